use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Worker API error: {0}")]
    #[diagnostic(code(palkkalaskuri::api))]
    Api(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(palkkalaskuri::config))]
    Config(String),

    #[error("Validation error: {0}")]
    #[diagnostic(
        code(palkkalaskuri::validation),
        help("check the calculation input for negative or missing values")
    )]
    Validation(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(palkkalaskuri::template))]
    Template(String),

    #[error("PDF error: {0}")]
    #[diagnostic(code(palkkalaskuri::pdf))]
    Pdf(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(palkkalaskuri::store))]
    Store(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(palkkalaskuri::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(palkkalaskuri::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(palkkalaskuri::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(palkkalaskuri::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create worker API errors
pub fn api_error(message: &str) -> Error {
    Error::Api(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create template errors
pub fn template_error(message: &str) -> Error {
    Error::Template(message.to_string())
}

/// Helper to create storage errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}
