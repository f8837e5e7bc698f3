//! Persistence for report templates, the company list and the API token.

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;

use crate::components::directory::models::{ApiToken, Company};
use crate::components::report::ReportTemplate;
use crate::error::AppResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage used by the calculator front-ends
#[async_trait]
pub trait SalaryStore: Send + Sync {
    /// Get a template by name
    async fn get_template(&self, name: &str) -> AppResult<Option<ReportTemplate>>;

    /// Insert or replace a template
    async fn set_template(&self, template: &ReportTemplate) -> AppResult<()>;

    /// Names of all stored templates, sorted
    async fn list_templates(&self) -> AppResult<Vec<String>>;

    /// Delete a template, returning whether it existed
    async fn delete_template(&self, name: &str) -> AppResult<bool>;

    /// Companies from the last sync
    async fn get_companies(&self) -> AppResult<Vec<Company>>;

    /// Replace the company list
    async fn set_companies(&self, companies: &[Company]) -> AppResult<()>;

    /// Cached API token
    async fn get_token(&self) -> AppResult<Option<ApiToken>>;

    /// Cache an API token
    async fn set_token(&self, token: &ApiToken) -> AppResult<()>;
}

/// Load a template from the store, falling back to the built-in one
pub async fn load_template(store: &dyn SalaryStore, name: &str) -> AppResult<ReportTemplate> {
    match store.get_template(name).await? {
        Some(template) => Ok(template),
        None if name == crate::components::report::DEFAULT_TEMPLATE_NAME => {
            Ok(ReportTemplate::builtin())
        }
        None => Err(crate::error::template_error(&format!(
            "Template '{}' not found",
            name
        ))),
    }
}

/// Connect to Redis, or use an in-memory store when it is unreachable
pub async fn connect(redis_url: &str) -> Arc<dyn SalaryStore> {
    match RedisStore::new(redis_url) {
        Ok(store) => match store.ping().await {
            Ok(()) => {
                info!("Using Redis store at {}", redis_url);
                return Arc::new(store);
            }
            Err(e) => warn!("Redis at {} is unreachable: {}", redis_url, e),
        },
        Err(e) => warn!("Invalid Redis URL {}: {}", redis_url, e),
    }

    warn!("Falling back to in-memory store, data will not persist");
    Arc::new(InMemoryStore::new())
}
