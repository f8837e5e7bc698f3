use crate::error::{config_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default currency suffix used in reports
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Default overtime multiplier for hourly contracts
pub const DEFAULT_OVERTIME_MULTIPLIER: f64 = 1.5;

/// Company sync interval in seconds (one hour)
pub const DEFAULT_COMPANY_SYNC_INTERVAL: u64 = 3600;

/// Main configuration structure for the calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the worker REST API
    pub api_base_url: Option<String>,
    /// API key exchanged for a JWT before calling the worker API
    pub api_key: Option<String>,
    /// Token exchange endpoint
    pub token_exchange_url: Option<String>,
    /// Redis connection string
    pub redis_url: String,
    /// Timezone used for report timestamps
    pub timezone: String,
    /// Locale for report labels
    pub report_locale: String,
    /// Currency suffix printed after amounts
    pub currency: String,
    /// Seconds between company syncs
    pub company_sync_interval: u64,
    /// Default overtime multiplier
    pub overtime_multiplier: f64,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut components = HashMap::new();
        components.insert("directory".to_string(), true);

        Self {
            api_base_url: None,
            api_key: None,
            token_exchange_url: None,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            timezone: "UTC".to_string(),
            report_locale: "en".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            company_sync_interval: DEFAULT_COMPANY_SYNC_INTERVAL,
            overtime_multiplier: DEFAULT_OVERTIME_MULTIPLIER,
            components,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let api_base_url = env::var("API_BASE_URL").ok().filter(|v| !v.is_empty());
        let api_key = env::var("API_KEY").ok().filter(|v| !v.is_empty());
        let token_exchange_url = env::var("TOKEN_EXCHANGE_URL").ok().filter(|v| !v.is_empty());

        let redis_url = env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        let timezone = env::var("TIMEZONE").unwrap_or(defaults.timezone);
        let report_locale = env::var("REPORT_LOCALE").unwrap_or(defaults.report_locale);
        let currency = env::var("CURRENCY").unwrap_or(defaults.currency);

        // Parse numeric values
        let company_sync_interval = match env::var("COMPANY_SYNC_INTERVAL") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| config_error("Invalid COMPANY_SYNC_INTERVAL format"))?,
            Err(_) => defaults.company_sync_interval,
        };

        let overtime_multiplier = match env::var("OVERTIME_MULTIPLIER") {
            Ok(value) => value
                .parse::<f64>()
                .map_err(|_| config_error("Invalid OVERTIME_MULTIPLIER format"))?,
            Err(_) => defaults.overtime_multiplier,
        };

        let mut components = defaults.components;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            if let Ok(file_components) = toml::from_str::<HashMap<String, bool>>(&content) {
                // Merge with defaults
                for (key, value) in file_components {
                    components.insert(key, value);
                }
            }
        }

        let config = Config {
            api_base_url,
            api_key,
            token_exchange_url,
            redis_url,
            timezone,
            report_locale,
            currency,
            company_sync_interval,
            overtime_multiplier,
            components,
        };
        config.validate()?;

        Ok(config)
    }

    /// Check values that cannot be caught while parsing
    pub fn validate(&self) -> AppResult<()> {
        self.tz()?;

        if !self.overtime_multiplier.is_finite() || self.overtime_multiplier < 1.0 {
            return Err(config_error("OVERTIME_MULTIPLIER must be at least 1.0"));
        }

        if self.company_sync_interval == 0 {
            return Err(config_error("COMPANY_SYNC_INTERVAL must be positive"));
        }

        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Update component enabled status
    pub fn set_component_enabled(&mut self, name: &str, enabled: bool) -> AppResult<()> {
        self.components.insert(name.to_string(), enabled);
        self.save_components()
    }

    /// Save component configuration to file
    fn save_components(&self) -> AppResult<()> {
        // Create config directory if it doesn't exist
        if !Path::new("config").exists() {
            fs::create_dir("config")?;
        }

        let toml_str = toml::to_string(&self.components)
            .map_err(|e| crate::error::Error::Serialization(e.to_string()))?;
        fs::write("config/components.toml", toml_str)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.is_component_enabled("directory"));
        assert!(!config.is_component_enabled("missing"));
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            timezone: "Europe/Helsinki".to_string(),
            ..Config::default()
        };
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Helsinki);
    }

    #[test]
    fn test_overtime_multiplier_bounds() {
        let config = Config {
            overtime_multiplier: 0.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
