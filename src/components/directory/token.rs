use super::models::ApiToken;
use crate::components::store::SalaryStore;
use crate::config::Config;
use crate::error::{api_error, config_error, AppResult};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Body returned by the token exchange
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Exchanges the API key for a JWT and caches it in the store
#[derive(Clone)]
pub struct TokenManager {
    config: Arc<RwLock<Config>>,
    store: Arc<dyn SalaryStore>,
    client: Client,
}

impl TokenManager {
    pub fn new(config: Arc<RwLock<Config>>, store: Arc<dyn SalaryStore>, client: Client) -> Self {
        Self {
            config,
            store,
            client,
        }
    }

    /// Get a valid token, exchanging the API key when the cached one is missing or expired
    pub async fn get_token(&self) -> AppResult<ApiToken> {
        if let Some(token) = self.store.get_token().await? {
            if !token.is_expired(Utc::now()) {
                return Ok(token);
            }
            debug!("Cached API token expired at {}", token.expires_at);
        }

        let token = self.exchange().await?;
        self.store.set_token(&token).await?;
        Ok(token)
    }

    async fn exchange(&self) -> AppResult<ApiToken> {
        let (url, api_key) = {
            let config = self.config.read().await;
            let url = config
                .token_exchange_url
                .clone()
                .ok_or_else(|| config_error("TOKEN_EXCHANGE_URL is not set"))?;
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| config_error("API_KEY is not set"))?;
            (url, api_key)
        };

        let response = self
            .client
            .post(&url)
            .json(&json!({ "api_key": api_key }))
            .send()
            .await
            .map_err(|e| api_error(&format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(api_error(&format!(
                "Token exchange failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| api_error(&format!("Failed to parse token response: {}", e)))?;

        info!("Obtained API token valid for {} seconds", body.expires_in);
        Ok(ApiToken::new(body.access_token, body.expires_in, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::store::InMemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let store: Arc<dyn SalaryStore> = Arc::new(InMemoryStore::new());
        let cached = ApiToken {
            access_token: "cached".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        store.set_token(&cached).await.unwrap();

        // No exchange URL configured, so only the cache can answer
        let manager = TokenManager::new(
            Arc::new(RwLock::new(Config::default())),
            store,
            Client::new(),
        );
        assert_eq!(manager.get_token().await.unwrap().access_token, "cached");
    }

    #[tokio::test]
    async fn test_expired_token_requires_exchange() {
        let store: Arc<dyn SalaryStore> = Arc::new(InMemoryStore::new());
        let expired = ApiToken {
            access_token: "old".to_string(),
            expires_at: Utc::now() + Duration::seconds(30),
        };
        store.set_token(&expired).await.unwrap();

        let manager = TokenManager::new(
            Arc::new(RwLock::new(Config::default())),
            store,
            Client::new(),
        );
        let err = manager.get_token().await.unwrap_err();
        assert!(err.to_string().contains("TOKEN_EXCHANGE_URL"));
    }
}
