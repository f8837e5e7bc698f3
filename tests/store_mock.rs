use async_trait::async_trait;
use chrono::{Duration, Utc};
use palkkalaskuri::components::directory::token::TokenManager;
use palkkalaskuri::components::directory::{ApiToken, Company};
use palkkalaskuri::components::report::ReportTemplate;
use palkkalaskuri::components::store::{load_template, SalaryStore};
use palkkalaskuri::config::Config;
use palkkalaskuri::error::{store_error, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Mock store keeping JSON strings under Redis-like keys
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let data = self.data.lock().await;
        match data.get(key) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| store_error(&format!("Failed to deserialize {}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.data.lock().await.insert(key.to_string(), json);
        Ok(())
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SalaryStore for MockStore {
    async fn get_template(&self, name: &str) -> AppResult<Option<ReportTemplate>> {
        self.get_json(&format!("palkka:template:{}", name)).await
    }

    async fn set_template(&self, template: &ReportTemplate) -> AppResult<()> {
        template.validate()?;
        self.set_json(&format!("palkka:template:{}", template.name), template)
            .await
    }

    async fn list_templates(&self) -> AppResult<Vec<String>> {
        Ok(self
            .keys()
            .await
            .into_iter()
            .filter_map(|k| k.strip_prefix("palkka:template:").map(str::to_string))
            .collect())
    }

    async fn delete_template(&self, name: &str) -> AppResult<bool> {
        let key = format!("palkka:template:{}", name);
        Ok(self.data.lock().await.remove(&key).is_some())
    }

    async fn get_companies(&self) -> AppResult<Vec<Company>> {
        Ok(self.get_json("palkka:companies").await?.unwrap_or_default())
    }

    async fn set_companies(&self, companies: &[Company]) -> AppResult<()> {
        self.set_json("palkka:companies", &companies).await
    }

    async fn get_token(&self) -> AppResult<Option<ApiToken>> {
        self.get_json("palkka:token").await
    }

    async fn set_token(&self, token: &ApiToken) -> AppResult<()> {
        self.set_json("palkka:token", token).await
    }
}

/// Templates survive a JSON round trip and override the built-in one
#[tokio::test]
async fn test_mock_store_templates() {
    let store = MockStore::new();
    assert_eq!(
        load_template(&store, "default").await.unwrap().body,
        ReportTemplate::builtin().body
    );

    let custom = ReportTemplate::new("default", "<h1>{{label_title}}</h1>{{#tiers}}{{method}}{{/tiers}}");
    store.set_template(&custom).await.unwrap();
    assert_eq!(load_template(&store, "default").await.unwrap(), custom);
    assert_eq!(store.list_templates().await.unwrap(), vec!["default"]);
    assert_eq!(store.keys().await, vec!["palkka:template:default"]);

    assert!(store.delete_template("default").await.unwrap());
    assert!(store.list_templates().await.unwrap().is_empty());
}

/// The token manager answers from the store while the token is valid
#[tokio::test]
async fn test_token_manager_uses_store() {
    let store = MockStore::new();
    store
        .set_token(&ApiToken::new("stored".to_string(), 600, Utc::now()))
        .await
        .unwrap();

    let manager = TokenManager::new(
        Arc::new(RwLock::new(Config::default())),
        Arc::new(store.clone()),
        reqwest::Client::new(),
    );
    assert_eq!(manager.get_token().await.unwrap().access_token, "stored");

    // Within the expiry skew the cached token is no longer used
    store
        .set_token(&ApiToken {
            access_token: "stale".to_string(),
            expires_at: Utc::now() + Duration::seconds(10),
        })
        .await
        .unwrap();
    assert!(manager.get_token().await.is_err());
}
