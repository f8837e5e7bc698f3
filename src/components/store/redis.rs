use super::SalaryStore;
use crate::components::directory::models::{ApiToken, Company};
use crate::components::report::ReportTemplate;
use crate::error::{store_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Client as RedisClient};
use tracing::{debug, info};

/// Redis keys, all under the application prefix
mod keys {
    pub const TEMPLATE_PREFIX: &str = "palkka:template:";
    pub const TEMPLATE_NAMES: &str = "palkka:templates";
    pub const COMPANIES: &str = "palkka:companies";
    pub const API_TOKEN: &str = "palkka:token";
}

/// Store backed by Redis with JSON values
pub struct RedisStore {
    client: RedisClient,
}

impl RedisStore {
    /// Create a client for the given URL. No connection is made yet.
    pub fn new(redis_url: &str) -> AppResult<Self> {
        let client = RedisClient::open(redis_url)
            .map_err(|e| store_error(&format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| store_error(&format!("Failed to connect to Redis: {}", e)))
    }

    /// Check that the server answers
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn template_key(name: &str) -> String {
        format!("{}{}", keys::TEMPLATE_PREFIX, name)
    }
}

#[async_trait]
impl SalaryStore for RedisStore {
    async fn get_template(&self, name: &str) -> AppResult<Option<ReportTemplate>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = conn.get(Self::template_key(name)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_template(&self, template: &ReportTemplate) -> AppResult<()> {
        template.validate()?;
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(template)?;

        conn.set::<_, _, ()>(Self::template_key(&template.name), &json)
            .await?;
        conn.sadd::<_, _, ()>(keys::TEMPLATE_NAMES, &template.name)
            .await?;

        info!("Stored template '{}'", template.name);
        Ok(())
    }

    async fn list_templates(&self) -> AppResult<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let mut names: Vec<String> = conn.smembers(keys::TEMPLATE_NAMES).await?;
        names.sort();
        Ok(names)
    }

    async fn delete_template(&self, name: &str) -> AppResult<bool> {
        let mut conn = self.get_connection().await?;
        let removed: i64 = conn.del(Self::template_key(name)).await?;
        conn.srem::<_, _, ()>(keys::TEMPLATE_NAMES, name).await?;

        if removed > 0 {
            info!("Deleted template '{}'", name);
        }
        Ok(removed > 0)
    }

    async fn get_companies(&self) -> AppResult<Vec<Company>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = conn.get(keys::COMPANIES).await?;
        match data {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn set_companies(&self, companies: &[Company]) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(companies)?;
        conn.set::<_, _, ()>(keys::COMPANIES, &json).await?;
        debug!("Stored {} companies", companies.len());
        Ok(())
    }

    async fn get_token(&self) -> AppResult<Option<ApiToken>> {
        let mut conn = self.get_connection().await?;
        let data: Option<String> = conn.get(keys::API_TOKEN).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_token(&self, token: &ApiToken) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(token)?;

        // Let Redis drop the token once it can no longer be used
        let ttl = (token.expires_at - Utc::now()).num_seconds();
        if ttl > 0 {
            conn.set_ex::<_, _, ()>(keys::API_TOKEN, &json, ttl as u64)
                .await?;
        } else {
            conn.del::<_, ()>(keys::API_TOKEN).await?;
        }
        Ok(())
    }
}
