use super::SalaryStore;
use crate::components::directory::models::{ApiToken, Company};
use crate::components::report::ReportTemplate;
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    templates: RwLock<BTreeMap<String, ReportTemplate>>,
    companies: RwLock<Vec<Company>>,
    token: RwLock<Option<ApiToken>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SalaryStore for InMemoryStore {
    async fn get_template(&self, name: &str) -> AppResult<Option<ReportTemplate>> {
        Ok(self.templates.read().await.get(name).cloned())
    }

    async fn set_template(&self, template: &ReportTemplate) -> AppResult<()> {
        template.validate()?;
        self.templates
            .write()
            .await
            .insert(template.name.clone(), template.clone());
        Ok(())
    }

    async fn list_templates(&self) -> AppResult<Vec<String>> {
        Ok(self.templates.read().await.keys().cloned().collect())
    }

    async fn delete_template(&self, name: &str) -> AppResult<bool> {
        Ok(self.templates.write().await.remove(name).is_some())
    }

    async fn get_companies(&self) -> AppResult<Vec<Company>> {
        Ok(self.companies.read().await.clone())
    }

    async fn set_companies(&self, companies: &[Company]) -> AppResult<()> {
        *self.companies.write().await = companies.to_vec();
        Ok(())
    }

    async fn get_token(&self) -> AppResult<Option<ApiToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn set_token(&self, token: &ApiToken) -> AppResult<()> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_templates() {
        let store = InMemoryStore::new();
        store
            .set_template(&ReportTemplate::new("short", "{{total}}"))
            .await
            .unwrap();
        store
            .set_template(&ReportTemplate::new("long", "{{worker_name}} {{total}}"))
            .await
            .unwrap();

        assert_eq!(store.list_templates().await.unwrap(), vec!["long", "short"]);
        assert_eq!(
            store.get_template("short").await.unwrap().unwrap().body,
            "{{total}}"
        );

        assert!(store.delete_template("short").await.unwrap());
        assert!(!store.delete_template("short").await.unwrap());
        assert!(store.get_template("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_template_rejected() {
        let store = InMemoryStore::new();
        let result = store
            .set_template(&ReportTemplate::new("broken", "{{#companies}}"))
            .await;
        assert!(result.is_err());
        assert!(store.list_templates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_companies_replaced() {
        let store = InMemoryStore::new();
        let acme = Company {
            id: "acme".to_string(),
            name: "Acme Oy".to_string(),
            tax_id: None,
        };
        store.set_companies(&[acme.clone()]).await.unwrap();
        store.set_companies(&[acme.clone(), acme]).await.unwrap();
        assert_eq!(store.get_companies().await.unwrap().len(), 2);
    }
}
