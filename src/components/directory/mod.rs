mod actor;
mod handle;
pub mod models;
mod scheduler;
pub mod token;

pub use handle::DirectoryHandle;
pub use models::{ApiToken, Company, Worker};
pub use scheduler::CompanySyncScheduler;

use crate::components::store::SalaryStore;
use crate::config::Config;
use crate::error::{component_error, AppResult};
use crate::utils::scheduler::Scheduler;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Worker API integration with periodic company sync
#[derive(Default)]
pub struct Directory {
    handle: RwLock<Option<DirectoryHandle>>,
    scheduler: CompanySyncScheduler,
}

impl Directory {
    /// Create a new directory component
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle if the component has been initialized
    pub async fn get_handle(&self) -> Option<DirectoryHandle> {
        self.handle.read().await.clone()
    }
}

#[async_trait]
impl super::Component for Directory {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, store: Arc<dyn SalaryStore>) -> AppResult<()> {
        if config.read().await.api_base_url.is_none() {
            return Err(component_error("API_BASE_URL is not set"));
        }

        let handle = {
            let mut handle_lock = self.handle.write().await;
            handle_lock
                .get_or_insert_with(|| DirectoryHandle::new(Arc::clone(&config), store))
                .clone()
        };

        CompanySyncScheduler::start(config, handle).await
    }

    async fn shutdown(&self) -> AppResult<()> {
        self.scheduler.stop().await?;

        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
