use crate::components::directory::Directory;
use crate::components::store::{self, SalaryStore};
use crate::components::ComponentManager;
use crate::config::Config;
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(default_filter: &str) -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => {
            // Report labels follow the configured locale
            rust_i18n::set_locale(&config.report_locale);
            info!("Report locale set to {}", config.report_locale);
            Ok(Arc::new(RwLock::new(config)))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Open the configured store
pub async fn open_store(config: &Arc<RwLock<Config>>) -> Arc<dyn SalaryStore> {
    let redis_url = config.read().await.redis_url.clone();
    store::connect(&redis_url).await
}

/// Register and initialize the background components
pub async fn start_components(
    config: Arc<RwLock<Config>>,
    store: Arc<dyn SalaryStore>,
) -> miette::Result<Arc<ComponentManager>> {
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Directory::new());

    let started = component_manager.init_all(store).await?;
    info!("Started components: {:?}", started);

    Ok(Arc::new(component_manager))
}
