#[macro_use]
extern crate rust_i18n;

mod auth;
mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use palkkalaskuri::components::directory::Directory;
use palkkalaskuri::components::store::SalaryStore;
use palkkalaskuri::components::DirectoryHandle;
use palkkalaskuri::config::Config;
use palkkalaskuri::{shutdown, startup};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::auth::{AuthConfig, AuthService};
use crate::handlers::{
    calculate_handler, dashboard_handler, delete_template_handler, get_template_handler,
    health_handler, index_handler, list_templates_handler, login_form_handler, login_handler,
    logout_handler, put_template_handler, report_handler, split_handler, worker_hours_handler,
    workers_handler,
};

// Initialize i18n
i18n!("locales", fallback = "en");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    /// Auth service for JWT operations
    pub auth_service: Arc<AuthService>,
    pub store: Arc<dyn SalaryStore>,
    /// Present when the worker API is configured
    pub directory: Option<DirectoryHandle>,
}

/// Build the router with all routes and layers
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/workers", get(workers_handler))
        .route("/workers/{id}/hours", get(worker_hours_handler))
        .route("/calculate", post(calculate_handler))
        .route("/split", post(split_handler))
        .route("/templates", get(list_templates_handler))
        .route(
            "/templates/{name}",
            get(get_template_handler)
                .put(put_template_handler)
                .delete(delete_template_handler),
        )
        .route("/report", post(report_handler));

    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_form_handler).post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .route("/dashboard", get(dashboard_handler))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging("info,tower_http=debug")?;
    info!("Starting salary web server");

    let config = startup::load_config().await?;
    let store = startup::open_store(&config).await;

    let auth_config = AuthConfig::from_env();
    info!(
        "Using admin credentials from environment: username={}",
        auth_config.admin_username
    );

    // Background components, including the company sync
    let component_manager = startup::start_components(Arc::clone(&config), Arc::clone(&store)).await?;
    let directory = match component_manager.get::<Directory>() {
        Some(component) => component.get_handle().await,
        None => None,
    };

    let state = AppState {
        config,
        auth_service: Arc::new(AuthService::new(auth_config)),
        store,
        directory,
    };

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Listening on {}", addr);

    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(shutdown::handle_signals(shutdown_send, component_manager));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(palkkalaskuri::error::Error::from)?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = shutdown_recv.await;
        })
        .await
        .map_err(palkkalaskuri::error::Error::from)?;

    info!("Salary web server stopped");
    Ok(())
}
