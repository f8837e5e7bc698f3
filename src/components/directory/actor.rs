use super::models::{Company, Worker};
use super::token::TokenManager;
use crate::components::attendance::{AttendanceRecord, PayPeriod};
use crate::components::store::SalaryStore;
use crate::config::Config;
use crate::error::{api_error, component_error, config_error, validation_error, AppResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use url::Url;

/// The directory actor that talks to the worker API
pub struct DirectoryActor {
    config: Arc<RwLock<Config>>,
    token_manager: TokenManager,
    client: Client,
    store: Arc<dyn SalaryStore>,
    command_rx: mpsc::Receiver<DirectoryCommand>,
}

/// Commands that can be sent to the directory actor
pub enum DirectoryCommand {
    ListWorkers(mpsc::Sender<AppResult<Vec<Worker>>>),
    GetWorker(String, mpsc::Sender<AppResult<Worker>>),
    GetAttendance(
        String,
        PayPeriod,
        mpsc::Sender<AppResult<Vec<AttendanceRecord>>>,
    ),
    SyncCompanies(mpsc::Sender<AppResult<Vec<Company>>>),
    Shutdown,
}

/// Handle for communicating with the directory actor
#[derive(Clone)]
pub struct DirectoryActorHandle {
    command_tx: mpsc::Sender<DirectoryCommand>,
}

impl DirectoryActorHandle {
    async fn request<T>(
        &self,
        command: DirectoryCommand,
        mut response_rx: mpsc::Receiver<AppResult<T>>,
    ) -> AppResult<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// List all workers
    pub async fn list_workers(&self) -> AppResult<Vec<Worker>> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(DirectoryCommand::ListWorkers(response_tx), response_rx)
            .await
    }

    /// Get a single worker
    pub async fn get_worker(&self, worker_id: &str) -> AppResult<Worker> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            DirectoryCommand::GetWorker(worker_id.to_string(), response_tx),
            response_rx,
        )
        .await
    }

    /// Get a worker's attendance records for a period
    pub async fn get_attendance(
        &self,
        worker_id: &str,
        period: PayPeriod,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            DirectoryCommand::GetAttendance(worker_id.to_string(), period, response_tx),
            response_rx,
        )
        .await
    }

    /// Fetch companies and save them to the store
    pub async fn sync_companies(&self) -> AppResult<Vec<Company>> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(DirectoryCommand::SyncCompanies(response_tx), response_rx)
            .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(DirectoryCommand::Shutdown).await;
        Ok(())
    }
}

impl DirectoryActor {
    /// Create a new actor and return its handle
    pub fn new(
        config: Arc<RwLock<Config>>,
        store: Arc<dyn SalaryStore>,
    ) -> (Self, DirectoryActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let client = Client::new();

        let actor = Self {
            config: Arc::clone(&config),
            token_manager: TokenManager::new(config, Arc::clone(&store), client.clone()),
            client,
            store,
            command_rx,
        };

        (actor, DirectoryActorHandle { command_tx })
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Directory actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                DirectoryCommand::ListWorkers(response_tx) => {
                    let result = self.get_json::<Vec<Worker>>(&["workers"], &[]).await;
                    let _ = response_tx.send(result).await;
                }
                DirectoryCommand::GetWorker(worker_id, response_tx) => {
                    let result = self.get_json::<Worker>(&["workers", worker_id.as_str()], &[]).await;
                    let _ = response_tx.send(result).await;
                }
                DirectoryCommand::GetAttendance(worker_id, period, response_tx) => {
                    let result = self.get_attendance(&worker_id, &period).await;
                    let _ = response_tx.send(result).await;
                }
                DirectoryCommand::SyncCompanies(response_tx) => {
                    let result = self.sync_companies().await;
                    let _ = response_tx.send(result).await;
                }
                DirectoryCommand::Shutdown => {
                    info!("Directory actor shutting down");
                    break;
                }
            }
        }

        info!("Directory actor shut down");
    }

    async fn get_attendance(
        &self,
        worker_id: &str,
        period: &PayPeriod,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let from = period.start.format("%Y-%m-%d").to_string();
        let to = period.end.format("%Y-%m-%d").to_string();

        let records: Vec<AttendanceRecord> = self
            .get_json(&["workers", worker_id, "attendance"], &[("from", from), ("to", to)])
            .await?;

        // The API may return days outside the requested range
        Ok(records
            .into_iter()
            .filter(|r| period.contains(r.date))
            .collect())
    }

    async fn sync_companies(&self) -> AppResult<Vec<Company>> {
        let companies: Vec<Company> = self.get_json(&["companies"], &[]).await?;
        self.store.set_companies(&companies).await?;
        info!("Synced {} companies", companies.len());
        Ok(companies)
    }

    /// Build an API URL from path segments and query parameters.
    ///
    /// Segments are percent-encoded one by one, so an id can never add path
    /// segments or a query of its own.
    async fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> AppResult<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(validation_error(&format!(
                "Invalid path segment '{}'",
                segment
            )));
        }

        let base = {
            let config = self.config.read().await;
            config
                .api_base_url
                .clone()
                .ok_or_else(|| config_error("API_BASE_URL is not set"))?
        };

        let mut url = Url::parse(&base)
            .map_err(|e| config_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| config_error(&format!("API_BASE_URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = self.endpoint(segments, query).await?;
        let path = url.path().to_string();
        let token = self.token_manager.get_token().await?;

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| api_error(&format!("Request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(api_error(&format!(
                "Request to {} failed: HTTP {} - {}",
                path, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| api_error(&format!("Failed to parse response from {}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::store::InMemoryStore;

    fn actor(base: &str) -> DirectoryActor {
        let config = Config {
            api_base_url: Some(base.to_string()),
            ..Config::default()
        };
        let (actor, _handle) =
            DirectoryActor::new(Arc::new(RwLock::new(config)), Arc::new(InMemoryStore::new()));
        actor
    }

    #[tokio::test]
    async fn test_endpoint_keeps_base_path() {
        let actor = actor("https://api.example.com/v1/");
        let url = actor
            .endpoint(&["workers", "w-1", "attendance"], &[("from", "2024-03-01".to_string())])
            .await
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/workers/w-1/attendance?from=2024-03-01"
        );
    }

    #[tokio::test]
    async fn test_endpoint_encodes_worker_ids() {
        let actor = actor("https://api.example.com/v1");
        let url = actor
            .endpoint(&["workers", "../companies?x=1#top"], &[])
            .await
            .unwrap();
        assert_eq!(url.path(), "/v1/workers/..%2Fcompanies%3Fx=1%23top");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        for id in ["..", ".", ""] {
            assert!(actor.endpoint(&["workers", id], &[]).await.is_err());
        }
    }
}
