use super::actor::{DirectoryActor, DirectoryActorHandle};
use super::models::{Company, Worker};
use crate::components::attendance::{AttendanceCalendar, PayPeriod};
use crate::components::store::SalaryStore;
use crate::config::Config;
use crate::error::AppResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the directory actor
#[derive(Clone)]
pub struct DirectoryHandle {
    actor_handle: DirectoryActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl DirectoryHandle {
    /// Create a new DirectoryHandle and spawn the actor
    pub fn new(config: Arc<RwLock<Config>>, store: Arc<dyn SalaryStore>) -> Self {
        let (mut actor, handle) = DirectoryActor::new(config, store);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    pub async fn list_workers(&self) -> AppResult<Vec<Worker>> {
        self.actor_handle.list_workers().await
    }

    pub async fn get_worker(&self, worker_id: &str) -> AppResult<Worker> {
        self.actor_handle.get_worker(worker_id).await
    }

    /// Attendance calendar of a worker for the period
    pub async fn get_calendar(
        &self,
        worker_id: &str,
        period: PayPeriod,
    ) -> AppResult<AttendanceCalendar> {
        let records = self.actor_handle.get_attendance(worker_id, period).await?;
        Ok(AttendanceCalendar::from_records(worker_id, records))
    }

    pub async fn sync_companies(&self) -> AppResult<Vec<Company>> {
        self.actor_handle.sync_companies().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}
