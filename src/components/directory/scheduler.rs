use lazy_static::lazy_static;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration as TokioDuration, MissedTickBehavior};
use tracing::{error, info, warn};

use super::handle::DirectoryHandle;
use crate::config::Config;
use crate::error::AppResult;
use crate::utils::scheduler::Scheduler;

lazy_static! {
    static ref SYNC_TASK_RUNNING: AtomicBool = AtomicBool::new(false);
}

/// Periodically refreshes the company list
#[derive(Debug, Default)]
pub struct CompanySyncScheduler;

impl Scheduler for CompanySyncScheduler {
    type Handle = DirectoryHandle;

    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
    ) -> Pin<Box<dyn Future<Output = AppResult<()>> + Send>> {
        Box::pin(async move {
            let period = config.read().await.company_sync_interval;

            // Only one sync task per process
            if SYNC_TASK_RUNNING.swap(true, Ordering::SeqCst) {
                warn!("Company sync task is already running, skipping initialization");
                return Ok(());
            }

            info!("Starting company sync every {} seconds", period);
            tokio::spawn(run_sync_loop(period, handle));
            Ok(())
        })
    }

    fn stop(&self) -> Pin<Box<dyn Future<Output = AppResult<()>> + Send>> {
        Box::pin(async {
            if SYNC_TASK_RUNNING.swap(false, Ordering::SeqCst) {
                info!("Company sync task stopping");
            }
            Ok(())
        })
    }
}

async fn run_sync_loop(period: u64, handle: DirectoryHandle) {
    let mut ticker = interval(TokioDuration::from_secs(period.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !SYNC_TASK_RUNNING.load(Ordering::SeqCst) {
            break;
        }

        if let Err(e) = handle.sync_companies().await {
            error!("Failed to sync companies: {}", e);
        }
    }

    info!("Company sync task stopped");
}
