use crate::errors::GateError;
use crate::storage::Storage;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{error, info, instrument};

/// Periodically drops expired OTP, counter and lock entries from backends
/// that do not evict on their own.
pub struct CleanupService {
    storage: Arc<dyn Storage>,
}

impl CleanupService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self))]
    pub async fn run_cleanup(&self) -> Result<usize, GateError> {
        let purged = self.storage.purge_expired().await?;
        info!(purged, "Expired OTP entries purged");
        Ok(purged)
    }

    /// Runs the cleanup every `interval`, forever.
    pub async fn start_scheduler(self: Arc<Self>, interval: Duration) {
        let mut timer = time::interval(interval);

        info!("Cleanup scheduler started with interval: {:?}", interval);

        loop {
            timer.tick().await;

            // Spawned so a slow purge does not delay the next tick.
            let service = self.clone();
            tokio::spawn(async move {
                if let Err(e) = service.run_cleanup().await {
                    error!("Cleanup job failed: {:?}", e);
                }
            });
        }
    }
}
