//! Background maintenance
//!
//! Hourly sweeps for expired cache entries and OAuth states. Startup
//! reconciliation of interrupted tasks lives in `main`, before the worker
//! starts.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::repositories::{AuthRepository, CacheRepository};

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawns the hourly sweep loop
pub fn spawn_sweeps(cache: Arc<dyn CacheRepository>, auth: Arc<dyn AuthRepository>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick fires immediately, clearing anything left over
        // from before the restart
        loop {
            ticker.tick().await;

            match cache.clear_expired().await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "cache sweep removed expired entries");
                }
                Ok(_) => {}
                Err(e) => warn!("cache sweep failed: {e}"),
            }

            match auth.clear_expired_oauth_states().await {
                Ok(removed) if removed > 0 => {
                    info!(removed, "removed expired oauth states");
                }
                Ok(_) => {}
                Err(e) => warn!("oauth state sweep failed: {e}"),
            }
        }
    });
}
