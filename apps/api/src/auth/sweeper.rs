use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::auth::service::TokenService;

/// Spawns the periodic expired-token sweep. The first tick fires
/// immediately, so a sweep also runs at startup.
///
/// The task exits once `shutdown` turns `true` or its sender is dropped.
pub fn spawn_sweeper(
    tokens: TokenService,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Token sweeper running every {}s", period.as_secs());

        loop {
            tokio::select! {
                _ = ticker.tick() => match tokens.sweep().await {
                    Ok(deleted) => debug!("Token sweep finished ({deleted} removed)"),
                    Err(e) => error!("Token sweep failed: {e}"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Token sweeper stopped");
    })
}
