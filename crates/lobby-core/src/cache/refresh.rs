//! Periodic listing

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::lobby::GameLister;

/// Spawn a background task that lists games periodically.
///
/// Listing is what drives expiration and source polling, so a lobby that is
/// only watched through its metrics needs somebody to keep asking.
pub fn spawn_refresh_task(
    lister: Arc<dyn GameLister>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    use tokio::time::{MissedTickBehavior, interval};

    info!("Starting background game list refresh (interval: {:?})", period);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match lister.list_games().await {
                Ok(games) => debug!("Scheduled refresh: {} games listed", games.len()),
                Err(e) => warn!("Error during scheduled game list refresh: {}", e),
            }
        }
    })
}
