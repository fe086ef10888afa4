//! Read-through cache over a game lister

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::LobbyError;
use crate::game::GameInfo;
use crate::lobby::{DEFAULT_TIMEOUT, GameLister};

#[derive(Default)]
struct Snapshot {
    refreshed_at: Option<Instant>,
    games: Vec<GameInfo>,
}

impl Snapshot {
    fn is_fresh(&self, refresh: Duration, now: Instant) -> bool {
        self.refreshed_at
            .and_then(|at| at.checked_add(refresh))
            .is_some_and(|expires| expires > now)
    }
}

/// Caches the list returned by another lister.
///
/// The wrapped lister is called at most once per refresh interval, unless
/// it fails: errors are returned to the caller and never cached.
pub struct ListCache {
    source: Arc<dyn GameLister>,
    refresh: Duration,
    snapshot: RwLock<Snapshot>,
}

impl ListCache {
    /// Create a cache over `source`.
    ///
    /// A zero `refresh` uses half of [`DEFAULT_TIMEOUT`].
    pub fn new(source: Arc<dyn GameLister>, refresh: Duration) -> Self {
        let refresh = if refresh.is_zero() {
            DEFAULT_TIMEOUT / 2
        } else {
            refresh
        };
        info!("Initializing game list cache (refresh: {:?})", refresh);

        Self {
            source,
            refresh,
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }
}

#[async_trait]
impl GameLister for ListCache {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        {
            let snapshot = self.snapshot.read().await;
            if snapshot.is_fresh(self.refresh, Instant::now()) {
                return Ok(snapshot.games.clone());
            }
        }

        let mut snapshot = self.snapshot.write().await;
        let now = Instant::now();
        // Another caller may have refreshed while we waited for the lock
        if snapshot.is_fresh(self.refresh, now) {
            return Ok(snapshot.games.clone());
        }

        debug!("Game list cache is stale, refreshing");
        let games = self.source.list_games().await?;
        snapshot.games = games;
        snapshot.refreshed_at = Some(now);
        Ok(snapshot.games.clone())
    }
}
