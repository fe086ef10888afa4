//! Registration events
//!
//! The lobby reports what it sees to a [`LobbyObserver`]. Production wiring
//! uses [`MetricsObserver`], which feeds the `metrics` facade.

use async_trait::async_trait;
use metrics::Label;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::LobbyError;
use crate::game::{Game, GameInfo, GameKey};
use crate::lobby::GameLister;

/// Where a game listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSource {
    /// Registered directly on this lobby
    OpenNox,
    /// Listed by a remote lobby
    Remote,
}

impl GameSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameSource::OpenNox => "opennox",
            GameSource::Remote => "remote",
        }
    }
}

/// Receives registration events from a lobby
pub trait LobbyObserver: Send + Sync {
    /// A game registration was accepted; carries the current player count
    fn game_seen(&self, source: GameSource, game: &Game);

    /// A game registration expired and was removed
    fn game_expired(&self, source: GameSource, game: &Game);
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LobbyObserver for NoopObserver {
    fn game_seen(&self, _source: GameSource, _game: &Game) {}

    fn game_expired(&self, _source: GameSource, _game: &Game) {}
}

/// Observer that records Prometheus-style counters and gauges
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl MetricsObserver {
    fn labels(source: GameSource, game: &Game) -> Vec<Label> {
        vec![
            Label::new("src", source.as_str()),
            Label::new("addr", game.address.clone()),
            Label::new("port", game.port.to_string()),
            Label::new("name", game.name.clone()),
            Label::new("vers", game.version.clone()),
            Label::new("mode", game.mode.as_str()),
            Label::new("map", game.map.clone()),
        ]
    }
}

impl LobbyObserver for MetricsObserver {
    fn game_seen(&self, source: GameSource, game: &Game) {
        let labels = Self::labels(source, game);
        metrics::counter!("nox_game_seen", labels.clone()).increment(1);
        metrics::gauge!("nox_game_players", labels).set(game.players.cur as f64);
    }

    fn game_expired(&self, source: GameSource, game: &Game) {
        let labels = Self::labels(source, game);
        metrics::counter!("nox_game_expired", labels.clone()).increment(1);
        metrics::gauge!("nox_game_players", labels).set(0.0);
    }
}

/// Reports games listed by a foreign source to an observer.
///
/// Every listed game counts as seen. A game that disappears from the next
/// successful listing counts as expired. Listings are serialized so that
/// snapshots are compared in the order they were taken.
pub struct ObservedLister {
    inner: Arc<dyn GameLister>,
    source: GameSource,
    observer: Arc<dyn LobbyObserver>,
    previous: Mutex<HashMap<GameKey, Game>>,
}

impl ObservedLister {
    pub fn new(
        inner: Arc<dyn GameLister>,
        source: GameSource,
        observer: Arc<dyn LobbyObserver>,
    ) -> Self {
        Self {
            inner,
            source,
            observer,
            previous: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GameLister for ObservedLister {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        let mut previous = self.previous.lock().await;
        let list = self.inner.list_games().await?;

        let mut seen = HashMap::with_capacity(list.len());
        for info in &list {
            self.observer.game_seen(self.source, &info.game);
            seen.insert(info.key(), info.game.clone());
        }

        for (key, game) in previous.iter() {
            if !seen.contains_key(key) {
                self.observer.game_expired(self.source, game);
            }
        }
        *previous = seen;

        debug!("{}: {} games listed", self.source.as_str(), list.len());
        Ok(list)
    }
}
