//! Overlay of two game listings
//!
//! Registrations go to the primary lobby only. Listings merge both sources,
//! entries from the secondary source win on a key collision.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::LobbyError;
use crate::game::{Game, GameInfo, GameKey, sort_games};
use crate::lobby::{GameLister, GameRegisterer, Lobby};

/// Combines a primary lobby with a read-only secondary lister
pub struct Overlay {
    primary: Arc<dyn Lobby>,
    secondary: Arc<dyn GameLister>,
}

impl Overlay {
    pub fn new(primary: Arc<dyn Lobby>, secondary: Arc<dyn GameLister>) -> Self {
        Self { primary, secondary }
    }
}

fn split(result: Result<Vec<GameInfo>, LobbyError>) -> (Vec<GameInfo>, Option<LobbyError>) {
    match result {
        Ok(games) => (games, None),
        Err(e) => (Vec::new(), Some(e)),
    }
}

#[async_trait]
impl GameRegisterer for Overlay {
    async fn register_game(&self, game: Game) -> Result<(), LobbyError> {
        self.primary.register_game(game).await
    }
}

#[async_trait]
impl GameLister for Overlay {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        let (primary, secondary) =
            tokio::join!(self.primary.list_games(), self.secondary.list_games());
        let (primary, primary_err) = split(primary);
        let (secondary, secondary_err) = split(secondary);

        if primary.is_empty() && secondary.is_empty() {
            // Secondary error takes priority
            if let Some(e) = secondary_err {
                return Err(e);
            }
            if let Some(e) = primary_err {
                return Err(e);
            }
            return Ok(Vec::new());
        }

        // Any results at all suppress errors
        if let Some(e) = &primary_err {
            warn!("Primary lobby failed, serving partial list: {}", e);
        }
        if let Some(e) = &secondary_err {
            warn!("Secondary lister failed, serving partial list: {}", e);
        }

        let mut by_key: HashMap<GameKey, GameInfo> =
            HashMap::with_capacity(primary.len() + secondary.len());
        for game in primary {
            by_key.insert(game.key(), game);
        }
        for game in secondary {
            if let Some(prev) = by_key.insert(game.key(), game) {
                debug!(
                    "Secondary listing overrides {}:{}",
                    prev.game.address, prev.game.port
                );
            }
        }

        let mut list: Vec<GameInfo> = by_key.into_values().collect();
        sort_games(&mut list);
        Ok(list)
    }
}
