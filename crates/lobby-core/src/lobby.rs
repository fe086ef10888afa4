//! Lobby capabilities
//!
//! Everything that can list games implements [`GameLister`]: the in-memory
//! service, the list cache, the overlay and the remote HTTP client. Caching
//! and overlaying are built on these traits only.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LobbyError;
use crate::game::{Game, GameInfo};

/// Default expiration time for game registrations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Registers games on a lobby
#[async_trait]
pub trait GameRegisterer: Send + Sync {
    /// Register a new game or refresh the registration of an existing one.
    ///
    /// Hosts must call this periodically, more often than [`DEFAULT_TIMEOUT`],
    /// or the registration expires.
    async fn register_game(&self, game: Game) -> Result<(), LobbyError>;
}

/// Lists games registered on a lobby
#[async_trait]
pub trait GameLister: Send + Sync {
    /// Return games sorted by address and port
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError>;
}

/// A lobby that can both list and register games
pub trait Lobby: GameRegisterer + GameLister {}

impl<T: GameRegisterer + GameLister + ?Sized> Lobby for T {}

/// A server hosting a game
#[async_trait]
pub trait GameHost: Send + Sync {
    /// Return current information about the active game
    async fn game_info(&self) -> Result<Game, LobbyError>;
}

#[async_trait]
impl<T: GameLister + ?Sized> GameLister for Arc<T> {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        (**self).list_games().await
    }
}

#[async_trait]
impl<T: GameRegisterer + ?Sized> GameRegisterer for Arc<T> {
    async fn register_game(&self, game: Game) -> Result<(), LobbyError> {
        (**self).register_game(game).await
    }
}
