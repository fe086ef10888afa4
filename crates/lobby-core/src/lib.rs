//! Nox Lobby Core
//!
//! This crate provides the game registry for the Nox lobby: the in-memory
//! lobby service with registration expiry, a read-through cache for
//! listings, and an overlay merging two listing sources.

pub mod cache;
pub mod error;
pub mod game;
pub mod keepalive;
pub mod lobby;
pub mod observer;
pub mod overlay;
pub mod service;

#[cfg(test)]
mod test_util;

pub use cache::{ListCache, spawn_refresh_task};
pub use error::LobbyError;
pub use game::{
    DEFAULT_GAME_PORT, Game, GameAccess, GameInfo, GameKey, GameMode, PlayersInfo, QuestInfo,
    Resolution, sort_games,
};
pub use keepalive::{MAX_REGISTER_FAILURES, keep_registered};
pub use lobby::{DEFAULT_TIMEOUT, GameHost, GameLister, GameRegisterer, Lobby};
pub use observer::{GameSource, LobbyObserver, MetricsObserver, NoopObserver, ObservedLister};
pub use overlay::Overlay;
pub use service::LobbyService;
