//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LobbyError {
    #[error("Invalid game: {0}")]
    InvalidGame(String),

    #[error("Upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Game host error: {0}")]
    Host(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl LobbyError {
    /// Wrap any error coming from a foreign listing source
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LobbyError::Upstream(Box::new(err))
    }

    pub(crate) fn invalid(msg: &str) -> Self {
        LobbyError::InvalidGame(msg.to_string())
    }
}
