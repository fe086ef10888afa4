//! Client error types

use lobby_core::LobbyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid lobby URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Server(String),

    #[error("status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ClientError> for LobbyError {
    fn from(err: ClientError) -> Self {
        LobbyError::upstream(err)
    }
}
