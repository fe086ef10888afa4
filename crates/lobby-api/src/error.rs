//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lobby_core::LobbyError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Lobby(#[from] LobbyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Lobby(LobbyError::InvalidGame(_)) => StatusCode::BAD_REQUEST,
            ApiError::Lobby(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = axum::Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
