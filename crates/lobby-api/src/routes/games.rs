//! Lobby API routes

use axum::{
    Json, Router,
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    routing::{get, post},
};
use lobby_core::{Game, GameInfo};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Registration requests above this size are rejected
const MAX_REGISTER_BODY: usize = 1024 * 1024;

/// Successful response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Response to the address request
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub ip: String,
}

fn remote_ip(request: &Request) -> Result<IpAddr, ApiError> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .ok_or_else(|| ApiError::BadRequest("cannot detect IP address".to_string()))
}

/// GET /api/v0/address - the caller's address as seen by the lobby
async fn address(request: Request) -> Result<Json<DataResponse<AddressResponse>>, ApiError> {
    let ip = remote_ip(&request)?;
    Ok(Json(DataResponse {
        data: AddressResponse { ip: ip.to_string() },
    }))
}

/// GET /api/v0/games/list
async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<GameInfo>>>, ApiError> {
    let games = state.lobby.list_games().await?;
    debug!("Listing {} games", games.len());
    Ok(Json(DataResponse { data: games }))
}

/// POST /api/v0/games/register
async fn register_game(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<DataResponse<Option<()>>>, ApiError> {
    let remote = remote_ip(&request);
    let body = to_bytes(request.into_body(), MAX_REGISTER_BODY)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let mut game: Game =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !state.trust_addr {
        game.address = remote?.to_string();
    }

    info!("Register game {:?} from {}", game.name, game.address);
    // Every registration failure is answered with 400
    state
        .lobby
        .register_game(game)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(DataResponse { data: None }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create lobby routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v0/address", get(address).fallback(method_not_allowed))
        .route(
            "/api/v0/games/list",
            get(list_games).fallback(method_not_allowed),
        )
        .route(
            "/api/v0/games/register",
            post(register_game).fallback(method_not_allowed),
        )
}
