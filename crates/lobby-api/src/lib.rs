//! Nox Lobby REST API
//!
//! This crate provides the Axum-based HTTP API for the Nox lobby:
//! game registration, game listing and address discovery.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, monitor_router};
pub use state::{AppState, MetricsHandle};
