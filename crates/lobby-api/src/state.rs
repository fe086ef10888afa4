//! Application state

use lobby_core::Lobby;
use std::sync::Arc;

/// Prometheus render handle used by the metrics endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lobby: Arc<dyn Lobby>,
    /// Trust the game address sent by clients instead of using the remote IP
    pub trust_addr: bool,
}

impl AppState {
    pub fn new(lobby: Arc<dyn Lobby>, trust_addr: bool) -> Self {
        Self { lobby, trust_addr }
    }
}
