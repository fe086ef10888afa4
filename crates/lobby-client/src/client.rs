//! Nox lobby HTTP client

use async_trait::async_trait;
use lobby_core::{Game, GameInfo, GameLister, GameRegisterer, LobbyError};
use reqwest::{Client, Method, header};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::ClientError;

const ADDRESS_PATH: &str = "/api/v0/address";
const LIST_PATH: &str = "/api/v0/games/list";
const REGISTER_PATH: &str = "/api/v0/games/register";

/// Response envelope used by the lobby API
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    ip: String,
}

/// HTTP client for a Nox lobby server
#[derive(Clone)]
pub struct LobbyClient {
    client: Client,
    server_url: String,
    agent: Option<String>,
}

impl LobbyClient {
    /// Create a client for the lobby at `server_url`
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(server_url, Client::new())
    }

    /// Create a client using a custom HTTP client
    pub fn with_client(server_url: &str, client: Client) -> Result<Self, ClientError> {
        let url = Url::parse(server_url)?;
        info!("Created lobby client for {}", url);

        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            agent: None,
        })
    }

    /// Set the User-Agent sent with requests, e.g. "AppName/1.2.3".
    ///
    /// Apps are advised to set something unique.
    pub fn set_user_agent(&mut self, agent: impl Into<String>) {
        self.agent = Some(agent.into());
    }

    /// Ask the lobby which address it sees for this client
    pub async fn address(&self) -> Result<String, ClientError> {
        let resp: Option<AddressResponse> = self
            .send_request(Method::GET, ADDRESS_PATH, None::<&()>)
            .await?;
        resp.map(|r| r.ip)
            .ok_or_else(|| ClientError::InvalidResponse("missing address".to_string()))
    }

    /// List games registered on the lobby
    pub async fn list(&self) -> Result<Vec<GameInfo>, ClientError> {
        let games: Option<Vec<GameInfo>> = self
            .send_request(Method::GET, LIST_PATH, None::<&()>)
            .await?;
        Ok(games.unwrap_or_default())
    }

    /// Register or refresh a game on the lobby
    pub async fn register(&self, game: &Game) -> Result<(), ClientError> {
        let _: Option<IgnoredAny> = self
            .send_request(Method::POST, REGISTER_PATH, Some(game))
            .await?;
        Ok(())
    }

    async fn send_request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.server_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(agent) = &self.agent {
            request = request.header(header::USER_AGENT, agent);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(ClientError::Status(status)),
            Err(e) => return Err(ClientError::InvalidResponse(e.to_string())),
        };

        if let Some(msg) = envelope.error.filter(|m| !m.is_empty()) {
            return Err(ClientError::Server(msg));
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl GameLister for LobbyClient {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        Ok(self.list().await?)
    }
}

#[async_trait]
impl GameRegisterer for LobbyClient {
    async fn register_game(&self, game: Game) -> Result<(), LobbyError> {
        Ok(self.register(&game).await?)
    }
}
