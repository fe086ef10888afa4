//! Game record model
//!
//! A [`Game`] is what a host announces about itself. The lobby stores it as a
//! [`GameInfo`], which adds the time the registration was last seen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LobbyError;

/// Default UDP port for Nox games
pub const DEFAULT_GAME_PORT: i32 = 18590;

/// Error type for parsing game modes and access levels
#[derive(Debug, Clone)]
pub struct ParseGameFieldError {
    field: &'static str,
    value: String,
}

impl fmt::Display for ParseGameFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{} should be set", self.field)
        } else {
            write!(f, "Invalid {}: {}", self.field, self.value)
        }
    }
}

impl std::error::Error for ParseGameFieldError {}

/// Nox game mode
/// Decoding goes through [`FromStr`]: an empty mode is an error, names this
/// lobby doesn't know become [`GameMode::Custom`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum GameMode {
    /// King of the realm
    Kotr,
    /// Capture the flag
    Ctf,
    FlagBall,
    Chat,
    Arena,
    Elimination,
    Quest,
    Coop,
    /// Catch-all for listings whose mode has no direct equivalent
    Custom,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Kotr => "kotr",
            GameMode::Ctf => "ctf",
            GameMode::FlagBall => "flagball",
            GameMode::Chat => "chat",
            GameMode::Arena => "arena",
            GameMode::Elimination => "elimination",
            GameMode::Quest => "quest",
            GameMode::Coop => "coop",
            GameMode::Custom => "custom",
        }
    }
}

impl FromStr for GameMode {
    type Err = ParseGameFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" => Err(ParseGameFieldError {
                field: "mode",
                value: String::new(),
            }),
            "kotr" => Ok(GameMode::Kotr),
            "ctf" => Ok(GameMode::Ctf),
            "flagball" => Ok(GameMode::FlagBall),
            "chat" => Ok(GameMode::Chat),
            "arena" => Ok(GameMode::Arena),
            "elimination" => Ok(GameMode::Elimination),
            "quest" => Ok(GameMode::Quest),
            "coop" => Ok(GameMode::Coop),
            _ => Ok(GameMode::Custom),
        }
    }
}

impl TryFrom<String> for GameMode {
    type Error = ParseGameFieldError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the game (open, password-protected, etc)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameAccess {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "pass")]
    Password,
    #[serde(rename = "closed")]
    Closed,
}

impl GameAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAccess::Open => "open",
            GameAccess::Password => "pass",
            GameAccess::Closed => "closed",
        }
    }
}

impl FromStr for GameAccess {
    type Err = ParseGameFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(GameAccess::Open),
            "pass" => Ok(GameAccess::Password),
            "closed" => Ok(GameAccess::Closed),
            _ => Err(ParseGameFieldError {
                field: "access",
                value: s.to_string(),
            }),
        }
    }
}

/// Max resolution used by the game.
///
/// Historically Nox used a limited resolution, HD-aware servers set `high_res`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub high_res: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub width: i32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub height: i32,
}

/// Player counts for a game
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayersInfo {
    #[serde(default)]
    pub cur: i32,
    #[serde(default)]
    pub max: i32,
}

/// Additional state for the quest game mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestInfo {
    pub stage: i32,
}

/// A game as announced by the server hosting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub name: String,
    #[serde(rename = "addr", default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: i32,
    pub map: String,
    pub mode: GameMode,
    /// Unknown access levels are dropped
    #[serde(
        default,
        deserialize_with = "deserialize_access",
        skip_serializing_if = "Option::is_none"
    )]
    pub access: Option<GameAccess>,
    #[serde(rename = "vers", default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res: Option<Resolution>,
    pub players: PlayersInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest: Option<QuestInfo>,
}

impl Game {
    /// Check that the game carries everything a listing needs.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub fn validate(&self) -> Result<(), LobbyError> {
        if self.players.cur < 0 {
            return Err(LobbyError::invalid("players number should be positive"));
        }
        if self.players.max <= 0 {
            return Err(LobbyError::invalid("max players number should be set"));
        }
        if self.address.is_empty() {
            return Err(LobbyError::invalid("address must be set"));
        }
        if self.version.is_empty() {
            return Err(LobbyError::invalid("version should be set"));
        }
        if self.map.is_empty() {
            return Err(LobbyError::invalid("map should be set"));
        }
        if self.name.is_empty() || self.name != self.name.trim() {
            return Err(LobbyError::invalid("invalid server name"));
        }
        Ok(())
    }

    /// Apply the defaults and normalization used for stored games
    pub fn normalize(&mut self) {
        if self.port <= 0 {
            self.port = DEFAULT_GAME_PORT;
        }
        self.map = self.map.to_lowercase();
    }

    /// Session identity of this game
    pub fn key(&self) -> GameKey {
        GameKey {
            address: self.address.clone(),
            port: self.port,
        }
    }
}

/// Identity of a game session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    pub address: String,
    pub port: i32,
}

/// A registered game, as returned by a lobby
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    #[serde(flatten)]
    pub game: Game,
    pub seen_at: DateTime<Utc>,
}

impl GameInfo {
    pub fn new(game: Game, seen_at: DateTime<Utc>) -> Self {
        Self { game, seen_at }
    }

    pub fn key(&self) -> GameKey {
        self.game.key()
    }
}

/// Sort listings by address, then port
pub fn sort_games(list: &mut [GameInfo]) {
    list.sort_by(|a, b| {
        a.game
            .address
            .cmp(&b.game.address)
            .then(a.game.port.cmp(&b.game.port))
    });
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

fn deserialize_access<'de, D>(deserializer: D) -> Result<Option<GameAccess>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()))
}
