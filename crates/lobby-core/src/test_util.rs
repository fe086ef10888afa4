//! Shared test fixtures

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::LobbyError;
use crate::game::{DEFAULT_GAME_PORT, Game, GameInfo, GameMode, PlayersInfo};
use crate::lobby::{GameHost, GameLister, GameRegisterer};
use crate::observer::{GameSource, LobbyObserver};

pub fn test_game(name: &str, address: &str) -> Game {
    Game {
        name: name.to_string(),
        address: address.to_string(),
        port: DEFAULT_GAME_PORT,
        map: "testmap".to_string(),
        mode: GameMode::Arena,
        access: None,
        version: "v0.0.0".to_string(),
        res: None,
        players: PlayersInfo { cur: 0, max: 32 },
        quest: None,
    }
}

pub fn test_info(name: &str, address: &str) -> GameInfo {
    GameInfo::new(test_game(name, address), Utc::now())
}

pub async fn expect_games<L: GameLister + ?Sized>(lister: &L, expected: &[Game]) {
    let got: Vec<Game> = lister
        .list_games()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.game)
        .collect();
    assert_eq!(got, expected);
}

fn test_error(msg: &str) -> LobbyError {
    LobbyError::upstream(std::io::Error::other(msg.to_string()))
}

/// Lobby returning a configurable list, counting calls
pub struct StaticLister {
    response: Mutex<Result<Vec<GameInfo>, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticLister {
    pub fn new(games: Vec<GameInfo>) -> Self {
        Self {
            response: Mutex::new(Ok(games)),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_games(&self, games: Vec<GameInfo>) {
        *self.response.lock() = Ok(games);
    }

    pub fn fail_with(&self, msg: &str) {
        *self.response.lock() = Err(msg.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameLister for StaticLister {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().clone().map_err(|msg| test_error(&msg))
    }
}

#[async_trait]
impl GameRegisterer for StaticLister {
    async fn register_game(&self, game: Game) -> Result<(), LobbyError> {
        let mut response = self.response.lock();
        match response.as_mut() {
            Ok(games) => {
                games.push(GameInfo::new(game, Utc::now()));
                Ok(())
            }
            Err(msg) => Err(test_error(msg)),
        }
    }
}

/// Registerer that succeeds or fails following a script
pub struct ScriptedRegisterer {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedRegisterer {
    pub fn new(script: Vec<bool>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameRegisterer for ScriptedRegisterer {
    async fn register_game(&self, _game: Game) -> Result<(), LobbyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(false) => Err(LobbyError::InvalidGame("scripted failure".to_string())),
            _ => Ok(()),
        }
    }
}

/// Game host reporting a fixed game
pub struct StaticHost {
    game: Result<Game, String>,
    calls: AtomicUsize,
}

impl StaticHost {
    pub fn new(game: Game) -> Self {
        Self {
            game: Ok(game),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            game: Err(msg.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameHost for StaticHost {
    async fn game_info(&self) -> Result<Game, LobbyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.game.clone().map_err(LobbyError::Host)
    }
}

/// Observer counting events
#[derive(Default)]
pub struct RecordingObserver {
    seen: AtomicUsize,
    expired: AtomicUsize,
    last_players: Mutex<Option<i32>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }

    pub fn expired(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn last_players(&self) -> Option<i32> {
        *self.last_players.lock()
    }
}

impl LobbyObserver for RecordingObserver {
    fn game_seen(&self, _source: GameSource, game: &Game) {
        self.seen.fetch_add(1, Ordering::SeqCst);
        *self.last_players.lock() = Some(game.players.cur);
    }

    fn game_expired(&self, _source: GameSource, _game: &Game) {
        self.expired.fetch_add(1, Ordering::SeqCst);
    }
}
