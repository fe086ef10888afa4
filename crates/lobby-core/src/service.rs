//! In-memory lobby service
//!
//! Registrations expire lazily: every list and every registration checks
//! `seen + timeout` against the current time, there is no timer task.
//! Expired entries are removed by a sweep that runs at most once per
//! timeout on writes, or right after a reader notices a stale entry.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::LobbyError;
use crate::game::{Game, GameInfo, GameKey, sort_games};
use crate::lobby::{DEFAULT_TIMEOUT, GameLister, GameRegisterer};
use crate::observer::{GameSource, LobbyObserver, NoopObserver};

struct Entry {
    info: GameInfo,
    seen: Instant,
}

struct ServiceState {
    games: HashMap<GameKey, Entry>,
    timeout: Duration,
    last_gc: Instant,
}

impl ServiceState {
    fn is_valid(&self, entry: &Entry, now: Instant) -> bool {
        entry
            .seen
            .checked_add(self.timeout)
            .is_none_or(|expires| expires > now)
    }
}

/// In-memory implementation of a lobby
pub struct LobbyService {
    /// Set by the first reader that sees a stale entry since the last sweep
    gc_requested: AtomicBool,
    state: RwLock<ServiceState>,
    observer: Arc<dyn LobbyObserver>,
}

impl Default for LobbyService {
    fn default() -> Self {
        Self::new()
    }
}

impl LobbyService {
    /// Create an empty lobby with the default timeout
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    /// Create an empty lobby reporting registration events to `observer`
    pub fn with_observer(observer: Arc<dyn LobbyObserver>) -> Self {
        Self {
            gc_requested: AtomicBool::new(false),
            state: RwLock::new(ServiceState {
                games: HashMap::new(),
                timeout: DEFAULT_TIMEOUT,
                last_gc: Instant::now(),
            }),
            observer,
        }
    }

    /// Set the expiration time for game registrations.
    ///
    /// Applies to every stored registration, not only new ones.
    pub fn set_timeout(&self, timeout: Duration) {
        info!("Setting game registration timeout to {:?}", timeout);
        self.state.write().timeout = timeout;
    }

    /// Current expiration time for game registrations
    pub fn timeout(&self) -> Duration {
        self.state.read().timeout
    }

    /// Number of stored registrations, including expired ones not swept yet
    pub fn len(&self) -> usize {
        self.state.read().games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate and store a game registration
    pub fn register(&self, mut game: Game) -> Result<(), LobbyError> {
        game.validate()?;
        game.normalize();

        self.observer.game_seen(GameSource::OpenNox, &game);

        let key = game.key();
        let mut state = self.state.write();
        let now = Instant::now();
        debug!("Registering game {:?} at {}:{}", game.name, key.address, key.port);
        state.games.insert(
            key,
            Entry {
                info: GameInfo::new(game, Utc::now()),
                seen: now,
            },
        );
        self.maybe_gc(&mut state, now);
        Ok(())
    }

    /// List live registrations sorted by address and port
    pub fn list(&self) -> Vec<GameInfo> {
        let (mut list, gc) = self.collect_valid();
        if gc {
            let mut state = self.state.write();
            self.maybe_gc(&mut state, Instant::now());
        }
        sort_games(&mut list);
        list
    }

    /// Copy valid entries under the read lock.
    ///
    /// Returns true if this call was the one to request a sweep.
    fn collect_valid(&self) -> (Vec<GameInfo>, bool) {
        let state = self.state.read();
        let now = Instant::now();
        let mut out = Vec::with_capacity(state.games.len());
        let mut gc = false;
        for entry in state.games.values() {
            if state.is_valid(entry, now) {
                out.push(entry.info.clone());
            } else if !gc {
                gc = self
                    .gc_requested
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok();
            }
        }
        (out, gc)
    }

    /// Sweep expired entries if a sweep was requested or the last one is too old.
    ///
    /// Must be called with the write lock held.
    fn maybe_gc(&self, state: &mut ServiceState, now: Instant) {
        let requested = self
            .gc_requested
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        let due = state
            .last_gc
            .checked_add(state.timeout)
            .is_some_and(|next| next <= now);
        if !requested && !due {
            return;
        }
        state.last_gc = now;

        let before = state.games.len();
        let expired: Vec<GameKey> = state
            .games
            .iter()
            .filter(|(_, entry)| !state.is_valid(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            if let Some(entry) = state.games.remove(&key) {
                debug!("Game registration expired: {}:{}", key.address, key.port);
                self.observer.game_expired(GameSource::OpenNox, &entry.info.game);
            }
        }
        let removed = before - state.games.len();
        if removed > 0 {
            debug!("Removed {} expired game registrations", removed);
        }
    }
}

#[async_trait]
impl GameRegisterer for LobbyService {
    async fn register_game(&self, game: Game) -> Result<(), LobbyError> {
        self.register(game)
    }
}

#[async_trait]
impl GameLister for LobbyService {
    async fn list_games(&self) -> Result<Vec<GameInfo>, LobbyError> {
        Ok(self.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::DEFAULT_GAME_PORT;
    use crate::test_util::{RecordingObserver, expect_games, test_game};
    use tokio::sync::Barrier;
    use tokio::time::advance;

    const TEST_TIMEOUT: Duration = Duration::from_millis(30);

    fn test_lobby() -> LobbyService {
        let lobby = LobbyService::new();
        lobby.set_timeout(TEST_TIMEOUT);
        lobby
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_validation() {
        let lobby = test_lobby();
        let full = test_game("test", "1.1.1.1");

        let invalid = |modify: fn(&mut Game)| {
            let mut game = full.clone();
            modify(&mut game);
            game
        };

        let cases = vec![
            ("empty address", invalid(|g| g.address.clear())),
            ("empty name", invalid(|g| g.name.clear())),
            ("empty version", invalid(|g| g.version.clear())),
            ("empty map", invalid(|g| g.map.clear())),
            ("spaces in name", invalid(|g| g.name = " test ".to_string())),
            ("empty max players", invalid(|g| g.players.max = 0)),
            ("negative players", invalid(|g| g.players.cur = -1)),
        ];
        for (name, game) in cases {
            let err = lobby.register_game(game).await;
            assert!(
                matches!(err, Err(LobbyError::InvalidGame(_))),
                "expected error for {}",
                name
            );
        }

        expect_games(&lobby, &[]).await;
        assert!(lobby.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_register() {
        let lobby = test_lobby();
        let full = test_game("test", "1.1.1.1");

        let mut game = full.clone();
        lobby.register_game(game.clone()).await.unwrap();
        expect_games(&lobby, &[game.clone()]).await;

        // Half of the timeout - should still be there
        advance(TEST_TIMEOUT / 2).await;
        expect_games(&lobby, &[game.clone()]).await;

        // The whole timeout - should expire
        advance(TEST_TIMEOUT).await;
        expect_games(&lobby, &[]).await;

        // Register again without a port to get the default
        game.port = 0;
        lobby.register_game(game.clone()).await.unwrap();
        game = full.clone();
        expect_games(&lobby, &[game.clone()]).await;

        // Changing the name must not create a duplicate
        game.name = "test1".to_string();
        lobby.register_game(game.clone()).await.unwrap();
        expect_games(&lobby, &[game.clone()]).await;

        // Refresh at half of the timeout, then wait 3/4 - still there
        advance(TEST_TIMEOUT / 2).await;
        lobby.register_game(game.clone()).await.unwrap();
        advance(TEST_TIMEOUT * 3 / 4).await;
        expect_games(&lobby, &[game.clone()]).await;

        // Second game on a different address, third on a different port
        lobby.register_game(game.clone()).await.unwrap();
        let mut game2 = full.clone();
        game2.name = "test 2".to_string();
        game2.address = "2.2.2.2".to_string();
        lobby.register_game(game2.clone()).await.unwrap();
        let mut game3 = full.clone();
        game3.name = "test 3".to_string();
        game3.port = DEFAULT_GAME_PORT + 10;
        lobby.register_game(game3.clone()).await.unwrap();
        expect_games(&lobby, &[game.clone(), game3, game2]).await;

        // Make all of them expire
        advance(TEST_TIMEOUT).await;
        expect_games(&lobby, &[]).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_map_lowercased() {
        let lobby = test_lobby();
        let mut game = test_game("test", "1.1.1.1");
        game.map = "TestMap".to_string();
        lobby.register_game(game).await.unwrap();

        let list = lobby.list_games().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].game.map, "testmap");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration_boundary() {
        let lobby = test_lobby();
        let game = test_game("test", "1.1.1.1");
        lobby.register_game(game.clone()).await.unwrap();

        advance(Duration::from_millis(15)).await;
        expect_games(&lobby, &[game]).await;

        advance(Duration::from_millis(20)).await;
        expect_games(&lobby, &[]).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_sweeps_expired() {
        let lobby = test_lobby();
        lobby.register(test_game("a", "1.1.1.1")).unwrap();
        lobby.register(test_game("b", "2.2.2.2")).unwrap();

        advance(TEST_TIMEOUT * 2).await;
        // Nothing swept until somebody looks
        assert_eq!(lobby.len(), 2);

        assert!(lobby.list().is_empty());
        assert!(lobby.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_sweeps_when_due() {
        let lobby = test_lobby();
        lobby.register(test_game("a", "1.1.1.1")).unwrap();

        advance(TEST_TIMEOUT * 2).await;
        lobby.register(test_game("b", "2.2.2.2")).unwrap();
        assert_eq!(lobby.len(), 1);

        // The next sweep is not due yet
        lobby.register(test_game("c", "3.3.3.3")).unwrap();
        assert_eq!(lobby.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_timeout_applies_to_stored() {
        let lobby = LobbyService::new();
        assert_eq!(lobby.timeout(), DEFAULT_TIMEOUT);

        let game = test_game("test", "1.1.1.1");
        lobby.register(game.clone()).unwrap();
        advance(Duration::from_secs(1)).await;
        expect_games(&lobby, &[game]).await;

        lobby.set_timeout(Duration::from_millis(500));
        expect_games(&lobby, &[]).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_returns_copies() {
        let lobby = test_lobby();
        let game = test_game("test", "1.1.1.1");
        lobby.register(game.clone()).unwrap();

        let mut list = lobby.list();
        list[0].game.name = "changed".to_string();
        list[0].game.players.cur = 10;

        expect_games(&lobby, &[game]).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_events() {
        let observer = Arc::new(RecordingObserver::default());
        let lobby = LobbyService::with_observer(observer.clone());
        lobby.set_timeout(TEST_TIMEOUT);

        let mut game = test_game("test", "1.1.1.1");
        game.players.cur = 5;
        lobby.register(game.clone()).unwrap();
        lobby.register(game).unwrap();
        assert!(lobby.register(test_game(" bad", "1.1.1.1")).is_err());
        assert_eq!(observer.seen(), 2);
        assert_eq!(observer.last_players(), Some(5));

        advance(TEST_TIMEOUT * 2).await;
        lobby.list();
        assert_eq!(observer.expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_concurrent() {
        let lobby = Arc::new(test_lobby());
        let games: Vec<Game> = (1..=6)
            .map(|i| test_game(&format!("test{}", i), &format!("{0}.{0}.{0}.{0}", i)))
            .collect();

        for (i, game) in games.iter().enumerate() {
            if i == 2 {
                // Expire the first two records
                advance(TEST_TIMEOUT * 2).await;
                expect_games(lobby.as_ref(), &[]).await;
            }
            lobby.register(game.clone()).unwrap();
        }
        expect_games(lobby.as_ref(), &games[2..]).await;

        let barrier = Arc::new(Barrier::new(10));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let lobby = lobby.clone();
            let barrier = barrier.clone();
            let expected = games[2..].to_vec();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                expect_games(lobby.as_ref(), &expected).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_concurrent() {
        let lobby = Arc::new(LobbyService::new());
        let game = test_game("test1", "1.1.1.1");
        let barrier = Arc::new(Barrier::new(20));
        let mut handles = Vec::new();

        for _ in 0..10 {
            let lobby = lobby.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                for _ in 0..3 {
                    lobby.list_games().await.unwrap();
                }
            }));
        }
        for _ in 0..10 {
            let lobby = lobby.clone();
            let barrier = barrier.clone();
            let game = game.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                lobby.register_game(game).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        expect_games(lobby.as_ref(), &[game]).await;
        assert_eq!(lobby.len(), 1);
    }
}
