//! Keeping a hosted game registered

use tokio::time::{Interval, MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::LobbyError;
use crate::lobby::{DEFAULT_TIMEOUT, GameHost, GameRegisterer};

/// Consecutive registration failures tolerated before giving up
pub const MAX_REGISTER_FAILURES: u32 = 3;

/// Keep registering a hosted game so that it doesn't expire.
///
/// `update` sets the pace; `None` ticks every third of [`DEFAULT_TIMEOUT`].
/// On every tick the host is asked for fresh game info, which is then
/// registered on the lobby.
///
/// Returns `Ok(())` once `cancel` fires. Returns an error as soon as the
/// host fails to report its game, or after more than
/// [`MAX_REGISTER_FAILURES`] registrations failed in a row.
pub async fn keep_registered<R, H>(
    lobby: &R,
    update: Option<Interval>,
    host: &H,
    cancel: &CancellationToken,
) -> Result<(), LobbyError>
where
    R: GameRegisterer + ?Sized,
    H: GameHost + ?Sized,
{
    let mut update = update.unwrap_or_else(|| {
        let mut ticker = interval(DEFAULT_TIMEOUT / 3);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    // A fresh interval fires immediately, registration below is the first update
    update.reset();

    let mut failures = 0;
    loop {
        let game = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            res = timeout(DEFAULT_TIMEOUT / 3, host.game_info()) => match res {
                Ok(game) => game?,
                Err(_) => {
                    return Err(LobbyError::Timeout(
                        "game host did not report game info".to_string(),
                    ));
                }
            },
        };

        match lobby.register_game(game).await {
            Ok(()) => {
                if failures > 0 {
                    debug!("Game registration recovered after {} failures", failures);
                }
                failures = 0;
            }
            Err(e) => {
                failures += 1;
                warn!("Failed to register game ({} in a row): {}", failures, e);
                if failures > MAX_REGISTER_FAILURES {
                    return Err(e);
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = update.tick() => {}
        }
    }
}
