//! The single game owned by the lobby: status, round counter and round timer.

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{clock::RoundClock, error::GameRuleError, winner::GameResult};

/// Lifecycle status of a game. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, players may still join.
    Waiting,
    /// Rounds are being played.
    Active,
    /// Winner resolved; purged when the next game is created.
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        })
    }
}

/// Facilitator-provided settings for a new game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Length of every round.
    pub round_duration: Duration,
}

/// Runtime representation of the current game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Set when the first round starts.
    pub started_at: Option<SystemTime>,
    /// Round being played, starting at 1.
    pub current_round: u32,
    /// Length of every round.
    pub round_duration: Duration,
    /// Timer of the current round.
    pub clock: RoundClock,
    /// Winner resolution stored when the game finishes.
    pub result: Option<GameResult>,
}

impl Game {
    /// Create a waiting game.
    pub fn new(settings: GameSettings, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: settings.name,
            description: settings.description,
            status: GameStatus::Waiting,
            created_at: now,
            started_at: None,
            current_round: 1,
            round_duration: settings.round_duration,
            clock: RoundClock::default(),
            result: None,
        }
    }

    /// Whether the round timer is frozen.
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Whole seconds left in the round; 0 unless the game is active.
    pub fn time_remaining_in_round(&self, now: SystemTime) -> u64 {
        if self.status != GameStatus::Active {
            return 0;
        }
        self.clock.remaining_secs(now)
    }

    /// Whether the active round reached its pause-adjusted deadline.
    pub fn is_round_finished(&self, now: SystemTime) -> bool {
        self.status == GameStatus::Active && self.clock.is_finished(now)
    }

    /// Waiting → active, starting round 1.
    pub fn begin(&mut self, now: SystemTime) -> Result<(), GameRuleError> {
        self.expect_status("start the game", GameStatus::Waiting)?;
        self.status = GameStatus::Active;
        self.started_at = Some(now);
        self.current_round = 1;
        self.clock.start(now, self.round_duration);
        Ok(())
    }

    /// Increment the round counter and restart the timer with pause cleared.
    pub fn next_round(&mut self, now: SystemTime) -> Result<u32, GameRuleError> {
        self.expect_status("advance the round", GameStatus::Active)?;
        self.current_round += 1;
        self.clock.start(now, self.round_duration);
        Ok(self.current_round)
    }

    /// Freeze the round timer.
    pub fn pause(&mut self, now: SystemTime) -> Result<(), GameRuleError> {
        self.expect_status("pause the round", GameStatus::Active)?;
        if !self.clock.pause(now) {
            return Err(GameRuleError::AlreadyPaused);
        }
        Ok(())
    }

    /// Unfreeze the round timer; the pause pushes the deadline back.
    pub fn resume(&mut self, now: SystemTime) -> Result<(), GameRuleError> {
        self.expect_status("resume the round", GameStatus::Active)?;
        if !self.clock.resume(now) {
            return Err(GameRuleError::NotPaused);
        }
        Ok(())
    }

    /// Active → finished, storing the result and clearing the timer.
    pub fn conclude(&mut self, result: GameResult) -> Result<(), GameRuleError> {
        self.expect_status("finish the game", GameStatus::Active)?;
        self.status = GameStatus::Finished;
        self.result = Some(result);
        self.clock.stop();
        Ok(())
    }

    fn expect_status(
        &self,
        action: &'static str,
        expected: GameStatus,
    ) -> Result<(), GameRuleError> {
        if self.status != expected {
            return Err(GameRuleError::InvalidTransition {
                action,
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::winner::Outcome;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn game() -> Game {
        Game::new(
            GameSettings {
                name: "friday".into(),
                description: String::new(),
                round_duration: Duration::from_secs(60),
            },
            at(0),
        )
    }

    fn result() -> GameResult {
        GameResult {
            outcome: Outcome::NoSurvivors,
            winner: None,
            winner_name: None,
            reason: "all players died".into(),
            alive_count: 0,
        }
    }

    #[test]
    fn waiting_game_has_no_timer() {
        let g = game();
        assert_eq!(g.time_remaining_in_round(at(10)), 0);
        assert!(!g.is_round_finished(at(1_000)));
        assert!(matches!(
            g.clone().pause(at(1)),
            Err(GameRuleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn lifecycle_runs_forward_only() {
        let mut g = game();
        g.begin(at(100)).unwrap();
        assert_eq!(g.status, GameStatus::Active);
        assert_eq!(g.started_at, Some(at(100)));
        assert_eq!(g.time_remaining_in_round(at(130)), 30);

        assert_eq!(g.next_round(at(200)).unwrap(), 2);
        assert_eq!(g.time_remaining_in_round(at(200)), 60);

        g.conclude(result()).unwrap();
        assert_eq!(g.status, GameStatus::Finished);
        assert!(!g.clock.is_running());
        assert_eq!(g.time_remaining_in_round(at(200)), 0);

        assert!(g.begin(at(300)).is_err());
        assert!(g.next_round(at(300)).is_err());
        assert!(g.conclude(result()).is_err());
    }

    #[test]
    fn double_pause_and_stray_resume_are_rejected() {
        let mut g = game();
        g.begin(at(0)).unwrap();
        assert_eq!(g.resume(at(1)), Err(GameRuleError::NotPaused));
        g.pause(at(10)).unwrap();
        assert_eq!(g.pause(at(11)), Err(GameRuleError::AlreadyPaused));
        assert!(!g.is_round_finished(at(500)));
        g.resume(at(40)).unwrap();
        assert_eq!(g.time_remaining_in_round(at(40)), 50);
    }

    #[test]
    fn new_round_clears_pause() {
        let mut g = game();
        g.begin(at(0)).unwrap();
        g.pause(at(10)).unwrap();
        g.next_round(at(20)).unwrap();
        assert!(!g.is_paused());
        assert_eq!(g.clock.paused_duration, Duration::ZERO);
    }
}
