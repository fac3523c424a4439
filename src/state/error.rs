use thiserror::Error;
use uuid::Uuid;

use crate::state::{game::GameStatus, ledger::LedgerError};

/// Rule violations raised by the lobby and its game.
///
/// None of them mutate anything: an operation either fully applies or
/// returns one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameRuleError {
    /// The requested lifecycle step is not allowed from the current status.
    #[error("cannot {action} while the game is {status}")]
    InvalidTransition {
        /// Operation that was attempted.
        action: &'static str,
        /// Status the game was in.
        status: GameStatus,
    },
    /// Pausing a round that is already paused.
    #[error("the round is already paused")]
    AlreadyPaused,
    /// Resuming a round that is not paused.
    #[error("the round is not paused")]
    NotPaused,
    /// Another waiting or active game already exists.
    #[error("game `{0}` is still waiting or active")]
    GameAlreadyExists(Uuid),
    /// No game at all, or the id does not match the current one.
    #[error("game `{0}` not found")]
    GameNotFound(Uuid),
    /// An operation that needs a game was called while none exists.
    #[error("no game has been created")]
    NoGame,
    /// A player operation that needs an active round.
    #[error("no active game")]
    NoActiveGame,
    /// Not enough players have joined to start.
    #[error("at least {required} players are required to start (currently {actual})")]
    InsufficientPlayers {
        /// Configured minimum.
        required: usize,
        /// In-game players at the time of the attempt.
        actual: usize,
    },
    /// Unknown player identifier.
    #[error("player `{0}` not found")]
    UnknownPlayer(Uuid),
    /// Display names must be unique across the roster.
    #[error("display name `{0}` is already taken")]
    DuplicateDisplayName(String),
    /// Display names must contain something besides whitespace.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// The player did not join the current game.
    #[error("player `{0}` is not taking part in the game")]
    NotInGame(Uuid),
    /// Eliminated players can no longer act.
    #[error("player `{0}` has been eliminated")]
    PlayerEliminated(Uuid),
    /// The caller referred to a round that is not the one being played.
    #[error("round {0} is not the round being played")]
    InvalidRound(u32),
    /// Ledger rejection (self-report).
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
