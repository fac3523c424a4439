use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::state::{game::GameStatus, lobby::Lobby};

/// High-level phases the server can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GamePhase {
    /// No game has been created yet.
    Idle,
    /// A game exists and players may join.
    Waiting,
    /// Rounds are being played.
    Active(ActiveRound),
    /// The winner has been resolved; a new game may be created.
    Finished,
}

/// Round information carried by [`GamePhase::Active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRound {
    /// Round being played.
    pub round: u32,
    /// Whether the round timer is frozen.
    pub paused: bool,
}

impl GamePhase {
    /// Phase implied by the lobby contents.
    pub fn of(lobby: &Lobby) -> Self {
        match lobby.game() {
            None => GamePhase::Idle,
            Some(game) => match game.status {
                GameStatus::Waiting => GamePhase::Waiting,
                GameStatus::Active => GamePhase::Active(ActiveRound {
                    round: game.current_round,
                    paused: game.is_paused(),
                }),
                GameStatus::Finished => GamePhase::Finished,
            },
        }
    }

    /// Round being played, if any.
    pub fn current_round(&self) -> Option<u32> {
        match self {
            GamePhase::Active(active) => Some(active.round),
            _ => None,
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Facilitator creates a game (from idle, or over a finished one).
    CreateGame,
    /// Enough players joined; round 1 begins.
    StartGame,
    /// Freeze the round timer.
    PauseRound,
    /// Unfreeze the round timer.
    ResumeRound,
    /// Score `from_round` and begin the next one.
    AdvanceRound {
        /// Round the caller believes is being played.
        from_round: u32,
    },
    /// Resolve the winner and end the game.
    FinishGame,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// Lifecycle guard for the round-boundary transitions.
///
/// The machine only validates and sequences; the lobby does the actual work.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self::from_phase(GamePhase::Idle)
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the machine with a phase restored from storage.
    pub fn from_phase(phase: GamePhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase.clone()
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to.clone()),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event.clone())
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase.clone(),
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase.clone(),
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase.clone())
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase.clone(), &event) {
            (GamePhase::Idle | GamePhase::Finished, GameEvent::CreateGame) => GamePhase::Waiting,
            (GamePhase::Waiting, GameEvent::StartGame) => GamePhase::Active(ActiveRound {
                round: 1,
                paused: false,
            }),
            (GamePhase::Active(active), GameEvent::PauseRound) if !active.paused => {
                GamePhase::Active(ActiveRound {
                    paused: true,
                    ..active
                })
            }
            (GamePhase::Active(active), GameEvent::ResumeRound) if active.paused => {
                GamePhase::Active(ActiveRound {
                    paused: false,
                    ..active
                })
            }
            (GamePhase::Active(active), GameEvent::AdvanceRound { from_round })
                if *from_round == active.round =>
            {
                GamePhase::Active(ActiveRound {
                    round: active.round + 1,
                    paused: false,
                })
            }
            (GamePhase::Active(_), GameEvent::FinishGame) => GamePhase::Finished,
            (from, _) => {
                return Err(InvalidTransition {
                    from,
                    event: event.clone(),
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    fn running(round: u32, paused: bool) -> GamePhase {
        GamePhase::Active(ActiveRound { round, paused })
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Idle);
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = GameStateMachine::new();

        assert_eq!(apply(&mut sm, GameEvent::CreateGame), GamePhase::Waiting);
        assert_eq!(apply(&mut sm, GameEvent::StartGame), running(1, false));
        assert_eq!(apply(&mut sm, GameEvent::PauseRound), running(1, true));
        assert_eq!(apply(&mut sm, GameEvent::ResumeRound), running(1, false));
        assert_eq!(
            apply(&mut sm, GameEvent::AdvanceRound { from_round: 1 }),
            running(2, false)
        );
        assert_eq!(apply(&mut sm, GameEvent::FinishGame), GamePhase::Finished);
        assert_eq!(apply(&mut sm, GameEvent::CreateGame), GamePhase::Waiting);
        assert_eq!(sm.snapshot().version, 7);
    }

    #[test]
    fn advancing_while_paused_clears_the_pause() {
        let mut sm = GameStateMachine::from_phase(running(3, true));
        assert_eq!(
            apply(&mut sm, GameEvent::AdvanceRound { from_round: 3 }),
            running(4, false)
        );
    }

    #[test]
    fn stale_advance_is_rejected() {
        let mut sm = GameStateMachine::from_phase(running(1, false));
        apply(&mut sm, GameEvent::AdvanceRound { from_round: 1 });

        let err = sm
            .plan(GameEvent::AdvanceRound { from_round: 1 })
            .unwrap_err();
        match err {
            PlanError::InvalidTransition(InvalidTransition { from, event }) => {
                assert_eq!(from, running(2, false));
                assert_eq!(event, GameEvent::AdvanceRound { from_round: 1 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn double_pause_and_stray_resume_are_invalid() {
        let mut sm = GameStateMachine::from_phase(running(1, true));
        assert!(matches!(
            sm.plan(GameEvent::PauseRound),
            Err(PlanError::InvalidTransition(_))
        ));
        apply(&mut sm, GameEvent::ResumeRound);
        assert!(matches!(
            sm.plan(GameEvent::ResumeRound),
            Err(PlanError::InvalidTransition(_))
        ));
    }

    #[test]
    fn finished_is_terminal_except_for_creation() {
        let mut sm = GameStateMachine::from_phase(GamePhase::Finished);
        for event in [
            GameEvent::StartGame,
            GameEvent::PauseRound,
            GameEvent::ResumeRound,
            GameEvent::AdvanceRound { from_round: 1 },
            GameEvent::FinishGame,
        ] {
            assert!(sm.plan(event).is_err());
        }
    }

    #[test]
    fn cannot_create_over_an_unfinished_game() {
        let mut sm = GameStateMachine::from_phase(GamePhase::Waiting);
        assert!(sm.plan(GameEvent::CreateGame).is_err());
    }

    #[test]
    fn second_plan_is_rejected_while_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::CreateGame).unwrap();
        assert_eq!(sm.snapshot().pending, Some(GamePhase::Waiting));
        assert_eq!(
            sm.plan(GameEvent::CreateGame).unwrap_err(),
            PlanError::AlreadyPending
        );
        sm.apply(plan.id).unwrap();
        assert_eq!(sm.snapshot().pending, None);
    }

    #[test]
    fn apply_with_wrong_id_keeps_the_plan() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::CreateGame).unwrap();
        let other = Uuid::new_v4();
        assert_eq!(
            sm.apply(other),
            Err(ApplyError::IdMismatch {
                expected: plan.id,
                got: other
            })
        );
        assert_eq!(sm.apply(plan.id), Ok(GamePhase::Waiting));
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::CreateGame).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), GamePhase::Idle);
    }
}
