pub mod clock;
pub mod error;
pub mod game;
pub mod ledger;
pub mod lobby;
pub mod player;
pub mod roster;
pub mod scoring;
mod sse;
pub mod state_machine;
pub mod suit;
pub mod transitions;
pub mod winner;

use std::{sync::Arc, time::Duration, time::SystemTime};

use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    dao::{game_store::GameStore, models::LobbyEntity},
    error::ServiceError,
    state::{lobby::Lobby, state_machine::GamePhase},
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::{GameEvent, GameStateMachine};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state: the lobby, its lifecycle guard and the storage handle.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseHub,
    game: RwLock<GameStateMachine>,
    lobby: RwLock<Lobby>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            sse: SseHub::new(config.sse_capacity),
            config,
            game_store: RwLock::new(None),
            game: RwLock::new(GameStateMachine::new()),
            lobby: RwLock::new(Lobby::default()),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        let mut guard = self.game_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        let mut guard = self.game_store.write().await;
        guard.take();
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.game_store.read().await;
        guard.is_none()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Snapshot the current phase of the shared game state machine.
    pub async fn state_machine_phase(&self) -> GamePhase {
        self.game.read().await.phase()
    }

    /// Lobby holding players, ledger and the current game. Writers go through
    /// [`AppState::mutate_lobby`] or [`AppState::run_transition`].
    pub fn lobby(&self) -> &RwLock<Lobby> {
        &self.lobby
    }

    /// Replace the lobby with a restored one and re-seed the state machine from it.
    pub async fn restore(&self, lobby: Lobby) -> GamePhase {
        let _gate = self.transition_gate.lock().await;
        let phase = GamePhase::of(&lobby);
        *self.lobby.write().await = lobby;
        *self.game.write().await = GameStateMachine::from_phase(phase.clone());
        phase
    }

    /// Apply a change that does not move the lifecycle (player self-service).
    ///
    /// The change runs on a copy that is only swapped in once persisted.
    pub async fn mutate_lobby<F, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Lobby) -> Result<T, ServiceError>,
    {
        let mut lobby = self.lobby.write().await;
        let mut next = lobby.clone();
        let value = work(&mut next)?;
        self.persist(&next).await?;
        *lobby = next;
        Ok(value)
    }

    async fn persist(&self, lobby: &Lobby) -> Result<(), ServiceError> {
        let store = self.game_store().await.ok_or(ServiceError::Degraded)?;
        store
            .save_lobby(LobbyEntity::capture(lobby, SystemTime::now()))
            .await?;
        Ok(())
    }

    /// Plan a transition to the shared game state machine, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut sm = self.game.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the shared game state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let mut sm = self.game.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared game state machine
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.game.write().await;
        sm.abort(plan_id)
    }

    /// Phase, version and pending plan of the lifecycle machine.
    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.game.read().await;
        sm.snapshot()
    }

    /// Run `work` on a copy of the lobby and commit it only if it lands in the planned phase.
    async fn commit_planned<F, T>(&self, plan: &Plan, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Lobby) -> Result<T, ServiceError>,
    {
        let mut lobby = self.lobby.write().await;
        let mut next = lobby.clone();
        let value = work(&mut next)?;

        let reached = GamePhase::of(&next);
        if reached != plan.to {
            return Err(ServiceError::InvalidState(format!(
                "transition {:?} reached {reached:?} instead of {:?}",
                plan.event, plan.to
            )));
        }

        self.persist(&next).await?;
        *lobby = next;
        debug!(event = ?plan.event, phase = ?plan.to, "lobby committed");
        Ok(value)
    }

    /// Plan `event`, run `work` on a lobby copy, persist it and apply the plan.
    ///
    /// Any failure (or the timeout) aborts the plan and leaves the lobby untouched.
    pub async fn run_transition<F, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce(&mut Lobby) -> Result<T, ServiceError>,
    {
        let gate = self.transition_gate.lock().await;
        let plan = self.plan_transition(event.clone()).await?;
        let plan_id = plan.id;

        let work_future = self.commit_planned(&plan, work);
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dao::game_store::MemoryGameStore,
        state::{game::GameSettings, state_machine::ActiveRound},
    };

    fn settings() -> GameSettings {
        GameSettings {
            name: "g".into(),
            description: String::new(),
            round_duration: Duration::from_secs(60),
        }
    }

    async fn ready_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn degraded_state_rejects_writes_and_keeps_lobby() {
        let state = AppState::new(AppConfig::default());
        let err = state
            .mutate_lobby(|lobby| Ok(lobby.register_player("ana", SystemTime::now())?))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
        assert!(state.lobby().read().await.roster.is_empty());
    }

    #[tokio::test]
    async fn failed_work_aborts_the_plan() {
        let state = ready_state().await;
        let err = state
            .run_transition(GameEvent::CreateGame, |_| -> Result<(), ServiceError> {
                Err(ServiceError::InvalidInput("nope".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, GamePhase::Idle);
        assert_eq!(snapshot.pending, None);
    }

    #[tokio::test]
    async fn work_must_reach_the_planned_phase() {
        let state = ready_state().await;
        let err = state
            .run_transition(GameEvent::CreateGame, |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.state_machine_phase().await, GamePhase::Idle);
    }

    #[tokio::test]
    async fn committed_transition_is_persisted() {
        let state = ready_state().await;
        let (_, phase) = state
            .run_transition(GameEvent::CreateGame, |lobby| {
                Ok(lobby.create_game(settings(), SystemTime::now())?)
            })
            .await
            .unwrap();
        assert_eq!(phase, GamePhase::Waiting);

        let stored = state
            .game_store()
            .await
            .unwrap()
            .load_lobby()
            .await
            .unwrap()
            .unwrap();
        assert!(stored.game.is_some());
    }

    #[tokio::test]
    async fn restore_reseeds_the_machine() {
        let state = ready_state().await;
        let mut lobby = Lobby::default();
        let game_id = lobby.create_game(settings(), SystemTime::now()).unwrap().game_id;
        for name in ["a", "b", "c"] {
            let id = lobby.register_player(name, SystemTime::now()).unwrap().id;
            lobby.join_game(id, SystemTime::now()).unwrap();
        }
        lobby
            .start_game(game_id, 3, &mut rand::rng(), SystemTime::now())
            .unwrap();

        let phase = state.restore(lobby).await;
        assert_eq!(
            phase,
            GamePhase::Active(ActiveRound {
                round: 1,
                paused: false
            })
        );
        assert_eq!(state.state_machine_phase().await, phase);
    }
}
