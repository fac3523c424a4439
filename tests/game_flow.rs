use std::sync::Arc;

use karma_suits_back::{
    config::AppConfig,
    dao::game_store::MemoryGameStore,
    dto::{
        admin::{
            AdvanceRoundRequest, CreateGameRequest, KarmaAction, KarmaAdjustmentRequest,
            PauseAction, PauseRequest,
        },
        player::{
            ChooseSymbolRequest, CommunicationsQuery, RecordAction, RegisterPlayerRequest,
            TellSymbolRequest,
        },
        phase::VisibleGamePhase,
    },
    error::ServiceError,
    services::{admin_service, game_service, player_service, public_service},
    state::{
        AppState, SharedState,
        game::GameStatus,
        state_machine::{ActiveRound, GamePhase},
        suit::{SUITS, Suit},
        winner::Outcome,
    },
};
use uuid::Uuid;

async fn ready_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .install_game_store(Arc::new(MemoryGameStore::new()))
        .await;
    state
}

async fn online_player(state: &SharedState, name: &str) -> Uuid {
    let view = player_service::register(
        state,
        RegisterPlayerRequest {
            display_name: name.into(),
        },
    )
    .await
    .unwrap();
    player_service::set_online(state, view.player.id)
        .await
        .unwrap();
    view.player.id
}

async fn suit_of(state: &SharedState, player_id: Uuid) -> Suit {
    state
        .lobby()
        .read()
        .await
        .roster
        .get(player_id)
        .and_then(|player| player.suit_symbol)
        .unwrap()
}

async fn choose_own_symbol(state: &SharedState, player_id: Uuid) {
    let suit = suit_of(state, player_id).await;
    player_service::choose_symbol(
        state,
        player_id,
        ChooseSymbolRequest {
            symbol: suit.symbol().into(),
        },
    )
    .await
    .unwrap();
}

/// Three online players and a game already in round 1.
async fn started_game(state: &SharedState) -> (Uuid, [Uuid; 3]) {
    let ana = online_player(state, "ana").await;
    let bo = online_player(state, "bo").await;
    let cy = online_player(state, "cy").await;

    let created = admin_service::create_game(
        state,
        CreateGameRequest {
            start_immediately: true,
            ..CreateGameRequest::default()
        },
    )
    .await
    .unwrap();
    assert!(created.started);
    assert_eq!(created.joined_players, 3);
    assert_eq!(created.assignments.len(), 3);

    (created.game.id, [ana, bo, cy])
}

#[tokio::test]
async fn full_game_resolves_the_liar_as_winner() {
    let state = ready_state().await;
    let (game_id, [ana, bo, cy]) = started_game(&state).await;

    for id in [ana, bo, cy] {
        choose_own_symbol(&state, id).await;
    }

    let ana_suit = suit_of(&state, ana).await;
    let lie = SUITS.into_iter().find(|suit| *suit != ana_suit).unwrap();
    let told = player_service::record_communication(
        &state,
        ana,
        TellSymbolRequest {
            teller_id: bo,
            symbol: lie.symbol().into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(told.round, 1);
    assert_eq!(told.action, RecordAction::Created);

    let received = player_service::communications(&state, ana, CommunicationsQuery::default())
        .await
        .unwrap();
    assert_eq!(received.round, 1);
    assert_eq!(received.communications.len(), 1);
    assert_eq!(received.communications[0].teller_name.as_deref(), Some("bo"));

    let advanced = admin_service::advance_round(
        &state,
        game_id,
        AdvanceRoundRequest { round: Some(1) },
    )
    .await
    .unwrap();
    assert_eq!(advanced.current_round, 2);
    assert_eq!(advanced.report.communications, 1);
    assert!(advanced.report.symbol_deaths.is_empty());
    assert!(!advanced.end_condition_met);
    let bo_change = advanced
        .report
        .karma_changes
        .iter()
        .find(|change| change.player_id == bo)
        .unwrap();
    assert_eq!((bo_change.before, bo_change.after), (3, 4));

    // Round 2: cy never guesses and is eliminated at the boundary.
    choose_own_symbol(&state, ana).await;
    choose_own_symbol(&state, bo).await;
    let advanced = admin_service::advance_round(&state, game_id, AdvanceRoundRequest::default())
        .await
        .unwrap();
    assert_eq!(advanced.report.symbol_deaths, vec![cy]);
    assert!(advanced.end_condition_met);

    let result = admin_service::finish_game(&state, game_id).await.unwrap();
    assert_eq!(result.outcome, Outcome::MoreInteractions);
    assert_eq!(result.winner_id, Some(bo));
    assert_eq!(result.reason, "bo wins with more interactions (1 vs 0)");

    let results = admin_service::results(&state, game_id).await.unwrap();
    assert_eq!(results.ranking[0].player.id, bo);
    assert!(results.ranking[0].is_winner);
    assert_eq!(results.ranking.len(), 3);

    let mine = player_service::player_result(&state, bo).await.unwrap();
    assert!(mine.is_winner);
    assert!(!mine.is_tie);
    let theirs = player_service::player_result(&state, cy).await.unwrap();
    assert!(!theirs.is_winner);
    assert!(theirs.player.is_dead);
}

#[tokio::test]
async fn degraded_backend_rejects_writes() {
    let state = AppState::new(AppConfig::default());
    let err = player_service::register(
        &state,
        RegisterPlayerRequest {
            display_name: "ana".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));

    let status = public_service::game_status(&state).await;
    assert!(status.snapshot.degraded);
    assert_eq!(status.snapshot.phase, VisibleGamePhase::Idle);
}

#[tokio::test]
async fn stale_advance_is_rejected_without_rescoring() {
    let state = ready_state().await;
    let (game_id, _) = started_game(&state).await;

    admin_service::advance_round(&state, game_id, AdvanceRoundRequest { round: Some(1) })
        .await
        .unwrap();
    let err = admin_service::advance_round(&state, game_id, AdvanceRoundRequest { round: Some(1) })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let stats = admin_service::statistics(&state, game_id).await.unwrap();
    assert_eq!(stats.current_round, 2);
    assert_eq!(
        state.state_machine_phase().await,
        GamePhase::Active(ActiveRound {
            round: 2,
            paused: false
        })
    );
}

#[tokio::test]
async fn only_one_unfinished_game_at_a_time() {
    let state = ready_state().await;
    started_game(&state).await;

    let err = admin_service::create_game(&state, CreateGameRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn starting_needs_enough_players() {
    let state = ready_state().await;
    online_player(&state, "solo").await;

    let created = admin_service::create_game(
        &state,
        CreateGameRequest {
            start_immediately: true,
            ..CreateGameRequest::default()
        },
    )
    .await
    .unwrap();
    assert!(!created.started);
    assert_eq!(created.game.status, GameStatus::Waiting);

    let err = admin_service::start_game(&state, created.game.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionNotMet(_)));
    assert_eq!(state.state_machine_phase().await, GamePhase::Waiting);
    assert_eq!(state.snapshot().await.pending, None);
}

#[tokio::test]
async fn unknown_game_id_is_not_found() {
    let state = ready_state().await;
    started_game(&state).await;

    let err = admin_service::finish_game(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn pause_and_resume_are_not_repeatable() {
    let state = ready_state().await;
    let (game_id, _) = started_game(&state).await;

    let paused = admin_service::pause_round(
        &state,
        game_id,
        PauseRequest {
            action: PauseAction::Pause,
        },
    )
    .await
    .unwrap();
    assert!(paused.is_paused);

    let err = admin_service::pause_round(
        &state,
        game_id,
        PauseRequest {
            action: PauseAction::Pause,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let resumed = admin_service::pause_round(
        &state,
        game_id,
        PauseRequest {
            action: PauseAction::Resume,
        },
    )
    .await
    .unwrap();
    assert!(!resumed.is_paused);
}

#[tokio::test]
async fn invalid_statements_are_rejected() {
    let state = ready_state().await;
    let (_, [ana, bo, _]) = started_game(&state).await;

    let self_report = player_service::record_communication(
        &state,
        ana,
        TellSymbolRequest {
            teller_id: ana,
            symbol: "♠".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(self_report, ServiceError::InvalidInput(_)));

    let bad_symbol = player_service::record_communication(
        &state,
        ana,
        TellSymbolRequest {
            teller_id: bo,
            symbol: "★".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_symbol, ServiceError::InvalidInput(_)));

    let unknown = player_service::record_communication(
        &state,
        ana,
        TellSymbolRequest {
            teller_id: Uuid::new_v4(),
            symbol: "♠".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn karma_override_can_eliminate() {
    let state = ready_state().await;
    let (_, [ana, _, _]) = started_game(&state).await;

    for expected_death in [false, false, true] {
        let adjusted = admin_service::adjust_karma(
            &state,
            ana,
            KarmaAdjustmentRequest {
                action: KarmaAction::Decrease,
            },
        )
        .await
        .unwrap();
        assert_eq!(adjusted.eliminated, expected_death);
    }

    let view = player_service::get_player(&state, ana).await.unwrap();
    assert!(view.player.is_dead);
    assert_eq!(view.player.karma_score, 0);
}

#[tokio::test]
async fn round_events_reach_sse_subscribers() {
    let state = ready_state().await;
    let (game_id, [_, _, cy]) = started_game(&state).await;
    let mut receiver = state.public_sse().subscribe();

    // Nobody guessed, so everyone dies at the boundary.
    admin_service::advance_round(&state, game_id, AdvanceRoundRequest::default())
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push((event.event.unwrap_or_default(), event.data));
    }
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names[0], "phase_changed");
    assert_eq!(names[1], "round.scored");
    assert_eq!(
        names.iter().filter(|name| **name == "player.eliminated").count(),
        3
    );
    assert!(events.iter().any(|(_, data)| data.contains(&cy.to_string())));
}

#[tokio::test]
async fn lobby_survives_a_restart() {
    let store = Arc::new(MemoryGameStore::new());
    let first = AppState::new(AppConfig::default());
    first.install_game_store(store.clone()).await;
    let (game_id, [ana, _, _]) = started_game(&first).await;
    admin_service::pause_round(
        &first,
        game_id,
        PauseRequest {
            action: PauseAction::Pause,
        },
    )
    .await
    .unwrap();

    let second = AppState::new(AppConfig::default());
    second.install_game_store(store).await;
    let phase = game_service::restore_from_store(&second).await.unwrap();
    assert_eq!(
        phase,
        Some(GamePhase::Active(ActiveRound {
            round: 1,
            paused: true
        }))
    );

    let view = player_service::get_player(&second, ana).await.unwrap();
    assert!(view.player.is_in_game);
    let status = public_service::game_status(&second).await;
    assert_eq!(status.snapshot.phase, VisibleGamePhase::Paused);
    assert_eq!(status.snapshot.game_id, Some(game_id));
}
