//! Player self-service: registration, presence, guesses and statements.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        common::{GameResultDto, PlayerSummary},
        player::{
            ChooseSymbolRequest, CommunicationsQuery, CommunicationsResponse, PlayerResultResponse,
            PlayerView, ReceivedCommunication, RegisterPlayerRequest, TellSymbolRequest,
            TellSymbolResponse,
        },
    },
    error::ServiceError,
    state::{
        SharedState,
        error::GameRuleError,
        game::GameStatus,
        lobby::Lobby,
        suit::{Suit, UnknownSuit},
        winner::Outcome,
    },
};

/// Register a new player.
pub async fn register(
    state: &SharedState,
    request: RegisterPlayerRequest,
) -> Result<PlayerView, ServiceError> {
    let player = state
        .mutate_lobby(|lobby| Ok(lobby.register_player(&request.display_name, SystemTime::now())?))
        .await?;
    info!(player_id = %player.id, display_name = %player.display_name, "player registered");
    Ok(PlayerView::from(&player))
}

/// A player's own view.
pub async fn get_player(state: &SharedState, player_id: Uuid) -> Result<PlayerView, ServiceError> {
    let lobby = state.lobby().read().await;
    Ok(PlayerView::from(lobby.roster.require(player_id)?))
}

/// Mark the player as connected.
pub async fn set_online(state: &SharedState, player_id: Uuid) -> Result<PlayerView, ServiceError> {
    update_player(state, player_id, |lobby, now| lobby.set_online(player_id, now)).await
}

/// Mark the player as disconnected. Game participation is kept.
pub async fn set_offline(state: &SharedState, player_id: Uuid) -> Result<PlayerView, ServiceError> {
    update_player(state, player_id, |lobby, now| lobby.set_offline(player_id, now)).await
}

/// Enrol the player in the waiting game.
pub async fn join_game(state: &SharedState, player_id: Uuid) -> Result<PlayerView, ServiceError> {
    update_player(state, player_id, |lobby, now| lobby.join_game(player_id, now)).await
}

/// Withdraw the player from the waiting game.
pub async fn leave_game(state: &SharedState, player_id: Uuid) -> Result<PlayerView, ServiceError> {
    update_player(state, player_id, |lobby, now| lobby.leave_game(player_id, now)).await
}

/// Record the player's guess of their own symbol.
pub async fn choose_symbol(
    state: &SharedState,
    player_id: Uuid,
    request: ChooseSymbolRequest,
) -> Result<PlayerView, ServiceError> {
    let suit = parse_symbol(&request.symbol)?;
    update_player(state, player_id, |lobby, now| {
        lobby.choose_symbol(player_id, suit, now)
    })
    .await
}

/// Record that `teller_id` told the player their symbol is `symbol`.
pub async fn record_communication(
    state: &SharedState,
    receiver: Uuid,
    request: TellSymbolRequest,
) -> Result<TellSymbolResponse, ServiceError> {
    let suit = parse_symbol(&request.symbol)?;
    let teller = request.teller_id;

    let (round, outcome, teller_name) = state
        .mutate_lobby(|lobby| {
            let outcome = lobby.record_communication(receiver, teller, suit, SystemTime::now())?;
            let round = lobby
                .active_game()
                .map(|game| game.current_round)
                .ok_or(GameRuleError::NoActiveGame)?;
            let teller_name = lobby.roster.require(teller)?.display_name.clone();
            Ok((round, outcome, teller_name))
        })
        .await?;

    Ok(TellSymbolResponse {
        round,
        action: outcome.into(),
        message: format!("{teller_name} told you that you have {suit}"),
    })
}

/// Statements received by the player, most recent first.
pub async fn communications(
    state: &SharedState,
    receiver: Uuid,
    query: CommunicationsQuery,
) -> Result<CommunicationsResponse, ServiceError> {
    let lobby = state.lobby().read().await;
    let (round, records) = lobby.received_communications(receiver, query.round)?;
    let communications = records
        .into_iter()
        .map(|record| {
            let teller_name = lobby
                .roster
                .get(record.teller)
                .map(|teller| teller.display_name.clone());
            ReceivedCommunication::build(record, teller_name)
        })
        .collect();

    Ok(CommunicationsResponse {
        round,
        communications,
    })
}

/// "Did I win" view, available once the game is finished.
pub async fn player_result(
    state: &SharedState,
    player_id: Uuid,
) -> Result<PlayerResultResponse, ServiceError> {
    let lobby = state.lobby().read().await;
    let player = lobby.roster.require(player_id)?;
    let game = lobby.game().ok_or(GameRuleError::NoGame)?;
    let Some(result) = game.result.as_ref().filter(|_| game.status == GameStatus::Finished) else {
        return Err(ServiceError::InvalidState(
            "results are only available for finished games".into(),
        ));
    };
    if !player.is_in_game {
        return Err(GameRuleError::NotInGame(player_id).into());
    }

    Ok(PlayerResultResponse {
        game_id: game.id,
        status: game.status,
        player: PlayerSummary::from(player),
        is_winner: result.is_winner(player_id),
        is_tie: result.outcome == Outcome::Tie,
        result: GameResultDto::from(result),
    })
}

async fn update_player<F>(
    state: &SharedState,
    player_id: Uuid,
    change: F,
) -> Result<PlayerView, ServiceError>
where
    F: FnOnce(&mut Lobby, SystemTime) -> Result<(), GameRuleError>,
{
    state
        .mutate_lobby(|lobby| {
            change(lobby, SystemTime::now())?;
            Ok(PlayerView::from(lobby.roster.require(player_id)?))
        })
        .await
}

fn parse_symbol(symbol: &str) -> Result<Suit, ServiceError> {
    symbol
        .parse()
        .map_err(|err: UnknownSuit| ServiceError::InvalidInput(err.to_string()))
}
