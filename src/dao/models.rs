use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, TimestampMilliSeconds, serde_as};
use uuid::Uuid;

use crate::state::{
    clock::RoundClock,
    game::{Game, GameStatus},
    ledger::{Communication, CommunicationLedger},
    lobby::Lobby,
    player::{DeathReason, Player},
    roster::Roster,
    suit::Suit,
    winner::GameResult,
};

/// Persisted form of the current game.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation timestamp.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: SystemTime,
    /// First round start.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub started_at: Option<SystemTime>,
    /// Round being played.
    pub current_round: u32,
    /// Length of every round.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub round_duration: Duration,
    /// Current round start.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub round_started_at: Option<SystemTime>,
    /// Nominal end of the current round.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub round_ends_at: Option<SystemTime>,
    /// Start of the ongoing pause.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub paused_at: Option<SystemTime>,
    /// Pause time accumulated during the current round.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default)]
    pub paused_duration: Duration,
    /// Stored winner resolution.
    #[serde(default)]
    pub result: Option<GameResult>,
}

/// Persisted form of a player.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique label.
    pub display_name: String,
    /// Karma meter.
    pub karma_score: u8,
    /// Dealt symbol.
    pub suit_symbol: Option<Suit>,
    /// Guessed symbol.
    pub chosen_symbol: Option<Suit>,
    /// Enrolled in the current game.
    pub is_in_game: bool,
    /// Connected.
    pub is_online: bool,
    /// Elimination cause.
    pub death_reason: Option<DeathReason>,
    /// Truthful reports this game.
    pub truths_told: u32,
    /// False reports this game.
    pub lies_told: u32,
    /// Facilitator score.
    #[serde(default)]
    pub current_game_score: i32,
    /// Secrets discovered this game.
    #[serde(default)]
    pub secrets_discovered_this_game: u32,
    /// Registration timestamp.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub registered_at: SystemTime,
    /// Last activity timestamp.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub last_activity: SystemTime,
}

/// Persisted form of a ledger row.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommunicationEntity {
    /// Player the statement is about.
    pub receiver: Uuid,
    /// Player who made it.
    pub teller: Uuid,
    /// Round number.
    pub round: u32,
    /// Claimed symbol.
    pub told_symbol: Suit,
    /// First recording.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub recorded_at: SystemTime,
    /// Last overwrite.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: SystemTime,
}

/// Complete snapshot written after every committed change.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LobbyEntity {
    /// Current game, if any.
    pub game: Option<GameEntity>,
    /// Players in registration order.
    pub players: Vec<PlayerEntity>,
    /// Live ledger rows.
    pub communications: Vec<CommunicationEntity>,
    /// When the snapshot was taken.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub saved_at: SystemTime,
}

impl LobbyEntity {
    /// Capture the lobby as a storable snapshot.
    pub fn capture(lobby: &Lobby, saved_at: SystemTime) -> Self {
        Self {
            game: lobby.game.clone().map(Into::into),
            players: lobby.roster.iter().cloned().map(Into::into).collect(),
            communications: lobby.ledger.iter().cloned().map(Into::into).collect(),
            saved_at,
        }
    }
}

impl From<LobbyEntity> for Lobby {
    fn from(value: LobbyEntity) -> Self {
        Self {
            roster: Roster::from_players(value.players.into_iter().map(Into::into)),
            ledger: CommunicationLedger::from_records(
                value.communications.into_iter().map(Into::into),
            ),
            game: value.game.map(Into::into),
        }
    }
}

impl From<Game> for GameEntity {
    fn from(value: Game) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            status: value.status,
            created_at: value.created_at,
            started_at: value.started_at,
            current_round: value.current_round,
            round_duration: value.round_duration,
            round_started_at: value.clock.round_started_at,
            round_ends_at: value.clock.round_ends_at,
            paused_at: value.clock.paused_at,
            paused_duration: value.clock.paused_duration,
            result: value.result,
        }
    }
}

impl From<GameEntity> for Game {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            status: value.status,
            created_at: value.created_at,
            started_at: value.started_at,
            current_round: value.current_round.max(1),
            round_duration: value.round_duration,
            clock: RoundClock {
                round_started_at: value.round_started_at,
                round_ends_at: value.round_ends_at,
                paused_at: value.paused_at,
                paused_duration: value.paused_duration,
            },
            result: value.result,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            karma_score: value.karma_score,
            suit_symbol: value.suit_symbol,
            chosen_symbol: value.chosen_symbol,
            is_in_game: value.is_in_game,
            is_online: value.is_online,
            death_reason: value.death_reason,
            truths_told: value.truths_told,
            lies_told: value.lies_told,
            current_game_score: value.current_game_score,
            secrets_discovered_this_game: value.secrets_discovered_this_game,
            registered_at: value.registered_at,
            last_activity: value.last_activity,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            karma_score: value.karma_score.min(crate::state::player::KARMA_MAX),
            suit_symbol: value.suit_symbol,
            chosen_symbol: value.chosen_symbol,
            is_in_game: value.is_in_game,
            is_online: value.is_online,
            death_reason: value.death_reason,
            truths_told: value.truths_told,
            lies_told: value.lies_told,
            current_game_score: value.current_game_score,
            secrets_discovered_this_game: value.secrets_discovered_this_game,
            registered_at: value.registered_at,
            last_activity: value.last_activity,
        }
    }
}

impl From<Communication> for CommunicationEntity {
    fn from(value: Communication) -> Self {
        Self {
            receiver: value.receiver,
            teller: value.teller,
            round: value.round,
            told_symbol: value.told_symbol,
            recorded_at: value.recorded_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<CommunicationEntity> for Communication {
    fn from(value: CommunicationEntity) -> Self {
        Self {
            receiver: value.receiver,
            teller: value.teller,
            round: value.round,
            told_symbol: value.told_symbol,
            recorded_at: value.recorded_at,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::game::GameSettings;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn running_lobby() -> Lobby {
        let mut lobby = Lobby::default();
        let mut ids = Vec::new();
        for (i, name) in ["ana", "bo", "cy"].iter().enumerate() {
            let id = lobby.register_player(name, at(i as u64)).unwrap().id;
            lobby.set_online(id, at(10)).unwrap();
            ids.push(id);
        }
        let game_id = lobby
            .create_game(
                GameSettings {
                    name: "night".into(),
                    description: "test".into(),
                    round_duration: Duration::from_secs(120),
                },
                at(20),
            )
            .unwrap()
            .game_id;
        lobby
            .start_game(game_id, 3, &mut StdRng::seed_from_u64(1), at(30))
            .unwrap();
        lobby.pause_round(game_id, at(40)).unwrap();
        lobby
            .record_communication(ids[0], ids[1], Suit::Hearts, at(35))
            .unwrap();
        lobby
    }

    #[test]
    fn snapshot_restores_the_same_lobby() {
        let lobby = running_lobby();
        let entity = LobbyEntity::capture(&lobby, at(50));
        let restored: Lobby = entity.into();
        assert_eq!(restored, lobby);
    }

    #[test]
    fn snapshot_survives_json() {
        let lobby = running_lobby();
        let json = serde_json::to_string(&LobbyEntity::capture(&lobby, at(50))).unwrap();
        let entity: LobbyEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(Lobby::from(entity), lobby);
        assert!(json.contains("\"round_duration\":120"));
    }
}
