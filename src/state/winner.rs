//! Winner resolution over the in-game players.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{player::Player, roster::Roster};

/// How the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Everybody was eliminated.
    NoSurvivors,
    /// Exactly one player is alive.
    SoleSurvivor,
    /// Two survivors, decided by total interactions.
    MoreInteractions,
    /// Two survivors with equal interactions, decided by lies.
    MoreLies,
    /// Two survivors equal on interactions and lies.
    Tie,
    /// Three or more survivors; no winner is computed.
    Undecided,
}

/// Result of a winner resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Kind of ending.
    pub outcome: Outcome,
    /// Winning player, if any.
    pub winner: Option<Uuid>,
    /// Display name of the winner, if any.
    pub winner_name: Option<String>,
    /// Human-readable explanation.
    pub reason: String,
    /// Living in-game players at resolution time.
    pub alive_count: usize,
}

impl GameResult {
    /// Whether `player_id` won.
    pub fn is_winner(&self, player_id: Uuid) -> bool {
        self.winner == Some(player_id)
    }

    fn won_by(outcome: Outcome, player: &Player, reason: String, alive_count: usize) -> Self {
        Self {
            outcome,
            winner: Some(player.id),
            winner_name: Some(player.display_name.clone()),
            reason,
            alive_count,
        }
    }

    fn without_winner(outcome: Outcome, reason: String, alive_count: usize) -> Self {
        Self {
            outcome,
            winner: None,
            winner_name: None,
            reason,
            alive_count,
        }
    }
}

/// Decide the winner from the survivors. Pure: the roster is not modified.
pub fn resolve_winner(roster: &Roster) -> GameResult {
    let alive: Vec<&Player> = roster.iter().filter(|p| p.is_survivor()).collect();
    let count = alive.len();

    match alive.as_slice() {
        [] => GameResult::without_winner(Outcome::NoSurvivors, "all players died".into(), 0),
        [sole] => GameResult::won_by(
            Outcome::SoleSurvivor,
            sole,
            format!("{} wins as sole survivor", sole.display_name),
            1,
        ),
        [a, b] => resolve_duel(a, b),
        _ => GameResult::without_winner(
            Outcome::Undecided,
            format!("game finished with {count} survivors"),
            count,
        ),
    }
}

fn resolve_duel(a: &Player, b: &Player) -> GameResult {
    let (ia, ib) = (a.interactions(), b.interactions());
    if ia != ib {
        let (winner, high, low) = if ia > ib { (a, ia, ib) } else { (b, ib, ia) };
        return GameResult::won_by(
            Outcome::MoreInteractions,
            winner,
            format!(
                "{} wins with more interactions ({high} vs {low})",
                winner.display_name
            ),
            2,
        );
    }

    let (la, lb) = (a.lies_told, b.lies_told);
    if la != lb {
        let (winner, high, low) = if la > lb { (a, la, lb) } else { (b, lb, la) };
        return GameResult::won_by(
            Outcome::MoreLies,
            winner,
            format!(
                "{} wins with more lies on tied interactions ({high} vs {low})",
                winner.display_name
            ),
            2,
        );
    }

    GameResult::without_winner(
        Outcome::Tie,
        format!(
            "tie between {} and {}: same interactions and same lies",
            a.display_name, b.display_name
        ),
        2,
    )
}
