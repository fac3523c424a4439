//! End-of-round scoring: symbol checks, truth/lie tallies and karma moves.

use indexmap::IndexMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{ledger::CommunicationLedger, roster::Roster};

/// Truths and lies told by one player during a single round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTally {
    /// Reports matching the receiver's symbol.
    pub truths: u32,
    /// Reports contradicting it.
    pub lies: u32,
}

/// Direction karma moved for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KarmaShift {
    /// More lies than truths.
    Up,
    /// More truths than lies.
    Down,
    /// Balanced (or silent) round.
    Unchanged,
}

impl RoundTally {
    fn shift(&self) -> KarmaShift {
        match self.lies.cmp(&self.truths) {
            std::cmp::Ordering::Greater => KarmaShift::Up,
            std::cmp::Ordering::Less => KarmaShift::Down,
            std::cmp::Ordering::Equal => KarmaShift::Unchanged,
        }
    }
}

/// Karma before and after scoring for a player whose meter moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarmaChange {
    /// Affected player.
    pub player_id: Uuid,
    /// Karma before scoring.
    pub before: u8,
    /// Karma after scoring.
    pub after: u8,
    /// Direction of the move.
    pub shift: KarmaShift,
}

/// Everything that happened while scoring a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Round that was scored.
    pub round: u32,
    /// Number of statements examined.
    pub communications: usize,
    /// Players eliminated because their guess was missing or wrong.
    pub symbol_deaths: Vec<Uuid>,
    /// Per-teller tallies for this round, in order of first statement.
    pub tallies: IndexMap<Uuid, RoundTally>,
    /// Players whose karma actually moved.
    pub karma_changes: Vec<KarmaChange>,
    /// Players eliminated by the karma moves.
    pub karma_deaths: Vec<Uuid>,
}

impl RoundReport {
    /// Every player eliminated during this scoring pass.
    pub fn eliminated(&self) -> impl Iterator<Item = &Uuid> {
        self.symbol_deaths.iter().chain(self.karma_deaths.iter())
    }
}

/// Score `round` against the roster.
///
/// Symbol checks run first; if the round has no statements nothing else
/// changes. Every in-game player gets a karma move from their tally, dead
/// ones included, and the per-game truth/lie counters grow accordingly.
pub fn score_round(roster: &mut Roster, ledger: &CommunicationLedger, round: u32) -> RoundReport {
    let mut report = RoundReport {
        round,
        ..RoundReport::default()
    };

    for player in roster.in_game_mut() {
        if player.check_symbol_death() {
            report.symbol_deaths.push(player.id);
        }
    }

    let statements: Vec<_> = ledger.records_for_round(round).collect();
    report.communications = statements.len();
    if statements.is_empty() {
        debug!(round, "no communications recorded, karma unchanged");
        return report;
    }

    for statement in statements {
        let Some(receiver) = roster.get(statement.receiver) else {
            warn!(
                round,
                receiver = %statement.receiver,
                "communication refers to an unknown receiver, skipping"
            );
            continue;
        };
        let truthful = receiver.suit_symbol == Some(statement.told_symbol);

        let Ok(teller) = roster.require_mut(statement.teller) else {
            warn!(
                round,
                teller = %statement.teller,
                "communication refers to an unknown teller, skipping"
            );
            continue;
        };

        let tally = report.tallies.entry(teller.id).or_default();
        if truthful {
            teller.truths_told += 1;
            tally.truths += 1;
        } else {
            teller.lies_told += 1;
            tally.lies += 1;
        }
    }

    for player in roster.in_game_mut() {
        let tally = report.tallies.get(&player.id).copied().unwrap_or_default();
        let shift = tally.shift();
        let before = player.karma_score;
        let died = match shift {
            KarmaShift::Up => player.increase_karma(1),
            KarmaShift::Down => player.decrease_karma(1),
            KarmaShift::Unchanged => continue,
        };
        if player.karma_score != before {
            report.karma_changes.push(KarmaChange {
                player_id: player.id,
                before,
                after: player.karma_score,
                shift,
            });
        }
        if died {
            report.karma_deaths.push(player.id);
        }
    }

    report
}
