//! Player entity and the karma rules that can eliminate it.

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::suit::Suit;

/// Lowest karma a player can hold; reaching it eliminates the player.
pub const KARMA_MIN: u8 = 0;
/// Highest karma a player can hold; reaching it eliminates the player.
pub const KARMA_MAX: u8 = 6;
/// Karma every player starts a game with.
pub const KARMA_DEFAULT: u8 = 3;

/// Why a player left the game for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeathReason {
    /// Karma dropped to [`KARMA_MIN`].
    KarmaDepleted,
    /// Karma climbed to [`KARMA_MAX`].
    KarmaOverflow,
    /// The player's guess did not match their suit when the round ended.
    WrongSymbol,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::KarmaDepleted => f.write_str("reached karma 0"),
            DeathReason::KarmaOverflow => f.write_str("reached karma 6"),
            DeathReason::WrongSymbol => f.write_str("did not choose correctly"),
        }
    }
}

/// A registered participant. Survives across games; the game-scoped fields
/// are reset whenever a new game begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique human-readable label.
    pub display_name: String,
    /// Honesty meter, always within [`KARMA_MIN`]..=[`KARMA_MAX`].
    pub karma_score: u8,
    /// True symbol dealt for the current round.
    pub suit_symbol: Option<Suit>,
    /// Player's current guess of their own symbol.
    pub chosen_symbol: Option<Suit>,
    /// Whether the player joined the current game.
    pub is_in_game: bool,
    /// Whether the player is connected; online players auto-join new games.
    pub is_online: bool,
    /// Set once the player is eliminated, never overwritten afterwards.
    pub death_reason: Option<DeathReason>,
    /// Truthful reports made during this game.
    pub truths_told: u32,
    /// False reports made during this game.
    pub lies_told: u32,
    /// Free-form score kept for the facilitator.
    pub current_game_score: i32,
    /// Secrets discovered during this game.
    pub secrets_discovered_this_game: u32,
    /// Registration timestamp; defines the dealing order.
    pub registered_at: SystemTime,
    /// Last time the player did anything.
    pub last_activity: SystemTime,
}

impl Player {
    /// Create a fresh player with default karma, outside any game.
    pub fn new(display_name: String, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            karma_score: KARMA_DEFAULT,
            suit_symbol: None,
            chosen_symbol: None,
            is_in_game: false,
            is_online: false,
            death_reason: None,
            truths_told: 0,
            lies_told: 0,
            current_game_score: 0,
            secrets_discovered_this_game: 0,
            registered_at: now,
            last_activity: now,
        }
    }

    /// Whether the player has been eliminated.
    pub fn is_dead(&self) -> bool {
        self.death_reason.is_some()
    }

    /// Alive and part of the current game.
    pub fn is_survivor(&self) -> bool {
        self.is_in_game && !self.is_dead()
    }

    /// Number of reports made this game, true or false.
    pub fn interactions(&self) -> u32 {
        self.lies_told + self.truths_told
    }

    /// Raise karma by `amount`, eliminating the player if this move reaches [`KARMA_MAX`].
    /// Returns whether the call eliminated the player.
    pub fn increase_karma(&mut self, amount: u8) -> bool {
        let previous = self.karma_score;
        self.karma_score = previous.saturating_add(amount).min(KARMA_MAX);
        self.karma_score == KARMA_MAX
            && previous != KARMA_MAX
            && self.kill(DeathReason::KarmaOverflow)
    }

    /// Lower karma by `amount`, eliminating the player if this move reaches [`KARMA_MIN`].
    /// Returns whether the call eliminated the player.
    pub fn decrease_karma(&mut self, amount: u8) -> bool {
        let previous = self.karma_score;
        self.karma_score = previous.saturating_sub(amount).max(KARMA_MIN);
        self.karma_score == KARMA_MIN
            && previous != KARMA_MIN
            && self.kill(DeathReason::KarmaDepleted)
    }

    /// Eliminate the player. A dead player keeps their first death reason.
    pub fn kill(&mut self, reason: DeathReason) -> bool {
        if self.is_dead() {
            return false;
        }
        self.death_reason = Some(reason);
        true
    }

    /// Undo an elimination.
    pub fn revive(&mut self) {
        self.death_reason = None;
    }

    /// Eliminate a living player whose guess is missing or wrong.
    ///
    /// Players without a dealt symbol and dead players are left untouched.
    pub fn check_symbol_death(&mut self) -> bool {
        let Some(actual) = self.suit_symbol else {
            return false;
        };
        if self.is_dead() || self.chosen_symbol == Some(actual) {
            return false;
        }
        self.kill(DeathReason::WrongSymbol)
    }

    /// Deal the player's true symbol.
    pub fn assign_suit(&mut self, suit: Suit) {
        self.suit_symbol = Some(suit);
    }

    /// Record the player's guess.
    pub fn choose_symbol(&mut self, suit: Suit, now: SystemTime) {
        self.chosen_symbol = Some(suit);
        self.touch(now);
    }

    /// Enrol in the current game.
    pub fn join_game(&mut self, now: SystemTime) {
        self.is_in_game = true;
        self.touch(now);
    }

    /// Leave the current game, giving back the dealt symbol.
    pub fn leave_game(&mut self, now: SystemTime) {
        self.is_in_game = false;
        self.suit_symbol = None;
        self.touch(now);
    }

    /// Mark the player as connected.
    pub fn set_online(&mut self, now: SystemTime) {
        self.is_online = true;
        self.touch(now);
    }

    /// Mark the player as disconnected; game participation is unaffected.
    pub fn set_offline(&mut self, now: SystemTime) {
        self.is_online = false;
        self.touch(now);
    }

    /// Add facilitator points.
    pub fn add_score(&mut self, points: i32) {
        self.current_game_score += points;
    }

    /// Count one more discovered secret.
    pub fn discover_secret(&mut self) {
        self.secrets_discovered_this_game += 1;
    }

    /// Clear everything scoped to a single game while keeping participation flags.
    pub fn reset_game_scoped(&mut self) {
        self.karma_score = KARMA_DEFAULT;
        self.suit_symbol = None;
        self.chosen_symbol = None;
        self.death_reason = None;
        self.truths_told = 0;
        self.lies_told = 0;
        self.current_game_score = 0;
        self.secrets_discovered_this_game = 0;
    }

    /// Prepare the player for the next game. Only identity, name and
    /// connectivity survive. Ledger rows are purged by the roster.
    pub fn reset_for_new_game(&mut self) {
        self.reset_game_scoped();
        self.is_in_game = false;
    }

    /// Human label for the karma meter.
    pub fn karma_level(&self) -> &'static str {
        match self.karma_score {
            0 => "very low",
            1 => "low",
            2 => "fair",
            3 => "normal",
            4 => "good",
            5 => "high",
            _ => "excellent",
        }
    }

    /// Bump `last_activity`.
    pub fn touch(&mut self, now: SystemTime) {
        self.last_activity = self.last_activity.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new("ana".into(), SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn karma_stays_within_bounds() {
        let mut p = player();
        let moves: [(bool, u8); 10] = [
            (true, 2),
            (true, 9),
            (false, 1),
            (false, 200),
            (true, 255),
            (false, 3),
            (true, 1),
            (false, 0),
            (true, 0),
            (false, 7),
        ];
        for (up, amount) in moves {
            if up {
                p.increase_karma(amount);
            } else {
                p.decrease_karma(amount);
            }
            assert!(p.karma_score <= KARMA_MAX);
        }
    }

    #[test]
    fn reaching_six_eliminates() {
        let mut p = player();
        assert!(!p.increase_karma(1));
        assert!(!p.increase_karma(1));
        assert!(p.increase_karma(1));
        assert_eq!(p.karma_score, 6);
        assert_eq!(p.death_reason, Some(DeathReason::KarmaOverflow));
        assert_eq!(p.death_reason.unwrap().to_string(), "reached karma 6");
    }

    #[test]
    fn reaching_zero_eliminates() {
        let mut p = player();
        assert!(p.decrease_karma(5));
        assert_eq!(p.karma_score, 0);
        assert_eq!(p.death_reason, Some(DeathReason::KarmaDepleted));
    }

    #[test]
    fn staying_at_a_bound_does_not_eliminate_again() {
        let mut p = player();
        p.karma_score = 6;
        assert!(!p.increase_karma(1));
        assert!(!p.is_dead());
    }

    #[test]
    fn death_reason_is_never_overwritten() {
        let mut p = player();
        p.decrease_karma(3);
        assert_eq!(p.death_reason, Some(DeathReason::KarmaDepleted));

        p.increase_karma(6);
        assert_eq!(p.karma_score, 6);
        assert_eq!(p.death_reason, Some(DeathReason::KarmaDepleted));

        p.assign_suit(Suit::Clubs);
        assert!(!p.check_symbol_death());
        assert_eq!(p.death_reason, Some(DeathReason::KarmaDepleted));
    }

    #[test]
    fn symbol_check_kills_on_wrong_or_missing_guess() {
        let mut missing = player();
        missing.assign_suit(Suit::Hearts);
        assert!(missing.check_symbol_death());
        assert_eq!(missing.death_reason, Some(DeathReason::WrongSymbol));

        let mut wrong = player();
        wrong.assign_suit(Suit::Hearts);
        wrong.choose_symbol(Suit::Spades, SystemTime::UNIX_EPOCH);
        assert!(wrong.check_symbol_death());

        let mut right = player();
        right.assign_suit(Suit::Hearts);
        right.choose_symbol(Suit::Hearts, SystemTime::UNIX_EPOCH);
        assert!(!right.check_symbol_death());
        assert!(!right.is_dead());
    }

    #[test]
    fn symbol_check_skips_players_without_a_suit() {
        let mut p = player();
        assert!(!p.check_symbol_death());
        assert!(!p.is_dead());
    }

    #[test]
    fn reset_for_new_game_keeps_identity() {
        let mut p = player();
        let id = p.id;
        p.join_game(SystemTime::UNIX_EPOCH);
        p.set_online(SystemTime::UNIX_EPOCH);
        p.assign_suit(Suit::Diamonds);
        p.lies_told = 4;
        p.truths_told = 2;
        p.add_score(5);
        p.discover_secret();
        p.decrease_karma(3);

        p.reset_for_new_game();

        assert_eq!(p.id, id);
        assert_eq!(p.display_name, "ana");
        assert_eq!(p.karma_score, KARMA_DEFAULT);
        assert!(!p.is_dead());
        assert!(!p.is_in_game);
        assert!(p.is_online);
        assert_eq!(p.suit_symbol, None);
        assert_eq!(p.interactions(), 0);
        assert_eq!(p.current_game_score, 0);
        assert_eq!(p.secrets_discovered_this_game, 0);
    }

    #[test]
    fn leaving_returns_the_symbol() {
        let mut p = player();
        p.join_game(SystemTime::UNIX_EPOCH);
        p.assign_suit(Suit::Spades);
        p.leave_game(SystemTime::UNIX_EPOCH);
        assert!(!p.is_in_game);
        assert_eq!(p.suit_symbol, None);
    }
}
