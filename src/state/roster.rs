//! Player repository with the batch operations used at game and round boundaries.

use std::time::SystemTime;

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::state::{
    error::GameRuleError,
    ledger::CommunicationLedger,
    player::Player,
    suit::{SUITS, Suit},
};

/// Selects which players a batch operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerFilter {
    /// Every registered player.
    All,
    /// Players enrolled in the current game.
    InGame,
    /// Connected players.
    Online,
}

impl PlayerFilter {
    fn matches(self, player: &Player) -> bool {
        match self {
            PlayerFilter::All => true,
            PlayerFilter::InGame => player.is_in_game,
            PlayerFilter::Online => player.is_online,
        }
    }
}

/// Symbol dealt to a player at round setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitAssignment {
    /// Player receiving the symbol.
    pub player_id: Uuid,
    /// Name shown to the facilitator.
    pub display_name: String,
    /// Dealt symbol.
    pub suit: Suit,
}

/// All registered players, kept in registration order.
///
/// Registration order is the dealing order: with more than four players the
/// first ones in the roster are the ones whose symbols repeat first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: IndexMap<Uuid, Player>,
}

impl Roster {
    /// Rebuild a roster from persisted players, ordering them by registration.
    pub fn from_players(players: impl IntoIterator<Item = Player>) -> Self {
        let mut players: Vec<Player> = players.into_iter().collect();
        players.sort_by_key(|player| player.registered_at);
        Self {
            players: players
                .into_iter()
                .map(|player| (player.id, player))
                .collect(),
        }
    }

    /// Register a new player under a unique display name.
    pub fn register(
        &mut self,
        display_name: &str,
        now: SystemTime,
    ) -> Result<&Player, GameRuleError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(GameRuleError::EmptyDisplayName);
        }

        let lowered = display_name.to_lowercase();
        if self
            .players
            .values()
            .any(|player| player.display_name.to_lowercase() == lowered)
        {
            return Err(GameRuleError::DuplicateDisplayName(
                display_name.to_string(),
            ));
        }

        let player = Player::new(display_name.to_string(), now);
        let id = player.id;
        self.players.insert(id, player);
        self.require(id)
    }

    /// Look a player up.
    pub fn get(&self, id: Uuid) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look a player up or fail with [`GameRuleError::UnknownPlayer`].
    pub fn require(&self, id: Uuid) -> Result<&Player, GameRuleError> {
        self.players.get(&id).ok_or(GameRuleError::UnknownPlayer(id))
    }

    /// Mutable variant of [`Roster::require`].
    pub fn require_mut(&mut self, id: Uuid) -> Result<&mut Player, GameRuleError> {
        self.players
            .get_mut(&id)
            .ok_or(GameRuleError::UnknownPlayer(id))
    }

    /// Every player in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Players matching `filter`, in registration order.
    pub fn filtered(&self, filter: PlayerFilter) -> impl Iterator<Item = &Player> {
        self.players
            .values()
            .filter(move |player| filter.matches(player))
    }

    /// Mutable iterator over in-game players.
    pub fn in_game_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players
            .values_mut()
            .filter(|player| player.is_in_game)
    }

    /// Number of players matching `filter`.
    pub fn count(&self, filter: PlayerFilter) -> usize {
        self.filtered(filter).count()
    }

    /// Number of in-game players still alive.
    pub fn survivors(&self) -> usize {
        self.players
            .values()
            .filter(|player| player.is_survivor())
            .count()
    }

    /// Total number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody registered yet.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Reset the game-scoped fields of every player matching `filter`
    /// (karma, symbols, counters, death). Returns how many were touched.
    pub fn reset_all(&mut self, filter: PlayerFilter) -> usize {
        let mut touched = 0;
        for player in self
            .players
            .values_mut()
            .filter(|player| filter.matches(player))
        {
            player.reset_game_scoped();
            touched += 1;
        }
        touched
    }

    /// Reset a single player for a new game and purge every statement touching them.
    pub fn reset_player_for_new_game(
        &mut self,
        id: Uuid,
        ledger: &mut CommunicationLedger,
    ) -> Result<usize, GameRuleError> {
        self.require_mut(id)?.reset_for_new_game();
        Ok(ledger.purge_player(id))
    }

    /// Reset every player for a new game and empty the ledger.
    pub fn reset_all_for_new_game(&mut self, ledger: &mut CommunicationLedger) -> usize {
        for player in self.players.values_mut() {
            player.reset_for_new_game();
        }
        ledger.clear();
        self.players.len()
    }

    /// Enrol every online player in the game. Returns how many were enrolled.
    pub fn join_online_players(&mut self, now: SystemTime) -> usize {
        let mut joined = 0;
        for player in self.players.values_mut().filter(|player| player.is_online) {
            player.join_game(now);
            joined += 1;
        }
        joined
    }

    /// Give each online player without a symbol the next suit of a cyclic deal.
    pub fn assign_suits_to_online_players(&mut self) -> usize {
        let mut dealt = 0;
        for player in self
            .players
            .values_mut()
            .filter(|player| player.is_online && player.suit_symbol.is_none())
        {
            player.assign_suit(Suit::cyclic(dealt));
            dealt += 1;
        }
        dealt
    }

    /// Round setup: shuffle the four suits and deal them cyclically to every
    /// in-game player, clearing last round's guesses. Up to four players
    /// always receive distinct symbols.
    pub fn deal_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<SuitAssignment> {
        let mut deck = SUITS;
        deck.shuffle(rng);

        self.in_game_mut()
            .enumerate()
            .map(|(index, player)| {
                let suit = deck[index % deck.len()];
                player.assign_suit(suit);
                player.chosen_symbol = None;
                SuitAssignment {
                    player_id: player.id,
                    display_name: player.display_name.clone(),
                    suit,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn roster_with(names: &[&str]) -> (Roster, Vec<Uuid>) {
        let mut roster = Roster::default();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| roster.register(name, at(i as u64)).unwrap().id)
            .collect();
        (roster, ids)
    }

    #[test]
    fn display_names_are_unique_and_trimmed() {
        let (mut roster, _) = roster_with(&["Ana"]);
        assert_eq!(
            roster.register("  ana ", at(10)).unwrap_err(),
            GameRuleError::DuplicateDisplayName("ana".into())
        );
        assert_eq!(
            roster.register("   ", at(10)).unwrap_err(),
            GameRuleError::EmptyDisplayName
        );
        assert_eq!(roster.register(" Bo ", at(10)).unwrap().display_name, "Bo");
    }

    #[test]
    fn online_suits_follow_registration_order() {
        let (mut roster, ids) = roster_with(&["a", "b", "c", "d", "e"]);
        for id in &ids {
            roster.require_mut(*id).unwrap().set_online(at(20));
        }
        roster.require_mut(ids[1]).unwrap().assign_suit(Suit::Clubs);

        assert_eq!(roster.assign_suits_to_online_players(), 4);

        let suits: Vec<Option<Suit>> = ids
            .iter()
            .map(|id| roster.get(*id).unwrap().suit_symbol)
            .collect();
        assert_eq!(
            suits,
            vec![
                Some(Suit::Spades),
                Some(Suit::Clubs),
                Some(Suit::Hearts),
                Some(Suit::Diamonds),
                Some(Suit::Clubs),
            ]
        );
    }

    #[test]
    fn round_deal_is_distinct_up_to_four_players() {
        let (mut roster, ids) = roster_with(&["a", "b", "c", "d", "outsider"]);
        for id in &ids[..4] {
            roster.require_mut(*id).unwrap().join_game(at(30));
        }
        roster.require_mut(ids[0]).unwrap().chosen_symbol = Some(Suit::Spades);

        let mut rng = StdRng::seed_from_u64(7);
        let dealt = roster.deal_round(&mut rng);

        assert_eq!(dealt.len(), 4);
        let distinct: HashSet<Suit> = dealt.iter().map(|a| a.suit).collect();
        assert_eq!(distinct.len(), 4);
        assert_eq!(roster.get(ids[0]).unwrap().chosen_symbol, None);
        assert_eq!(roster.get(ids[4]).unwrap().suit_symbol, None);
    }

    #[test]
    fn round_deal_recycles_beyond_four_players() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let (mut roster, ids) = roster_with(&names);
        for id in &ids {
            roster.require_mut(*id).unwrap().join_game(at(30));
        }

        let dealt = roster.deal_round(&mut StdRng::seed_from_u64(3));
        assert_eq!(dealt[4].suit, dealt[0].suit);
        assert_eq!(dealt[5].suit, dealt[1].suit);
    }

    #[test]
    fn batch_reset_reports_count() {
        let (mut roster, ids) = roster_with(&["a", "b", "c"]);
        roster.require_mut(ids[0]).unwrap().join_game(at(5));
        roster.require_mut(ids[0]).unwrap().lies_told = 3;
        roster.require_mut(ids[2]).unwrap().truths_told = 1;

        assert_eq!(roster.reset_all(PlayerFilter::InGame), 1);
        assert_eq!(roster.get(ids[0]).unwrap().lies_told, 0);
        assert!(roster.get(ids[0]).unwrap().is_in_game);
        assert_eq!(roster.get(ids[2]).unwrap().truths_told, 1);

        assert_eq!(roster.reset_all(PlayerFilter::All), 3);
        assert_eq!(roster.get(ids[2]).unwrap().truths_told, 0);
    }

    #[test]
    fn resetting_a_player_purges_their_statements() {
        let (mut roster, ids) = roster_with(&["a", "b", "c"]);
        let mut ledger = CommunicationLedger::default();
        ledger.record(ids[0], ids[1], 1, Suit::Spades, at(1)).unwrap();
        ledger.record(ids[1], ids[0], 1, Suit::Spades, at(1)).unwrap();
        ledger.record(ids[1], ids[2], 1, Suit::Spades, at(1)).unwrap();

        let purged = roster
            .reset_player_for_new_game(ids[0], &mut ledger)
            .unwrap();
        assert_eq!(purged, 2);
        assert_eq!(ledger.len(), 1);
        assert_eq!(roster.get(ids[0]).unwrap().display_name, "a");
    }

    #[test]
    fn restored_roster_keeps_registration_order() {
        let (roster, ids) = roster_with(&["a", "b", "c"]);
        let mut players: Vec<Player> = roster.iter().cloned().collect();
        players.reverse();
        let restored = Roster::from_players(players);
        let order: Vec<Uuid> = restored.iter().map(|p| p.id).collect();
        assert_eq!(order, ids);
    }
}
