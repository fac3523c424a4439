//! Aggregate owning the roster, the communication ledger and at most one game.
//!
//! Every operation either applies completely or returns a [`GameRuleError`]
//! without touching anything. Callers run them on a clone when they need to
//! persist before committing.

use std::time::SystemTime;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{
    error::GameRuleError,
    game::{Game, GameSettings, GameStatus},
    ledger::{Communication, CommunicationLedger, RecordOutcome},
    player::Player,
    roster::{PlayerFilter, Roster, SuitAssignment},
    scoring::{RoundReport, score_round},
    suit::Suit,
    winner::{GameResult, resolve_winner},
};

/// Survivor count at or below which the game is considered over.
pub const END_CONDITION_SURVIVORS: usize = 2;

/// Facilitator override of a player's karma meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KarmaAdjustment {
    /// One step up.
    Increase,
    /// One step down.
    Decrease,
}

/// Outcome of [`Lobby::create_game`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGame {
    /// Identifier of the new game.
    pub game_id: Uuid,
    /// Online players enrolled automatically.
    pub joined: usize,
    /// Online players who received an initial symbol.
    pub dealt: usize,
}

/// Outcome of [`Lobby::advance_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundAdvance {
    /// Scoring of the round that just ended.
    pub report: RoundReport,
    /// Round now being played.
    pub current_round: u32,
    /// Symbols dealt for the new round.
    pub assignments: Vec<SuitAssignment>,
    /// Whether two or fewer players survive.
    pub end_condition_met: bool,
}

/// Everything the game server keeps in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lobby {
    /// Registered players.
    pub roster: Roster,
    /// Statements recorded during the game.
    pub ledger: CommunicationLedger,
    /// Current (possibly finished) game.
    pub game: Option<Game>,
}

impl Lobby {
    /// Borrow the current game, if any.
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Current game only while it is active.
    pub fn active_game(&self) -> Option<&Game> {
        self.game
            .as_ref()
            .filter(|game| game.status == GameStatus::Active)
    }

    /// Borrow the game with the given id.
    pub fn require_game(&self, game_id: Uuid) -> Result<&Game, GameRuleError> {
        self.game
            .as_ref()
            .filter(|game| game.id == game_id)
            .ok_or(GameRuleError::GameNotFound(game_id))
    }

    fn require_game_mut(&mut self, game_id: Uuid) -> Result<&mut Game, GameRuleError> {
        self.game
            .as_mut()
            .filter(|game| game.id == game_id)
            .ok_or(GameRuleError::GameNotFound(game_id))
    }

    fn require_active_round(&self) -> Result<u32, GameRuleError> {
        self.active_game()
            .map(|game| game.current_round)
            .ok_or(GameRuleError::NoActiveGame)
    }

    /// Create a waiting game.
    ///
    /// Fails while another game is waiting or active. A finished game is
    /// purged, every player is reset for the new game, online players are
    /// enrolled and dealt an initial symbol.
    pub fn create_game(
        &mut self,
        settings: GameSettings,
        now: SystemTime,
    ) -> Result<CreatedGame, GameRuleError> {
        if let Some(existing) = self
            .game
            .as_ref()
            .filter(|game| game.status != GameStatus::Finished)
        {
            return Err(GameRuleError::GameAlreadyExists(existing.id));
        }

        if let Some(previous) = self.game.take() {
            debug!(game_id = %previous.id, "purging finished game");
        }
        let reset = self.roster.reset_all_for_new_game(&mut self.ledger);
        let joined = self.roster.join_online_players(now);
        let dealt = self.roster.assign_suits_to_online_players();

        let game = Game::new(settings, now);
        let game_id = game.id;
        info!(
            %game_id,
            name = %game.name,
            round_duration_secs = game.round_duration.as_secs(),
            reset,
            joined,
            "game created"
        );
        self.game = Some(game);

        Ok(CreatedGame {
            game_id,
            joined,
            dealt,
        })
    }

    /// Waiting → active once enough players joined.
    ///
    /// Game-scoped player fields are reset globally, then round 1 is set up.
    pub fn start_game<R: Rng + ?Sized>(
        &mut self,
        game_id: Uuid,
        min_players: usize,
        rng: &mut R,
        now: SystemTime,
    ) -> Result<Vec<SuitAssignment>, GameRuleError> {
        let status = self.require_game(game_id)?.status;
        if status != GameStatus::Waiting {
            return Err(GameRuleError::InvalidTransition {
                action: "start the game",
                status,
            });
        }
        let actual = self.roster.count(PlayerFilter::InGame);
        if actual < min_players {
            return Err(GameRuleError::InsufficientPlayers {
                required: min_players,
                actual,
            });
        }

        self.roster.reset_all(PlayerFilter::All);
        self.require_game_mut(game_id)?.begin(now)?;
        let assignments = self.setup_round(1, rng);
        info!(%game_id, players = actual, "game started");
        Ok(assignments)
    }

    /// Score the current round and start the next one.
    ///
    /// `from_round`, when given, must be the round being played; this rejects
    /// a second advance issued for a round that already ended.
    pub fn advance_round<R: Rng + ?Sized>(
        &mut self,
        game_id: Uuid,
        from_round: Option<u32>,
        rng: &mut R,
        now: SystemTime,
    ) -> Result<RoundAdvance, GameRuleError> {
        let game = self.require_game(game_id)?;
        if game.status != GameStatus::Active {
            return Err(GameRuleError::InvalidTransition {
                action: "advance the round",
                status: game.status,
            });
        }
        let round = game.current_round;
        if let Some(requested) = from_round.filter(|requested| *requested != round) {
            return Err(GameRuleError::InvalidRound(requested));
        }

        let report = score_round(&mut self.roster, &self.ledger, round);
        let current_round = self.require_game_mut(game_id)?.next_round(now)?;
        let assignments = self.setup_round(current_round, rng);
        let end_condition_met = self.end_condition_met();

        info!(
            %game_id,
            scored_round = round,
            current_round,
            communications = report.communications,
            eliminated = report.eliminated().count(),
            end_condition_met,
            "round advanced"
        );

        Ok(RoundAdvance {
            report,
            current_round,
            assignments,
            end_condition_met,
        })
    }

    /// Active → finished with the resolved winner. The partial round is not scored.
    pub fn finish_game(&mut self, game_id: Uuid) -> Result<GameResult, GameRuleError> {
        let result = resolve_winner(&self.roster);
        self.require_game_mut(game_id)?.conclude(result.clone())?;
        info!(%game_id, outcome = ?result.outcome, reason = %result.reason, "game finished");
        Ok(result)
    }

    /// Freeze the round timer.
    pub fn pause_round(&mut self, game_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.require_game_mut(game_id)?.pause(now)
    }

    /// Unfreeze the round timer.
    pub fn resume_round(&mut self, game_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.require_game_mut(game_id)?.resume(now)
    }

    fn setup_round<R: Rng + ?Sized>(&mut self, round: u32, rng: &mut R) -> Vec<SuitAssignment> {
        let assignments = self.roster.deal_round(rng);
        let purged = self.ledger.purge_before(round);
        debug!(round, dealt = assignments.len(), purged, "round set up");
        assignments
    }

    /// Whether two or fewer in-game players are still alive.
    pub fn end_condition_met(&self) -> bool {
        self.roster.survivors() <= END_CONDITION_SURVIVORS
    }

    /// Result stored when the game finished.
    pub fn result(&self) -> Option<&GameResult> {
        self.game.as_ref().and_then(|game| game.result.as_ref())
    }

    /// Winner resolution over the current survivors, without finishing anything.
    pub fn live_result(&self) -> GameResult {
        resolve_winner(&self.roster)
    }

    /// Register a new player.
    pub fn register_player(
        &mut self,
        display_name: &str,
        now: SystemTime,
    ) -> Result<Player, GameRuleError> {
        self.roster.register(display_name, now).cloned()
    }

    /// Mark a player as connected.
    pub fn set_online(&mut self, player_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.roster.require_mut(player_id)?.set_online(now);
        Ok(())
    }

    /// Mark a player as disconnected.
    pub fn set_offline(&mut self, player_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.roster.require_mut(player_id)?.set_offline(now);
        Ok(())
    }

    /// Enrol a player. Not allowed once rounds are being played.
    pub fn join_game(&mut self, player_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.reject_while_active("join the game")?;
        self.roster.require_mut(player_id)?.join_game(now);
        Ok(())
    }

    /// Withdraw a player. Not allowed once rounds are being played.
    pub fn leave_game(&mut self, player_id: Uuid, now: SystemTime) -> Result<(), GameRuleError> {
        self.reject_while_active("leave the game")?;
        self.roster.require_mut(player_id)?.leave_game(now);
        Ok(())
    }

    fn reject_while_active(&self, action: &'static str) -> Result<(), GameRuleError> {
        match self.active_game() {
            Some(game) => Err(GameRuleError::InvalidTransition {
                action,
                status: game.status,
            }),
            None => Ok(()),
        }
    }

    /// Reset one player for a new game, purging their statements.
    pub fn reset_player(&mut self, player_id: Uuid) -> Result<usize, GameRuleError> {
        self.roster
            .reset_player_for_new_game(player_id, &mut self.ledger)
    }

    /// Facilitator karma override. Returns whether it eliminated the player.
    pub fn adjust_karma(
        &mut self,
        player_id: Uuid,
        adjustment: KarmaAdjustment,
    ) -> Result<bool, GameRuleError> {
        let player = self.roster.require_mut(player_id)?;
        Ok(match adjustment {
            KarmaAdjustment::Increase => player.increase_karma(1),
            KarmaAdjustment::Decrease => player.decrease_karma(1),
        })
    }

    /// Record the player's guess of their own symbol for the active round.
    pub fn choose_symbol(
        &mut self,
        player_id: Uuid,
        suit: Suit,
        now: SystemTime,
    ) -> Result<(), GameRuleError> {
        self.require_active_round()?;
        let player = self.roster.require_mut(player_id)?;
        if !player.is_in_game {
            return Err(GameRuleError::NotInGame(player_id));
        }
        if player.is_dead() {
            return Err(GameRuleError::PlayerEliminated(player_id));
        }
        player.choose_symbol(suit, now);
        Ok(())
    }

    /// `receiver` records that `teller` claimed the receiver's symbol is `suit`.
    pub fn record_communication(
        &mut self,
        receiver: Uuid,
        teller: Uuid,
        suit: Suit,
        now: SystemTime,
    ) -> Result<RecordOutcome, GameRuleError> {
        let round = self.require_active_round()?;
        for id in [receiver, teller] {
            if !self.roster.require(id)?.is_in_game {
                return Err(GameRuleError::NotInGame(id));
            }
        }

        let outcome = self.ledger.record(teller, receiver, round, suit, now)?;
        self.roster.require_mut(receiver)?.touch(now);
        debug!(%receiver, %teller, round, ?outcome, "communication recorded");
        Ok(outcome)
    }

    /// Statements received by a player, for `round` or the current round.
    pub fn received_communications(
        &self,
        receiver: Uuid,
        round: Option<u32>,
    ) -> Result<(u32, Vec<&Communication>), GameRuleError> {
        self.roster.require(receiver)?;
        let round = match round {
            Some(round) => round,
            None => self
                .game
                .as_ref()
                .map(|game| game.current_round)
                .ok_or(GameRuleError::NoGame)?,
        };
        Ok((round, self.ledger.query(receiver, round)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::{ledger::LedgerError, player::DeathReason, winner::Outcome};

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn settings() -> GameSettings {
        GameSettings {
            name: "test".into(),
            description: String::new(),
            round_duration: Duration::from_secs(60),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Lobby with `n` online players and a waiting game they all joined.
    fn waiting_lobby(n: usize) -> (Lobby, Uuid, Vec<Uuid>) {
        let mut lobby = Lobby::default();
        let ids: Vec<Uuid> = (0..n)
            .map(|i| {
                let id = lobby.register_player(&format!("p{i}"), at(i as u64)).unwrap().id;
                lobby.set_online(id, at(i as u64)).unwrap();
                id
            })
            .collect();
        let created = lobby.create_game(settings(), at(100)).unwrap();
        (lobby, created.game_id, ids)
    }

    fn active_lobby(n: usize) -> (Lobby, Uuid, Vec<Uuid>) {
        let (mut lobby, game_id, ids) = waiting_lobby(n);
        lobby.start_game(game_id, 3, &mut rng(), at(200)).unwrap();
        (lobby, game_id, ids)
    }

    fn suit_of(lobby: &Lobby, id: Uuid) -> Suit {
        lobby.roster.get(id).unwrap().suit_symbol.unwrap()
    }

    #[test]
    fn creation_enrols_online_players_and_deals_in_registration_order() {
        let (lobby, _, ids) = waiting_lobby(5);
        assert_eq!(lobby.roster.count(PlayerFilter::InGame), 5);
        assert_eq!(suit_of(&lobby, ids[0]), Suit::Spades);
        assert_eq!(suit_of(&lobby, ids[3]), Suit::Clubs);
        assert_eq!(suit_of(&lobby, ids[4]), Suit::Spades);
    }

    #[test]
    fn only_one_unfinished_game() {
        let (mut lobby, game_id, _) = waiting_lobby(3);
        assert_eq!(
            lobby.create_game(settings(), at(150)),
            Err(GameRuleError::GameAlreadyExists(game_id))
        );
    }

    #[test]
    fn finished_game_is_purged_on_creation() {
        let (mut lobby, game_id, ids) = active_lobby(3);
        lobby.roster.require_mut(ids[0]).unwrap().lies_told = 2;
        lobby.finish_game(game_id).unwrap();
        let created = lobby.create_game(settings(), at(900)).unwrap();
        assert_ne!(created.game_id, game_id);
        assert_eq!(lobby.game().unwrap().status, GameStatus::Waiting);
        assert_eq!(lobby.roster.get(ids[0]).unwrap().lies_told, 0);
        assert!(lobby.ledger.is_empty());
    }

    #[test]
    fn start_requires_minimum_players_without_mutating() {
        let (mut lobby, game_id, _) = waiting_lobby(2);
        let before = lobby.clone();
        assert_eq!(
            lobby.start_game(game_id, 3, &mut rng(), at(200)),
            Err(GameRuleError::InsufficientPlayers {
                required: 3,
                actual: 2
            })
        );
        assert_eq!(lobby, before);
    }

    #[test]
    fn start_with_wrong_id_is_not_found() {
        let (mut lobby, _, _) = waiting_lobby(3);
        let other = Uuid::new_v4();
        assert_eq!(
            lobby.start_game(other, 3, &mut rng(), at(200)),
            Err(GameRuleError::GameNotFound(other))
        );
    }

    #[test]
    fn start_deals_distinct_symbols_and_opens_round_one() {
        let (lobby, _, ids) = active_lobby(4);
        let game = lobby.game().unwrap();
        assert_eq!(game.status, GameStatus::Active);
        assert_eq!(game.current_round, 1);
        assert_eq!(game.time_remaining_in_round(at(230)), 30);

        let mut suits: Vec<Suit> = ids.iter().map(|id| suit_of(&lobby, *id)).collect();
        suits.sort_by_key(|s| s.symbol());
        suits.dedup();
        assert_eq!(suits.len(), 4);
    }

    #[test]
    fn one_lie_in_round_one_scores_the_teller() {
        let (mut lobby, game_id, ids) = active_lobby(3);
        let (teller, receiver) = (ids[0], ids[1]);
        for id in &ids {
            let suit = suit_of(&lobby, *id);
            lobby.choose_symbol(*id, suit, at(210)).unwrap();
        }
        let wrong = crate::state::suit::SUITS
            .into_iter()
            .find(|s| *s != suit_of(&lobby, receiver))
            .unwrap();
        lobby
            .record_communication(receiver, teller, wrong, at(220))
            .unwrap();

        let advance = lobby
            .advance_round(game_id, Some(1), &mut rng(), at(260))
            .unwrap();

        assert_eq!(advance.current_round, 2);
        assert_eq!(advance.assignments.len(), 3);
        let t = lobby.roster.get(teller).unwrap();
        assert_eq!((t.lies_told, t.truths_told, t.karma_score), (1, 0, 4));
        assert!(advance.report.symbol_deaths.is_empty());
        assert!(!advance.end_condition_met);
        assert!(lobby.roster.iter().all(|p| p.chosen_symbol.is_none()));
        assert!(lobby.ledger.is_empty());
    }

    #[test]
    fn stale_advance_is_rejected_without_rescoring() {
        let (mut lobby, game_id, ids) = active_lobby(3);
        lobby
            .advance_round(game_id, Some(1), &mut rng(), at(260))
            .unwrap();
        let snapshot = lobby.clone();
        assert_eq!(
            lobby.advance_round(game_id, Some(1), &mut rng(), at(261)),
            Err(GameRuleError::InvalidRound(1))
        );
        assert_eq!(lobby, snapshot);
        // Nobody guessed in round 1, so everybody died on the symbol check.
        assert!(ids.iter().all(|id| lobby.roster.get(*id).unwrap().is_dead()));
        assert!(lobby.end_condition_met());
    }

    #[test]
    fn communications_need_an_active_game_and_two_parties() {
        let (mut lobby, _, ids) = waiting_lobby(3);
        assert_eq!(
            lobby.record_communication(ids[0], ids[1], Suit::Clubs, at(150)),
            Err(GameRuleError::NoActiveGame)
        );

        let (mut lobby, _, ids) = active_lobby(3);
        assert_eq!(
            lobby.record_communication(ids[0], ids[0], Suit::Clubs, at(210)),
            Err(GameRuleError::Ledger(LedgerError::SelfReport))
        );
        let stranger = Uuid::new_v4();
        assert_eq!(
            lobby.record_communication(ids[0], stranger, Suit::Clubs, at(210)),
            Err(GameRuleError::UnknownPlayer(stranger))
        );
        assert_eq!(
            lobby.record_communication(ids[0], ids[1], Suit::Clubs, at(210)),
            Ok(RecordOutcome::Created)
        );
        assert_eq!(
            lobby.record_communication(ids[0], ids[1], Suit::Hearts, at(211)),
            Ok(RecordOutcome::Updated)
        );

        let (round, received) = lobby.received_communications(ids[0], None).unwrap();
        assert_eq!(round, 1);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].told_symbol, Suit::Hearts);
    }

    #[test]
    fn dead_players_cannot_choose() {
        let (mut lobby, _, ids) = active_lobby(3);
        lobby
            .roster
            .require_mut(ids[2])
            .unwrap()
            .kill(DeathReason::KarmaDepleted);
        assert_eq!(
            lobby.choose_symbol(ids[2], Suit::Clubs, at(210)),
            Err(GameRuleError::PlayerEliminated(ids[2]))
        );
    }

    #[test]
    fn pause_and_resume_guard_state() {
        let (mut lobby, game_id, _) = active_lobby(3);
        lobby.pause_round(game_id, at(210)).unwrap();
        assert_eq!(
            lobby.pause_round(game_id, at(211)),
            Err(GameRuleError::AlreadyPaused)
        );
        lobby.resume_round(game_id, at(240)).unwrap();
        assert_eq!(
            lobby.resume_round(game_id, at(241)),
            Err(GameRuleError::NotPaused)
        );
        assert_eq!(
            lobby.game().unwrap().time_remaining_in_round(at(240)),
            50
        );
    }

    #[test]
    fn roster_changes_are_locked_while_active() {
        let (mut lobby, _, ids) = active_lobby(3);
        assert!(matches!(
            lobby.leave_game(ids[0], at(210)),
            Err(GameRuleError::InvalidTransition { .. })
        ));
        let late = lobby.register_player("late", at(210)).unwrap().id;
        assert!(lobby.join_game(late, at(211)).is_err());
    }

    #[test]
    fn finishing_resolves_and_stores_the_winner() {
        let (mut lobby, game_id, ids) = active_lobby(3);
        lobby
            .roster
            .require_mut(ids[2])
            .unwrap()
            .kill(DeathReason::WrongSymbol);
        lobby.roster.require_mut(ids[0]).unwrap().lies_told = 3;

        let result = lobby.finish_game(game_id).unwrap();
        assert_eq!(result.outcome, Outcome::MoreInteractions);
        assert!(result.is_winner(ids[0]));
        assert_eq!(lobby.result(), Some(&result));
        assert!(lobby.finish_game(game_id).is_err());
        assert!(lobby.active_game().is_none());
    }

    #[test]
    fn karma_override_can_eliminate() {
        let (mut lobby, _, ids) = active_lobby(3);
        lobby.roster.require_mut(ids[0]).unwrap().karma_score = 1;
        assert_eq!(lobby.adjust_karma(ids[0], KarmaAdjustment::Decrease), Ok(true));
        assert_eq!(lobby.adjust_karma(ids[0], KarmaAdjustment::Increase), Ok(false));
        assert_eq!(lobby.roster.get(ids[0]).unwrap().karma_score, 1);
    }
}
