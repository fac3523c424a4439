//! Record of what each player told another about that player's symbol.

use std::time::SystemTime;

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::state::suit::Suit;

/// Identity of a communication: one live statement per teller, receiver and round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    /// Player the statement is about (and who recorded it).
    pub receiver: Uuid,
    /// Player who made the statement.
    pub teller: Uuid,
    /// Round the statement belongs to.
    pub round: u32,
}

/// "`teller` told `receiver` that the receiver's symbol is `told_symbol`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Communication {
    /// Player the statement is about.
    pub receiver: Uuid,
    /// Player who made the statement.
    pub teller: Uuid,
    /// Round the statement belongs to.
    pub round: u32,
    /// Symbol the teller claimed.
    pub told_symbol: Suit,
    /// When the statement was first recorded.
    pub recorded_at: SystemTime,
    /// When the statement was last overwritten.
    pub updated_at: SystemTime,
}

impl Communication {
    /// Unique key of this statement.
    pub fn key(&self) -> LedgerKey {
        LedgerKey {
            receiver: self.receiver,
            teller: self.teller,
            round: self.round,
        }
    }
}

/// Whether [`CommunicationLedger::record`] inserted or overwrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First statement for this key.
    Created,
    /// An earlier statement was replaced.
    Updated,
}

/// Rejections raised by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A player cannot report on themselves.
    #[error("a player cannot record a statement from themselves")]
    SelfReport,
}

/// Append/overwrite log keyed by [`LedgerKey`], kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunicationLedger {
    records: IndexMap<LedgerKey, Communication>,
}

impl CommunicationLedger {
    /// Rebuild a ledger from persisted records; later duplicates win.
    pub fn from_records(records: impl IntoIterator<Item = Communication>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.key(), record))
                .collect(),
        }
    }

    /// Upsert a statement. Resubmitting the same key overwrites the symbol
    /// but keeps the original `recorded_at`.
    pub fn record(
        &mut self,
        teller: Uuid,
        receiver: Uuid,
        round: u32,
        told_symbol: Suit,
        now: SystemTime,
    ) -> Result<RecordOutcome, LedgerError> {
        if teller == receiver {
            return Err(LedgerError::SelfReport);
        }

        let key = LedgerKey {
            receiver,
            teller,
            round,
        };
        match self.records.get_mut(&key) {
            Some(existing) => {
                existing.told_symbol = told_symbol;
                existing.updated_at = now;
                Ok(RecordOutcome::Updated)
            }
            None => {
                self.records.insert(
                    key,
                    Communication {
                        receiver,
                        teller,
                        round,
                        told_symbol,
                        recorded_at: now,
                        updated_at: now,
                    },
                );
                Ok(RecordOutcome::Created)
            }
        }
    }

    /// Statements received by `receiver` during `round`, most recent first.
    pub fn query(&self, receiver: Uuid, round: u32) -> Vec<&Communication> {
        let mut received: Vec<&Communication> = self
            .records
            .values()
            .filter(|record| record.receiver == receiver && record.round == round)
            .collect();
        received.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        received
    }

    /// Every statement made during `round`, in recording order.
    pub fn records_for_round(&self, round: u32) -> impl Iterator<Item = &Communication> {
        self.records
            .values()
            .filter(move |record| record.round == round)
    }

    /// Drop statements from rounds before `round`. Returns how many were removed.
    pub fn purge_before(&mut self, round: u32) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| key.round >= round);
        before - self.records.len()
    }

    /// Drop every statement where `player` is teller or receiver.
    pub fn purge_player(&mut self, player: Uuid) -> usize {
        let before = self.records.len();
        self.records
            .retain(|key, _| key.receiver != player && key.teller != player);
        before - self.records.len()
    }

    /// Drop everything.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// All statements in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Communication> {
        self.records.values()
    }

    /// Number of live statements.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger holds no statement.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
