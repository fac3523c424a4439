//! The four suit symbols dealt to players every round.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Secret symbol assigned to a player for the duration of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Suit {
    /// ♠
    #[serde(rename = "♠", alias = "spades")]
    Spades,
    /// ♥
    #[serde(rename = "♥", alias = "hearts")]
    Hearts,
    /// ♦
    #[serde(rename = "♦", alias = "diamonds")]
    Diamonds,
    /// ♣
    #[serde(rename = "♣", alias = "clubs")]
    Clubs,
}

/// Every suit in dealing order.
pub const SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

impl Suit {
    /// Unicode symbol shown to players.
    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }

    /// Lowercase English name, also accepted when parsing.
    pub fn name(self) -> &'static str {
        match self {
            Suit::Spades => "spades",
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
        }
    }

    /// Suit given to the `index`-th player of a cyclic deal over [`SUITS`].
    pub fn cyclic(index: usize) -> Self {
        SUITS[index % SUITS.len()]
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error returned when a string is neither a suit symbol nor a suit name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown suit symbol `{0}`")]
pub struct UnknownSuit(pub String);

impl FromStr for Suit {
    type Err = UnknownSuit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        SUITS
            .into_iter()
            .find(|suit| {
                suit.symbol() == trimmed || suit.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownSuit(value.to_string()))
    }
}
