//! Bet records.
//!
//! Bets form an append-only log per market. A negative amount records a
//! sale of previously accumulated shares.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BetId, MarketId, Username};
use super::money::Amount;
use super::outcome::Outcome;

/// An immutable, persisted bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub market_id: MarketId,
    pub username: Username,
    /// Positive for a buy, negative for a sale.
    pub amount: Amount,
    pub outcome: Outcome,
    pub placed_at: DateTime<Utc>,
}

impl Bet {
    #[must_use]
    pub const fn is_sale(&self) -> bool {
        self.amount < 0
    }
}

/// A bet to insert. Storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBet {
    pub market_id: MarketId,
    pub username: Username,
    pub amount: Amount,
    pub outcome: Outcome,
    pub placed_at: DateTime<Utc>,
}

impl NewBet {
    #[must_use]
    pub fn into_bet(self, id: BetId) -> Bet {
        Bet {
            id,
            market_id: self.market_id,
            username: self.username,
            amount: self.amount,
            outcome: self.outcome,
            placed_at: self.placed_at,
        }
    }
}

/// Order bets by placement time, breaking ties by insertion id.
pub fn sort_chronologically(bets: &mut [Bet]) {
    bets.sort_by(|a, b| a.placed_at.cmp(&b.placed_at).then(a.id.cmp(&b.id)));
}

/// Total market volume `V = Σ |amount|`, sales included.
#[must_use]
pub fn total_volume(bets: &[Bet]) -> Amount {
    bets.iter().map(|bet| bet.amount.abs()).sum()
}
