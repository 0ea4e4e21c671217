//! Wallet ledger entries and balance mutations.
//!
//! The ledger schema is the one externally visible representation that must
//! stay stable: `kind` strings, the sign convention (credits positive,
//! debits negative) and `balance` as the balance after the mutation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Username;
use super::money::Amount;

/// Reason code for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Win,
    Refund,
    Sale,
    Buy,
    Fee,
}

impl EntryKind {
    /// Stable wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Refund => "REFUND",
            Self::Sale => "SALE",
            Self::Buy => "BUY",
            Self::Fee => "FEE",
        }
    }

    /// Kinds that increase a balance.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Win | Self::Refund | Self::Sale)
    }

    /// Kinds that decrease a balance.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        !self.is_credit()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WIN" => Ok(Self::Win),
            "REFUND" => Ok(Self::Refund),
            "SALE" => Ok(Self::Sale),
            "BUY" => Ok(Self::Buy),
            "FEE" => Ok(Self::Fee),
            other => Err(format!("unknown ledger kind '{other}'")),
        }
    }
}

/// An append-only audit record of one balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub username: Username,
    /// Signed: positive for credits, negative for debits.
    pub amount: Amount,
    pub kind: EntryKind,
    /// Balance after this entry was applied.
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

/// A validated balance change waiting to be committed by storage.
///
/// Only the wallet service builds these, so anything reaching storage has
/// already passed amount and kind validation. Storage is responsible for
/// the floor check against the live balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMutation {
    username: Username,
    amount: Amount,
    kind: EntryKind,
    floor: Option<Amount>,
    at: DateTime<Utc>,
}

impl BalanceMutation {
    pub(crate) fn credit(username: Username, amount: Amount, kind: EntryKind, at: DateTime<Utc>) -> Self {
        Self {
            username,
            amount,
            kind,
            floor: None,
            at,
        }
    }

    pub(crate) fn debit(
        username: Username,
        amount: Amount,
        max_debt: Amount,
        kind: EntryKind,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            amount: -amount,
            kind,
            floor: Some(-max_debt),
            at,
        }
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Signed delta applied to the balance.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Lowest balance this mutation may leave behind, if any.
    #[must_use]
    pub const fn floor(&self) -> Option<Amount> {
        self.floor
    }

    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Balance after applying to `current`, or `None` if that would breach
    /// the floor. Equality with the floor is allowed.
    #[must_use]
    pub fn resulting_balance(&self, current: Amount) -> Option<Amount> {
        let next = current.checked_add(self.amount)?;
        match self.floor {
            Some(floor) if next < floor => None,
            _ => Some(next),
        }
    }

    /// Build the ledger entry for this mutation once committed.
    #[must_use]
    pub fn to_entry(&self, id: u64, balance: Amount) -> LedgerEntry {
        LedgerEntry {
            id,
            username: self.username.clone(),
            amount: self.amount,
            kind: self.kind,
            balance,
            created_at: self.at,
        }
    }
}
