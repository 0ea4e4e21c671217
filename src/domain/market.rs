//! Market-related domain types.
//!
//! - [`Market`] - A binary prediction market and its lifecycle
//! - [`MarketStatus`] - `active`, `closed` or `resolved`
//! - [`MarketLabels`] - Custom display labels for the YES/NO sides
//! - [`SeedParameters`] - Initial probability and pool seeds frozen at creation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MarketId, Username};
use super::money::{Amount, Probability};
use super::outcome::{Outcome, Resolution};

/// Kind of market. Only binary markets exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeType {
    #[default]
    Binary,
}

impl OutcomeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
        }
    }
}

impl FromStr for OutcomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BINARY" => Ok(Self::Binary),
            other => Err(format!("unsupported outcome type '{other}'")),
        }
    }
}

/// Lifecycle status of a market.
///
/// Transitions are `active -> closed` (deadline passes), and
/// `active | closed -> resolved` (creator verdict). Resolved is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Active,
    Closed,
    Resolved,
}

impl MarketStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown market status '{other}'")),
        }
    }
}

/// Status selector for listings: everything, or one specific status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(MarketStatus),
}

impl StatusFilter {
    /// Parse a user-supplied filter. Empty and `"all"` select everything.
    ///
    /// # Errors
    ///
    /// Returns the rejection message for an unknown status.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed.parse().map(Self::Only)
    }

    /// True when this filter names one specific status.
    #[must_use]
    pub const fn is_specific(self) -> bool {
        matches!(self, Self::Only(_))
    }

    #[must_use]
    pub fn matches(self, status: MarketStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

/// Display labels for the two sides of a binary market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLabels {
    pub yes: String,
    pub no: String,
}

impl MarketLabels {
    pub const DEFAULT_YES: &'static str = "YES";
    pub const DEFAULT_NO: &'static str = "NO";

    /// Label shown for `outcome`.
    #[must_use]
    pub fn for_outcome(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Yes => &self.yes,
            Outcome::No => &self.no,
        }
    }
}

impl Default for MarketLabels {
    fn default() -> Self {
        Self {
            yes: Self::DEFAULT_YES.to_string(),
            no: Self::DEFAULT_NO.to_string(),
        }
    }
}

/// Probability-engine seeds captured when the market is created.
///
/// Stored with the market so later configuration changes never rewrite the
/// history of existing markets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedParameters {
    /// `p0`, the probability before any bet.
    pub initial_probability: Probability,
    /// `Y0`, the initial YES contribution.
    pub initial_yes: Amount,
    /// `N0`, the initial NO contribution.
    pub initial_no: Amount,
}

impl SeedParameters {
    /// `I = Y0 + N0`.
    #[must_use]
    pub const fn subsidization(&self) -> Amount {
        self.initial_yes + self.initial_no
    }
}

impl Default for SeedParameters {
    fn default() -> Self {
        Self {
            initial_probability: 0.5,
            initial_yes: 0,
            initial_no: 0,
        }
    }
}

/// A stored binary prediction market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub creator: Username,
    pub question_title: String,
    pub description: String,
    pub outcome_type: OutcomeType,
    pub resolution_at: DateTime<Utc>,
    pub final_resolution_at: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
    pub labels: MarketLabels,
    pub seeds: SeedParameters,
    pub created_at: DateTime<Utc>,
}

impl Market {
    /// Effective status at `now`.
    ///
    /// Closure is derived from the clock rather than stored, so a market
    /// moves to `closed` the instant its deadline is reached.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> MarketStatus {
        if self.resolution.is_some() {
            MarketStatus::Resolved
        } else if now >= self.resolution_at {
            MarketStatus::Closed
        } else {
            MarketStatus::Active
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// True when `user` created this market.
    #[must_use]
    pub fn is_created_by(&self, user: &Username) -> bool {
        &self.creator == user
    }
}

/// A market to insert. Storage assigns the id.
#[derive(Debug, Clone)]
pub struct NewMarket {
    pub creator: Username,
    pub question_title: String,
    pub description: String,
    pub outcome_type: OutcomeType,
    pub resolution_at: DateTime<Utc>,
    pub labels: MarketLabels,
    pub seeds: SeedParameters,
    pub created_at: DateTime<Utc>,
}

impl NewMarket {
    /// Materialise the stored market once an id is assigned.
    #[must_use]
    pub fn into_market(self, id: MarketId) -> Market {
        Market {
            id,
            creator: self.creator,
            question_title: self.question_title,
            description: self.description,
            outcome_type: self.outcome_type,
            resolution_at: self.resolution_at,
            final_resolution_at: None,
            resolution: None,
            labels: self.labels,
            seeds: self.seeds,
            created_at: self.created_at,
        }
    }
}
