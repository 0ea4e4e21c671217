//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Market identifier - monotonic integer assigned by storage.
///
/// The inner u64 is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(u64);

impl MarketId {
    /// Create a new `MarketId` from a u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MarketId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Bet identifier. Storage assigns these in insertion order, which is
/// also the tie-breaker for bets placed at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BetId(u64);

impl BetId {
    /// Create a new `BetId` from a u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bet-{}", self.0)
    }
}

/// Unique lowercase user handle.
///
/// [`Username::parse`] enforces the handle rules; [`Username::new`] trusts
/// its input and only lowercases it, for values read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Maximum handle length in characters.
    pub const MAX_LEN: usize = 30;

    /// Create a `Username` without validation.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_lowercase())
    }

    /// Parse and validate a user handle.
    ///
    /// Handles are 1 to 30 characters of `[a-z0-9_]` after trimming and
    /// lowercasing. Returns `None` for anything else.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_lowercase();
        let valid = !name.is_empty()
            && name.chars().count() <= Self::MAX_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        valid.then_some(Self(name))
    }

    /// Get the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Username {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_parse_lowercases_and_trims() {
        let name = Username::parse("  Alice_01 ").unwrap();
        assert_eq!(name.as_str(), "alice_01");
    }

    #[test]
    fn username_parse_rejects_invalid_handles() {
        assert!(Username::parse("").is_none());
        assert!(Username::parse("   ").is_none());
        assert!(Username::parse("has space").is_none());
        assert!(Username::parse("dash-name").is_none());
        assert!(Username::parse(&"a".repeat(31)).is_none());
    }

    #[test]
    fn username_parse_accepts_max_length() {
        assert!(Username::parse(&"a".repeat(30)).is_some());
    }

    #[test]
    fn market_id_display_is_plain_number() {
        assert_eq!(MarketId::new(42).to_string(), "42");
        assert_eq!(BetId::new(7).to_string(), "bet-7");
    }

    #[test]
    fn market_ids_order_numerically() {
        assert!(MarketId::new(2) < MarketId::new(10));
    }
}
