//! Bet outcomes and market resolutions.
//!
//! A bet is always on [`Outcome::Yes`] or [`Outcome::No`]. `N/A` exists only
//! as a [`Resolution`], never as a bet side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The side of a binary market a bet is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// Stable wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognised outcome or resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcomeError {
    input: String,
}

impl ParseOutcomeError {
    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseOutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown outcome '{}'", self.input)
    }
}

impl std::error::Error for ParseOutcomeError {}

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            _ => Err(ParseOutcomeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Final verdict of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Resolution {
    /// Stable wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::NotApplicable => "N/A",
        }
    }

    /// The winning bet side, if the market resolved to one.
    #[must_use]
    pub const fn winning_outcome(self) -> Option<Outcome> {
        match self {
            Self::Yes => Some(Outcome::Yes),
            Self::No => Some(Outcome::No),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(Self::Yes),
            "NO" => Ok(Self::No),
            "N/A" | "NA" => Ok(Self::NotApplicable),
            _ => Err(ParseOutcomeError {
                input: s.to_string(),
            }),
        }
    }
}

impl From<Outcome> for Resolution {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Yes => Self::Yes,
            Outcome::No => Self::No,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_parses_case_insensitively() {
        assert_eq!("yes".parse::<Outcome>().unwrap(), Outcome::Yes);
        assert_eq!(" No ".parse::<Outcome>().unwrap(), Outcome::No);
        assert!("N/A".parse::<Outcome>().is_err());
        assert!("maybe".parse::<Outcome>().is_err());
    }

    #[test]
    fn resolution_normalizes_not_applicable() {
        assert_eq!("n/a".parse::<Resolution>().unwrap(), Resolution::NotApplicable);
        assert_eq!("NA".parse::<Resolution>().unwrap(), Resolution::NotApplicable);
        assert_eq!("YES".parse::<Resolution>().unwrap(), Resolution::Yes);
    }

    #[test]
    fn resolution_reports_winning_side() {
        assert_eq!(Resolution::Yes.winning_outcome(), Some(Outcome::Yes));
        assert_eq!(Resolution::NotApplicable.winning_outcome(), None);
    }

    #[test]
    fn outcome_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Outcome::Yes).unwrap(), "\"YES\"");
        assert_eq!(
            serde_json::to_string(&Resolution::NotApplicable).unwrap(),
            "\"N/A\""
        );
    }
}
