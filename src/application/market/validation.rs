//! Request validation for market operations.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Amount, Market, MarketId, MarketLabels, Outcome, Resolution};
use crate::error::{MarketError, Result};

pub const MAX_TITLE_LEN: usize = 160;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_LABEL_LEN: usize = 20;

/// Trimmed title of 1-160 characters.
pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(MarketError::InvalidQuestionLength { len }.into());
    }
    Ok(title.to_string())
}

pub fn validate_description(raw: &str) -> Result<String> {
    let description = raw.trim();
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(MarketError::InvalidDescriptionLength { len }.into());
    }
    Ok(description.to_string())
}

fn normalize_label(raw: &str, default: &str, side: &str) -> Result<String> {
    let label = raw.trim();
    if label.is_empty() {
        return Ok(default.to_string());
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(MarketError::InvalidLabel {
            reason: format!("{side} label must be at most {MAX_LABEL_LEN} characters"),
        }
        .into());
    }
    Ok(label.to_string())
}

/// Empty labels fall back to `YES`/`NO`.
pub fn validate_labels(yes: &str, no: &str) -> Result<MarketLabels> {
    Ok(MarketLabels {
        yes: normalize_label(yes, MarketLabels::DEFAULT_YES, "yes")?,
        no: normalize_label(no, MarketLabels::DEFAULT_NO, "no")?,
    })
}

/// The deadline must be strictly later than `now + minimum`.
pub fn validate_resolution_time(
    resolution_at: DateTime<Utc>,
    now: DateTime<Utc>,
    minimum: Duration,
    minimum_hours: f64,
) -> Result<()> {
    let earliest = now.checked_add_signed(minimum);
    if earliest.map_or(true, |earliest| resolution_at <= earliest) {
        return Err(MarketError::InvalidResolutionTime {
            min_hours: minimum_hours.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Deadline `hours` from `now`, for callers that take a relative horizon.
pub fn deadline_after_hours(now: DateTime<Utc>, hours: f64) -> Result<DateTime<Utc>> {
    let millis = (hours * 3_600_000.0).round();
    let deadline = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
        Duration::try_milliseconds(millis as i64).and_then(|d| now.checked_add_signed(d))
    } else {
        None
    };
    deadline.ok_or_else(|| {
        MarketError::InvalidInput {
            reason: format!("{hours} hours from now is not a representable time"),
        }
        .into()
    })
}

pub fn parse_outcome(raw: &str) -> Result<Outcome> {
    raw.parse::<Outcome>().map_err(|err| {
        MarketError::InvalidOutcome {
            input: err.input().to_string(),
        }
        .into()
    })
}

/// Accepts YES, NO and N/A (or NA), case-insensitive.
pub fn parse_resolution(raw: &str) -> Result<Resolution> {
    raw.parse::<Resolution>().map_err(|_| {
        MarketError::InvalidInput {
            reason: format!("resolution must be YES, NO or N/A, got '{}'", raw.trim()),
        }
        .into()
    })
}

pub fn ensure_positive_amount(amount: Amount) -> Result<()> {
    if amount <= 0 {
        return Err(MarketError::InvalidInput {
            reason: format!("amount must be positive, got {amount}"),
        }
        .into());
    }
    Ok(())
}

/// Bets and sales are accepted only while the market is active.
pub fn ensure_tradeable(market: &Market, now: DateTime<Utc>) -> Result<()> {
    if market.is_resolved() {
        return Err(MarketError::AlreadyResolved { id: market.id }.into());
    }
    if now >= market.resolution_at {
        return Err(MarketError::MarketClosed { id: market.id }.into());
    }
    Ok(())
}

/// Market id as received from a caller, before it is known to be valid.
pub fn parse_market_id(raw: i64) -> Result<MarketId> {
    if raw <= 0 || raw > i64::from(u32::MAX) {
        return Err(MarketError::InvalidInput {
            reason: format!("market id must be between 1 and {}, got {raw}", u32::MAX),
        }
        .into());
    }
    Ok(MarketId::new(raw as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn title_bounds() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert_eq!(validate_title("  Will it rain?  ").unwrap(), "Will it rain?");
        assert!(validate_title(&"x".repeat(160)).is_ok());
        assert!(matches!(
            validate_title(&"x".repeat(161)),
            Err(Error::Market(MarketError::InvalidQuestionLength { len: 161 }))
        ));
    }

    #[test]
    fn description_may_be_empty() {
        assert_eq!(validate_description("").unwrap(), "");
        assert!(validate_description(&"d".repeat(2000)).is_ok());
        assert!(validate_description(&"d".repeat(2001)).is_err());
    }

    #[test]
    fn labels_trim_and_default() {
        let labels = validate_labels("  ", " Rain ").unwrap();
        assert_eq!(labels.yes, "YES");
        assert_eq!(labels.no, "Rain");
        assert!(matches!(
            validate_labels(&"y".repeat(21), ""),
            Err(Error::Market(MarketError::InvalidLabel { .. }))
        ));
    }

    #[test]
    fn resolution_time_is_strictly_after_minimum() {
        let min = Duration::hours(1);
        assert!(validate_resolution_time(now() + min, now(), min, 1.0).is_err());
        assert!(validate_resolution_time(now() + min + Duration::seconds(1), now(), min, 1.0).is_ok());
    }

    #[test]
    fn unrepresentable_minimum_is_rejected() {
        let huge = Duration::try_milliseconds(i64::MAX).unwrap();
        assert!(matches!(
            validate_resolution_time(now() + Duration::days(1), now(), huge, 1e12),
            Err(Error::Market(MarketError::InvalidResolutionTime { .. }))
        ));
    }

    #[test]
    fn relative_deadlines_are_checked() {
        assert_eq!(
            deadline_after_hours(now(), 1.5).unwrap(),
            now() + Duration::minutes(90)
        );
        for hours in [1e15, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                deadline_after_hours(now(), hours),
                Err(Error::Market(MarketError::InvalidInput { .. }))
            ));
        }
    }

    #[test]
    fn market_id_must_fit_u32() {
        assert!(parse_market_id(0).is_err());
        assert!(parse_market_id(-3).is_err());
        assert_eq!(parse_market_id(7).unwrap(), MarketId::new(7));
        assert!(parse_market_id(i64::from(u32::MAX)).is_ok());
        assert!(parse_market_id(i64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn outcomes_and_resolutions_parse_at_the_boundary() {
        assert_eq!(parse_outcome("yes").unwrap(), Outcome::Yes);
        assert!(matches!(
            parse_outcome("N/A"),
            Err(Error::Market(MarketError::InvalidOutcome { .. }))
        ));
        assert_eq!(parse_resolution("n/a").unwrap(), Resolution::NotApplicable);
        assert!(matches!(
            parse_resolution("maybe"),
            Err(Error::Market(MarketError::InvalidInput { .. }))
        ));
    }
}
