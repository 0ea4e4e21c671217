//! Monetary types for currency and probability representation.
//!
//! Currency and share counts are whole units held in signed 64-bit
//! integers. Probabilities are `f64` in `[0, 1]`.

/// Whole units of the internal currency. Never fractional.
pub type Amount = i64;

/// Integer share count.
pub type Shares = i64;

/// Probability in `[0, 1]`.
pub type Probability = f64;

/// Round to the nearest integer, halves away from zero.
///
/// Non-finite inputs map to 0 so the engines stay total.
#[must_use]
pub fn round_units(value: f64) -> Amount {
    if value.is_finite() {
        value.round() as Amount
    } else {
        0
    }
}

/// Clamp a probability into `[0, 1]`, mapping NaN to `fallback`.
#[must_use]
pub fn clamp_probability(value: f64, fallback: Probability) -> Probability {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
