//! Weighted Probability Adjustment Model (WPAM).
//!
//! After `k` bets the probability is `Y_k / (Y_k + N_k)`, where `Y_k` is the
//! initial YES seed plus the signed sum of YES bet amounts and `N_k` the same
//! for NO. Empty or negative pools fall back to the seed probability.
//!
//! All functions here are pure and total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bet::Bet;
use super::market::SeedParameters;
use super::money::{clamp_probability, Amount, Probability};
use super::outcome::Outcome;

/// A `(timestamp, probability)` pair on a market's curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityPoint {
    pub at: DateTime<Utc>,
    pub probability: Probability,
}

/// Running YES/NO contribution totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    pub yes: Amount,
    pub no: Amount,
}

impl Pool {
    #[must_use]
    pub const fn seeded(seeds: &SeedParameters) -> Self {
        Self {
            yes: seeds.initial_yes,
            no: seeds.initial_no,
        }
    }

    /// Add a signed contribution to one side.
    pub fn add(&mut self, outcome: Outcome, amount: Amount) {
        match outcome {
            Outcome::Yes => self.yes = self.yes.saturating_add(amount),
            Outcome::No => self.no = self.no.saturating_add(amount),
        }
    }

    /// `Y / (Y + N)` clamped to `[0, 1]`, or `fallback` when `Y + N <= 0`.
    #[must_use]
    pub fn probability(&self, fallback: Probability) -> Probability {
        let total = self.yes as f64 + self.no as f64;
        if total <= 0.0 {
            return fallback;
        }
        clamp_probability(self.yes as f64 / total, fallback)
    }
}

/// Bets in timestamp order, ties kept in input order.
fn chronological(bets: &[Bet]) -> Vec<&Bet> {
    let mut ordered: Vec<&Bet> = bets.iter().collect();
    ordered.sort_by_key(|bet| bet.placed_at);
    ordered
}

/// Compute the probability curve for a market.
///
/// The first point is always `(created_at, p0)`; each bet then adds one
/// point at its placement time. Bets stamped before `created_at` are
/// pinned to `created_at` so the curve never goes back in time.
#[must_use]
pub fn probability_timeline(
    created_at: DateTime<Utc>,
    seeds: &SeedParameters,
    bets: &[Bet],
) -> Vec<ProbabilityPoint> {
    let p0 = clamp_probability(seeds.initial_probability, 0.5);
    let mut pool = Pool::seeded(seeds);
    let mut points = Vec::with_capacity(bets.len() + 1);
    points.push(ProbabilityPoint {
        at: created_at,
        probability: p0,
    });

    for bet in chronological(bets) {
        pool.add(bet.outcome, bet.amount);
        points.push(ProbabilityPoint {
            at: bet.placed_at.max(created_at),
            probability: pool.probability(p0),
        });
    }
    points
}

/// The last probability on the curve (`R`).
#[must_use]
pub fn current_probability(points: &[ProbabilityPoint]) -> Option<Probability> {
    points.last().map(|point| point.probability)
}

/// Probability of the closest change not after `at`.
///
/// With several changes sharing `at`, the latest of them wins, so a bet's
/// own timestamp yields the probability after that bet (and any bet tied
/// with it). Times before the first point yield the first point.
#[must_use]
pub fn probability_at(points: &[ProbabilityPoint], at: DateTime<Utc>) -> Option<Probability> {
    let first = points.first()?;
    let idx = points.partition_point(|point| point.at <= at);
    if idx == 0 {
        Some(first.probability)
    } else {
        Some(points[idx - 1].probability)
    }
}

/// Result of a hypothetical bet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityProjection {
    pub current: Probability,
    pub projected: Probability,
}

/// Probability if `amount` were bet on `outcome` after `bets`.
///
/// Does not touch its inputs; calling twice yields identical results.
#[must_use]
pub fn project_probability(
    seeds: &SeedParameters,
    bets: &[Bet],
    amount: Amount,
    outcome: Outcome,
) -> ProbabilityProjection {
    let p0 = clamp_probability(seeds.initial_probability, 0.5);
    let mut pool = Pool::seeded(seeds);
    for bet in bets {
        pool.add(bet.outcome, bet.amount);
    }
    let current = pool.probability(p0);
    pool.add(outcome, amount);
    ProbabilityProjection {
        current,
        projected: pool.probability(p0),
    }
}
