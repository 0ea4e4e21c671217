//! Divergence-Based Payout Model (DBPM).
//!
//! Turns a bet history plus its WPAM curve into integer share holdings, and
//! on resolution into payouts that sum to the market volume exactly.
//!
//! Pipeline:
//!
//! 1. Split the volume `V` into a YES pool `round(V * R)` and a NO pool
//!    `round(V * (1 - R))`, `R` being the final probability.
//! 2. Course payout per bet: `|R - p_i| * |a_i|`.
//! 3. Per-side normalization factor `min(1, pool / Σ course)`.
//! 4. Scaled payout `round(course * factor)`.
//! 5. Excess correction so that `Σ scaled = V`.
//! 6. Per-user aggregation (sales reduce holdings), negatives clamped to 0.
//! 7. Netting: a user holds at most one side.
//!
//! The excess correction walks bets in chronological order; its result
//! depends on that order, so callers never reorder between steps.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::bet::{sort_chronologically, total_volume, Bet};
use super::id::{BetId, Username};
use super::money::{round_units, Amount, Probability, Shares};
use super::outcome::{Outcome, Resolution};
use super::probability::{current_probability, probability_at, ProbabilityPoint};

/// Integer split of the volume between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSplit {
    pub yes: Shares,
    pub no: Shares,
}

impl PoolSplit {
    #[must_use]
    pub const fn for_outcome(&self, outcome: Outcome) -> Shares {
        match outcome {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }
}

/// Per-side normalization factors, each in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationFactors {
    pub yes: f64,
    pub no: f64,
}

impl NormalizationFactors {
    #[must_use]
    pub const fn for_outcome(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }
}

/// Share computation for a single bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetShares {
    pub bet_id: BetId,
    pub username: Username,
    pub outcome: Outcome,
    pub amount: Amount,
    /// Probability recorded at the bet's timestamp.
    pub probability: Probability,
    /// Unnormalized `|R - p_i| * |a_i|`.
    pub course: f64,
    /// Scaled and excess-corrected payout.
    pub shares: Shares,
}

/// Net holdings of one user. At most one side is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShares {
    pub username: Username,
    pub yes: Shares,
    pub no: Shares,
}

impl UserShares {
    #[must_use]
    pub const fn for_outcome(&self, outcome: Outcome) -> Shares {
        match outcome {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }

    /// Side currently held, if any.
    #[must_use]
    pub const fn side(&self) -> Option<Outcome> {
        if self.yes > 0 {
            Some(Outcome::Yes)
        } else if self.no > 0 {
            Some(Outcome::No)
        } else {
            None
        }
    }
}

/// Full result of the share pipeline for a market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareAllocation {
    /// `R`, the last probability on the curve.
    pub final_probability: Probability,
    /// `V = Σ |a_i|`.
    pub volume: Amount,
    pub pool: PoolSplit,
    pub factors: NormalizationFactors,
    /// One entry per bet, in chronological order.
    pub bets: Vec<BetShares>,
    /// Net holdings per user, in order of first bet.
    pub users: Vec<UserShares>,
}

impl ShareAllocation {
    /// Net holdings of `username`.
    #[must_use]
    pub fn user(&self, username: &Username) -> Option<&UserShares> {
        self.users.iter().find(|u| &u.username == username)
    }

    /// Σ scaled payouts over all bets.
    #[must_use]
    pub fn total_scaled(&self) -> Shares {
        self.bets.iter().map(|b| b.shares).sum()
    }

    /// Σ net shares across users and sides.
    #[must_use]
    pub fn total_net_shares(&self) -> Shares {
        self.users.iter().map(|u| u.yes + u.no).sum()
    }
}

/// Step 1: split the volume between YES and NO.
///
/// With a single unit of volume the unit goes to whichever side has the
/// larger signed contribution, NO on a tie.
#[must_use]
pub fn split_pool(volume: Amount, final_probability: Probability, bets: &[Bet]) -> PoolSplit {
    if volume == 1 {
        let (yes, no) = bets.iter().fold((0, 0), |(yes, no), bet| match bet.outcome {
            Outcome::Yes => (yes + bet.amount, no),
            Outcome::No => (yes, no + bet.amount),
        });
        return if yes > no {
            PoolSplit { yes: 1, no: 0 }
        } else {
            PoolSplit { yes: 0, no: 1 }
        };
    }
    let v = volume as f64;
    PoolSplit {
        yes: round_units(v * final_probability),
        no: round_units(v * (1.0 - final_probability)),
    }
}

/// Step 3: `min(1, pool / course_sum)`, or 1 when nothing was earned.
#[must_use]
pub fn normalization_factor(pool: Shares, course_sum: f64) -> f64 {
    if course_sum <= 0.0 || !course_sum.is_finite() {
        return 1.0;
    }
    (pool as f64 / course_sum).min(1.0)
}

/// Step 5: nudge scaled payouts until they sum to `volume`.
///
/// A surplus is removed one unit at a time from the most recent positive
/// payouts; a shortfall is added one unit at a time from the oldest payout
/// onward, wrapping around as often as needed.
pub fn correct_excess(payouts: &mut [Shares], volume: Amount) {
    if payouts.is_empty() {
        return;
    }
    let mut excess: Shares = payouts.iter().sum::<Shares>() - volume;

    while excess > 0 {
        let mut changed = false;
        for payout in payouts.iter_mut().rev() {
            if excess == 0 {
                break;
            }
            if *payout > 0 {
                *payout -= 1;
                excess -= 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    if excess < 0 {
        let len = payouts.len() as Shares;
        let missing = -excess;
        let full_rounds = missing / len;
        let remainder = (missing % len) as usize;
        for (idx, payout) in payouts.iter_mut().enumerate() {
            *payout += full_rounds + Shares::from(idx < remainder);
        }
    }
}

/// Steps 6 and 7: per-user aggregation, clamp and netting.
fn aggregate(bets: &[BetShares]) -> Vec<UserShares> {
    let mut order: Vec<Username> = Vec::new();
    let mut totals: HashMap<Username, (Shares, Shares)> = HashMap::new();

    for bet in bets {
        let signed = if bet.amount < 0 { -bet.shares } else { bet.shares };
        let entry = totals.entry(bet.username.clone()).or_insert_with(|| {
            order.push(bet.username.clone());
            (0, 0)
        });
        match bet.outcome {
            Outcome::Yes => entry.0 += signed,
            Outcome::No => entry.1 += signed,
        }
    }

    order
        .into_iter()
        .map(|username| {
            let (yes, no) = totals.get(&username).copied().unwrap_or_default();
            let (yes, no) = (yes.max(0), no.max(0));
            let (yes, no) = if yes >= no { (yes - no, 0) } else { (0, no - yes) };
            UserShares { username, yes, no }
        })
        .collect()
}

/// Run the whole share pipeline on a bet history and its curve.
#[must_use]
pub fn allocate_shares(bets: &[Bet], points: &[ProbabilityPoint]) -> ShareAllocation {
    let mut ordered = bets.to_vec();
    sort_chronologically(&mut ordered);

    let final_probability = current_probability(points).unwrap_or(0.5);
    let volume = total_volume(&ordered);
    let pool = split_pool(volume, final_probability, &ordered);

    let mut shares: Vec<BetShares> = ordered
        .iter()
        .map(|bet| {
            let probability = probability_at(points, bet.placed_at).unwrap_or(final_probability);
            BetShares {
                bet_id: bet.id,
                username: bet.username.clone(),
                outcome: bet.outcome,
                amount: bet.amount,
                probability,
                course: (final_probability - probability).abs() * bet.amount.abs() as f64,
                shares: 0,
            }
        })
        .collect();

    let course_sum = |side: Outcome| -> f64 {
        shares
            .iter()
            .filter(|b| b.outcome == side)
            .map(|b| b.course)
            .sum()
    };
    let factors = NormalizationFactors {
        yes: normalization_factor(pool.yes, course_sum(Outcome::Yes)),
        no: normalization_factor(pool.no, course_sum(Outcome::No)),
    };

    let mut scaled: Vec<Shares> = shares
        .iter()
        .map(|b| round_units(b.course * factors.for_outcome(b.outcome)))
        .collect();
    correct_excess(&mut scaled, volume);
    for (bet, value) in shares.iter_mut().zip(scaled) {
        bet.shares = value;
    }

    let users = aggregate(&shares);
    ShareAllocation {
        final_probability,
        volume,
        pool,
        factors,
        bets: shares,
        users,
    }
}

/// A wallet credit owed on resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub username: Username,
    pub amount: Amount,
}

/// Payouts owed when a market resolves.
///
/// YES/NO: each holder of the winning side gets `round(w / W * V)`, and the
/// rounding leftover goes to the largest holder (earliest on ties). N/A:
/// each user gets back the net amount they put in. Zero payouts are omitted.
#[must_use]
pub fn resolution_payouts(
    allocation: &ShareAllocation,
    bets: &[Bet],
    resolution: Resolution,
) -> Vec<Payout> {
    match resolution.winning_outcome() {
        Some(outcome) => winner_payouts(allocation, outcome),
        None => refunds(bets),
    }
}

fn winner_payouts(allocation: &ShareAllocation, outcome: Outcome) -> Vec<Payout> {
    let winners: Vec<(&Username, Shares)> = allocation
        .users
        .iter()
        .map(|u| (&u.username, u.for_outcome(outcome)))
        .filter(|(_, shares)| *shares > 0)
        .collect();
    let total_winning: Shares = winners.iter().map(|(_, s)| s).sum();
    if total_winning == 0 {
        return Vec::new();
    }

    let volume = allocation.volume as f64;
    let mut amounts: Vec<Amount> = winners
        .iter()
        .map(|(_, shares)| round_units(*shares as f64 / total_winning as f64 * volume))
        .collect();

    let mut leftover = allocation.volume - amounts.iter().sum::<Amount>();
    // Largest holders first, ties by first-bet order (stable sort).
    let mut by_size: Vec<usize> = (0..winners.len()).collect();
    by_size.sort_by(|&a, &b| winners[b].1.cmp(&winners[a].1));

    if leftover > 0 {
        amounts[by_size[0]] += leftover;
    } else {
        for &idx in &by_size {
            if leftover == 0 {
                break;
            }
            let take = (-leftover).min(amounts[idx]);
            amounts[idx] -= take;
            leftover += take;
        }
    }

    winners
        .iter()
        .zip(amounts)
        .filter(|(_, amount)| *amount > 0)
        .map(|((username, _), amount)| Payout {
            username: (*username).clone(),
            amount,
        })
        .collect()
}

fn refunds(bets: &[Bet]) -> Vec<Payout> {
    let mut order: Vec<&Username> = Vec::new();
    let mut net: HashMap<&Username, Amount> = HashMap::new();
    for bet in bets {
        let entry = net.entry(&bet.username).or_insert_with(|| {
            order.push(&bet.username);
            0
        });
        *entry += bet.amount;
    }
    order
        .into_iter()
        .filter_map(|username| {
            let amount = net.get(username).copied().unwrap_or_default();
            (amount > 0).then(|| Payout {
                username: username.clone(),
                amount,
            })
        })
        .collect()
}

/// Residual between cumulative signed volume and the net shares accounted
/// for. Reported as a market metric, never distributed.
#[must_use]
pub fn share_residual(bets: &[Bet], allocation: &ShareAllocation) -> Amount {
    let signed: Amount = bets.iter().map(|b| b.amount).sum();
    (signed - allocation.total_net_shares()).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::MarketId;
    use crate::domain::market::SeedParameters;
    use crate::domain::probability::probability_timeline;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn bet(id: u64, user: &str, minutes: i64, amount: Amount, outcome: Outcome) -> Bet {
        Bet {
            id: BetId::new(id),
            market_id: MarketId::new(1),
            username: Username::new(user),
            amount,
            outcome,
            placed_at: t0() + Duration::minutes(minutes),
        }
    }

    fn allocate(bets: &[Bet]) -> ShareAllocation {
        let points = probability_timeline(t0(), &SeedParameters::default(), bets);
        allocate_shares(bets, &points)
    }

    fn scenario_bets() -> Vec<Bet> {
        vec![
            bet(1, "alice", 1, 20, Outcome::No),
            bet(2, "bob", 2, 10, Outcome::Yes),
            bet(3, "carol", 3, 10, Outcome::Yes),
        ]
    }

    #[test]
    fn worked_example_pipeline() {
        let allocation = allocate(&scenario_bets());

        assert_eq!(allocation.volume, 40);
        assert_eq!(allocation.pool, PoolSplit { yes: 20, no: 20 });
        assert_eq!(allocation.factors.yes, 1.0);
        assert_eq!(allocation.factors.no, 1.0);
        assert!((allocation.bets[0].course - 10.0).abs() < 1e-9);
        assert!((allocation.bets[1].course - 10.0 / 6.0).abs() < 1e-9);
        assert!(allocation.bets[2].course.abs() < 1e-9);

        // Scaled [10, 2, 0], shortfall 28 spread from the oldest bet.
        let shares: Vec<Shares> = allocation.bets.iter().map(|b| b.shares).collect();
        assert_eq!(shares, vec![20, 11, 9]);
        assert_eq!(allocation.total_scaled(), 40);
    }

    #[test]
    fn worked_example_yes_resolution_pays_volume() {
        let bets = scenario_bets();
        let allocation = allocate(&bets);
        let payouts = resolution_payouts(&allocation, &bets, Resolution::Yes);

        let total: Amount = payouts.iter().map(|p| p.amount).sum();
        assert_eq!(total, 40);
        assert_eq!(payouts.len(), 2);
        // bob 11 of 20 winning shares -> 22, carol 9 -> 18
        assert_eq!(payouts[0], Payout { username: Username::new("bob"), amount: 22 });
        assert_eq!(payouts[1], Payout { username: Username::new("carol"), amount: 18 });
    }

    #[test]
    fn no_resolution_pays_single_holder_everything() {
        let bets = scenario_bets();
        let allocation = allocate(&bets);
        let payouts = resolution_payouts(&allocation, &bets, Resolution::No);
        assert_eq!(payouts, vec![Payout { username: Username::new("alice"), amount: 40 }]);
    }

    #[test]
    fn not_applicable_refunds_face_value() {
        let bets = vec![
            bet(1, "alice", 1, 50, Outcome::Yes),
            bet(2, "bob", 2, 30, Outcome::No),
            bet(3, "carol", 3, 20, Outcome::Yes),
        ];
        let allocation = allocate(&bets);
        let payouts = resolution_payouts(&allocation, &bets, Resolution::NotApplicable);
        let amounts: Vec<Amount> = payouts.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![50, 30, 20]);
    }

    #[test]
    fn netting_leaves_one_side() {
        let bets = vec![
            bet(1, "alice", 1, 10, Outcome::Yes),
            bet(2, "alice", 2, 30, Outcome::No),
            bet(3, "bob", 3, 15, Outcome::Yes),
        ];
        let allocation = allocate(&bets);
        for user in &allocation.users {
            assert_eq!(user.yes.min(user.no), 0, "{user:?}");
            assert!(user.yes >= 0 && user.no >= 0);
        }
        assert_eq!(allocation.total_scaled(), allocation.volume);
    }

    #[test]
    fn single_unit_volume_goes_to_larger_side() {
        let yes = vec![bet(1, "a", 1, 1, Outcome::Yes)];
        assert_eq!(split_pool(1, 1.0, &yes), PoolSplit { yes: 1, no: 0 });

        let tie = vec![bet(1, "a", 1, 1, Outcome::Yes), bet(2, "b", 2, 1, Outcome::No)];
        assert_eq!(split_pool(1, 0.5, &tie), PoolSplit { yes: 0, no: 1 });
    }

    #[test]
    fn normalization_caps_at_one_and_handles_zero() {
        assert_eq!(normalization_factor(10, 0.0), 1.0);
        assert_eq!(normalization_factor(10, 5.0), 1.0);
        assert!((normalization_factor(10, 40.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn excess_surplus_trims_most_recent_positive() {
        let mut payouts = vec![3, 0, 2, 1];
        correct_excess(&mut payouts, 4);
        assert_eq!(payouts, vec![3, 0, 1, 0]);
    }

    #[test]
    fn excess_shortfall_tops_up_oldest_first() {
        let mut payouts = vec![0, 0, 0];
        correct_excess(&mut payouts, 5);
        assert_eq!(payouts, vec![2, 2, 1]);
    }

    #[test]
    fn half_boundaries_still_sum_to_volume() {
        // Courses landing on .5 multiples round up on every bet.
        let bets = vec![
            bet(1, "a", 1, 1, Outcome::No),
            bet(2, "b", 2, 1, Outcome::Yes),
            bet(3, "c", 3, 1, Outcome::No),
            bet(4, "d", 4, 1, Outcome::Yes),
        ];
        let allocation = allocate(&bets);
        assert_eq!(allocation.total_scaled(), allocation.volume);
        for resolution in [Resolution::Yes, Resolution::No] {
            let total: Amount = resolution_payouts(&allocation, &bets, resolution)
                .iter()
                .map(|p| p.amount)
                .sum();
            let winners = allocation
                .users
                .iter()
                .filter(|u| resolution.winning_outcome().is_some_and(|o| u.for_outcome(o) > 0))
                .count();
            if winners > 0 {
                assert_eq!(total, allocation.volume);
            }
        }
    }

    #[test]
    fn no_winning_shares_means_no_payouts() {
        let bets = vec![bet(1, "a", 1, 10, Outcome::Yes)];
        let allocation = allocate(&bets);
        assert!(resolution_payouts(&allocation, &bets, Resolution::No).is_empty());
    }

    #[test]
    fn sales_reduce_holdings() {
        let bets = vec![
            bet(1, "a", 1, 30, Outcome::No),
            bet(2, "b", 2, 40, Outcome::Yes),
            bet(3, "b", 3, -10, Outcome::Yes),
        ];
        let allocation = allocate(&bets);
        let b = allocation.user(&Username::new("b")).unwrap();
        let bought = allocation.bets[1].shares;
        let sold = allocation.bets[2].shares;
        assert_eq!(b.yes, (bought - sold).max(0));
        assert_eq!(allocation.total_scaled(), 80);
    }

    #[test]
    fn empty_history_allocates_nothing() {
        let allocation = allocate(&[]);
        assert_eq!(allocation.volume, 0);
        assert!(allocation.users.is_empty());
        assert_eq!(share_residual(&[], &allocation), 0);
    }
}
