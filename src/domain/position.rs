//! Per-user positions and the market leaderboard.
//!
//! Positions are derived, never stored: they come from running the DBPM
//! share pipeline over the bet log as of now, then valuing the net shares
//! at the current probability.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bet::{sort_chronologically, Bet};
use super::id::Username;
use super::market::SeedParameters;
use super::money::{round_units, Amount, Probability, Shares};
use super::outcome::Outcome;
use super::payout::{allocate_shares, ShareAllocation};
use super::probability::{probability_timeline, ProbabilityPoint};

/// Price of one share of `outcome` at probability `p`.
#[must_use]
pub fn share_price(outcome: Outcome, probability: Probability) -> Probability {
    match outcome {
        Outcome::Yes => probability,
        Outcome::No => 1.0 - probability,
    }
}

/// Proceeds of selling shares at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleQuote {
    /// `shares * price`, exact.
    pub exact: Decimal,
    /// Whole units credited, `floor(exact)`.
    pub proceeds: Amount,
    /// `exact - proceeds`, retained by the market.
    pub dust: Decimal,
}

/// Quote a sale of `shares` units at `price`.
///
/// Runs in decimal arithmetic so that prices like `0.07` do not leave
/// binary-float residue in the dust.
#[must_use]
pub fn quote_sale(shares: Shares, price: Probability) -> SaleQuote {
    let price = Decimal::from_f64(price.clamp(0.0, 1.0)).unwrap_or(Decimal::ZERO);
    let exact = Decimal::from(shares) * price;
    let floor = exact.floor();
    SaleQuote {
        exact,
        proceeds: floor.to_i64().unwrap_or(0),
        dust: exact - floor,
    }
}

/// Re-quote the sale at `idx` of a chronological bet log at the
/// probability just before it. `None` for buys.
fn requote_sale(idx: usize, bet: &Bet, points: &[ProbabilityPoint]) -> Option<SaleQuote> {
    if bet.amount >= 0 {
        return None;
    }
    let before = points.get(idx).map_or(0.5, |p| p.probability);
    Some(quote_sale(-bet.amount, share_price(bet.outcome, before)))
}

/// Dust retained by the market: the fractional remainders of every sale.
///
/// `bets` must be in chronological order, matching `points`.
#[must_use]
pub fn sale_dust(bets: &[Bet], points: &[ProbabilityPoint]) -> Decimal {
    bets.iter()
        .enumerate()
        .filter_map(|(idx, bet)| requote_sale(idx, bet, points))
        .map(|quote| quote.dust)
        .sum()
}

/// A user's holdings and value in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosition {
    pub username: Username,
    pub yes_shares: Shares,
    pub no_shares: Shares,
    /// Σ of positive bet amounts.
    pub total_spent: Amount,
    /// Σ of sale proceeds, re-quoted from the curve.
    pub sales_received: Amount,
    /// Net shares valued at the current probability, rounded.
    pub current_value: Amount,
    /// `current_value - total_spent + sales_received`.
    pub profit: Amount,
    pub first_bet_at: Option<DateTime<Utc>>,
}

impl UserPosition {
    /// An empty position for a user without bets.
    #[must_use]
    pub fn empty(username: Username) -> Self {
        Self {
            username,
            yes_shares: 0,
            no_shares: 0,
            total_spent: 0,
            sales_received: 0,
            current_value: 0,
            profit: 0,
            first_bet_at: None,
        }
    }

    /// Side held, if any.
    #[must_use]
    pub const fn side(&self) -> Option<Outcome> {
        if self.yes_shares > 0 {
            Some(Outcome::Yes)
        } else if self.no_shares > 0 {
            Some(Outcome::No)
        } else {
            None
        }
    }

    /// `"YES"`, `"NO"` or empty.
    #[must_use]
    pub fn position_label(&self) -> &'static str {
        self.side().map_or("", Outcome::as_str)
    }

    #[must_use]
    pub const fn shares_for(&self, outcome: Outcome) -> Shares {
        match outcome {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }
}

#[derive(Default)]
struct Tally {
    spent: Amount,
    sales: Amount,
    first_bet_at: Option<DateTime<Utc>>,
}

/// A market snapshot: curve, shares and positions computed together.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub bets: Vec<Bet>,
    pub points: Vec<ProbabilityPoint>,
    pub allocation: ShareAllocation,
    pub positions: Vec<UserPosition>,
}

impl MarketSnapshot {
    /// Build the snapshot from a market's seeds and bet log.
    #[must_use]
    pub fn compute(created_at: DateTime<Utc>, seeds: &SeedParameters, bets: &[Bet]) -> Self {
        let mut bets = bets.to_vec();
        sort_chronologically(&mut bets);
        let points = probability_timeline(created_at, seeds, &bets);
        let allocation = allocate_shares(&bets, &points);
        let positions = positions_from(&bets, &points, &allocation);
        Self {
            bets,
            points,
            allocation,
            positions,
        }
    }

    /// Current probability.
    #[must_use]
    pub fn probability(&self) -> Probability {
        self.allocation.final_probability
    }

    /// Sale dust accumulated by the market so far.
    #[must_use]
    pub fn sale_dust(&self) -> Decimal {
        sale_dust(&self.bets, &self.points)
    }

    /// Position of `username`, empty if they never bet.
    #[must_use]
    pub fn position_of(&self, username: &Username) -> UserPosition {
        self.positions
            .iter()
            .find(|p| &p.username == username)
            .cloned()
            .unwrap_or_else(|| UserPosition::empty(username.clone()))
    }
}

/// Value every trader's net holdings at the current probability.
///
/// `bets` must be in chronological order, matching `points`.
#[must_use]
pub fn positions_from(
    bets: &[Bet],
    points: &[ProbabilityPoint],
    allocation: &ShareAllocation,
) -> Vec<UserPosition> {
    let mut tallies: HashMap<&Username, Tally> = HashMap::new();
    for (idx, bet) in bets.iter().enumerate() {
        let tally = tallies.entry(&bet.username).or_default();
        tally.first_bet_at = Some(tally.first_bet_at.map_or(bet.placed_at, |t| t.min(bet.placed_at)));
        if bet.amount > 0 {
            tally.spent += bet.amount;
        } else if let Some(quote) = requote_sale(idx, bet, points) {
            tally.sales += quote.proceeds;
        }
    }

    let p = allocation.final_probability;
    allocation
        .users
        .iter()
        .map(|shares| {
            let tally = tallies.remove(&shares.username).unwrap_or_default();
            let current_value =
                round_units(shares.yes as f64 * p + shares.no as f64 * (1.0 - p));
            UserPosition {
                username: shares.username.clone(),
                yes_shares: shares.yes,
                no_shares: shares.no,
                total_spent: tally.spent,
                sales_received: tally.sales,
                current_value,
                profit: current_value - tally.spent + tally.sales,
                first_bet_at: tally.first_bet_at,
            }
        })
        .collect()
}

/// One ranked row of a market leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub username: Username,
    pub profit: Amount,
    pub current_value: Amount,
    pub total_spent: Amount,
    pub position: String,
    pub yes_shares: Shares,
    pub no_shares: Shares,
}

/// Pagination window for leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 1000;

    /// Apply defaults (100/0) and cap the limit at 1000. A zero limit
    /// falls back to the default.
    #[must_use]
    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        let limit = match limit {
            None | Some(0) => Self::DEFAULT_LIMIT,
            Some(l) => l.min(Self::MAX_LIMIT),
        };
        Self {
            limit,
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Rank every position: profit descending, then lowest spend, then
/// earliest first bet. Ranks start at 1.
#[must_use]
pub fn ranked(positions: &[UserPosition]) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<&UserPosition> = positions.iter().collect();
    ordered.sort_by(|a, b| {
        b.profit
            .cmp(&a.profit)
            .then(a.total_spent.cmp(&b.total_spent))
            .then(a.first_bet_at.cmp(&b.first_bet_at))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(idx, p)| LeaderboardEntry {
            rank: idx + 1,
            username: p.username.clone(),
            profit: p.profit,
            current_value: p.current_value,
            total_spent: p.total_spent,
            position: p.position_label().to_string(),
            yes_shares: p.yes_shares,
            no_shares: p.no_shares,
        })
        .collect()
}

/// One page of the ranking. Ranks are assigned before paging and the
/// limit never exceeds [`Page::MAX_LIMIT`].
#[must_use]
pub fn leaderboard(positions: &[UserPosition], page: Page) -> Vec<LeaderboardEntry> {
    ranked(positions)
        .into_iter()
        .skip(page.offset)
        .take(page.limit.min(Page::MAX_LIMIT))
        .collect()
}
