//! Economic parameters of the exchange.

use chrono::Duration;
use rust_decimal::Decimal;

use crate::domain::{Amount, SeedParameters};

/// Upper bound on `minimum_future_hours`: one hundred years.
pub const MAX_MINIMUM_FUTURE_HOURS: f64 = 876_000.0;

/// Every tunable that the services read, passed in at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Economics {
    /// Initial probability and YES/NO subsidy of each new market.
    pub seeds: SeedParameters,
    pub create_market_cost: Amount,
    /// Accepted from configuration; no ledger kind pays it out.
    pub trader_bonus: Amount,
    pub initial_account_balance: Amount,
    pub maximum_debt_allowed: Amount,
    pub minimum_bet: Amount,
    /// Charged on a user's first buy in a market.
    pub initial_bet_fee: Amount,
    /// Charged on every buy.
    pub each_bet_fee: Amount,
    /// Deducted from sale proceeds.
    pub sell_shares_fee: Amount,
    pub minimum_future_hours: f64,
    /// Largest fractional residue a single sale may leave behind.
    pub max_dust_per_sale: Decimal,
}

impl Economics {
    /// Minimum distance between creation and resolution deadline.
    #[must_use]
    pub fn minimum_future(&self) -> Duration {
        let hours = self.minimum_future_hours.clamp(0.0, MAX_MINIMUM_FUTURE_HOURS);
        Duration::milliseconds((hours * 3_600_000.0).round() as i64)
    }

    /// Total debited for a buy of `stake`, `None` if it overflows.
    #[must_use]
    pub fn buy_cost(&self, stake: Amount, first_buy: bool) -> Option<Amount> {
        let cost = stake.checked_add(self.each_bet_fee)?;
        if first_buy {
            cost.checked_add(self.initial_bet_fee)
        } else {
            Some(cost)
        }
    }
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            seeds: SeedParameters {
                initial_probability: 0.5,
                initial_yes: 5,
                initial_no: 5,
            },
            create_market_cost: 10,
            trader_bonus: 1,
            initial_account_balance: 0,
            maximum_debt_allowed: 500,
            minimum_bet: 1,
            initial_bet_fee: 1,
            each_bet_fee: 0,
            sell_shares_fee: 0,
            minimum_future_hours: 1.0,
            max_dust_per_sale: Decimal::ZERO,
        }
    }
}
