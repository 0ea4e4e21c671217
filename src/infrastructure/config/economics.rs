//! Economic parameters as they appear in the configuration file.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::economics::MAX_MINIMUM_FUTURE_HOURS;
use crate::application::Economics;
use crate::domain::{Amount, SeedParameters};
use crate::error::{ConfigError, Result};

/// `[economics]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EconomicsConfig {
    #[serde(default)]
    pub market_creation: MarketCreationConfig,
    #[serde(default)]
    pub market_incentives: MarketIncentivesConfig,
    #[serde(default)]
    pub user: UserEconomicsConfig,
    #[serde(default)]
    pub betting: BettingConfig,
}

/// Seeds of every new market.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketCreationConfig {
    #[serde(default = "default_initial_probability")]
    pub initial_market_probability: f64,
    #[serde(default = "default_subsidization")]
    pub initial_market_subsidization: Amount,
    /// Derived from probability and subsidy when both sides are omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_market_yes: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_market_no: Option<Amount>,
}

const fn default_initial_probability() -> f64 {
    0.5
}

const fn default_subsidization() -> Amount {
    10
}

impl Default for MarketCreationConfig {
    fn default() -> Self {
        Self {
            initial_market_probability: default_initial_probability(),
            initial_market_subsidization: default_subsidization(),
            initial_market_yes: None,
            initial_market_no: None,
        }
    }
}

impl MarketCreationConfig {
    /// Resolve the YES/NO split. A single given side fixes the other as the
    /// remainder of the subsidy.
    pub fn seeds(&self) -> Result<SeedParameters> {
        let p = self.initial_market_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(invalid(
                "initial_market_probability",
                "must be between 0 and 1",
            ));
        }
        let total = self.initial_market_subsidization;
        non_negative("initial_market_subsidization", total)?;

        let (yes, no) = match (self.initial_market_yes, self.initial_market_no) {
            (Some(yes), Some(no)) => (yes, no),
            (Some(yes), None) => (yes, total - yes),
            (None, Some(no)) => (total - no, no),
            (None, None) => {
                let yes = (p * total as f64).round() as Amount;
                (yes, total - yes)
            }
        };
        non_negative("initial_market_yes", yes)?;
        non_negative("initial_market_no", no)?;
        if yes + no != total {
            return Err(invalid(
                "initial_market_yes",
                "initial_market_yes + initial_market_no must equal initial_market_subsidization",
            ));
        }

        Ok(SeedParameters {
            initial_probability: p,
            initial_yes: yes,
            initial_no: no,
        })
    }
}

/// Creation cost and trader incentives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketIncentivesConfig {
    #[serde(default = "default_create_market_cost")]
    pub create_market_cost: Amount,
    #[serde(default = "default_trader_bonus")]
    pub trader_bonus: Amount,
}

const fn default_create_market_cost() -> Amount {
    10
}

const fn default_trader_bonus() -> Amount {
    1
}

impl Default for MarketIncentivesConfig {
    fn default() -> Self {
        Self {
            create_market_cost: default_create_market_cost(),
            trader_bonus: default_trader_bonus(),
        }
    }
}

/// Account opening and credit line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserEconomicsConfig {
    #[serde(default)]
    pub initial_account_balance: Amount,
    #[serde(default = "default_maximum_debt")]
    pub maximum_debt_allowed: Amount,
}

const fn default_maximum_debt() -> Amount {
    500
}

impl Default for UserEconomicsConfig {
    fn default() -> Self {
        Self {
            initial_account_balance: 0,
            maximum_debt_allowed: default_maximum_debt(),
        }
    }
}

/// Bet sizing and fees.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BettingConfig {
    #[serde(default = "default_minimum_bet")]
    pub minimum_bet: Amount,
    #[serde(default = "default_initial_bet_fee")]
    pub initial_bet_fee: Amount,
    #[serde(default)]
    pub each_bet_fee: Amount,
    #[serde(default)]
    pub sell_shares_fee: Amount,
}

const fn default_minimum_bet() -> Amount {
    1
}

const fn default_initial_bet_fee() -> Amount {
    1
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self {
            minimum_bet: default_minimum_bet(),
            initial_bet_fee: default_initial_bet_fee(),
            each_bet_fee: 0,
            sell_shares_fee: 0,
        }
    }
}

/// `[market_policy]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketPolicyConfig {
    #[serde(default = "default_minimum_future_hours")]
    pub minimum_future_hours: f64,
    /// Dust cap per sale. Fractional values such as `0.5` are allowed.
    #[serde(default)]
    pub max_dust_per_sale: f64,
}

const fn default_minimum_future_hours() -> f64 {
    1.0
}

impl Default for MarketPolicyConfig {
    fn default() -> Self {
        Self {
            minimum_future_hours: default_minimum_future_hours(),
            max_dust_per_sale: 0.0,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

fn non_negative(field: &'static str, value: Amount) -> Result<()> {
    if value < 0 {
        return Err(invalid(field, "must be 0 or greater"));
    }
    Ok(())
}

impl EconomicsConfig {
    /// Validate and assemble the values the services run with.
    pub fn to_economics(&self, policy: &MarketPolicyConfig) -> Result<Economics> {
        let seeds = self.market_creation.seeds()?;

        non_negative("create_market_cost", self.market_incentives.create_market_cost)?;
        non_negative("trader_bonus", self.market_incentives.trader_bonus)?;
        non_negative("initial_account_balance", self.user.initial_account_balance)?;
        non_negative("maximum_debt_allowed", self.user.maximum_debt_allowed)?;
        non_negative("initial_bet_fee", self.betting.initial_bet_fee)?;
        non_negative("each_bet_fee", self.betting.each_bet_fee)?;
        non_negative("sell_shares_fee", self.betting.sell_shares_fee)?;
        if self.betting.minimum_bet < 1 {
            return Err(invalid("minimum_bet", "must be at least 1"));
        }
        if !(0.0..=MAX_MINIMUM_FUTURE_HOURS).contains(&policy.minimum_future_hours) {
            return Err(invalid(
                "minimum_future_hours",
                &format!("must be between 0 and {MAX_MINIMUM_FUTURE_HOURS}"),
            ));
        }
        let max_dust_per_sale = Decimal::from_f64(policy.max_dust_per_sale)
            .filter(|cap| *cap >= Decimal::ZERO)
            .ok_or_else(|| invalid("max_dust_per_sale", "must be 0 or greater"))?;

        Ok(Economics {
            seeds,
            create_market_cost: self.market_incentives.create_market_cost,
            trader_bonus: self.market_incentives.trader_bonus,
            initial_account_balance: self.user.initial_account_balance,
            maximum_debt_allowed: self.user.maximum_debt_allowed,
            minimum_bet: self.betting.minimum_bet,
            initial_bet_fee: self.betting.initial_bet_fee,
            each_bet_fee: self.betting.each_bet_fee,
            sell_shares_fee: self.betting.sell_shares_fee,
            minimum_future_hours: policy.minimum_future_hours,
            max_dust_per_sale,
        })
    }
}
