//! Buying and selling shares.

use tracing::{info, warn};

use super::validation::{ensure_positive_amount, ensure_tradeable, parse_outcome};
use super::{traced, MarketService};
use crate::domain::position::{quote_sale, share_price, SaleQuote};
use crate::domain::{
    Amount, Bet, EntryKind, Market, MarketId, MarketSnapshot, NewBet, Username,
};
use crate::error::{Error, MarketError, Result};
use crate::port::inbound::CancelToken;
use crate::port::outbound::{BetPlan, BetReceipt, Store};

/// Committed sale with its pricing.
#[derive(Debug, Clone)]
pub struct SaleReceipt {
    pub receipt: BetReceipt,
    pub quote: SaleQuote,
    pub fee: Amount,
    /// Amount credited, `proceeds - fee`.
    pub net_proceeds: Amount,
}

impl<S: Store> MarketService<S> {
    /// Stake `amount` on `outcome`. The stake and any bet fees are one BUY
    /// debit committed together with the bet.
    pub async fn place_bet(
        &self,
        market_id: MarketId,
        user: &Username,
        amount: Amount,
        outcome: &str,
        cancel: &CancelToken,
    ) -> Result<BetReceipt> {
        let outcome = parse_outcome(outcome)?;
        ensure_positive_amount(amount)?;
        if amount < self.economics.minimum_bet {
            return Err(MarketError::BetBelowMinimum {
                amount,
                minimum: self.economics.minimum_bet,
            }
            .into());
        }
        self.profiles.ensure_user_exists(user).await?;

        let now = self.clock.now();
        let economics = &self.economics;
        let wallet = &self.wallet;
        let plan = |market: &Market, bets: &[Bet]| -> Result<BetPlan> {
            ensure_tradeable(market, now)?;
            let first_buy = !bets.iter().any(|b| &b.username == user && b.amount > 0);
            let cost = economics.buy_cost(amount, first_buy).ok_or_else(|| {
                MarketError::InvalidInput {
                    reason: format!("bet amount {amount} plus fees is too large"),
                }
            })?;
            let mutation = wallet.prepare_debit(
                user,
                cost,
                economics.maximum_debt_allowed,
                EntryKind::Buy,
            )?;
            Ok(BetPlan {
                bet: NewBet {
                    market_id: market.id,
                    username: user.clone(),
                    amount,
                    outcome,
                    placed_at: now,
                },
                mutation: Some(mutation),
            })
        };

        match traced("place_bet", self.store.append_bet(market_id, cancel, plan).await) {
            Ok(receipt) => {
                info!(
                    market_id = %market_id,
                    user = %user,
                    outcome = %outcome,
                    amount,
                    bet_id = %receipt.bet.id,
                    "Bet placed"
                );
                Ok(receipt)
            }
            Err(err @ Error::Wallet(_)) => {
                warn!(market_id = %market_id, user = %user, error = %err, "Bet rejected");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Sell `units` shares of `outcome` at the current price.
    ///
    /// Records a bet of `-units`, credits `floor(units * price) - fee` and
    /// leaves the fractional remainder with the market.
    pub async fn sell_position(
        &self,
        market_id: MarketId,
        user: &Username,
        units: Amount,
        outcome: &str,
        cancel: &CancelToken,
    ) -> Result<SaleReceipt> {
        let outcome = parse_outcome(outcome)?;
        ensure_positive_amount(units)?;
        self.profiles.ensure_user_exists(user).await?;

        let now = self.clock.now();
        let economics = &self.economics;
        let wallet = &self.wallet;
        let mut priced: Option<(SaleQuote, Amount)> = None;
        let plan = |market: &Market, bets: &[Bet]| -> Result<BetPlan> {
            ensure_tradeable(market, now)?;
            let snapshot = MarketSnapshot::compute(market.created_at, &market.seeds, bets);
            let held = snapshot.position_of(user).shares_for(outcome);
            if held < units {
                return Err(MarketError::InsufficientShares {
                    requested: units,
                    held,
                }
                .into());
            }

            let quote = quote_sale(units, share_price(outcome, snapshot.probability()));
            let cap = economics.max_dust_per_sale;
            if quote.dust > cap {
                return Err(MarketError::DustCapExceeded {
                    dust: quote.dust.normalize().to_string(),
                    cap: cap.normalize().to_string(),
                }
                .into());
            }
            let fee = economics.sell_shares_fee;
            if fee > quote.proceeds {
                return Err(MarketError::SaleBelowFee {
                    proceeds: quote.proceeds,
                    fee,
                }
                .into());
            }

            let net = quote.proceeds - fee;
            let mutation = if net > 0 {
                Some(wallet.prepare_credit(user, net, EntryKind::Sale)?)
            } else {
                None
            };
            priced = Some((quote, fee));
            Ok(BetPlan {
                bet: NewBet {
                    market_id: market.id,
                    username: user.clone(),
                    amount: -units,
                    outcome,
                    placed_at: now,
                },
                mutation,
            })
        };

        let result = traced("sell_position", self.store.append_bet(market_id, cancel, plan).await);
        let receipt = match result {
            Ok(receipt) => receipt,
            Err(err @ Error::Market(MarketError::DustCapExceeded { .. })) => {
                warn!(market_id = %market_id, user = %user, error = %err, "Sale rejected");
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let (quote, fee) = priced
            .ok_or_else(|| Error::Database("store committed a sale without pricing it".into()))?;
        let net_proceeds = quote.proceeds - fee;

        info!(
            market_id = %market_id,
            user = %user,
            outcome = %outcome,
            units,
            proceeds = net_proceeds,
            dust = %quote.dust,
            "Shares sold"
        );
        Ok(SaleReceipt {
            receipt,
            quote,
            fee,
            net_proceeds,
        })
    }
}
