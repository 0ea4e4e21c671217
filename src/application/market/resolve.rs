//! Market resolution and payout settlement.

use tracing::info;

use super::validation::parse_resolution;
use super::{traced, MarketService};
use crate::domain::payout::resolution_payouts;
use crate::domain::{
    Amount, Bet, EntryKind, LedgerEntry, Market, MarketId, MarketSnapshot, Resolution, Username,
};
use crate::error::{MarketError, Result};
use crate::port::inbound::CancelToken;
use crate::port::outbound::{Settlement, Store};

/// Outcome of a committed resolution.
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub market: Market,
    pub resolution: Resolution,
    /// Total market volume at resolution.
    pub volume: Amount,
    /// One WIN or REFUND entry per credited user.
    pub credits: Vec<LedgerEntry>,
}

impl ResolutionReport {
    #[must_use]
    pub fn total_credited(&self) -> Amount {
        self.credits.iter().map(|entry| entry.amount).sum()
    }
}

impl<S: Store> MarketService<S> {
    /// Resolve a market to YES, NO or N/A and pay it out.
    ///
    /// YES/NO pays winners through the share pipeline; N/A refunds what each
    /// user put in. Status, final timestamp and every credit commit together.
    pub async fn resolve_market(
        &self,
        id: MarketId,
        outcome: &str,
        caller: &Username,
        cancel: &CancelToken,
    ) -> Result<ResolutionReport> {
        let resolution = parse_resolution(outcome)?;
        let now = self.clock.now();
        let wallet = &self.wallet;
        let mut volume = 0;

        let plan = |market: &Market, bets: &[Bet]| -> Result<Settlement> {
            if !market.is_created_by(caller) {
                return Err(MarketError::NotCreator {
                    id,
                    caller: caller.clone(),
                }
                .into());
            }
            if market.is_resolved() {
                return Err(MarketError::AlreadyResolved { id }.into());
            }

            let snapshot = MarketSnapshot::compute(market.created_at, &market.seeds, bets);
            volume = snapshot.allocation.volume;
            let kind = match resolution {
                Resolution::NotApplicable => EntryKind::Refund,
                Resolution::Yes | Resolution::No => EntryKind::Win,
            };
            let credits = resolution_payouts(&snapshot.allocation, &snapshot.bets, resolution)
                .into_iter()
                .map(|payout| wallet.prepare_credit(&payout.username, payout.amount, kind))
                .collect::<Result<Vec<_>>>()?;

            Ok(Settlement {
                resolution,
                resolved_at: now,
                credits,
            })
        };

        let receipt = traced("resolve_market", self.store.settle_market(id, cancel, plan).await)?;
        let report = ResolutionReport {
            market: receipt.market,
            resolution,
            volume,
            credits: receipt.entries,
        };

        info!(
            market_id = %id,
            resolution = %resolution,
            volume = report.volume,
            credited = report.total_credited(),
            recipients = report.credits.len(),
            "Market resolved"
        );
        Ok(report)
    }
}
