//! Market creation, label edits and deletion.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::validation::{
    validate_description, validate_labels, validate_resolution_time, validate_title,
};
use super::{traced, MarketService};
use crate::domain::{EntryKind, Market, MarketId, NewMarket, OutcomeType, Username};
use crate::error::{Error, MarketError, Result};
use crate::port::inbound::CancelToken;
use crate::port::outbound::Store;

/// Fields of a new market as supplied by its creator.
#[derive(Debug, Clone)]
pub struct CreateMarketRequest {
    pub question_title: String,
    pub description: String,
    pub outcome_type: OutcomeType,
    pub resolution_at: DateTime<Utc>,
    /// Empty for the default `YES`.
    pub yes_label: String,
    /// Empty for the default `NO`.
    pub no_label: String,
}

impl<S: Store> MarketService<S> {
    /// Validate, charge the creation fee and persist an active market.
    pub async fn create_market(
        &self,
        request: CreateMarketRequest,
        creator: &Username,
        cancel: &CancelToken,
    ) -> Result<Market> {
        let now = self.clock.now();
        let question_title = validate_title(&request.question_title)?;
        let description = validate_description(&request.description)?;
        let labels = validate_labels(&request.yes_label, &request.no_label)?;
        validate_resolution_time(
            request.resolution_at,
            now,
            self.economics.minimum_future(),
            self.economics.minimum_future_hours,
        )?;
        self.profiles.ensure_user_exists(creator).await?;

        let fee = match self.economics.create_market_cost {
            0 => None,
            cost => Some(self.wallet.prepare_debit(
                creator,
                cost,
                self.economics.maximum_debt_allowed,
                EntryKind::Fee,
            )?),
        };

        let new_market = NewMarket {
            creator: creator.clone(),
            question_title,
            description,
            outcome_type: request.outcome_type,
            resolution_at: request.resolution_at,
            labels,
            seeds: self.economics.seeds,
            created_at: now,
        };

        let (market, _fee_entry) =
            match traced("create_market", self.store.insert_market(new_market, fee, cancel).await) {
                Ok(created) => created,
                Err(err @ Error::Wallet(_)) => {
                    warn!(user = %creator, error = %err, "Market creation rejected");
                    return Err(err);
                }
                Err(err) => return Err(err),
            };

        info!(
            market_id = %market.id,
            creator = %market.creator,
            resolution_at = %market.resolution_at,
            "Market created"
        );
        Ok(market)
    }

    /// Replace the YES/NO labels. Creator only, before resolution.
    pub async fn update_labels(
        &self,
        id: MarketId,
        caller: &Username,
        yes_label: &str,
        no_label: &str,
        cancel: &CancelToken,
    ) -> Result<Market> {
        let labels = validate_labels(yes_label, no_label)?;
        let mut market = self.load_market(id).await?;
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

        let updated = traced(
            "update_labels",
            self.store.update_labels(id, labels.clone(), cancel).await,
        )?;
        if !updated {
            return Err(MarketError::MarketNotFound { id }.into());
        }
        info!(market_id = %id, yes = %labels.yes, no = %labels.no, "Market labels updated");
        market.labels = labels;
        Ok(market)
    }

    /// Delete an unresolved market that nobody has bet on. The creation fee
    /// stays spent.
    pub async fn delete_market(
        &self,
        id: MarketId,
        caller: &Username,
        cancel: &CancelToken,
    ) -> Result<()> {
        let market = self.load_market(id).await?;
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

        if !traced("delete_market", self.store.delete_market(id, cancel).await)? {
            return Err(MarketError::MarketNotFound { id }.into());
        }
        info!(market_id = %id, "Market deleted");
        Ok(())
    }
}
