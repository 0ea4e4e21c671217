//! Market service: lifecycle, trading, settlement and read projections.
//!
//! The service reaches money only through the [`Wallet`] capability and
//! user identity only through [`ProfileDirectory`]. Each mutation builds
//! its wallet changes as [`BalanceMutation`](crate::domain::BalanceMutation)s
//! and hands them to a single store unit together with the market write.

mod create;
mod query;
mod resolve;
mod search;
mod trade;
pub mod validation;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::application::economics::Economics;
use crate::domain::{Market, MarketId};
use crate::error::{MarketError, Result};
use crate::port::inbound::{ProfileDirectory, Wallet};
use crate::port::outbound::{Clock, Store};

pub use create::CreateMarketRequest;
pub use query::{BetView, MarketDetails, MarketList, ProjectionRequest};
pub use resolve::ResolutionReport;
pub use search::{SearchRequest, SearchResults};
pub use trade::SaleReceipt;

pub struct MarketService<S> {
    store: Arc<S>,
    wallet: Arc<dyn Wallet>,
    profiles: Arc<dyn ProfileDirectory>,
    clock: Arc<dyn Clock>,
    economics: Economics,
}

impl<S: Store> MarketService<S> {
    pub fn new(
        store: Arc<S>,
        wallet: Arc<dyn Wallet>,
        profiles: Arc<dyn ProfileDirectory>,
        clock: Arc<dyn Clock>,
        economics: Economics,
    ) -> Self {
        Self {
            store,
            wallet,
            profiles,
            clock,
            economics,
        }
    }

    #[must_use]
    pub const fn economics(&self) -> &Economics {
        &self.economics
    }

    /// Current time on the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn load_market(&self, id: MarketId) -> Result<Market> {
        traced("load_market", self.store.market(id).await)?
            .ok_or_else(|| MarketError::MarketNotFound { id }.into())
    }
}

/// Log storage and infrastructure failures with the operation they broke.
fn traced<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if err.is_internal() {
            error!(operation, error = %err, "Storage failure");
        }
    }
    result
}
