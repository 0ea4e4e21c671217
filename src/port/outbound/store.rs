//! Persistence ports for users, markets, bets and the ledger.
//!
//! Every method that changes money is a single atomic unit: either all of
//! its writes commit or none do. Methods taking a `plan` closure run it
//! inside the unit, against the market and bet log as they are at that
//! moment, so lifecycle and holdings checks cannot race a concurrent bet
//! or resolution on the same market.
//!
//! Mutating methods check their [`CancelToken`] inside the unit right
//! before committing and fail with `Error::Cancelled` without writing.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::domain::{
    BalanceMutation, Bet, LedgerEntry, Market, MarketId, MarketLabels, NewBet, NewMarket, NewUser,
    Resolution, StatusFilter, User, Username,
};
use crate::error::Result;
use crate::port::inbound::CancelToken;

/// Filters for market listings.
#[derive(Debug, Clone)]
pub struct MarketQuery {
    pub status: StatusFilter,
    pub created_by: Option<Username>,
    pub limit: usize,
    pub offset: usize,
    /// Reference time for deriving `closed`.
    pub now: DateTime<Utc>,
}

/// Case-insensitive substring search over title and description.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub status: StatusFilter,
    pub limit: usize,
    pub offset: usize,
    pub now: DateTime<Utc>,
}

/// What a bet-appending unit writes.
#[derive(Debug, Clone)]
pub struct BetPlan {
    pub bet: NewBet,
    /// Wallet change paired with the bet, if any.
    pub mutation: Option<BalanceMutation>,
}

/// Committed result of [`BetStore::append_bet`].
#[derive(Debug, Clone)]
pub struct BetReceipt {
    pub bet: Bet,
    pub entry: Option<LedgerEntry>,
}

/// What a settlement unit writes.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub resolution: Resolution,
    pub resolved_at: DateTime<Utc>,
    pub credits: Vec<BalanceMutation>,
}

/// Committed result of [`MarketStore::settle_market`].
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub market: Market,
    pub entries: Vec<LedgerEntry>,
}

/// User accounts and their ledger.
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails if the handle is taken.
    fn insert_user(
        &self,
        user: NewUser,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<User>> + Send;

    /// Fetch an account by handle.
    fn user(&self, username: &Username) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Read the balance, check the mutation's floor, write the new balance
    /// and append the ledger entry.
    fn apply_mutation(
        &self,
        mutation: BalanceMutation,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<LedgerEntry>> + Send;

    /// Ledger entries of a user, oldest first.
    fn ledger(&self, username: &Username) -> impl Future<Output = Result<Vec<LedgerEntry>>> + Send;
}

/// Markets and their lifecycle.
pub trait MarketStore: Send + Sync {
    /// Charge the creation fee and insert the market together.
    fn insert_market(
        &self,
        market: NewMarket,
        fee: Option<BalanceMutation>,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<(Market, Option<LedgerEntry>)>> + Send;

    /// Fetch a market by id.
    fn market(&self, id: MarketId) -> impl Future<Output = Result<Option<Market>>> + Send;

    /// Replace a market's labels. Returns false if the market is absent.
    fn update_labels(
        &self,
        id: MarketId,
        labels: MarketLabels,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Markets matching the query, newest first.
    fn list_markets(&self, query: &MarketQuery) -> impl Future<Output = Result<Vec<Market>>> + Send;

    /// Markets whose title or description contains the text, newest first.
    fn search_markets(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Market>>> + Send;

    /// Delete a market that has no bets. Returns false if absent.
    fn delete_market(
        &self,
        id: MarketId,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Resolve a market and apply its credits as one unit.
    fn settle_market<F>(
        &self,
        id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> impl Future<Output = Result<SettlementReceipt>> + Send
    where
        F: FnOnce(&Market, &[Bet]) -> Result<Settlement> + Send;
}

/// The append-only bet log.
pub trait BetStore: Send + Sync {
    /// Bets of a market ordered by placement time, then insertion id.
    fn bets(&self, market_id: MarketId) -> impl Future<Output = Result<Vec<Bet>>> + Send;

    /// Append a bet and apply its wallet change as one unit.
    fn append_bet<F>(
        &self,
        market_id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> impl Future<Output = Result<BetReceipt>> + Send
    where
        F: FnOnce(&Market, &[Bet]) -> Result<BetPlan> + Send;
}

/// Everything the services need from storage.
pub trait Store: UserStore + MarketStore + BetStore {}

impl<T: UserStore + MarketStore + BetStore> Store for T {}
