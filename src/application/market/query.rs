//! Read-only market projections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::validation::{ensure_positive_amount, ensure_tradeable, parse_market_id, parse_outcome};
use super::{traced, MarketService};
use crate::domain::bet::total_volume;
use crate::domain::payout::share_residual;
use crate::domain::position::{leaderboard, ranked};
use crate::domain::probability::project_probability;
use crate::domain::{
    Amount, Bet, LeaderboardEntry, Market, MarketId, MarketSnapshot, MarketStatus, Page,
    Probability, ProbabilityPoint, ProbabilityProjection, PublicUser, StatusFilter, UserPosition,
    Username,
};
use crate::error::{MarketError, Result};
use crate::port::outbound::{MarketQuery, Store};

/// Listing filters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct MarketList {
    /// `""`/`"all"` for every status.
    pub status: String,
    pub created_by: Option<Username>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Everything shown on a market page.
#[derive(Debug, Clone, Serialize)]
pub struct MarketDetails {
    pub id: MarketId,
    pub question_title: String,
    pub description: String,
    pub status: MarketStatus,
    pub resolution_at: DateTime<Utc>,
    pub final_resolution_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub yes_label: String,
    pub no_label: String,
    pub creator: PublicUser,
    pub probability_changes: Vec<ProbabilityPoint>,
    pub last_probability: Probability,
    pub total_volume: Amount,
    pub num_traders: usize,
    /// Fractional sale proceeds kept by the market.
    pub market_dust: Decimal,
    /// Signed volume not covered by net shares.
    pub share_residual: Amount,
    pub created_at: DateTime<Utc>,
}

/// A bet with the probability right after it.
#[derive(Debug, Clone, Serialize)]
pub struct BetView {
    pub bet: Bet,
    pub probability: Probability,
}

/// A hypothetical bet to price. Raw fields are validated before use.
#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    pub market_id: i64,
    pub amount: Amount,
    pub outcome: String,
}

impl<S: Store> MarketService<S> {
    pub async fn get_market(&self, id: MarketId) -> Result<Market> {
        self.load_market(id).await
    }

    /// Status of a market as of now.
    #[must_use]
    pub fn status_of(&self, market: &Market) -> MarketStatus {
        market.status_at(self.clock.now())
    }

    /// Markets filtered by status and creator, newest first.
    pub async fn list_markets(&self, filter: MarketList) -> Result<Vec<Market>> {
        let page = Page::new(filter.limit, filter.offset);
        let query = MarketQuery {
            status: parse_status(&filter.status)?,
            created_by: filter.created_by,
            limit: page.limit,
            offset: page.offset,
            now: self.clock.now(),
        };
        traced("list_markets", self.store.list_markets(&query).await)
    }

    /// One page of markets in a status.
    pub async fn list_by_status(&self, status: &str, page: Page) -> Result<Vec<Market>> {
        self.list_markets(MarketList {
            status: status.to_string(),
            created_by: None,
            limit: Some(page.limit),
            offset: Some(page.offset),
        })
        .await
    }

    pub async fn market_details(&self, id: MarketId) -> Result<MarketDetails> {
        let market = self.load_market(id).await?;
        let bets = traced("market_details", self.store.bets(id).await)?;
        let creator = self.profiles.public_user(&market.creator).await?;
        let snapshot = MarketSnapshot::compute(market.created_at, &market.seeds, &bets);

        Ok(MarketDetails {
            id: market.id,
            status: self.status_of(&market),
            question_title: market.question_title,
            description: market.description,
            resolution_at: market.resolution_at,
            final_resolution_at: market.final_resolution_at,
            resolution: market.resolution.map(|r| r.to_string()),
            yes_label: market.labels.yes,
            no_label: market.labels.no,
            creator,
            last_probability: snapshot.probability(),
            total_volume: snapshot.allocation.volume,
            num_traders: snapshot.allocation.users.len(),
            market_dust: snapshot.sale_dust(),
            share_residual: share_residual(&snapshot.bets, &snapshot.allocation),
            probability_changes: snapshot.points,
            created_at: market.created_at,
        })
    }

    /// Bets in chronological order, each with the probability it produced.
    pub async fn market_bets(&self, id: MarketId) -> Result<Vec<BetView>> {
        let market = self.load_market(id).await?;
        let bets = traced("market_bets", self.store.bets(id).await)?;
        let snapshot = MarketSnapshot::compute(market.created_at, &market.seeds, &bets);
        Ok(snapshot
            .bets
            .into_iter()
            .zip(snapshot.points.into_iter().skip(1))
            .map(|(bet, point)| BetView {
                bet,
                probability: point.probability,
            })
            .collect())
    }

    pub async fn market_positions(&self, id: MarketId) -> Result<Vec<UserPosition>> {
        Ok(self.snapshot(id).await?.positions)
    }

    /// Leaderboard row of one user; rank 0 and zeros if they never bet.
    pub async fn user_position(&self, id: MarketId, user: &Username) -> Result<LeaderboardEntry> {
        let snapshot = self.snapshot(id).await?;
        if let Some(entry) = ranked(&snapshot.positions)
            .into_iter()
            .find(|e| &e.username == user)
        {
            return Ok(entry);
        }
        Ok(LeaderboardEntry {
            rank: 0,
            username: user.clone(),
            profit: 0,
            current_value: 0,
            total_spent: 0,
            position: String::new(),
            yes_shares: 0,
            no_shares: 0,
        })
    }

    /// `Σ |amount|` over the market's bets.
    pub async fn market_volume(&self, id: MarketId) -> Result<Amount> {
        self.load_market(id).await?;
        let bets = traced("market_volume", self.store.bets(id).await)?;
        Ok(total_volume(&bets))
    }

    /// Probability if the requested bet were placed now. Writes nothing.
    pub async fn project_probability(
        &self,
        request: ProjectionRequest,
    ) -> Result<ProbabilityProjection> {
        let id = parse_market_id(request.market_id)?;
        let outcome = parse_outcome(&request.outcome)?;
        ensure_positive_amount(request.amount)?;

        let market = self.load_market(id).await?;
        ensure_tradeable(&market, self.clock.now())?;
        let bets = traced("project_probability", self.store.bets(id).await)?;
        let projection = project_probability(&market.seeds, &bets, request.amount, outcome);
        debug!(
            market_id = %id,
            outcome = %outcome,
            amount = request.amount,
            current = projection.current,
            projected = projection.projected,
            "Probability projected"
        );
        Ok(projection)
    }

    pub async fn market_leaderboard(
        &self,
        id: MarketId,
        page: Page,
    ) -> Result<Vec<LeaderboardEntry>> {
        Ok(leaderboard(&self.snapshot(id).await?.positions, page))
    }

    async fn snapshot(&self, id: MarketId) -> Result<MarketSnapshot> {
        let market = self.load_market(id).await?;
        let bets = traced("snapshot", self.store.bets(id).await)?;
        Ok(MarketSnapshot::compute(market.created_at, &market.seeds, &bets))
    }
}

pub(super) fn parse_status(raw: &str) -> Result<StatusFilter> {
    StatusFilter::parse(raw).map_err(|reason| MarketError::InvalidInput { reason }.into())
}

