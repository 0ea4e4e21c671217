//! Market search with status fallback.
//!
//! A status-filtered search that finds fewer than [`FALLBACK_THRESHOLD`]
//! markets is topped up from the same search across all statuses.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::query::parse_status;
use super::{traced, MarketService};
use crate::domain::{Market, MarketId, StatusFilter};
use crate::error::{MarketError, Result};
use crate::port::outbound::{SearchQuery, Store};

pub const MAX_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const FALLBACK_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    /// `""`/`"all"` for every status.
    pub status: String,
    /// 0 selects the default; at most 50.
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub status: String,
    pub primary: Vec<Market>,
    /// Extra matches in other statuses, never repeating a primary id.
    pub fallback: Vec<Market>,
    pub fallback_used: bool,
}

impl SearchResults {
    #[must_use]
    pub fn total(&self) -> usize {
        self.primary.len() + self.fallback.len()
    }
}

impl<S: Store> MarketService<S> {
    pub async fn search_markets(&self, request: SearchRequest) -> Result<SearchResults> {
        let text = request.query.trim();
        if text.is_empty() {
            return Err(MarketError::InvalidInput {
                reason: "search query must not be empty".into(),
            }
            .into());
        }
        let limit = match request.limit {
            0 => DEFAULT_SEARCH_LIMIT,
            l if l > MAX_SEARCH_LIMIT => {
                return Err(MarketError::InvalidInput {
                    reason: format!("search limit must be at most {MAX_SEARCH_LIMIT}"),
                }
                .into());
            }
            l => l,
        };
        let status = parse_status(&request.status)?;
        let now = self.clock.now();

        let primary_query = SearchQuery {
            text: text.to_string(),
            status,
            limit,
            offset: request.offset,
            now,
        };
        let primary = traced("search_markets", self.store.search_markets(&primary_query).await)?;

        let mut fallback = Vec::new();
        let fallback_used = primary.len() < FALLBACK_THRESHOLD && status.is_specific();
        if fallback_used {
            let seen: HashSet<MarketId> = primary.iter().map(|m| m.id).collect();
            // Over-fetch so that dropping primary ids still fills the page.
            let relaxed = SearchQuery {
                status: StatusFilter::All,
                limit: limit + seen.len(),
                offset: 0,
                ..primary_query
            };
            fallback = traced("search_markets", self.store.search_markets(&relaxed).await)?
                .into_iter()
                .filter(|m| !seen.contains(&m.id))
                .take(limit)
                .collect();
            debug!(
                query = text,
                status = %request.status.trim(),
                primary = primary.len(),
                fallback = fallback.len(),
                "Search fell back to all statuses"
            );
        }

        Ok(SearchResults {
            query: text.to_string(),
            status: request.status.trim().to_string(),
            primary,
            fallback,
            fallback_used,
        })
    }
}
