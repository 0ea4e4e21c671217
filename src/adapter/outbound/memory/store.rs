//! In-memory store.
//!
//! All state sits behind one mutex, so every method is trivially a single
//! atomic unit and bets, resolutions and wallet mutations are totally
//! ordered.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::domain::bet::sort_chronologically;
use crate::domain::{
    Amount, BalanceMutation, Bet, BetId, LedgerEntry, Market, MarketId, MarketLabels, NewMarket,
    NewUser, User, Username,
};
use crate::error::{Error, MarketError, Result, WalletError};
use crate::port::inbound::CancelToken;
use crate::port::outbound::{
    BetPlan, BetReceipt, BetStore, MarketQuery, MarketStore, SearchQuery, Settlement,
    SettlementReceipt, UserStore,
};

#[derive(Default)]
struct State {
    users: HashMap<Username, User>,
    ledger: Vec<LedgerEntry>,
    markets: BTreeMap<MarketId, Market>,
    bets: HashMap<MarketId, Vec<Bet>>,
    next_market_id: u64,
    next_bet_id: u64,
    next_entry_id: u64,
}

impl State {
    /// Resulting balances of applying `mutations` in order, without writing.
    fn stage(&self, mutations: &[BalanceMutation]) -> Result<Vec<Amount>> {
        let mut pending: HashMap<&Username, Amount> = HashMap::new();
        let mut balances = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            let username = mutation.username();
            let current = match pending.get(username) {
                Some(balance) => *balance,
                None => {
                    self.users
                        .get(username)
                        .ok_or_else(|| WalletError::AccountNotFound {
                            username: username.clone(),
                        })?
                        .balance
                }
            };
            let next = mutation
                .resulting_balance(current)
                .ok_or_else(|| WalletError::insufficient_for(mutation, current))?;
            pending.insert(username, next);
            balances.push(next);
        }
        Ok(balances)
    }

    fn commit(&mut self, mutations: Vec<BalanceMutation>, balances: Vec<Amount>) -> Vec<LedgerEntry> {
        mutations
            .into_iter()
            .zip(balances)
            .map(|(mutation, balance)| {
                if let Some(user) = self.users.get_mut(mutation.username()) {
                    user.balance = balance;
                }
                self.next_entry_id += 1;
                let entry = mutation.to_entry(self.next_entry_id, balance);
                self.ledger.push(entry.clone());
                entry
            })
            .collect()
    }

    fn market(&self, id: MarketId) -> Result<&Market> {
        self.markets
            .get(&id)
            .ok_or_else(|| MarketError::MarketNotFound { id }.into())
    }

    fn bets_of(&self, id: MarketId) -> Vec<Bet> {
        let mut bets = self.bets.get(&id).cloned().unwrap_or_default();
        sort_chronologically(&mut bets);
        bets
    }

    fn newest_first<'a>(&'a self, keep: impl Fn(&Market) -> bool) -> Vec<&'a Market> {
        let mut markets: Vec<&Market> = self.markets.values().filter(|m| keep(*m)).collect();
        markets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        markets
    }
}

fn page(markets: Vec<&Market>, offset: usize, limit: usize) -> Vec<Market> {
    markets.into_iter().skip(offset).take(limit).cloned().collect()
}

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser, cancel: &CancelToken) -> Result<User> {
        let mut state = self.state.lock();
        if state.users.contains_key(&user.username) {
            return Err(MarketError::UsernameTaken {
                username: user.username.to_string(),
            }
            .into());
        }
        cancel.check()?;
        let user = User {
            username: user.username,
            profile: user.profile,
            balance: user.initial_balance,
            created_at: user.created_at,
        };
        state.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn user(&self, username: &Username) -> Result<Option<User>> {
        Ok(self.state.lock().users.get(username).cloned())
    }

    async fn apply_mutation(
        &self,
        mutation: BalanceMutation,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry> {
        let mut state = self.state.lock();
        let mutations = vec![mutation];
        let balances = state.stage(&mutations)?;
        cancel.check()?;
        state
            .commit(mutations, balances)
            .pop()
            .ok_or_else(|| Error::Database("mutation produced no ledger entry".into()))
    }

    async fn ledger(&self, username: &Username) -> Result<Vec<LedgerEntry>> {
        let state = self.state.lock();
        Ok(state
            .ledger
            .iter()
            .filter(|entry| &entry.username == username)
            .cloned()
            .collect())
    }
}

impl MarketStore for MemoryStore {
    async fn insert_market(
        &self,
        market: NewMarket,
        fee: Option<BalanceMutation>,
        cancel: &CancelToken,
    ) -> Result<(Market, Option<LedgerEntry>)> {
        let mut state = self.state.lock();
        let mutations: Vec<BalanceMutation> = fee.into_iter().collect();
        let balances = state.stage(&mutations)?;
        cancel.check()?;

        let entry = state.commit(mutations, balances).pop();
        state.next_market_id += 1;
        let market = market.into_market(MarketId::new(state.next_market_id));
        state.markets.insert(market.id, market.clone());
        Ok((market, entry))
    }

    async fn market(&self, id: MarketId) -> Result<Option<Market>> {
        Ok(self.state.lock().markets.get(&id).cloned())
    }

    async fn update_labels(
        &self,
        id: MarketId,
        labels: MarketLabels,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let mut state = self.state.lock();
        cancel.check()?;
        Ok(state
            .markets
            .get_mut(&id)
            .map(|market| market.labels = labels)
            .is_some())
    }

    async fn list_markets(&self, query: &MarketQuery) -> Result<Vec<Market>> {
        let state = self.state.lock();
        let markets = state.newest_first(|m| {
            query.status.matches(m.status_at(query.now))
                && query.created_by.as_ref().map_or(true, |c| &m.creator == c)
        });
        Ok(page(markets, query.offset, query.limit))
    }

    async fn search_markets(&self, query: &SearchQuery) -> Result<Vec<Market>> {
        let needle = query.text.to_ascii_lowercase();
        let state = self.state.lock();
        let markets = state.newest_first(|m| {
            query.status.matches(m.status_at(query.now))
                && (m.question_title.to_ascii_lowercase().contains(&needle)
                    || m.description.to_ascii_lowercase().contains(&needle))
        });
        Ok(page(markets, query.offset, query.limit))
    }

    async fn delete_market(&self, id: MarketId, cancel: &CancelToken) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.markets.contains_key(&id) {
            return Ok(false);
        }
        if state.bets.get(&id).is_some_and(|bets| !bets.is_empty()) {
            return Err(MarketError::MarketHasBets { id }.into());
        }
        cancel.check()?;
        state.markets.remove(&id);
        state.bets.remove(&id);
        Ok(true)
    }

    async fn settle_market<F>(
        &self,
        id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> Result<SettlementReceipt>
    where
        F: FnOnce(&Market, &[Bet]) -> Result<Settlement> + Send,
    {
        let mut state = self.state.lock();
        let bets = state.bets_of(id);
        let settlement = plan(state.market(id)?, &bets)?;
        let balances = state.stage(&settlement.credits)?;
        cancel.check()?;

        let entries = state.commit(settlement.credits, balances);
        let market = state
            .markets
            .get_mut(&id)
            .ok_or(MarketError::MarketNotFound { id })?;
        market.resolution = Some(settlement.resolution);
        market.final_resolution_at = Some(settlement.resolved_at);
        Ok(SettlementReceipt {
            market: market.clone(),
            entries,
        })
    }
}

impl BetStore for MemoryStore {
    async fn bets(&self, market_id: MarketId) -> Result<Vec<Bet>> {
        Ok(self.state.lock().bets_of(market_id))
    }

    async fn append_bet<F>(
        &self,
        market_id: MarketId,
        cancel: &CancelToken,
        plan: F,
    ) -> Result<BetReceipt>
    where
        F: FnOnce(&Market, &[Bet]) -> Result<BetPlan> + Send,
    {
        let mut state = self.state.lock();
        let bets = state.bets_of(market_id);
        let BetPlan { bet, mutation } = plan(state.market(market_id)?, &bets)?;
        let mutations: Vec<BalanceMutation> = mutation.into_iter().collect();
        let balances = state.stage(&mutations)?;
        cancel.check()?;

        let entry = state.commit(mutations, balances).pop();
        state.next_bet_id += 1;
        let bet = bet.into_bet(BetId::new(state.next_bet_id));
        state.bets.entry(market_id).or_default().push(bet.clone());
        Ok(BetReceipt { bet, entry })
    }
}
