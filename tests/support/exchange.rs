//! Services over a store with a hand-driven clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use oddsmith::adapter::outbound::memory::MemoryStore;
use oddsmith::application::market::CreateMarketRequest;
use oddsmith::application::Economics;
use oddsmith::domain::{Amount, BetId, MarketId, OutcomeType, Username};
use oddsmith::infrastructure::bootstrap::{build_services, Services};
use oddsmith::port::inbound::CancelToken;
use oddsmith::port::outbound::Store;
use oddsmith::testkit::clock::FixedClock;
use oddsmith::testkit::domain::{scenario_economics, seed_user, t0};

pub struct Exchange<S = MemoryStore> {
    pub clock: Arc<FixedClock>,
    pub services: Services<S>,
}

impl Exchange<MemoryStore> {
    pub fn new(economics: Economics) -> Self {
        Self::with_store(MemoryStore::new(), economics)
    }

    /// Exchange with the worked-scenario economics.
    pub fn scenario() -> Self {
        Self::new(scenario_economics())
    }
}

impl<S: Store + 'static> Exchange<S> {
    pub fn with_store(store: S, economics: Economics) -> Self {
        let clock = Arc::new(FixedClock::epoch());
        let services = build_services(Arc::new(store), clock.clone(), economics);
        Self { clock, services }
    }

    pub fn now(&self) -> DateTime<Utc> {
        use oddsmith::port::outbound::Clock;
        self.clock.now()
    }

    /// Move the clock to `t0 + minutes`.
    pub fn at_minute(&self, minutes: i64) {
        self.clock.set(t0() + Duration::minutes(minutes));
    }

    pub async fn user(&self, name: &str, balance: Amount) -> Username {
        seed_user(self.services.store.as_ref(), name, balance).await.username
    }

    /// Market by `creator` resolving `hours` after the current clock.
    pub async fn market(&self, creator: &Username, hours: i64) -> MarketId {
        self.services
            .markets
            .create_market(
                CreateMarketRequest {
                    question_title: "Will it rain tomorrow?".into(),
                    description: String::new(),
                    outcome_type: OutcomeType::Binary,
                    resolution_at: self.now() + Duration::hours(hours),
                    yes_label: String::new(),
                    no_label: String::new(),
                },
                creator,
                &CancelToken::never(),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn market_titled(&self, creator: &Username, title: &str, description: &str) -> MarketId {
        self.services
            .markets
            .create_market(
                CreateMarketRequest {
                    question_title: title.into(),
                    description: description.into(),
                    outcome_type: OutcomeType::Binary,
                    resolution_at: self.now() + Duration::hours(24),
                    yes_label: String::new(),
                    no_label: String::new(),
                },
                creator,
                &CancelToken::never(),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn bet(&self, market: MarketId, user: &Username, amount: Amount, outcome: &str) -> BetId {
        self.services
            .markets
            .place_bet(market, user, amount, outcome, &CancelToken::never())
            .await
            .unwrap()
            .bet
            .id
    }

    pub async fn balance(&self, user: &Username) -> Amount {
        use oddsmith::port::inbound::Wallet;
        self.services.wallet.get_balance(user).await.unwrap()
    }
}
