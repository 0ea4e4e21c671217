//! The SQLite store, directly and underneath the services.

mod support;

use std::sync::Arc;

use chrono::Duration;
use oddsmith::adapter::outbound::sqlite::SqliteStore;
use oddsmith::application::market::MarketList;
use oddsmith::domain::{
    EntryKind, MarketLabels, MarketStatus, NewUser, Profile, StatusFilter, Username,
};
use oddsmith::error::{Error, ErrorKind, MarketError};
use oddsmith::port::inbound::CancelToken;
use oddsmith::port::outbound::{MarketQuery, MarketStore, UserStore};
use oddsmith::testkit::domain::{new_market, scenario_economics, seed_user, t0};
use support::Exchange;
use tempfile::TempDir;

/// Migrated database file inside its own temp dir.
fn temp_store() -> (TempDir, String) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("oddsmith.db");
    let url = path.to_str().expect("utf-8 path").to_string();
    (dir, url)
}

fn exchange(url: &str) -> Exchange<SqliteStore> {
    Exchange::with_store(SqliteStore::open(url).unwrap(), scenario_economics())
}

#[tokio::test]
async fn users_round_trip_with_profile() {
    let (_dir, url) = temp_store();
    let store = SqliteStore::open(&url).unwrap();
    let never = CancelToken::never();

    let user = store
        .insert_user(
            NewUser {
                username: Username::new("ada"),
                profile: Profile {
                    display_name: "Ada".into(),
                    emoji: "🧮".into(),
                    description: "Counts things".into(),
                    links: vec!["https://example.com/ada".into()],
                },
                initial_balance: 250,
                created_at: t0(),
            },
            &never,
        )
        .await
        .unwrap();

    let loaded = store.user(&Username::new("ada")).await.unwrap().unwrap();
    assert_eq!(loaded, user);
    assert_eq!(loaded.created_at, t0());
    assert!(store.user(&Username::new("nobody")).await.unwrap().is_none());

    let err = seed_user_again(&store).await;
    assert!(matches!(err, Error::Market(MarketError::UsernameTaken { .. })));
}

async fn seed_user_again(store: &SqliteStore) -> Error {
    store
        .insert_user(
            NewUser {
                username: Username::new("ada"),
                profile: Profile::default(),
                initial_balance: 0,
                created_at: t0(),
            },
            &CancelToken::never(),
        )
        .await
        .unwrap_err()
}

#[tokio::test]
async fn markets_round_trip_and_update() {
    let (_dir, url) = temp_store();
    let store = SqliteStore::open(&url).unwrap();
    let never = CancelToken::never();
    seed_user(&store, "cal", 0).await;

    let (market, fee) = store.insert_market(new_market("cal"), None, &never).await.unwrap();
    assert!(fee.is_none());
    assert_eq!(store.market(market.id).await.unwrap(), Some(market.clone()));

    let labels = MarketLabels {
        yes: "Ships".into(),
        no: "Slips".into(),
    };
    assert!(store.update_labels(market.id, labels.clone(), &never).await.unwrap());
    assert_eq!(store.market(market.id).await.unwrap().unwrap().labels, labels);

    assert!(store.delete_market(market.id, &never).await.unwrap());
    assert!(store.market(market.id).await.unwrap().is_none());
    assert!(!store.delete_market(market.id, &never).await.unwrap());
}

#[tokio::test]
async fn derived_status_filters_apply_in_sql() {
    let (_dir, url) = temp_store();
    let store = SqliteStore::open(&url).unwrap();
    let never = CancelToken::never();
    seed_user(&store, "cal", 0).await;

    let mut soon = new_market("cal");
    soon.resolution_at = t0() + Duration::hours(2);
    let (soon, _) = store.insert_market(soon, None, &never).await.unwrap();
    let (later, _) = store.insert_market(new_market("cal"), None, &never).await.unwrap();

    let query = |status, now| MarketQuery {
        status,
        created_by: None,
        limit: 10,
        offset: 0,
        now,
    };
    let ids = |markets: Vec<oddsmith::domain::Market>| -> Vec<_> {
        markets.into_iter().map(|m| m.id).collect()
    };

    let now = t0() + Duration::hours(3);
    let active = store
        .list_markets(&query(StatusFilter::Only(MarketStatus::Active), now))
        .await
        .unwrap();
    assert_eq!(ids(active), vec![later.id]);

    let closed = store
        .list_markets(&query(StatusFilter::Only(MarketStatus::Closed), now))
        .await
        .unwrap();
    assert_eq!(ids(closed), vec![soon.id]);

    let everything = store.list_markets(&query(StatusFilter::All, now)).await.unwrap();
    assert_eq!(ids(everything), vec![later.id, soon.id]);
}

#[tokio::test]
async fn worked_resolution_matches_memory_results() {
    let (_dir, url) = temp_store();
    let ex = exchange(&url);
    let creator = ex.user("creator", 0).await;
    let alice = ex.user("alice", 100).await;
    let bob = ex.user("bob", 100).await;
    let carol = ex.user("carol", 100).await;
    let market = ex.market(&creator, 24).await;

    ex.at_minute(1);
    ex.bet(market, &alice, 20, "NO").await;
    ex.at_minute(2);
    ex.bet(market, &bob, 10, "YES").await;
    ex.at_minute(3);
    ex.bet(market, &carol, 10, "YES").await;

    let details = ex.services.markets.market_details(market).await.unwrap();
    assert_eq!(details.probability_changes.len(), 4);
    assert!((details.last_probability - 0.5).abs() < 1e-9);

    ex.at_minute(60);
    let report = ex
        .services
        .markets
        .resolve_market(market, "YES", &creator, &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(report.total_credited(), 40);
    assert_eq!(ex.balance(&bob).await, 112);
    assert_eq!(ex.balance(&carol).await, 108);

    let resolved = ex.services.markets.get_market(market).await.unwrap();
    assert_eq!(ex.services.markets.status_of(&resolved), MarketStatus::Resolved);
    assert_eq!(resolved.final_resolution_at, Some(t0() + Duration::minutes(60)));

    let wins = ex.services.wallet.ledger(&bob).await.unwrap();
    assert_eq!(wins.last().map(|e| (e.kind, e.amount)), Some((EntryKind::Win, 22)));
}

#[tokio::test]
async fn rejected_bet_rolls_back() {
    let (_dir, url) = temp_store();
    let ex = exchange(&url);
    let creator = ex.user("creator", 0).await;
    let dan = ex.user("dan", 5).await;
    let market = ex.market(&creator, 24).await;

    let err = ex
        .services
        .markets
        .place_bet(market, &dan, 10, "YES", &CancelToken::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert!(ex.services.markets.market_bets(market).await.unwrap().is_empty());
    assert!(ex.services.wallet.ledger(&dan).await.unwrap().is_empty());
    assert_eq!(ex.balance(&dan).await, 5);
}

#[tokio::test]
async fn cancelled_settlement_rolls_back() {
    let (_dir, url) = temp_store();
    let ex = exchange(&url);
    let creator = ex.user("creator", 0).await;
    let eli = ex.user("eli", 100).await;
    let market = ex.market(&creator, 24).await;
    ex.bet(market, &eli, 10, "YES").await;

    let (tx, token) = CancelToken::channel();
    tx.send(true).unwrap();
    let err = ex
        .services
        .markets
        .resolve_market(market, "N/A", &creator, &token)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!ex.services.markets.get_market(market).await.unwrap().is_resolved());
    assert_eq!(ex.balance(&eli).await, 90);
}

#[tokio::test]
async fn search_escapes_wildcards_and_falls_back() {
    let (_dir, url) = temp_store();
    let ex = exchange(&url);
    let creator = ex.user("creator", 0).await;
    let literal = ex.market_titled(&creator, "Growth_rate over 5%?", "").await;
    ex.market_titled(&creator, "Growth rate over 50?", "").await;
    let resolved = ex.market_titled(&creator, "GROWTH beats forecast?", "").await;
    ex.services
        .markets
        .resolve_market(resolved, "NO", &creator, &CancelToken::never())
        .await
        .unwrap();

    let exact = ex
        .services
        .markets
        .search_markets(oddsmith::application::market::SearchRequest {
            query: "_rate over 5%".into(),
            status: String::new(),
            limit: 0,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(exact.primary.iter().map(|m| m.id).collect::<Vec<_>>(), vec![literal]);

    let relaxed = ex
        .services
        .markets
        .search_markets(oddsmith::application::market::SearchRequest {
            query: "growth".into(),
            status: "resolved".into(),
            limit: 0,
            offset: 0,
        })
        .await
        .unwrap();
    assert_eq!(relaxed.primary.len(), 1);
    assert!(relaxed.fallback_used);
    assert_eq!(relaxed.fallback.len(), 2);
}

#[tokio::test]
async fn data_survives_reopening() {
    let (_dir, url) = temp_store();
    let market = {
        let ex = exchange(&url);
        let creator = ex.user("creator", 0).await;
        let fin = ex.user("fin", 100).await;
        let market = ex.market(&creator, 24).await;
        ex.bet(market, &fin, 25, "NO").await;
        market
    };

    let ex = exchange(&url);
    let listed = ex
        .services
        .markets
        .list_markets(MarketList {
            created_by: Some(Username::new("creator")),
            ..MarketList::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(ex.services.markets.market_volume(market).await.unwrap(), 25);
    assert_eq!(ex.balance(&Username::new("fin")).await, 75);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bets_are_serialized() {
    let (_dir, url) = temp_store();
    let ex = Arc::new(exchange(&url));
    let creator = ex.user("creator", 0).await;
    let gus = ex.user("gus", 30).await;
    let market = ex.market(&creator, 24).await;

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let ex = Arc::clone(&ex);
            let gus = gus.clone();
            tokio::spawn(async move {
                ex.services
                    .markets
                    .place_bet(market, &gus, 10, "NO", &CancelToken::never())
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 3);
    assert_eq!(ex.balance(&gus).await, 0);
    assert_eq!(ex.services.markets.market_bets(market).await.unwrap().len(), 3);
}
