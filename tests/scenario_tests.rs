//! Worked market scenarios, end to end through the services.

mod support;

use chrono::Duration;
use oddsmith::domain::{EntryKind, MarketStatus, Username};
use oddsmith::error::{Error, ErrorKind, MarketError, WalletError};
use oddsmith::port::inbound::CancelToken;
use oddsmith::testkit::domain::{scenario_economics, t0};
use rust_decimal::Decimal;
use support::Exchange;

const EPS: f64 = 1e-9;

/// alice 20 NO at +1m, bob 10 YES at +2m, carol 10 YES at +3m.
async fn three_traders(ex: &Exchange) -> (Username, oddsmith::domain::MarketId) {
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
    (creator, market)
}

#[tokio::test]
async fn probability_moves_with_each_bet() {
    let ex = Exchange::scenario();
    let (_, market) = three_traders(&ex).await;

    let details = ex.services.markets.market_details(market).await.unwrap();
    let points: Vec<(i64, f64)> = details
        .probability_changes
        .iter()
        .map(|p| ((p.at - t0()).num_minutes(), p.probability))
        .collect();

    assert_eq!(points.len(), 4);
    let expected = [(0, 0.5), (1, 0.0), (2, 1.0 / 3.0), (3, 0.5)];
    for ((minute, p), (want_minute, want_p)) in points.iter().zip(expected) {
        assert_eq!(*minute, want_minute);
        assert!((p - want_p).abs() < EPS, "at +{minute}m: {p} != {want_p}");
    }
    assert!((details.last_probability - 0.5).abs() < EPS);
    assert_eq!(details.total_volume, 40);
    assert_eq!(details.num_traders, 3);
}

#[tokio::test]
async fn yes_resolution_pays_yes_holders_the_whole_volume() {
    let ex = Exchange::scenario();
    let (creator, market) = three_traders(&ex).await;

    let positions = ex.services.markets.market_positions(market).await.unwrap();
    let shares = |name: &str| {
        let p = positions
            .iter()
            .find(|p| p.username.as_str() == name)
            .unwrap();
        (p.yes_shares, p.no_shares)
    };
    assert_eq!(shares("alice"), (0, 20));
    assert_eq!(shares("bob"), (11, 0));
    assert_eq!(shares("carol"), (9, 0));

    ex.at_minute(60);
    let report = ex
        .services
        .markets
        .resolve_market(market, "YES", &creator, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.volume, 40);
    assert_eq!(report.total_credited(), 40);
    assert!(report.credits.iter().all(|e| e.kind == EntryKind::Win));
    assert_eq!(ex.balance(&Username::new("alice")).await, 80);
    assert_eq!(ex.balance(&Username::new("bob")).await, 112);
    assert_eq!(ex.balance(&Username::new("carol")).await, 108);

    let market = ex.services.markets.get_market(market).await.unwrap();
    assert!(market.is_resolved());
    assert_eq!(ex.services.markets.status_of(&market), MarketStatus::Resolved);
}

#[tokio::test]
async fn not_applicable_refunds_every_stake() {
    let ex = Exchange::scenario();
    let creator = ex.user("creator", 0).await;
    let alice = ex.user("alice", 100).await;
    let bob = ex.user("bob", 100).await;
    let carol = ex.user("carol", 100).await;
    let market = ex.market(&creator, 24).await;

    ex.at_minute(1);
    ex.bet(market, &alice, 50, "YES").await;
    ex.at_minute(2);
    ex.bet(market, &bob, 30, "NO").await;
    ex.at_minute(3);
    ex.bet(market, &carol, 20, "YES").await;

    let report = ex
        .services
        .markets
        .resolve_market(market, "N/A", &creator, &CancelToken::never())
        .await
        .unwrap();

    let refunded = |name: &str| {
        report
            .credits
            .iter()
            .find(|e| e.username.as_str() == name)
            .map(|e| (e.kind, e.amount))
    };
    assert_eq!(refunded("alice"), Some((EntryKind::Refund, 50)));
    assert_eq!(refunded("bob"), Some((EntryKind::Refund, 30)));
    assert_eq!(refunded("carol"), Some((EntryKind::Refund, 20)));
    assert_eq!(report.total_credited(), 100);

    for user in [&alice, &bob, &carol] {
        assert_eq!(ex.balance(user).await, 100);
    }
}

#[tokio::test]
async fn insufficient_balance_leaves_no_trace() {
    let ex = Exchange::scenario();
    let creator = ex.user("creator", 0).await;
    let dan = ex.user("dan", 5).await;
    let market = ex.market(&creator, 24).await;

    let err = ex
        .services
        .markets
        .place_bet(market, &dan, 10, "YES", &CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Wallet(WalletError::InsufficientBalance {
            balance: 5,
            amount: 10,
            max_debt: 0,
            ..
        })
    ));
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert!(ex.services.markets.market_bets(market).await.unwrap().is_empty());
    assert!(ex.services.wallet.ledger(&dan).await.unwrap().is_empty());
    assert_eq!(ex.balance(&dan).await, 5);
}

#[tokio::test]
async fn only_the_creator_may_resolve() {
    let ex = Exchange::scenario();
    let creator = ex.user("creator", 0).await;
    let eve = ex.user("eve", 100).await;
    let market = ex.market(&creator, 24).await;

    let err = ex
        .services
        .markets
        .resolve_market(market, "YES", &eve, &CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Market(MarketError::NotCreator { .. })));
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.kind().status_code(), 403);

    let market = ex.services.markets.get_market(market).await.unwrap();
    assert!(!market.is_resolved());
    assert_eq!(ex.services.markets.status_of(&market), MarketStatus::Active);
}

/// frank ends up with 11 YES shares priced at 1/3.
async fn frank_holds_yes(ex: &Exchange) -> (Username, oddsmith::domain::MarketId) {
    let creator = ex.user("creator", 0).await;
    let alice = ex.user("alice", 100).await;
    let frank = ex.user("frank", 100).await;
    let market = ex.market(&creator, 24).await;

    ex.at_minute(1);
    ex.bet(market, &alice, 20, "NO").await;
    ex.at_minute(2);
    ex.bet(market, &frank, 10, "YES").await;

    let position = ex.services.markets.user_position(market, &frank).await.unwrap();
    assert_eq!(position.yes_shares, 11);
    (frank, market)
}

#[tokio::test]
async fn sale_dust_over_cap_is_rejected() {
    let ex = Exchange::scenario();
    let (frank, market) = frank_holds_yes(&ex).await;

    ex.at_minute(3);
    let err = ex
        .services
        .markets
        .sell_position(market, &frank, 1, "YES", &CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        Error::Market(MarketError::DustCapExceeded { cap, .. }) if cap == "0"
    ));
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(ex.services.markets.market_bets(market).await.unwrap().len(), 2);
    assert_eq!(ex.balance(&frank).await, 90);
}

#[tokio::test]
async fn sale_dust_within_cap_is_kept_by_the_market() {
    let ex = Exchange::new(dust_tolerant());
    let (frank, market) = frank_holds_yes(&ex).await;
    let before = ex.services.markets.market_details(market).await.unwrap();
    assert_eq!(before.market_dust, Decimal::ZERO);

    ex.clock.advance(Duration::minutes(1));
    let sale = ex
        .services
        .markets
        .sell_position(market, &frank, 1, "YES", &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(sale.quote.proceeds, 0);
    assert!(sale.quote.dust > rust_decimal::Decimal::ZERO);
    assert_eq!(sale.net_proceeds, 0);
    assert!(sale.receipt.entry.is_none());
    assert_eq!(sale.receipt.bet.amount, -1);

    let bets = ex.services.markets.market_bets(market).await.unwrap();
    assert_eq!(bets.len(), 3);
    assert_eq!(ex.balance(&frank).await, 90);
    assert_eq!(ex.services.markets.market_volume(market).await.unwrap(), 31);

    let after = ex.services.markets.market_details(market).await.unwrap();
    assert_eq!(after.market_dust, sale.quote.dust);
}

/// Scenario economics with a dust cap of one unit, so every sale passes.
fn dust_tolerant() -> oddsmith::application::Economics {
    oddsmith::application::Economics {
        max_dust_per_sale: Decimal::ONE,
        ..scenario_economics()
    }
}

#[tokio::test]
async fn market_dust_accumulates_across_sales() {
    let ex = Exchange::new(dust_tolerant());
    let (_, market) = three_traders(&ex).await;
    let bob = Username::new("bob");
    let never = CancelToken::never();

    // p = 0.5: 3 YES -> 1.5, dust 0.5
    ex.at_minute(4);
    let first = ex
        .services
        .markets
        .sell_position(market, &bob, 3, "YES", &never)
        .await
        .unwrap();
    assert_eq!(first.quote.dust, Decimal::new(5, 1));
    assert_eq!(first.net_proceeds, 1);

    // carol holds 8 YES after the re-allocation; 2 at 17/37 leaves 0.918.. as dust.
    ex.at_minute(5);
    let carol = Username::new("carol");
    let second = ex
        .services
        .markets
        .sell_position(market, &carol, 2, "YES", &never)
        .await
        .unwrap();
    assert_eq!(second.net_proceeds, 0);

    let details = ex.services.markets.market_details(market).await.unwrap();
    assert_eq!(details.market_dust, first.quote.dust + second.quote.dust);
}

/// Scenario A's book, then bob sells 3 of his 11 YES shares at p = 0.5.
async fn book_with_a_sale(ex: &Exchange) -> (Username, oddsmith::domain::MarketId) {
    let (creator, market) = three_traders(ex).await;
    let bob = Username::new("bob");
    ex.at_minute(4);
    let sale = ex
        .services
        .markets
        .sell_position(market, &bob, 3, "YES", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(sale.net_proceeds, 1);
    assert_eq!(ex.balance(&bob).await, 91);
    (creator, market)
}

async fn resolve_after_sale(resolution: &str) {
    let ex = Exchange::new(dust_tolerant());
    let (creator, market) = book_with_a_sale(&ex).await;
    let volume = ex.services.markets.market_volume(market).await.unwrap();
    assert_eq!(volume, 43);

    ex.at_minute(60);
    let report = ex
        .services
        .markets
        .resolve_market(market, resolution, &creator, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.volume, volume);
    assert_eq!(report.total_credited(), volume);
    assert!(report.credits.iter().all(|e| e.kind == EntryKind::Win && e.amount > 0));

    let balances = [
        ex.balance(&Username::new("alice")).await,
        ex.balance(&Username::new("bob")).await,
        ex.balance(&Username::new("carol")).await,
    ];
    // 300 opening, -40 staked, +1 sale proceeds, +V paid out.
    assert_eq!(balances.iter().sum::<i64>(), 300 - 40 + 1 + volume);
}

#[tokio::test]
async fn yes_resolution_after_a_sale_pays_out_the_volume() {
    resolve_after_sale("YES").await;
}

#[tokio::test]
async fn no_resolution_after_a_sale_pays_out_the_volume() {
    resolve_after_sale("NO").await;
}

#[tokio::test]
async fn not_applicable_after_a_partial_sale_refunds_the_net() {
    let ex = Exchange::new(dust_tolerant());
    let (frank, market) = frank_holds_yes(&ex).await;
    let creator = Username::new("creator");

    // 4 YES at 1/3 -> proceeds 1
    ex.at_minute(3);
    ex.services
        .markets
        .sell_position(market, &frank, 4, "YES", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(ex.balance(&frank).await, 91);

    let report = ex
        .services
        .markets
        .resolve_market(market, "N/A", &creator, &CancelToken::never())
        .await
        .unwrap();

    let refunds: Vec<(&str, i64)> = report
        .credits
        .iter()
        .map(|e| (e.username.as_str(), e.amount))
        .collect();
    assert!(refunds.contains(&("frank", 6)));
    assert!(refunds.contains(&("alice", 20)));
    assert!(report.credits.iter().all(|e| e.kind == EntryKind::Refund));
    assert_eq!(ex.balance(&frank).await, 97);
    assert_eq!(ex.balance(&Username::new("alice")).await, 100);
}

#[tokio::test]
async fn not_applicable_skips_users_who_sold_out() {
    let ex = Exchange::new(dust_tolerant());
    let (frank, market) = frank_holds_yes(&ex).await;
    let creator = Username::new("creator");

    // All 11 YES at 1/3 -> proceeds 3; net stake 10 - 11 = -1
    ex.at_minute(3);
    ex.services
        .markets
        .sell_position(market, &frank, 11, "YES", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(ex.balance(&frank).await, 93);

    let report = ex
        .services
        .markets
        .resolve_market(market, "N/A", &creator, &CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.credits.len(), 1);
    assert_eq!(report.credits[0].username.as_str(), "alice");
    assert_eq!(report.total_credited(), 20);
    assert_eq!(ex.balance(&frank).await, 93);
    let ledger = ex.services.wallet.ledger(&frank).await.unwrap();
    assert!(ledger.iter().all(|e| e.kind != EntryKind::Refund));
}
