//! Builders for domain values used across tests.
//!
//! Keep scenario setup short so tests read as the sequence of bets and
//! resolutions they check.

use chrono::{DateTime, Duration, Utc};

use crate::application::Economics;
use crate::domain::{
    Amount, MarketLabels, NewMarket, NewUser, OutcomeType, Profile, SeedParameters, User, Username,
};
use crate::port::inbound::CancelToken;
use crate::port::outbound::UserStore;

/// Fixed instant every scenario starts from: 2023-11-14T22:13:20Z.
pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Insert `name` with `balance` straight into the store.
pub async fn seed_user<S: UserStore>(store: &S, name: &str, balance: Amount) -> User {
    store
        .insert_user(
            NewUser {
                username: Username::new(name),
                profile: Profile {
                    display_name: name.to_string(),
                    ..Profile::default()
                },
                initial_balance: balance,
                created_at: t0(),
            },
            &CancelToken::never(),
        )
        .await
        .unwrap()
}

/// A week-long binary market by `creator`, created at [`t0`].
pub fn new_market(creator: &str) -> NewMarket {
    NewMarket {
        creator: Username::new(creator),
        question_title: format!("Will {creator} ship on time?"),
        description: String::new(),
        outcome_type: OutcomeType::Binary,
        resolution_at: t0() + Duration::days(7),
        labels: MarketLabels::default(),
        seeds: Economics::default().seeds,
        created_at: t0(),
    }
}

/// Economics of the worked scenarios: `p0 = 0.5` with an empty seed pool,
/// no fees or creation cost, no credit line and a one-hour minimum horizon.
pub fn scenario_economics() -> Economics {
    Economics {
        seeds: SeedParameters {
            initial_probability: 0.5,
            initial_yes: 0,
            initial_no: 0,
        },
        create_market_cost: 0,
        maximum_debt_allowed: 0,
        initial_bet_fee: 0,
        each_bet_fee: 0,
        sell_shares_fee: 0,
        minimum_future_hours: 1.0,
        ..Economics::default()
    }
}
