//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{bets, ledger, markets, users};

/// Database row for a user.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub username: String,
    pub display_name: String,
    pub emoji: String,
    pub description: String,
    /// JSON array of strings.
    pub links: String,
    pub balance: i64,
    pub created_at: String,
}

/// Database row for a market (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: i64,
    pub creator: String,
    pub question_title: String,
    pub description: String,
    pub outcome_type: String,
    pub resolution_at: String,
    pub final_resolution_at: Option<String>,
    /// `active` or `resolved`; `closed` is derived from the deadline.
    pub status: String,
    pub resolution: Option<String>,
    pub yes_label: String,
    pub no_label: String,
    pub initial_probability: f64,
    pub initial_yes: i64,
    pub initial_no: i64,
    pub created_at: String,
}

/// Database row for a market (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = markets)]
pub struct NewMarketRow {
    pub creator: String,
    pub question_title: String,
    pub description: String,
    pub outcome_type: String,
    pub resolution_at: String,
    pub status: String,
    pub yes_label: String,
    pub no_label: String,
    pub initial_probability: f64,
    pub initial_yes: i64,
    pub initial_no: i64,
    pub created_at: String,
}

/// Database row for a bet (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = bets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BetRow {
    pub id: i64,
    pub market_id: i64,
    pub username: String,
    pub amount: i64,
    pub outcome: String,
    pub placed_at: String,
}

/// Database row for a bet (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bets)]
pub struct NewBetRow {
    pub market_id: i64,
    pub username: String,
    pub amount: i64,
    pub outcome: String,
    pub placed_at: String,
}

/// Database row for a ledger entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerRow {
    pub id: i64,
    pub username: String,
    pub amount: i64,
    pub kind: String,
    pub balance: i64,
    pub created_at: String,
}

/// Database row for a ledger entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = ledger)]
pub struct NewLedgerRow {
    pub username: String,
    pub amount: i64,
    pub kind: String,
    pub balance: i64,
    pub created_at: String,
}
