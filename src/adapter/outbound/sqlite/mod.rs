//! Durable storage on SQLite via Diesel.

pub mod database;
mod store;

pub use store::SqliteStore;
