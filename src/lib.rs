//! Oddsmith - a binary prediction-market exchange.
//!
//! Users stake play money on YES or NO. A weighted pool-average model
//! turns the bet history into a probability curve; at resolution a
//! dynamic-parimutuel share allocation turns the same history into payouts.
//! Every balance change is paired with an append-only ledger entry.
//!
//! # Modules
//!
//! - [`domain`] - Pure types and engines: probability, shares, positions
//! - [`port`] - Traits at the seams: storage, clock, wallet, profiles
//! - [`application`] - Wallet, profile and market services
//! - [`adapter`] - In-memory and SQLite stores, the CLI
//! - [`infrastructure`] - Configuration loading and runtime wiring
//! - [`error`] - Error types and their request-boundary classification
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use oddsmith::adapter::outbound::memory::MemoryStore;
//! use oddsmith::application::Economics;
//! use oddsmith::infrastructure::bootstrap::build_services;
//! use oddsmith::port::outbound::SystemClock;
//!
//! let services = build_services(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//!     Economics::default(),
//! );
//! # let _ = services;
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
