//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`]: a [`Clock`](crate::port::outbound::Clock) tests move by hand.
//! - [`domain`]: builders for users, markets and economics.

pub mod clock;
pub mod domain;
