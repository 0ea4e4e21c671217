//! Inbound adapters: drivers of the application services.

pub mod cli;
