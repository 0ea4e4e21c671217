//! Infrastructure configuration modules.

pub mod economics;
pub mod logging;
pub mod settings;

pub use settings::{Config, DatabaseTarget};
