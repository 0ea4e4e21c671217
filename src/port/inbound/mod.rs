//! Capabilities offered by the application layer.

pub mod cancel;
pub mod profile;
pub mod wallet;

pub use cancel::CancelToken;
pub use profile::ProfileDirectory;
pub use wallet::Wallet;
