//! Application services.
//!
//! - [`wallet`]: balance reads and ledger-paired mutations
//! - [`profile`]: registration and public profiles
//! - [`market`]: market lifecycle, trading, settlement and projections

pub mod economics;
pub mod market;
pub mod profile;
pub mod wallet;

pub use economics::Economics;
pub use market::MarketService;
pub use profile::{ProfileService, Registration};
pub use wallet::WalletService;
