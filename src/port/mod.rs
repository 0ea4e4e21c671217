//! Port definitions.
//!
//! - [`inbound`]: capabilities the application exposes (wallet, profiles)
//!   and the cancellation handle callers pass in.
//! - [`outbound`]: storage and clock the application depends on.

pub mod inbound;
pub mod outbound;

pub use inbound::{CancelToken, ProfileDirectory, Wallet};
pub use outbound::{
    BetPlan, BetReceipt, BetStore, Clock, MarketQuery, MarketStore, SearchQuery, Settlement,
    SettlementReceipt, Store, SystemClock, UserStore,
};
