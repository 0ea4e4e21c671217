//! Dependencies the application layer needs from the outside.

pub mod clock;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use store::{
    BetPlan, BetReceipt, BetStore, MarketQuery, MarketStore, SearchQuery, Settlement,
    SettlementReceipt, Store, UserStore,
};
