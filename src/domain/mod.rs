//! Market economics: pure types and engines.
//!
//! Nothing in here performs I/O. The engines ([`probability`], [`payout`],
//! [`position`]) are total functions over snapshots of a market's bet log.

pub mod bet;
pub mod id;
pub mod ledger;
pub mod market;
pub mod money;
pub mod outcome;
pub mod payout;
pub mod position;
pub mod probability;
pub mod user;

pub use bet::{Bet, NewBet};
pub use id::{BetId, MarketId, Username};
pub use ledger::{BalanceMutation, EntryKind, LedgerEntry};
pub use market::{
    Market, MarketLabels, MarketStatus, NewMarket, OutcomeType, SeedParameters, StatusFilter,
};
pub use money::{Amount, Probability, Shares};
pub use outcome::{Outcome, Resolution};
pub use payout::{Payout, ShareAllocation, UserShares};
pub use position::{LeaderboardEntry, MarketSnapshot, Page, UserPosition};
pub use probability::{ProbabilityPoint, ProbabilityProjection};
pub use user::{NewUser, Profile, PublicUser, User};
