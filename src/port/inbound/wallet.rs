//! Wallet capability consumed by the market service.

use async_trait::async_trait;

use crate::domain::{Amount, BalanceMutation, EntryKind, LedgerEntry, Username};
use crate::error::Result;
use crate::port::inbound::CancelToken;

/// Balance reads and ledger-paired mutations.
///
/// `prepare_*` build a validated mutation without touching storage so the
/// caller can commit it inside a larger unit (a bet insert, a settlement).
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn get_balance(&self, username: &Username) -> Result<Amount>;

    /// `balance + max_debt`, or `max_debt` for an unknown account.
    async fn get_credit(&self, username: &Username, max_debt: Amount) -> Result<Amount>;

    /// Succeeds iff `balance - amount >= -max_debt`.
    async fn validate_balance(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
    ) -> Result<()>;

    async fn credit(
        &self,
        username: &Username,
        amount: Amount,
        kind: EntryKind,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry>;

    async fn debit(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
        kind: EntryKind,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry>;

    fn prepare_credit(
        &self,
        username: &Username,
        amount: Amount,
        kind: EntryKind,
    ) -> Result<BalanceMutation>;

    fn prepare_debit(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
        kind: EntryKind,
    ) -> Result<BalanceMutation>;
}
