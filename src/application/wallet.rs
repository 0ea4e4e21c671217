//! Wallet service.
//!
//! The only path to a user's balance. Every mutation goes through
//! [`UserStore::apply_mutation`], which writes the balance and its ledger
//! entry together.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::{Amount, BalanceMutation, EntryKind, LedgerEntry, Username};
use crate::error::{Error, Result, WalletError};
use crate::port::inbound::{CancelToken, Wallet};
use crate::port::outbound::{Clock, UserStore};

/// Wallet over a user store.
pub struct WalletService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: UserStore> WalletService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Ledger entries of a user, oldest first.
    pub async fn ledger(&self, username: &Username) -> Result<Vec<LedgerEntry>> {
        self.store.ledger(username).await
    }

    async fn commit(&self, mutation: BalanceMutation, cancel: &CancelToken) -> Result<LedgerEntry> {
        match self.store.apply_mutation(mutation, cancel).await {
            Ok(entry) => {
                info!(
                    user = %entry.username,
                    kind = %entry.kind,
                    amount = entry.amount,
                    balance = entry.balance,
                    "Wallet mutation committed"
                );
                Ok(entry)
            }
            Err(Error::Wallet(err @ WalletError::InsufficientBalance { .. })) => {
                warn!(error = %err, "Debit rejected");
                Err(err.into())
            }
            Err(err) => Err(err),
        }
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount <= 0 {
        return Err(WalletError::InvalidAmount { amount }.into());
    }
    Ok(())
}

#[async_trait]
impl<S: UserStore + 'static> Wallet for WalletService<S> {
    async fn get_balance(&self, username: &Username) -> Result<Amount> {
        self.store
            .user(username)
            .await?
            .map(|user| user.balance)
            .ok_or_else(|| {
                WalletError::AccountNotFound {
                    username: username.clone(),
                }
                .into()
            })
    }

    async fn get_credit(&self, username: &Username, max_debt: Amount) -> Result<Amount> {
        let balance = self.store.user(username).await?.map_or(0, |user| user.balance);
        Ok(balance + max_debt)
    }

    async fn validate_balance(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
    ) -> Result<()> {
        let balance = self.get_balance(username).await?;
        if balance - amount < -max_debt {
            return Err(WalletError::InsufficientBalance {
                username: username.clone(),
                balance,
                amount,
                max_debt,
            }
            .into());
        }
        Ok(())
    }

    async fn credit(
        &self,
        username: &Username,
        amount: Amount,
        kind: EntryKind,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry> {
        let mutation = self.prepare_credit(username, amount, kind)?;
        self.commit(mutation, cancel).await
    }

    async fn debit(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
        kind: EntryKind,
        cancel: &CancelToken,
    ) -> Result<LedgerEntry> {
        let mutation = self.prepare_debit(username, amount, max_debt, kind)?;
        self.commit(mutation, cancel).await
    }

    fn prepare_credit(
        &self,
        username: &Username,
        amount: Amount,
        kind: EntryKind,
    ) -> Result<BalanceMutation> {
        ensure_positive(amount)?;
        if !kind.is_credit() {
            return Err(WalletError::InvalidTransaction { kind }.into());
        }
        Ok(BalanceMutation::credit(
            username.clone(),
            amount,
            kind,
            self.clock.now(),
        ))
    }

    fn prepare_debit(
        &self,
        username: &Username,
        amount: Amount,
        max_debt: Amount,
        kind: EntryKind,
    ) -> Result<BalanceMutation> {
        ensure_positive(amount)?;
        if !kind.is_debit() {
            return Err(WalletError::InvalidTransaction { kind }.into());
        }
        Ok(BalanceMutation::debit(
            username.clone(),
            amount,
            max_debt.max(0),
            kind,
            self.clock.now(),
        ))
    }
}
