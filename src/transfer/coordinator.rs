//! Transfer Coordinator
//!
//! Runs one transfer as a single store transaction:
//!
//! ```text
//! validate → BEGIN → INSERT transfer → INSERT 2 entries
//!          → lock + update accounts in ascending id order → COMMIT
//! ```
//!
//! Any failure after BEGIN rolls back before the error is returned.
//! Transient conflicts restart the whole transaction, bounded by
//! [`RetryPolicy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{StoreError, TransferError};
use super::lock_order;
use super::retry::RetryPolicy;
use super::store::{LedgerStore, LedgerTx};
use super::types::{TransferParams, TransferResult};
use crate::account::{Account, AccountId};

/// Coordinator behavior knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    pub retry: RetryPolicy,
    /// Let the source balance go negative
    pub allow_overdraft: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            allow_overdraft: false,
        }
    }
}

/// Transfer Coordinator - atomic, deadlock-free transfers
pub struct TransferCoordinator {
    store: Arc<dyn LedgerStore>,
    config: TransferConfig,
}

impl TransferCoordinator {
    /// Create a new TransferCoordinator with default config
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_config(store, TransferConfig::default())
    }

    pub fn with_config(store: Arc<dyn LedgerStore>, config: TransferConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Move `amount` from one account to another
    ///
    /// Either the transfer row, both entries and both balance updates are
    /// committed together, or nothing is.
    ///
    /// Dropping the returned future before it completes rolls back the
    /// in-flight transaction.
    pub async fn execute(&self, params: TransferParams) -> Result<TransferResult, TransferError> {
        validate(&params)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.execute_once(&params).await {
                Ok(result) => {
                    info!(
                        transfer_id = result.transfer.id,
                        from = params.from_account_id,
                        to = params.to_account_id,
                        amount = params.amount,
                        attempt,
                        "Transfer committed"
                    );
                    return Ok(result);
                }
                Err(TransferError::Conflict { .. }) if self.config.retry.should_retry(attempt) => {
                    let backoff = self.config.retry.backoff_after(attempt);
                    warn!(
                        from = params.from_account_id,
                        to = params.to_account_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transfer conflicted, retrying"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(TransferError::Conflict { .. }) => {
                    warn!(
                        from = params.from_account_id,
                        to = params.to_account_id,
                        attempts = attempt,
                        "Transfer retries exhausted"
                    );
                    return Err(TransferError::Conflict { attempts: attempt });
                }
                Err(e) => {
                    debug!(
                        from = params.from_account_id,
                        to = params.to_account_id,
                        error = %e,
                        "Transfer rejected"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// One attempt in one fresh transaction
    async fn execute_once(&self, params: &TransferParams) -> Result<TransferResult, TransferError> {
        let mut tx = self.store.begin().await?;

        let outcome = self.apply(tx.as_mut(), params).await;
        match outcome {
            Ok(result) => {
                tx.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    // Connection is gone; the server discards the transaction
                    warn!(error = %rb, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        tx: &mut dyn LedgerTx,
        params: &TransferParams,
    ) -> Result<TransferResult, TransferError> {
        let TransferParams {
            from_account_id: from,
            to_account_id: to,
            amount,
        } = *params;

        let transfer = tx.create_transfer(from, to, amount).await?;
        let from_entry = tx.create_entry(from, -amount).await?;
        let to_entry = tx.create_entry(to, amount).await?;
        debug!(transfer_id = transfer.id, "Transfer and entries inserted");

        let order = lock_order::resolve(from, to);
        let delta = |id: AccountId| if id == order.to_account() { amount } else { -amount };
        let [first_id, second_id] = order.ids();
        let first = self.move_funds(tx, first_id, delta(first_id)).await?;
        let second = self.move_funds(tx, second_id, delta(second_id)).await?;

        let (from_account, to_account) = if first.id == order.from_account() {
            (first, second)
        } else {
            (second, first)
        };

        Ok(TransferResult {
            transfer,
            from_account,
            to_account,
            from_entry,
            to_entry,
        })
    }

    /// Lock one account row, check the overdraft rule, apply the delta
    async fn move_funds(
        &self,
        tx: &mut dyn LedgerTx,
        id: AccountId,
        delta: i64,
    ) -> Result<Account, TransferError> {
        let current = tx
            .get_account_for_update(id)
            .await
            .map_err(|e| with_account(e, id))?;

        if delta < 0 && !self.config.allow_overdraft && current.balance < -delta {
            return Err(TransferError::InsufficientFunds {
                account_id: id,
                balance: current.balance,
                amount: -delta,
            });
        }

        let updated = tx
            .add_account_balance(id, delta)
            .await
            .map_err(|e| with_account(e, id))?;
        debug!(account_id = id, delta, balance = updated.balance, "Balance updated");
        Ok(updated)
    }
}

/// Preconditions checked before any transaction opens
fn validate(params: &TransferParams) -> Result<(), TransferError> {
    if params.from_account_id == params.to_account_id {
        return Err(TransferError::InvalidArgument(format!(
            "source and destination account are the same ({})",
            params.from_account_id
        )));
    }
    if params.amount <= 0 {
        return Err(TransferError::InvalidArgument(format!(
            "amount must be positive, got {}",
            params.amount
        )));
    }
    Ok(())
}

fn with_account(err: StoreError, id: AccountId) -> TransferError {
    match err {
        StoreError::NotFound => TransferError::AccountNotFound(format!("account {id}")),
        StoreError::OutOfRange(msg) => {
            TransferError::BalanceOutOfRange(format!("account {id}: {msg}"))
        }
        other => other.into(),
    }
}
