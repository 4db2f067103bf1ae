//! Transfer Types
//!
//! Ledger records (transfers, entries) and the composite result returned by
//! the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::account::{Account, AccountId};

/// Transfer identifier (store-assigned)
pub type TransferId = i64;

/// Entry identifier (store-assigned)
pub type EntryId = i64;

/// Input to [`TransferCoordinator::execute`](super::TransferCoordinator::execute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    /// Smallest currency unit; must be positive
    pub amount: i64,
}

impl TransferParams {
    pub fn new(from_account_id: AccountId, to_account_id: AccountId, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Immutable record of one money movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// One signed line item on one account
///
/// Negative for the debit side, positive for the credit side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Everything a committed transfer produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

impl TransferResult {
    /// Debit and credit must cancel out
    pub fn is_balanced(&self) -> bool {
        self.from_entry.amount + self.to_entry.amount == 0
    }
}
