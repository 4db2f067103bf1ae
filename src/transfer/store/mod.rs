//! Ledger Stores
//!
//! The coordinator talks to storage only through these traits. A production
//! implementation runs on PostgreSQL; an in-memory implementation reproduces
//! row locking and foreign keys for tests.
//!
//! Every `LedgerTx` method is one atomic statement inside the open
//! transaction and never opens a transaction of its own. Dropping a
//! `LedgerTx` without calling `commit` rolls it back.

pub mod memory;
pub mod postgres;

// Re-export stores for convenient access
pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;

use super::error::StoreError;
use super::types::{Entry, Transfer, TransferId};
use crate::account::{Account, AccountId, CreateAccountParams, ListAccountsParams};

/// Transactional ledger storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get store name for logging
    fn name(&self) -> &'static str;

    /// Open a new transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    /// Insert a new account row
    async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, StoreError>;

    /// Read committed account state
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Page through accounts ordered by id
    async fn list_accounts(&self, params: &ListAccountsParams)
    -> Result<Vec<Account>, StoreError>;

    async fn get_transfer(&self, id: TransferId) -> Result<Transfer, StoreError>;

    /// All entries of one account, oldest first
    async fn list_entries(&self, account_id: AccountId) -> Result<Vec<Entry>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// One open store transaction
#[async_trait]
pub trait LedgerTx: Send {
    /// Read an account and hold its row lock until the transaction ends
    ///
    /// A concurrent transaction asking for the same row waits.
    async fn get_account_for_update(&mut self, id: AccountId) -> Result<Account, StoreError>;

    /// Add `delta` to the balance and return the updated row
    async fn add_account_balance(
        &mut self,
        id: AccountId,
        delta: i64,
    ) -> Result<Account, StoreError>;

    async fn create_transfer(
        &mut self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: i64,
    ) -> Result<Transfer, StoreError>;

    async fn create_entry(&mut self, account_id: AccountId, amount: i64)
    -> Result<Entry, StoreError>;

    /// Make every write of this transaction visible at once
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
