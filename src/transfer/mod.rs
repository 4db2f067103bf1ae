//! Transactional Transfer Engine
//!
//! Moves money between two accounts in one store transaction.
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ TransferCoordinator::execute
//!                 │  validate (from ≠ to, amount > 0)
//!                 ▼
//!            LedgerStore::begin ──▶ LedgerTx
//!                 │  create_transfer, create_entry × 2
//!                 │  lock_order::resolve(from, to)
//!                 │  get_account_for_update + add_account_balance (ascending id)
//!                 ▼
//!            commit | rollback ──▶ TransferResult | TransferError
//! ```
//!
//! # Safety Invariants
//!
//! 1. **All or nothing**: the transfer row, both entries and both balance
//!    updates share one transaction boundary
//! 2. **Canonical lock order**: account rows are always locked in ascending id
//!    order, so opposite transfers on the same pair cannot deadlock
//! 3. **Scoped transactions**: a `LedgerTx` that is dropped uncommitted rolls
//!    back, including on cancellation and panics
//! 4. **Bounded retries**: only transient conflicts are retried, each in a
//!    fresh transaction

pub mod coordinator;
pub mod error;
pub mod lock_order;
pub mod retry;
pub mod store;
pub mod types;


// Re-exports for convenience
pub use coordinator::{TransferConfig, TransferCoordinator};
pub use error::{StoreError, TransferError};
pub use lock_order::LockOrder;
pub use retry::RetryPolicy;
pub use store::{LedgerStore, LedgerTx, MemoryLedgerStore, PgLedgerStore};
pub use types::{Entry, EntryId, Transfer, TransferId, TransferParams, TransferResult};
