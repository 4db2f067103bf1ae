//! simple_bank - Transactional Transfer Engine
//!
//! Moves money between accounts with a durable, balanced ledger.
//!
//! # Modules
//!
//! - [`account`] - Account records, currencies, owner validation
//! - [`transfer`] - Transfer coordinator, lock ordering, retry, ledger stores
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`gateway`] - HTTP API (axum)
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup
//! - [`fixtures`] - Seeded random fixtures for tests

pub mod account;
pub mod config;
pub mod db;
pub mod fixtures;
pub mod gateway;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountId, Currency};
pub use fixtures::Fixtures;
pub use transfer::{
    LedgerStore, MemoryLedgerStore, PgLedgerStore, TransferConfig, TransferCoordinator,
    TransferError, TransferParams, TransferResult,
};
