//! HTTP handlers
//!
//! Each handler validates input shape, calls the ledger store or the
//! transfer coordinator, and wraps the result in `ApiResponse`.

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{create_account, get_account, list_account_entries, list_accounts};
pub use health::health_check;
pub use transfer::{create_transfer, get_transfer};
