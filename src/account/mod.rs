//! Account management module
//!
//! Account records, currency codes, and boundary validation.

pub mod models;
pub mod validation;

// Re-export commonly used types
pub use models::{Account, AccountId, CreateAccountParams, Currency, ListAccountsParams};
pub use validation::{OwnerName, ValidationError, parse_currency};

// Re-export Database from top-level db module
pub use crate::db::Database;
