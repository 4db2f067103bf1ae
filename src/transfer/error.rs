//! Transfer Error Types
//!
//! `StoreError` classifies what the ledger store reported; `TransferError` is
//! what callers of the coordinator see.

use thiserror::Error;

use crate::account::AccountId;

/// Store-level failure classification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Targeted row does not exist
    #[error("Row not found")]
    NotFound,

    /// Foreign key / check constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization failure, deadlock victim, or lock wait timeout
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A balance update left the representable range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Connection, pool, or protocol failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// PostgreSQL SQLSTATE codes that mean "retry the transaction"
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                match code.as_deref() {
                    Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE) => {
                        StoreError::Conflict(db_err.message().to_string())
                    }
                    Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                        StoreError::OutOfRange(db_err.message().to_string())
                    }
                    Some(c) if c.starts_with("23") => {
                        StoreError::ConstraintViolation(db_err.message().to_string())
                    }
                    _ => StoreError::Unavailable(db_err.message().to_string()),
                }
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Transfer error types
///
/// Error codes are stable strings for API responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Self-transfer or non-positive amount; rejected before any transaction
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: i64,
        amount: i64,
    },

    /// Transient conflicts persisted through every attempt
    #[error("Transfer conflicted after {attempts} attempt(s), retry later")]
    Conflict { attempts: u32 },

    /// Applying the transfer would overflow an account balance
    #[error("Balance out of range: {0}")]
    BalanceOutOfRange(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TransferError::Conflict { .. } => "CONFLICT",
            TransferError::BalanceOutOfRange(_) => "BALANCE_OUT_OF_RANGE",
            TransferError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidArgument(_) => 400,
            TransferError::AccountNotFound(_) => 404,
            TransferError::Conflict { .. } => 409,
            TransferError::InsufficientFunds { .. } | TransferError::BalanceOutOfRange(_) => 422,
            TransferError::StoreUnavailable(_) => 503,
        }
    }

    /// Whether the caller may resubmit the identical request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::Conflict { .. } | TransferError::StoreUnavailable(_)
        )
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => TransferError::AccountNotFound("no such account".to_string()),
            StoreError::ConstraintViolation(msg) => TransferError::AccountNotFound(msg),
            StoreError::Conflict(_) => TransferError::Conflict { attempts: 1 },
            StoreError::OutOfRange(msg) => TransferError::BalanceOutOfRange(msg),
            StoreError::Unavailable(msg) => TransferError::StoreUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            TransferError::InvalidArgument("x".into()).code(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            TransferError::Conflict { attempts: 5 }.code(),
            "CONFLICT"
        );
        assert_eq!(
            TransferError::StoreUnavailable("down".into()).code(),
            "STORE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TransferError::InvalidArgument("x".into()).http_status(), 400);
        assert_eq!(TransferError::AccountNotFound("x".into()).http_status(), 404);
        assert_eq!(TransferError::Conflict { attempts: 3 }.http_status(), 409);
        assert_eq!(
            TransferError::InsufficientFunds {
                account_id: 1,
                balance: 0,
                amount: 1
            }
            .http_status(),
            422
        );
        assert_eq!(
            TransferError::StoreUnavailable("x".into()).http_status(),
            503
        );
    }

    #[test]
    fn test_retryable() {
        assert!(TransferError::Conflict { attempts: 5 }.is_retryable());
        assert!(TransferError::StoreUnavailable("x".into()).is_retryable());
        assert!(!TransferError::AccountNotFound("x".into()).is_retryable());
        assert!(!TransferError::InvalidArgument("x".into()).is_retryable());
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            TransferError::from(StoreError::NotFound),
            TransferError::AccountNotFound(_)
        ));
        assert!(matches!(
            TransferError::from(StoreError::ConstraintViolation("fk".into())),
            TransferError::AccountNotFound(_)
        ));
        assert_eq!(
            TransferError::from(StoreError::Conflict("deadlock".into())),
            TransferError::Conflict { attempts: 1 }
        );
        assert_eq!(
            TransferError::from(StoreError::OutOfRange("bigint out of range".into())),
            TransferError::BalanceOutOfRange("bigint out of range".into())
        );
    }

    #[test]
    fn test_balance_out_of_range_is_final() {
        let err = TransferError::BalanceOutOfRange("account 2".into());
        assert_eq!(err.code(), "BALANCE_OUT_OF_RANGE");
        assert_eq!(err.http_status(), 422);
        assert!(!err.is_retryable());
    }

    /// Server error carrying a fixed SQLSTATE
    #[derive(Debug, Error)]
    #[error("{message}")]
    struct PgError {
        code: &'static str,
        message: &'static str,
    }

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            self.message
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.code.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str, message: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgError { code, message }))
    }

    #[test]
    fn test_sqlstate_classification() {
        assert!(matches!(
            StoreError::from(db_error("40P01", "deadlock detected")),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(db_error("40001", "could not serialize access")),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(db_error("23503", "violates foreign key constraint")),
            StoreError::ConstraintViolation(_)
        ));
        assert_eq!(
            StoreError::from(db_error("22003", "bigint out of range")),
            StoreError::OutOfRange("bigint out of range".to_string())
        );
        assert!(matches!(
            StoreError::from(db_error("57P01", "terminating connection")),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        assert_eq!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_display() {
        let err = TransferError::InsufficientFunds {
            account_id: 3,
            balance: 10,
            amount: 25,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account 3: balance 10, requested 25"
        );
    }
}
