//! Input validation for account fields
//!
//! Validated types enforce naming rules at the API boundary.
//! Fields are private to force validation through the public API.

use std::fmt;

use super::models::Currency;

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for account input
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported currency: '{0}' (expected one of USD, EUR, CAD)")]
    UnsupportedCurrency(String),

    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

// ============================================================================
// OwnerName - Validated Account Owner (Private Fields)
// ============================================================================

/// Validated account owner name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerName(String);

impl OwnerName {
    const MAX_LEN: usize = 64;

    /// Create a new validated OwnerName
    ///
    /// # Validation Rules
    /// - Length: 1-64 characters after trimming
    /// - Characters: ASCII alphanumeric, `_`, `-`, `.`
    ///
    /// # Errors
    /// Returns `ValidationError` if validation fails
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();

        if name.is_empty() || name.len() > Self::MAX_LEN {
            return Err(ValidationError::InvalidLength {
                field: "owner",
                min: 1,
                max: Self::MAX_LEN,
                actual: name.len(),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(ValidationError::InvalidFormat {
                field: "owner",
                value: name.to_string(),
                expected: "[A-Za-z0-9_.-]",
            });
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OwnerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a currency code, case-insensitive
pub fn parse_currency(code: &str) -> Result<Currency, ValidationError> {
    code.trim().to_ascii_uppercase().parse()
}

/// Field-level check used by `validator` derives on request DTOs
pub fn validate_currency_code(code: &str) -> Result<(), validator::ValidationError> {
    parse_currency(code)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("currency"))
}
