//! Lock-Order Resolver
//!
//! Two transfers touching the same pair of accounts must lock the rows in the
//! same relative order, whatever their direction. The canonical order is
//! ascending account id.

use crate::account::AccountId;

/// Canonical acquisition order for a (from, to) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOrder {
    /// Locked first (smaller id)
    pub first: AccountId,
    /// Locked second (larger id)
    pub second: AccountId,
    /// `true` when `from` is `first`
    pub from_first: bool,
}

impl LockOrder {
    /// Ids in acquisition order
    pub fn ids(&self) -> [AccountId; 2] {
        [self.first, self.second]
    }

    /// The source account of the original pair
    pub fn from_account(&self) -> AccountId {
        if self.from_first { self.first } else { self.second }
    }

    /// The destination account of the original pair
    pub fn to_account(&self) -> AccountId {
        if self.from_first { self.second } else { self.first }
    }
}

/// Resolve a (from, to) pair to ascending-id order
///
/// Equal ids resolve with `from_first = true`; the coordinator rejects
/// self-transfers before this is consulted.
pub fn resolve(from: AccountId, to: AccountId) -> LockOrder {
    if from <= to {
        LockOrder {
            first: from,
            second: to,
            from_first: true,
        }
    } else {
        LockOrder {
            first: to,
            second: from,
            from_first: false,
        }
    }
}
