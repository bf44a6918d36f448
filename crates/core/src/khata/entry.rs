//! Entry validation and the ledger sign convention.
//!
//! The sign convention is load-bearing for every balance computation and is
//! fixed contract behavior:
//! - **positive** amount: the shop extended credit or handed over goods,
//!   the customer now owes more
//! - **negative** amount: the customer repaid cash, the customer owes less
//!
//! No layer may flip or normalize the sign on the way to storage.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::error::KhataError;

/// Validates an entry amount before it reaches the store.
///
/// Amounts must be nonzero; a zero entry carries no information and would
/// pollute the append-only log.
///
/// # Errors
///
/// Returns `KhataError::InvalidAmount` for a zero amount.
pub fn validate_amount(amount: Decimal) -> Result<(), KhataError> {
    if amount.is_zero() {
        return Err(KhataError::InvalidAmount);
    }
    Ok(())
}

/// Business meaning of an entry, derived from its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Credit extended to the customer ("gave"): positive amount.
    CreditGiven,
    /// Cash repayment from the customer ("got"): negative amount.
    Repayment,
}

impl EntryKind {
    /// Classifies a validated (nonzero) amount.
    #[must_use]
    pub fn of(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            Self::CreditGiven
        } else {
            Self::Repayment
        }
    }
}

/// A correction for a previously recorded entry.
///
/// Entries are never mutated or deleted; a correction is a brand-new entry
/// with the inverse amount, preserving full auditability. UI-level "edit"
/// and "delete" operations must be translated into this pattern.
#[derive(Debug, Clone)]
pub struct CompensatingEntry {
    /// Customer whose khata is being corrected.
    pub customer_id: Uuid,
    /// Inverse of the original amount.
    pub amount: Decimal,
    /// Memo pointing back at the corrected entry.
    pub description: String,
}

impl CompensatingEntry {
    /// Builds the compensating entry for a recorded entry.
    #[must_use]
    pub fn for_entry(entry_id: Uuid, customer_id: Uuid, amount: Decimal) -> Self {
        Self {
            customer_id,
            amount: -amount,
            description: format!("Reversal of entry {entry_id}"),
        }
    }
}
