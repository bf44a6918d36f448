//! Outstanding balance arithmetic.
//!
//! The persisted `customer_balances` row is a cache; this module defines
//! the arithmetic it caches. The core invariant: at rest, `outstanding`
//! equals the signed sum of every entry amount for that
//! `(shop_id, customer_id)` pair.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached outstanding balance for one customer in one shop.
///
/// `version` increases by one on every applied entry and on every
/// reconciliation, so lost updates are detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingBalance {
    /// Owning shop.
    pub shop_id: Uuid,
    /// Customer within the shop.
    pub customer_id: Uuid,
    /// Net amount the customer currently owes.
    pub outstanding: Decimal,
    /// Monotonic update counter.
    pub version: i64,
}

impl OutstandingBalance {
    /// Creates the balance row for a customer's first entry.
    #[must_use]
    pub const fn open(shop_id: Uuid, customer_id: Uuid, amount: Decimal) -> Self {
        Self {
            shop_id,
            customer_id,
            outstanding: amount,
            version: 1,
        }
    }

    /// Applies one more entry amount to the cached balance.
    #[must_use]
    pub fn apply(&self, amount: Decimal) -> Self {
        Self {
            shop_id: self.shop_id,
            customer_id: self.customer_id,
            outstanding: self.outstanding + amount,
            version: self.version + 1,
        }
    }
}

/// Recomputes the outstanding figure from the authoritative entry log.
///
/// This is the reconciliation reference: whatever the cache says, this sum
/// is the truth.
#[must_use]
pub fn sum_entries<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().sum()
}
