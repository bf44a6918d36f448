//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every method takes a `ShopScope` minted by the tenant guard and keys its
//! queries on it; no repository accepts a bare shop ID.

pub mod credit_entry;
pub mod customer;
pub mod customer_balance;

pub use credit_entry::{CreditEntryRepository, EntryWithCustomer, RecordEntryInput};
pub use customer::CustomerRepository;
pub use customer_balance::CustomerBalanceRepository;

use khata_core::KhataError;
use sea_orm::DbErr;

/// Maps a database error to the ledger's transient-storage error.
///
/// The ledger never retries internally; callers retry with an idempotency
/// token.
pub(crate) fn store_err(err: DbErr) -> KhataError {
    KhataError::StoreUnavailable(err.to_string())
}
