//! Customer credit ledger ("khata") domain logic.
//!
//! A khata is the running credit notebook between a shop and one of its
//! customers: an append-only log of signed entries from which the
//! customer's outstanding balance is derived.
//!
//! Sign convention (fixed contract behavior, see [`entry`]):
//! - positive amount = the shop extended credit, the customer owes more
//! - negative amount = the customer repaid, the customer owes less

pub mod balance;
pub mod entry;
pub mod error;
pub mod guard;
pub mod history;

pub use balance::OutstandingBalance;
pub use entry::{CompensatingEntry, EntryKind, validate_amount};
pub use error::KhataError;
pub use guard::{ShopScope, TenantGuard};
pub use history::{HistoryQuery, HistorySort, SortDirection, SortField};
