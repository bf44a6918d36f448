//! Core business logic for the Khata credit ledger.
//!
//! This crate is pure: no web framework, no database. It defines the
//! ledger's validation rules, sign convention, balance arithmetic, tenant
//! scoping, and history query types. Persistence lives in `khata-db`.

pub mod khata;

pub use khata::{
    CompensatingEntry, EntryKind, HistoryQuery, HistorySort, KhataError, OutstandingBalance,
    ShopScope, SortDirection, SortField, TenantGuard,
};
