//! `SeaORM` entity definitions.

pub mod credit_entries;
pub mod customer_balances;
pub mod customers;
pub mod shops;
