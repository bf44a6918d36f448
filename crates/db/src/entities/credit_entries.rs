//! `SeaORM` Entity for the credit_entries table.
//!
//! Entries are append-only: no repository exposes an update or delete for
//! this table. Corrections are compensating entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    /// Signed amount: positive = credit extended, negative = repayment.
    pub amount: Decimal,
    pub description: Option<String>,
    /// Business transaction date; may be backdated by the caller.
    pub occurred_at: DateTimeWithTimeZone,
    /// Server-assigned creation timestamp, immutable.
    pub recorded_at: DateTimeWithTimeZone,
    /// Client-generated token making retried submissions safe.
    /// Unique per (shop_id, idempotency_key).
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shops::Entity",
        from = "Column::ShopId",
        to = "super::shops::Column::Id"
    )]
    Shops,
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
}

impl Related<super::shops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shops.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
