//! Customer Directory lookups.
//!
//! The ledger consults the directory for existence checks and display
//! names; it never writes to it.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use khata_core::{KhataError, ShopScope};

use super::store_err;
use crate::entities::customers;

/// Read-only repository over the Customer Directory.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a customer by ID within the scoped shop.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails.
    pub async fn find_in_shop(
        &self,
        scope: &ShopScope,
        customer_id: Uuid,
    ) -> Result<Option<customers::Model>, KhataError> {
        customers::Entity::find_by_id(customer_id)
            .filter(customers::Column::ShopId.eq(scope.shop_id()))
            .one(&self.db)
            .await
            .map_err(store_err)
    }

    /// Resolves a customer or fails with `UnknownCustomer`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCustomer` if the ID does not resolve under the
    /// scoped shop, `StoreUnavailable` if the query fails.
    pub async fn resolve(
        &self,
        scope: &ShopScope,
        customer_id: Uuid,
    ) -> Result<customers::Model, KhataError> {
        self.find_in_shop(scope, customer_id)
            .await?
            .ok_or(KhataError::UnknownCustomer(customer_id))
    }
}
