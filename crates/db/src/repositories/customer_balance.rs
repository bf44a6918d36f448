//! Balance Aggregator: cached outstanding balances per customer.
//!
//! The cache is maintained by a single atomic SQL upsert per entry (never
//! read-modify-write at the application layer, so concurrent entries for
//! the same customer cannot lose updates) and rebuilt by a reconciliation
//! pass that recomputes the sum from the entry log.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Set, Statement, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use tracing::info;
use uuid::Uuid;

use khata_core::{KhataError, ShopScope};

use super::store_err;
use crate::entities::customer_balances;

/// Atomically adds `amount` to a customer's outstanding balance, creating
/// the row with `outstanding = amount` if none exists.
///
/// Generic over the connection so the Ledger Entry Store can run it on the
/// same transaction as the entry insert. Serialization happens at the
/// balance row: concurrent increments for the same customer queue on the
/// row lock, different customers proceed independently.
///
/// # Errors
///
/// Returns `StoreUnavailable` if the statement fails.
pub async fn increment<C: ConnectionTrait>(
    conn: &C,
    scope: &ShopScope,
    customer_id: Uuid,
    amount: Decimal,
) -> Result<(), KhataError> {
    let now: DateTimeWithTimeZone = chrono::Utc::now().into();

    let first = customer_balances::ActiveModel {
        shop_id: Set(scope.shop_id()),
        customer_id: Set(customer_id),
        outstanding: Set(amount),
        version: Set(1),
        updated_at: Set(now),
    };

    // The update arm must table-qualify its columns: the conflict clause
    // also sees the `excluded` pseudo-table, so bare names are ambiguous.
    customer_balances::Entity::insert(first)
        .on_conflict(
            OnConflict::columns([
                customer_balances::Column::ShopId,
                customer_balances::Column::CustomerId,
            ])
            .value(
                customer_balances::Column::Outstanding,
                Expr::col((
                    customer_balances::Entity,
                    customer_balances::Column::Outstanding,
                ))
                .add(amount),
            )
            .value(
                customer_balances::Column::Version,
                Expr::col((
                    customer_balances::Entity,
                    customer_balances::Column::Version,
                ))
                .add(1),
            )
            .value(customer_balances::Column::UpdatedAt, now)
            .to_owned(),
        )
        .exec(conn)
        .await
        .map_err(store_err)?;

    Ok(())
}

/// Locks the balance row, creating it if missing, without changing it.
/// `DO NOTHING` would skip the row lock on conflict, so the no-op update
/// is load-bearing: reconcile must queue behind in-flight writers here.
const LOCK_BALANCE_SQL: &str = r"
INSERT INTO customer_balances (shop_id, customer_id, outstanding, version, updated_at)
VALUES ($1, $2, 0, 0, now())
ON CONFLICT (shop_id, customer_id) DO UPDATE
    SET version = customer_balances.version;
";

/// Recomputes the sum in a statement of its own, after the row lock has
/// been granted. Under read committed each statement takes a fresh
/// snapshot, so the sum covers every entry committed by writers the lock
/// waited on.
const RECONCILE_SQL: &str = r"
UPDATE customer_balances SET
    outstanding = COALESCE((
        SELECT SUM(amount) FROM credit_entries
        WHERE shop_id = customer_balances.shop_id
          AND customer_id = customer_balances.customer_id
    ), 0),
    version = customer_balances.version + 1,
    updated_at = now()
WHERE shop_id = $1 AND customer_id = $2
RETURNING outstanding;
";

/// Repository over the customer_balances cache.
#[derive(Debug, Clone)]
pub struct CustomerBalanceRepository {
    db: DatabaseConnection,
}

impl CustomerBalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the cached outstanding balance for a customer.
    ///
    /// A customer with no entries reads as zero; no row is created.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails.
    pub async fn get_outstanding(
        &self,
        scope: &ShopScope,
        customer_id: Uuid,
    ) -> Result<Decimal, KhataError> {
        let row = customer_balances::Entity::find_by_id((scope.shop_id(), customer_id))
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(row.map_or(Decimal::ZERO, |balance| balance.outstanding))
    }

    /// Returns the full cached balance row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails.
    pub async fn find(
        &self,
        scope: &ShopScope,
        customer_id: Uuid,
    ) -> Result<Option<customer_balances::Model>, KhataError> {
        customer_balances::Entity::find_by_id((scope.shop_id(), customer_id))
            .one(&self.db)
            .await
            .map_err(store_err)
    }

    /// Recomputes a customer's outstanding balance from the entry log and
    /// overwrites the cache, returning the recomputed figure.
    ///
    /// Two statements in one transaction: first take the balance row lock,
    /// queueing behind any in-flight `record_entry` for this customer, then
    /// recompute the sum. The sum's snapshot is taken after the lock is
    /// granted, so the result covers every entry committed before this call
    /// returns. The authoritative recovery path when drift is suspected,
    /// and idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a statement fails.
    pub async fn reconcile(
        &self,
        scope: &ShopScope,
        customer_id: Uuid,
    ) -> Result<Decimal, KhataError> {
        let txn = self.db.begin().await.map_err(store_err)?;
        let params = [
            sea_orm::Value::from(scope.shop_id()),
            sea_orm::Value::from(customer_id),
        ];

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            LOCK_BALANCE_SQL,
            params.clone(),
        ))
        .await
        .map_err(store_err)?;

        let row = txn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                RECONCILE_SQL,
                params,
            ))
            .await
            .map_err(store_err)?
            .ok_or_else(|| KhataError::StoreUnavailable("reconcile returned no row".into()))?;

        let outstanding: Decimal = row.try_get("", "outstanding").map_err(store_err)?;

        txn.commit().await.map_err(store_err)?;

        info!(
            shop_id = %scope.shop_id(),
            customer_id = %customer_id,
            outstanding = %outstanding,
            "Reconciled customer balance"
        );

        Ok(outstanding)
    }
}
