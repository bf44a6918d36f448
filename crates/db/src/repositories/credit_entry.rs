//! Ledger Entry Store and History Query Service.
//!
//! Entries are append-only: this repository exposes no update or delete.
//! Recording an entry and incrementing the cached balance commit as one
//! database transaction, so a reader never observes one without the other.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::DateTimeWithTimeZone,
};
use tracing::info;
use uuid::Uuid;

use khata_core::khata::entry::validate_amount;
use khata_core::{CompensatingEntry, HistoryQuery, KhataError, ShopScope, SortDirection, SortField};

use super::{customer_balance, store_err};
use crate::entities::{credit_entries, customers};

/// Input for recording a ledger entry.
#[derive(Debug, Clone)]
pub struct RecordEntryInput {
    /// Customer the entry belongs to; must resolve in the scoped shop.
    pub customer_id: Uuid,
    /// Signed amount: positive = credit extended, negative = repayment.
    pub amount: Decimal,
    /// Optional free-text memo.
    pub description: Option<String>,
    /// Business transaction date; defaults to now.
    pub occurred_at: Option<DateTimeWithTimeZone>,
    /// Client token making retried submissions safe.
    pub idempotency_key: Option<String>,
}

/// A ledger entry joined with its customer's display name.
#[derive(Debug, Clone)]
pub struct EntryWithCustomer {
    /// The ledger entry.
    pub entry: credit_entries::Model,
    /// Display name resolved via the Customer Directory.
    pub customer_name: Option<String>,
}

/// Repository over the append-only credit_entries log.
#[derive(Debug, Clone)]
pub struct CreditEntryRepository {
    db: DatabaseConnection,
}

impl CreditEntryRepository {
    /// Creates a new credit entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a new ledger entry and increments the customer's cached
    /// balance as a single atomic unit.
    ///
    /// When `idempotency_key` is set and an entry with the same key
    /// already exists in this shop, that entry is returned verbatim: no
    /// second insert, no second increment.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a zero amount
    /// - `UnknownCustomer` if the customer does not resolve in this shop
    /// - `StoreUnavailable` on storage failure (not retried here; callers
    ///   retry with the same idempotency key)
    pub async fn record_entry(
        &self,
        scope: &ShopScope,
        input: RecordEntryInput,
    ) -> Result<credit_entries::Model, KhataError> {
        validate_amount(input.amount)?;

        // Idempotent replay of an already-recorded submission.
        if let Some(key) = &input.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(scope, key).await? {
                return Ok(existing);
            }
        }

        let txn = self.db.begin().await.map_err(store_err)?;

        // The customer must resolve in this shop's directory.
        let customer = customers::Entity::find_by_id(input.customer_id)
            .filter(customers::Column::ShopId.eq(scope.shop_id()))
            .one(&txn)
            .await
            .map_err(store_err)?;
        if customer.is_none() {
            txn.rollback().await.map_err(store_err)?;
            return Err(KhataError::UnknownCustomer(input.customer_id));
        }

        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let entry = credit_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            shop_id: Set(scope.shop_id()),
            customer_id: Set(input.customer_id),
            amount: Set(input.amount),
            description: Set(input.description.clone()),
            occurred_at: Set(input.occurred_at.unwrap_or(now)),
            recorded_at: Set(now),
            idempotency_key: Set(input.idempotency_key.clone()),
        };

        let inserted = match entry.insert(&txn).await {
            Ok(model) => model,
            Err(err) => {
                // A concurrent retry may have won the idempotency race and
                // tripped the unique index; surface its entry instead.
                txn.rollback().await.ok();
                if let Some(key) = &input.idempotency_key {
                    if let Some(existing) = self.find_by_idempotency_key(scope, key).await? {
                        return Ok(existing);
                    }
                }
                return Err(store_err(err));
            }
        };

        customer_balance::increment(&txn, scope, input.customer_id, input.amount).await?;

        txn.commit().await.map_err(store_err)?;

        info!(
            shop_id = %scope.shop_id(),
            customer_id = %inserted.customer_id,
            entry_id = %inserted.id,
            amount = %inserted.amount,
            "Recorded khata entry"
        );

        Ok(inserted)
    }

    /// Records the compensating entry for a previously recorded entry.
    ///
    /// Entries are never mutated or deleted; a correction is a new entry
    /// with the inverse amount. The reversal carries a key derived from the
    /// original entry's id, so reversing the same entry twice surfaces the
    /// first compensating entry instead of recording a second one.
    ///
    /// # Errors
    ///
    /// - `UnknownEntry` if the entry does not resolve in this shop
    /// - the errors of `record_entry` otherwise
    pub async fn reverse_entry(
        &self,
        scope: &ShopScope,
        entry_id: Uuid,
    ) -> Result<credit_entries::Model, KhataError> {
        let original = credit_entries::Entity::find_by_id(entry_id)
            .filter(credit_entries::Column::ShopId.eq(scope.shop_id()))
            .one(&self.db)
            .await
            .map_err(store_err)?
            .ok_or(KhataError::UnknownEntry(entry_id))?;

        let reversal =
            CompensatingEntry::for_entry(original.id, original.customer_id, original.amount);

        self.record_entry(
            scope,
            RecordEntryInput {
                customer_id: reversal.customer_id,
                amount: reversal.amount,
                description: Some(reversal.description),
                occurred_at: None,
                idempotency_key: Some(format!("reversal-{entry_id}")),
            },
        )
        .await
    }

    /// History Query Service: paginated, sortable retrieval of entries.
    ///
    /// Returns the requested page plus the total count across all pages.
    /// A page beyond the available range is an empty sequence with the
    /// correct total, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if a query fails. Sort validation
    /// happens upstream, in `khata-core::history`.
    pub async fn list_entries(
        &self,
        scope: &ShopScope,
        query: &HistoryQuery,
    ) -> Result<(Vec<EntryWithCustomer>, u64), KhataError> {
        let mut filtered = credit_entries::Entity::find()
            .filter(credit_entries::Column::ShopId.eq(scope.shop_id()));
        if let Some(customer_id) = query.customer_id {
            filtered = filtered.filter(credit_entries::Column::CustomerId.eq(customer_id));
        }

        let total = filtered.clone().count(&self.db).await.map_err(store_err)?;

        let order = match query.sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        // Customer display name is a join, not a ledger-owned field.
        let mut select = filtered.find_also_related(customers::Entity);
        select = match query.sort.field {
            SortField::OccurredAt => select.order_by(credit_entries::Column::OccurredAt, order),
            SortField::Amount => select.order_by(credit_entries::Column::Amount, order),
            SortField::CustomerName => select.order_by(customers::Column::Name, order),
        };
        // Time-ordered UUIDv7 ids keep pages stable under equal sort keys.
        let select = select.order_by(credit_entries::Column::Id, Order::Asc);

        let rows = select
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        let items = rows
            .into_iter()
            .map(|(entry, customer)| EntryWithCustomer {
                customer_name: customer.map(|c| c.name),
                entry,
            })
            .collect();

        Ok((items, total))
    }

    /// Looks up a previously recorded entry by its idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the query fails.
    async fn find_by_idempotency_key(
        &self,
        scope: &ShopScope,
        key: &str,
    ) -> Result<Option<credit_entries::Model>, KhataError> {
        credit_entries::Entity::find()
            .filter(credit_entries::Column::ShopId.eq(scope.shop_id()))
            .filter(credit_entries::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
            .map_err(store_err)
    }
}
