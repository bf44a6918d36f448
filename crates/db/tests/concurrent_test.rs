//! Concurrency tests for the balance aggregator.
//!
//! These run against a real Postgres instance. Set `DATABASE_URL` to run
//! them; without it each test skips.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, TransactionTrait};
use tokio::sync::Barrier;
use uuid::Uuid;

use khata_core::{ShopScope, TenantGuard};
use khata_db::entities::{credit_entries, customers, shops};
use khata_db::migration::{Migrator, MigratorTrait};
use khata_db::repositories::{
    CreditEntryRepository, CustomerBalanceRepository, RecordEntryInput, customer_balance,
};

async fn setup() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping db concurrency test");
        return None;
    };
    // A wide pool so concurrent writers genuinely overlap.
    let db = khata_db::connect_with_pool(&url, 20, 2, 8)
        .await
        .expect("failed to connect");
    Migrator::up(&db, None).await.expect("failed to migrate");
    Some(db)
}

async fn create_shop(db: &DatabaseConnection) -> Uuid {
    let id = Uuid::new_v4();
    shops::ActiveModel {
        id: Set(id),
        name: Set(format!("Concurrent Shop {id}")),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("failed to create shop");
    id
}

async fn create_customer(db: &DatabaseConnection, shop_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    customers::ActiveModel {
        id: Set(id),
        shop_id: Set(shop_id),
        name: Set(name.to_string()),
        phone: Set(None),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("failed to create customer");
    id
}

fn scope_for(shop_id: Uuid) -> ShopScope {
    TenantGuard::authorize(shop_id, shop_id).expect("same shop must authorize")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_entries_lose_no_updates() {
    let Some(db) = setup().await else { return };
    let shop_id = create_shop(&db).await;
    let customer_id = create_customer(&db, shop_id, "Busy Customer").await;

    const WRITERS: i64 = 16;

    let barrier = Arc::new(Barrier::new(WRITERS as usize));
    let mut handles = Vec::new();

    for i in 1..=WRITERS {
        let db = db.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            let scope = scope_for(shop_id);
            let entries = CreditEntryRepository::new(db);
            barrier.wait().await;
            // Mix of credits and repayments; the sum is known up front.
            let amount = if i % 4 == 0 {
                Decimal::from(-i)
            } else {
                Decimal::from(i)
            };
            entries
                .record_entry(
                    &scope,
                    RecordEntryInput {
                        customer_id,
                        amount,
                        description: None,
                        occurred_at: None,
                        idempotency_key: None,
                    },
                )
                .await
                .expect("record_entry failed");
            amount
        }));
    }

    let mut expected = Decimal::ZERO;
    for handle in join_all(handles).await {
        expected += handle.expect("writer task panicked");
    }

    let scope = scope_for(shop_id);
    let balances = CustomerBalanceRepository::new(db.clone());

    let outstanding = balances.get_outstanding(&scope, customer_id).await.unwrap();
    assert_eq!(outstanding, expected, "cached balance lost an update");

    // The cache agrees with the log.
    let recomputed = balances.reconcile(&scope, customer_id).await.unwrap();
    assert_eq!(recomputed, expected);

    // Every writer bumped the version exactly once.
    let row = balances.find(&scope, customer_id).await.unwrap().unwrap();
    assert_eq!(row.version, WRITERS + 1); // +1 for the reconcile
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_writers_on_different_customers_do_not_interfere() {
    let Some(db) = setup().await else { return };
    let shop_id = create_shop(&db).await;

    const CUSTOMERS: usize = 8;

    let mut customer_ids = Vec::with_capacity(CUSTOMERS);
    for i in 0..CUSTOMERS {
        customer_ids.push(create_customer(&db, shop_id, &format!("Customer {i}")).await);
    }

    let barrier = Arc::new(Barrier::new(CUSTOMERS));
    let mut handles = Vec::new();

    for (i, customer_id) in customer_ids.iter().copied().enumerate() {
        let db = db.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            let scope = scope_for(shop_id);
            let entries = CreditEntryRepository::new(db);
            barrier.wait().await;
            let amount = Decimal::from((i + 1) * 10);
            entries
                .record_entry(
                    &scope,
                    RecordEntryInput {
                        customer_id,
                        amount,
                        description: None,
                        occurred_at: None,
                        idempotency_key: None,
                    },
                )
                .await
                .expect("record_entry failed");
        }));
    }

    for handle in join_all(handles).await {
        handle.expect("writer task panicked");
    }

    let scope = scope_for(shop_id);
    let balances = CustomerBalanceRepository::new(db.clone());

    for (i, customer_id) in customer_ids.iter().copied().enumerate() {
        let outstanding = balances.get_outstanding(&scope, customer_id).await.unwrap();
        assert_eq!(outstanding, Decimal::from((i + 1) * 10));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_retries_with_same_idempotency_key_record_once() {
    let Some(db) = setup().await else { return };
    let shop_id = create_shop(&db).await;
    let customer_id = create_customer(&db, shop_id, "Flaky Network Customer").await;

    const RETRIES: usize = 8;
    let key = format!("burst-{}", Uuid::new_v4());

    let barrier = Arc::new(Barrier::new(RETRIES));
    let mut handles = Vec::new();

    for _ in 0..RETRIES {
        let db = db.clone();
        let barrier = barrier.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            let scope = scope_for(shop_id);
            let entries = CreditEntryRepository::new(db);
            barrier.wait().await;
            entries
                .record_entry(
                    &scope,
                    RecordEntryInput {
                        customer_id,
                        amount: dec!(250),
                        description: Some("same submission, retried".to_string()),
                        occurred_at: None,
                        idempotency_key: Some(key),
                    },
                )
                .await
                .expect("record_entry failed")
        }));
    }

    let mut entry_ids = Vec::new();
    for handle in join_all(handles).await {
        entry_ids.push(handle.expect("writer task panicked").id);
    }

    // Every retry surfaced the same logical entry.
    entry_ids.sort();
    entry_ids.dedup();
    assert_eq!(entry_ids.len(), 1);

    let scope = scope_for(shop_id);
    let balances = CustomerBalanceRepository::new(db.clone());

    // And the balance moved exactly once.
    let outstanding = balances.get_outstanding(&scope, customer_id).await.unwrap();
    assert_eq!(outstanding, dec!(250));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_reconcile_during_writes_converges() {
    let Some(db) = setup().await else { return };
    let shop_id = create_shop(&db).await;
    let customer_id = create_customer(&db, shop_id, "Audited Customer").await;

    const WRITERS: i64 = 10;

    let barrier = Arc::new(Barrier::new(WRITERS as usize + 1));
    let mut handles = Vec::new();

    for i in 1..=WRITERS {
        let db = db.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            let scope = scope_for(shop_id);
            let entries = CreditEntryRepository::new(db);
            barrier.wait().await;
            entries
                .record_entry(
                    &scope,
                    RecordEntryInput {
                        customer_id,
                        amount: Decimal::from(i),
                        description: None,
                        occurred_at: None,
                        idempotency_key: None,
                    },
                )
                .await
                .expect("record_entry failed");
        }));
    }

    // Reconcile in the middle of the write burst; it must not error and
    // must never leave the cache behind the log once writes finish.
    let reconciler = {
        let db = db.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            let scope = scope_for(shop_id);
            let balances = CustomerBalanceRepository::new(db);
            barrier.wait().await;
            balances
                .reconcile(&scope, customer_id)
                .await
                .expect("reconcile failed");
        })
    };

    for handle in join_all(handles).await {
        handle.expect("writer task panicked");
    }
    reconciler.await.expect("reconciler task panicked");

    let scope = scope_for(shop_id);
    let balances = CustomerBalanceRepository::new(db.clone());

    let expected = Decimal::from(WRITERS * (WRITERS + 1) / 2);
    let outstanding = balances.get_outstanding(&scope, customer_id).await.unwrap();
    assert_eq!(outstanding, expected);

    let recomputed = balances.reconcile(&scope, customer_id).await.unwrap();
    assert_eq!(recomputed, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reconcile_waits_for_inflight_writer() {
    let Some(db) = setup().await else { return };
    let shop_id = create_shop(&db).await;
    let customer_id = create_customer(&db, shop_id, "Slow Writer Customer").await;
    let scope = scope_for(shop_id);

    let entries = CreditEntryRepository::new(db.clone());
    entries
        .record_entry(
            &scope,
            RecordEntryInput {
                customer_id,
                amount: dec!(100),
                description: None,
                occurred_at: None,
                idempotency_key: None,
            },
        )
        .await
        .unwrap();

    // An open writer transaction holds the balance row lock across its
    // entry insert and increment, like a record_entry caught mid-flight.
    let writer = db.begin().await.unwrap();
    let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
    credit_entries::ActiveModel {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop_id),
        customer_id: Set(customer_id),
        amount: Set(dec!(50)),
        description: Set(None),
        occurred_at: Set(now),
        recorded_at: Set(now),
        idempotency_key: Set(None),
    }
    .insert(&writer)
    .await
    .unwrap();
    customer_balance::increment(&writer, &scope, customer_id, dec!(50))
        .await
        .unwrap();

    // Reconcile must queue behind the writer and, once through, count the
    // writer's committed entry rather than the pre-lock state.
    let reconciler = {
        let db = db.clone();
        tokio::spawn(async move {
            let scope = scope_for(shop_id);
            CustomerBalanceRepository::new(db)
                .reconcile(&scope, customer_id)
                .await
                .expect("reconcile failed")
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    writer.commit().await.unwrap();

    let reconciled = reconciler.await.expect("reconciler task panicked");
    assert_eq!(reconciled, dec!(150));

    let balances = CustomerBalanceRepository::new(db.clone());
    let outstanding = balances.get_outstanding(&scope, customer_id).await.unwrap();
    assert_eq!(outstanding, dec!(150));
}
