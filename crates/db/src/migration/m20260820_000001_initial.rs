//! Initial schema for the khata ledger.
//!
//! Creates shops, customers (Customer Directory), the append-only
//! credit_entries log, and the customer_balances cache.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS customer_balances CASCADE;
             DROP TABLE IF EXISTS credit_entries CASCADE;
             DROP TABLE IF EXISTS customers CASCADE;
             DROP TABLE IF EXISTS shops CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Shops (tenants)
CREATE TABLE shops (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Customer Directory (read-only for the ledger)
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    shop_id UUID NOT NULL REFERENCES shops(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    phone VARCHAR(32),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_customers_shop ON customers(shop_id, name);

-- Append-only credit ledger.
-- amount sign convention: positive = credit extended, negative = repayment.
CREATE TABLE credit_entries (
    id UUID PRIMARY KEY,
    shop_id UUID NOT NULL REFERENCES shops(id) ON DELETE CASCADE,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    description TEXT,
    occurred_at TIMESTAMPTZ NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    idempotency_key VARCHAR(128),
    CONSTRAINT chk_amount_nonzero CHECK (amount <> 0)
);

-- Every query is keyed on the tenant first
CREATE INDEX idx_credit_entries_shop_customer
    ON credit_entries(shop_id, customer_id, occurred_at DESC);

CREATE INDEX idx_credit_entries_shop_occurred
    ON credit_entries(shop_id, occurred_at DESC);

-- Duplicate submissions of the same logical entry are detectable per shop
CREATE UNIQUE INDEX uq_credit_entries_idempotency
    ON credit_entries(shop_id, idempotency_key)
    WHERE idempotency_key IS NOT NULL;

-- Cached outstanding balance per (shop, customer), maintained by atomic
-- increments and rebuilt by reconciliation.
CREATE TABLE customer_balances (
    shop_id UUID NOT NULL REFERENCES shops(id) ON DELETE CASCADE,
    customer_id UUID NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    outstanding NUMERIC(19, 4) NOT NULL,
    version BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (shop_id, customer_id)
);
";
