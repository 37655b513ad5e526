//! Postgres-backed stores (behind the `postgres` feature).
//!
//! Records are persisted whole as JSONB next to a `version` column; the
//! conditional write is a row-level `UPDATE ... WHERE id = $1 AND
//! version = $2`, so the optimistic-concurrency check happens in the
//! database. Unique indexes on `catalog_code` and `order_number` back
//! the insert-time uniqueness guarantees.
//!
//! SQLx unique-violation errors (code `23505`) are mapped to
//! [`StoreError::Duplicate`]; a conditional update touching zero rows is
//! a [`StoreError::Concurrency`].

use sqlx::{PgPool, Row};
use uuid::Uuid;

use vendora_catalog::Product;
use vendora_core::{BuyerId, ExpectedVersion, OrderId, ProductId};
use vendora_orders::{Order, OrderNumber};

use super::r#trait::{CatalogStore, OrderStore, StoreError, StoredOrder, StoredProduct};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog_products (
    id UUID PRIMARY KEY,
    catalog_code TEXT NOT NULL UNIQUE,
    version BIGINT NOT NULL,
    record JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    order_number TEXT NOT NULL UNIQUE,
    buyer_id UUID NOT NULL,
    version BIGINT NOT NULL,
    record JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_buyer_idx ON orders (buyer_id);
"#;

/// Create the backing tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
    }
    Ok(())
}

/// Bridge the synchronous store traits onto SQLx.
///
/// Works when called from within a tokio runtime (e.g. from axum
/// handlers), matching how the in-process callers run.
fn block_on<F, T>(future: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Storage(
            "postgres stores require an async runtime (tokio); call from within a runtime context"
                .to_string(),
        )
    })?;
    handle.block_on(future)
}

fn map_sqlx(e: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate {
                field,
                value: value.to_string(),
            };
        }
    }
    StoreError::Storage(e.to_string())
}

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_async(&self, product: Product) -> Result<StoredProduct, StoreError> {
        let record = serde_json::to_value(&product)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let code = product.code().to_string();

        sqlx::query(
            "INSERT INTO catalog_products (id, catalog_code, version, record)
             VALUES ($1, $2, 1, $3)",
        )
        .bind(*product.id_typed().as_uuid())
        .bind(&code)
        .bind(&record)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "catalog_code", &code))?;

        Ok(StoredProduct {
            product,
            version: 1,
        })
    }

    async fn get_async(&self, product_id: ProductId) -> Result<Option<StoredProduct>, StoreError> {
        let row = sqlx::query("SELECT version, record FROM catalog_products WHERE id = $1")
            .bind(*product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        row.map(decode_product).transpose()
    }

    async fn list_async(&self) -> Result<Vec<StoredProduct>, StoreError> {
        let rows = sqlx::query("SELECT version, record FROM catalog_products ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        rows.into_iter().map(decode_product).collect()
    }

    async fn update_async(
        &self,
        expected: ExpectedVersion,
        product: Product,
    ) -> Result<StoredProduct, StoreError> {
        let record = serde_json::to_value(&product)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let id = *product.id_typed().as_uuid();

        let row = match expected {
            ExpectedVersion::Exact(version) => sqlx::query(
                "UPDATE catalog_products
                 SET record = $1, version = version + 1
                 WHERE id = $2 AND version = $3
                 RETURNING version",
            )
            .bind(&record)
            .bind(id)
            .bind(version as i64)
            .fetch_optional(&self.pool)
            .await,
            ExpectedVersion::Any => sqlx::query(
                "UPDATE catalog_products
                 SET record = $1, version = version + 1
                 WHERE id = $2
                 RETURNING version",
            )
            .bind(&record)
            .bind(id)
            .fetch_optional(&self.pool)
            .await,
        }
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(StoredProduct {
                    product,
                    version: version as u64,
                })
            }
            None => Err(StoreError::Concurrency(format!(
                "conditional update of product {id} touched no row (expected {expected:?})"
            ))),
        }
    }
}

fn decode_product(row: sqlx::postgres::PgRow) -> Result<StoredProduct, StoreError> {
    let version: i64 = row
        .try_get("version")
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let record: serde_json::Value = row
        .try_get("record")
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let product: Product =
        serde_json::from_value(record).map_err(|e| StoreError::Storage(e.to_string()))?;
    Ok(StoredProduct {
        product,
        version: version as u64,
    })
}

impl CatalogStore for PostgresCatalogStore {
    fn insert(&self, product: Product) -> Result<StoredProduct, StoreError> {
        block_on(self.insert_async(product))
    }

    fn get(&self, product_id: ProductId) -> Result<Option<StoredProduct>, StoreError> {
        block_on(self.get_async(product_id))
    }

    fn list(&self) -> Result<Vec<StoredProduct>, StoreError> {
        block_on(self.list_async())
    }

    fn update(
        &self,
        expected: ExpectedVersion,
        product: Product,
    ) -> Result<StoredProduct, StoreError> {
        block_on(self.update_async(expected, product))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_async(&self, order: Order) -> Result<StoredOrder, StoreError> {
        let record =
            serde_json::to_value(&order).map_err(|e| StoreError::Storage(e.to_string()))?;
        let number = order.number().to_string();

        sqlx::query(
            "INSERT INTO orders (id, order_number, buyer_id, version, record)
             VALUES ($1, $2, $3, 1, $4)",
        )
        .bind(*order.id_typed().as_uuid())
        .bind(&number)
        .bind(*order.buyer_id().as_uuid())
        .bind(&record)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, "order_number", &number))?;

        Ok(StoredOrder { order, version: 1 })
    }

    async fn get_where(
        &self,
        sql: &str,
        bind: Uuid,
    ) -> Result<Option<StoredOrder>, StoreError> {
        let row = sqlx::query(sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        row.map(decode_order).transpose()
    }

    async fn get_by_number_async(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<StoredOrder>, StoreError> {
        let row = sqlx::query("SELECT version, record FROM orders WHERE order_number = $1")
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        row.map(decode_order).transpose()
    }

    async fn list_by_buyer_async(&self, buyer_id: BuyerId) -> Result<Vec<StoredOrder>, StoreError> {
        let rows = sqlx::query(
            "SELECT version, record FROM orders WHERE buyer_id = $1 ORDER BY id",
        )
        .bind(*buyer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        rows.into_iter().map(decode_order).collect()
    }

    async fn update_async(
        &self,
        expected: ExpectedVersion,
        order: Order,
    ) -> Result<StoredOrder, StoreError> {
        let record =
            serde_json::to_value(&order).map_err(|e| StoreError::Storage(e.to_string()))?;
        let id = *order.id_typed().as_uuid();

        let row = match expected {
            ExpectedVersion::Exact(version) => sqlx::query(
                "UPDATE orders
                 SET record = $1, version = version + 1
                 WHERE id = $2 AND version = $3
                 RETURNING version",
            )
            .bind(&record)
            .bind(id)
            .bind(version as i64)
            .fetch_optional(&self.pool)
            .await,
            ExpectedVersion::Any => sqlx::query(
                "UPDATE orders
                 SET record = $1, version = version + 1
                 WHERE id = $2
                 RETURNING version",
            )
            .bind(&record)
            .bind(id)
            .fetch_optional(&self.pool)
            .await,
        }
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                Ok(StoredOrder {
                    order,
                    version: version as u64,
                })
            }
            None => Err(StoreError::Concurrency(format!(
                "conditional update of order {id} touched no row (expected {expected:?})"
            ))),
        }
    }
}

fn decode_order(row: sqlx::postgres::PgRow) -> Result<StoredOrder, StoreError> {
    let version: i64 = row
        .try_get("version")
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let record: serde_json::Value = row
        .try_get("record")
        .map_err(|e| StoreError::Storage(e.to_string()))?;
    let order: Order =
        serde_json::from_value(record).map_err(|e| StoreError::Storage(e.to_string()))?;
    Ok(StoredOrder {
        order,
        version: version as u64,
    })
}

impl OrderStore for PostgresOrderStore {
    fn insert(&self, order: Order) -> Result<StoredOrder, StoreError> {
        block_on(self.insert_async(order))
    }

    fn get(&self, order_id: OrderId) -> Result<Option<StoredOrder>, StoreError> {
        block_on(self.get_where("SELECT version, record FROM orders WHERE id = $1", *order_id.as_uuid()))
    }

    fn get_by_number(&self, number: &OrderNumber) -> Result<Option<StoredOrder>, StoreError> {
        block_on(self.get_by_number_async(number))
    }

    fn list_by_buyer(&self, buyer_id: BuyerId) -> Result<Vec<StoredOrder>, StoreError> {
        block_on(self.list_by_buyer_async(buyer_id))
    }

    fn update(&self, expected: ExpectedVersion, order: Order) -> Result<StoredOrder, StoreError> {
        block_on(self.update_async(expected, order))
    }
}
