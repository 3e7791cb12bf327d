//! # Product Reference Repository
//!
//! Read access to the external product reference table: catalog name →
//! current list unit price. The catalog is owned outside this system;
//! `upsert` exists for seeding and administration tooling only.
//!
//! ## No Silent Zero
//! A price lookup for an unknown product is an error, never a default 0.
//! Substituting 0 for a missing financial quantity is exactly the data-loss
//! pattern this layer exists to prevent.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use prevente_core::validation::validate_product_name;
use prevente_core::{Money, Product};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    name: String,
    unit_price_cents: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Product {
        Product {
            name: row.name,
            unit_price: Money::from_cents(row.unit_price_cents),
        }
    }
}

/// Repository for the product reference table.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Current list unit price for a product.
    ///
    /// ## Errors
    /// `NotFound` if the product is absent from the reference table.
    pub async fn unit_price(&self, name: &str) -> DbResult<Money> {
        let price: Option<i64> =
            sqlx::query_scalar("SELECT unit_price_cents FROM products WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        price
            .map(Money::from_cents)
            .ok_or_else(|| DbError::not_found("product", name))
    }

    /// Gets a catalog entry by name.
    pub async fn get(&self, name: &str) -> DbResult<Product> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT name, unit_price_cents FROM products WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Product::from)
            .ok_or_else(|| DbError::not_found("product", name))
    }

    /// The full catalog, name-ordered.
    pub async fn all(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT name, unit_price_cents FROM products ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts or updates a catalog entry (seeding/administration only).
    pub async fn upsert(&self, name: &str, unit_price: Money) -> DbResult<()> {
        validate_product_name(name)?;

        sqlx::query(
            r#"
            INSERT INTO products (name, unit_price_cents)
            VALUES (?1, ?2)
            ON CONFLICT (name) DO UPDATE SET unit_price_cents = excluded.unit_price_cents
            "#,
        )
        .bind(name)
        .bind(unit_price.cents())
        .execute(&self.pool)
        .await?;

        debug!(name = %name, unit_price = %unit_price, "Product upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn missing_product_is_an_error_not_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.products().unit_price("Unknown").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn upsert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();

        products.upsert("Widget", Money::from_cents(1000)).await.unwrap();
        assert_eq!(products.unit_price("Widget").await.unwrap().cents(), 1000);

        // Price revision replaces, it does not duplicate.
        products.upsert("Widget", Money::from_cents(1200)).await.unwrap();
        assert_eq!(products.unit_price("Widget").await.unwrap().cents(), 1200);
        assert_eq!(products.all().await.unwrap().len(), 1);
    }
}
