//! # Ledger Repository
//!
//! The append-only stock ledger and its derived stock reads.
//!
//! ## Append-Only Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     The Movement Ledger                                 │
//! │                                                                         │
//! │  record_movement() ──► INSERT one row. No UPDATE or DELETE statement   │
//! │                        exists anywhere in this module.                  │
//! │                                                                         │
//! │  current_stock()   ──► SELECT the matching history, hand it to the     │
//! │                        pure aggregator in prevente-core:               │
//! │                        stock = Σ quantity_in − Σ quantity_out          │
//! │                                                                         │
//! │  Stock is re-derived on every read. Appends are commutative, so any    │
//! │  number of concurrent writers stay safe for readers.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order and sale repositories write their movements through the
//! crate-internal helpers here so the column layout lives in one place.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use prevente_core::stock::StockLevels;
use prevente_core::types::{Location, StockMovement};
use prevente_core::validation::{validate_movement_sides, validate_product_name};

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw movements row; decoded into the domain type after the location key
/// is parsed (an unparseable key is a schema mismatch, never a default).
#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    location: String,
    product: String,
    quantity_in: i64,
    quantity_out: i64,
    reference: Option<String>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_movement(self) -> DbResult<StockMovement> {
        Ok(StockMovement {
            location: self.location.parse::<Location>()?,
            id: self.id,
            product: self.product,
            quantity_in: self.quantity_in,
            quantity_out: self.quantity_out,
            reference: self.reference,
            reason: self.reason,
            created_at: self.created_at,
        })
    }
}

// =============================================================================
// Crate-Internal Write/Read Helpers
// =============================================================================
// Generic over the executor so callers can run them against the pool or
// inside an open transaction (order validation, sales).

/// Appends one movement row and returns its id.
pub(crate) async fn insert_movement<'e, E>(
    executor: E,
    location_key: &str,
    product: &str,
    quantity_in: i64,
    quantity_out: i64,
    reference: Option<&str>,
    reason: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<String, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO movements (
            id, location, product, quantity_in, quantity_out,
            reference, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&id)
    .bind(location_key)
    .bind(product)
    .bind(quantity_in)
    .bind(quantity_out)
    .bind(reference)
    .bind(reason)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(id)
}

/// Derived stock for one (location, product) pair via an aggregate query.
///
/// Used inside open transactions so a sufficiency check sees the
/// transaction's own view of the ledger. SUM over no rows is NULL, which
/// COALESCE maps to the "absent means zero" contract.
pub(crate) async fn stock_level<'e, E>(
    executor: E,
    location_key: &str,
    product: &str,
) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let level: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(quantity_in) - SUM(quantity_out), 0)
        FROM movements
        WHERE location = ?1 AND product = ?2
        "#,
    )
    .bind(location_key)
    .bind(product)
    .fetch_one(executor)
    .await?;

    Ok(level)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the append-only movement ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a stock movement and returns its id.
    ///
    /// ## Contract
    /// - Both sides must be ≥ 0; a single row conventionally carries one
    ///   side nonzero, but corrective rows with both are accepted.
    /// - Never fails on business grounds beyond that - storage I/O errors
    ///   propagate as `DbError`, they are not recovered here.
    /// - The row is immutable once written.
    pub async fn record_movement(
        &self,
        location: &Location,
        product: &str,
        quantity_in: i64,
        quantity_out: i64,
        reference: Option<&str>,
        reason: Option<&str>,
    ) -> DbResult<String> {
        validate_product_name(product)?;
        validate_movement_sides(quantity_in, quantity_out)?;

        let id = insert_movement(
            &self.pool,
            &location.storage_key(),
            product,
            quantity_in,
            quantity_out,
            reference,
            reason,
            Utc::now(),
        )
        .await?;

        debug!(
            id = %id,
            location = %location,
            product = %product,
            quantity_in,
            quantity_out,
            "Movement recorded"
        );

        Ok(id)
    }

    /// Full movement history for a location, oldest first, optionally
    /// narrowed to one product.
    pub async fn movements_for(
        &self,
        location: &Location,
        product: Option<&str>,
    ) -> DbResult<Vec<StockMovement>> {
        let location_key = location.storage_key();

        let rows: Vec<MovementRow> = match product {
            Some(product) => {
                sqlx::query_as(
                    r#"
                    SELECT id, location, product, quantity_in, quantity_out,
                           reference, reason, created_at
                    FROM movements
                    WHERE location = ?1 AND product = ?2
                    ORDER BY created_at, id
                    "#,
                )
                .bind(&location_key)
                .bind(product)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, location, product, quantity_in, quantity_out,
                           reference, reason, created_at
                    FROM movements
                    WHERE location = ?1
                    ORDER BY created_at, id
                    "#,
                )
                .bind(&location_key)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(MovementRow::into_movement).collect()
    }

    /// Current stock per product at a location, derived from the full
    /// movement history at read time.
    ///
    /// Products with no movements are absent from the result; callers treat
    /// absent and zero identically (see [`StockLevels::level`]).
    pub async fn current_stock(
        &self,
        location: &Location,
        product: Option<&str>,
    ) -> DbResult<StockLevels> {
        let movements = self.movements_for(location, product).await?;
        Ok(StockLevels::from_movements(&movements))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use prevente_core::types::REASON_PURCHASE;
    use prevente_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn stock_is_sum_of_entries_minus_exits() {
        let db = test_db().await;
        let ledger = db.ledger();
        let loc = Location::Distributor;

        ledger
            .record_movement(&loc, "Widget", 100, 0, None, Some(REASON_PURCHASE))
            .await
            .unwrap();
        ledger
            .record_movement(&loc, "Widget", 0, 30, None, None)
            .await
            .unwrap();
        ledger
            .record_movement(&loc, "Gadget", 7, 0, None, None)
            .await
            .unwrap();

        let stock = ledger.current_stock(&loc, None).await.unwrap();
        assert_eq!(stock.level("Widget"), 70);
        assert_eq!(stock.level("Gadget"), 7);
        assert_eq!(stock.level("Unknown"), 0);
    }

    #[tokio::test]
    async fn locations_are_independent_pools() {
        let db = test_db().await;
        let ledger = db.ledger();

        ledger
            .record_movement(&Location::Distributor, "Widget", 10, 0, None, None)
            .await
            .unwrap();
        ledger
            .record_movement(&Location::pos("P1"), "Widget", 3, 0, None, None)
            .await
            .unwrap();

        let dist = ledger.current_stock(&Location::Distributor, None).await.unwrap();
        let pos = ledger.current_stock(&Location::pos("P1"), None).await.unwrap();
        assert_eq!(dist.level("Widget"), 10);
        assert_eq!(pos.level("Widget"), 3);
    }

    #[tokio::test]
    async fn corrective_row_with_both_sides_aggregates() {
        let db = test_db().await;
        let ledger = db.ledger();
        let loc = Location::Distributor;

        ledger.record_movement(&loc, "W", 100, 0, None, None).await.unwrap();
        ledger.record_movement(&loc, "W", 2, 5, None, Some("correction")).await.unwrap();

        let stock = ledger.current_stock(&loc, Some("W")).await.unwrap();
        assert_eq!(stock.level("W"), 97);
    }

    #[tokio::test]
    async fn negative_sides_rejected() {
        let db = test_db().await;
        let err = db
            .ledger()
            .record_movement(&Location::Distributor, "W", -1, 0, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn history_keeps_reference_and_reason() {
        let db = test_db().await;
        let ledger = db.ledger();
        let loc = Location::pos("P1");

        ledger
            .record_movement(&loc, "W", 5, 0, Some("order-123"), Some("replenishment"))
            .await
            .unwrap();

        let history = ledger.movements_for(&loc, Some("W")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reference.as_deref(), Some("order-123"));
        assert_eq!(history[0].reason.as_deref(), Some("replenishment"));
        assert_eq!(history[0].location, loc);
    }
}
