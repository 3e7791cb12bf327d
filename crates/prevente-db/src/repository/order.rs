//! # Order Repository
//!
//! The order lifecycle state machine and its fulfillment writes.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. SUBMIT (pre-seller)                                                │
//! │     └── submit_order() → Order { status: Pending }                     │
//! │         No stock touched, no stock checked: an order is a request.     │
//! │                                                                         │
//! │  2a. VALIDATE (ADV)                 2b. CANCEL (ADV)                   │
//! │      └── validate_order()               └── cancel_order()             │
//! │          ├── optional quantity override     └── status → Cancelled     │
//! │          ├── distributor stock check            (no movement written)  │
//! │          ├── status → Validated                                        │
//! │          ├── movement: distributor −qty  (fulfillment)                 │
//! │          └── movement: POS +qty          (replenishment)               │
//! │          ALL IN ONE TRANSACTION                                        │
//! │                                                                         │
//! │  Terminal states accept no further transition. A retried validate      │
//! │  after a success gets OrderNotPending and moves no stock again.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the status flip is a conditional UPDATE
//! Two concurrent validations of the same order could both read Pending
//! before either writes. The flip is therefore a compare-and-swap:
//! `UPDATE … WHERE id = ? AND status = 'pending'`, re-checking the
//! precondition atomically with the write; zero rows affected means the
//! order was already decided and the caller gets `OrderNotPending`. The
//! dual stock movements commit in the same transaction, so a failure
//! between the distributor debit and the POS credit rolls both back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::ledger;
use prevente_core::types::{
    Location, Order, OrderStatus, REASON_FULFILLMENT, REASON_REPLENISHMENT,
};
use prevente_core::validation::{
    validate_actor_code, validate_pos_code, validate_product_name, validate_quantity,
};
use prevente_core::CoreError;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    pos_code: String,
    product: String,
    quantity: i64,
    seller_code: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
    validated_by: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Order {
        Order {
            id: row.id,
            pos_code: row.pos_code,
            product: row.product,
            quantity: row.quantity,
            seller_code: row.seller_code,
            status: row.status,
            created_at: row.created_at,
            validated_at: row.validated_at,
            validated_by: row.validated_by,
        }
    }
}

const ORDER_COLUMNS: &str = "id, pos_code, product, quantity, seller_code, status, \
                             created_at, validated_at, validated_by";

async fn fetch_order<'e, E>(executor: E, order_id: &str) -> Result<Option<OrderRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(order_id)
    .fetch_optional(executor)
    .await
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order lifecycle operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Submits a new order on behalf of a POS.
    ///
    /// ## Contract
    /// - `quantity` must be > 0
    /// - Creates the order in state Pending with a fresh id
    /// - Does **not** touch stock or check sufficiency: stock is committed
    ///   only at validation time
    pub async fn submit_order(
        &self,
        pos_code: &str,
        product: &str,
        quantity: i64,
        seller_code: &str,
    ) -> DbResult<Order> {
        validate_pos_code(pos_code)?;
        validate_product_name(product)?;
        validate_actor_code(seller_code)?;
        validate_quantity(quantity)?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            pos_code: pos_code.to_string(),
            product: product.to_string(),
            quantity,
            seller_code: seller_code.to_string(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            validated_at: None,
            validated_by: None,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, pos_code, product, quantity, seller_code,
                status, created_at, validated_at, validated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, NULL, NULL)
            "#,
        )
        .bind(&order.id)
        .bind(&order.pos_code)
        .bind(&order.product)
        .bind(order.quantity)
        .bind(&order.seller_code)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            id = %order.id,
            pos_code = %order.pos_code,
            product = %order.product,
            quantity = order.quantity,
            "Order submitted"
        );

        Ok(order)
    }

    /// Gets an order by id.
    pub async fn get(&self, order_id: &str) -> DbResult<Order> {
        let row = fetch_order(&self.pool, order_id).await?;
        row.map(Order::from)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// The ADV worklist: all Pending orders, oldest first.
    pub async fn pending(&self) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = 'pending' ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    /// Validates a Pending order: checks distributor stock, flips the order
    /// to Validated and writes the two fulfillment movements, atomically.
    ///
    /// ## Arguments
    /// * `order_id` - order to validate
    /// * `validator` - ADV identity performing the validation
    /// * `override_quantity` - ADV correction applied before the checks run
    ///
    /// ## Failure Modes
    /// * `OrderNotFound` - no such order
    /// * `OrderNotPending` - already Validated or Cancelled (idempotent
    ///   rejection: stock moves at most once per order)
    /// * `InsufficientStock` - distributor cannot cover the quantity; the
    ///   order stays Pending with no partial effect
    pub async fn validate_order(
        &self,
        order_id: &str,
        validator: &str,
        override_quantity: Option<i64>,
    ) -> DbResult<Order> {
        validate_actor_code(validator)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = fetch_order(&mut *tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if row.status != OrderStatus::Pending {
            return Err(CoreError::OrderNotPending {
                id: row.id,
                status: row.status,
            }
            .into());
        }

        // ADV correction path: the override replaces the requested quantity
        // before any further check.
        let quantity = override_quantity.unwrap_or(row.quantity);
        validate_quantity(quantity)?;

        // Sufficiency check against the transaction's view of the ledger.
        let available =
            ledger::stock_level(&mut *tx, &Location::Distributor.storage_key(), &row.product)
                .await?;
        if available < quantity {
            // Dropping the transaction rolls back; the order stays Pending.
            return Err(CoreError::InsufficientStock {
                location: Location::Distributor.to_string(),
                product: row.product,
                available,
                requested: quantity,
            }
            .into());
        }

        // Compare-and-swap on status: the Pending precondition is re-checked
        // atomically with the write.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'validated',
                quantity = ?2,
                validated_at = ?3,
                validated_by = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(quantity)
        .bind(now)
        .bind(validator)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Lost the race: someone decided this order between our read and
            // our write. Report the current state.
            let current = fetch_order(&mut *tx, order_id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
            return Err(CoreError::OrderNotPending {
                id: current.id,
                status: current.status,
            }
            .into());
        }

        // The physical transfer: distributor exit + POS entry, correlated by
        // the order id, committed together with the status flip.
        let pos = Location::pos(row.pos_code.clone());
        ledger::insert_movement(
            &mut *tx,
            &Location::Distributor.storage_key(),
            &row.product,
            0,
            quantity,
            Some(order_id),
            Some(REASON_FULFILLMENT),
            now,
        )
        .await?;
        ledger::insert_movement(
            &mut *tx,
            &pos.storage_key(),
            &row.product,
            quantity,
            0,
            Some(order_id),
            Some(REASON_REPLENISHMENT),
            now,
        )
        .await?;

        tx.commit().await?;

        info!(
            id = %order_id,
            validator = %validator,
            quantity,
            pos_code = %row.pos_code,
            "Order validated, stock transferred"
        );

        Ok(Order {
            id: row.id,
            pos_code: row.pos_code,
            product: row.product,
            quantity,
            seller_code: row.seller_code,
            status: OrderStatus::Validated,
            created_at: row.created_at,
            validated_at: Some(now),
            validated_by: Some(validator.to_string()),
        })
    }

    /// Cancels a Pending order. No stock movement is created: the requested
    /// transfer never happened.
    ///
    /// ## Failure Modes
    /// * `OrderNotFound` - no such order
    /// * `OrderNotPending` - already decided
    pub async fn cancel_order(&self, order_id: &str, validator: &str) -> DbResult<Order> {
        validate_actor_code(validator)?;

        // Same compare-and-swap shape as validation, without movements.
        let result = sqlx::query(
            "UPDATE orders SET status = 'cancelled' WHERE id = ?1 AND status = 'pending'",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = fetch_order(&self.pool, order_id)
                .await?
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
            return Err(CoreError::OrderNotPending {
                id: current.id,
                status: current.status,
            }
            .into());
        }

        info!(id = %order_id, validator = %validator, "Order cancelled");

        self.get(order_id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use prevente_core::types::REASON_PURCHASE;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock_at(db: &Database, location: &Location, product: &str) -> i64 {
        db.ledger()
            .current_stock(location, Some(product))
            .await
            .unwrap()
            .level(product)
    }

    #[tokio::test]
    async fn submit_creates_pending_without_touching_stock() {
        let db = test_db().await;

        // Submission must succeed even with zero stock anywhere.
        let order = db
            .orders()
            .submit_order("P1", "Widget", 30, "S1")
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.validated_at.is_none());
        assert_eq!(stock_at(&db, &Location::Distributor, "Widget").await, 0);
        assert_eq!(db.orders().pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_rejects_non_positive_quantity() {
        let db = test_db().await;
        let err = db.orders().submit_order("P1", "Widget", 0, "S1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidQuantity(0))));
    }

    #[tokio::test]
    async fn validation_transfers_stock_and_conserves_total() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 100, 0, None, Some(REASON_PURCHASE))
            .await
            .unwrap();

        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();
        let validated = db.orders().validate_order(&order.id, "ADV1", None).await.unwrap();

        assert_eq!(validated.status, OrderStatus::Validated);
        assert_eq!(validated.validated_by.as_deref(), Some("ADV1"));
        assert!(validated.validated_at.is_some());

        let dist = stock_at(&db, &Location::Distributor, "Widget").await;
        let pos = stock_at(&db, &Location::pos("P1"), "Widget").await;
        assert_eq!(dist, 70);
        assert_eq!(pos, 30);
        assert_eq!(dist + pos, 100); // conservation

        // Both movements carry the order id as correlation reference.
        let pos_history = db
            .ledger()
            .movements_for(&Location::pos("P1"), Some("Widget"))
            .await
            .unwrap();
        assert_eq!(pos_history.len(), 1);
        assert_eq!(pos_history[0].reference.as_deref(), Some(order.id.as_str()));
        assert_eq!(pos_history[0].reason.as_deref(), Some(REASON_REPLENISHMENT));
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_everything_unchanged() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 10, 0, None, None)
            .await
            .unwrap();

        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();
        let err = db.orders().validate_order(&order.id, "ADV1", None).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 10, requested: 30, .. })
        ));

        // No partial effect: order still Pending, both pools untouched.
        assert_eq!(db.orders().get(&order.id).await.unwrap().status, OrderStatus::Pending);
        assert_eq!(stock_at(&db, &Location::Distributor, "Widget").await, 10);
        assert_eq!(stock_at(&db, &Location::pos("P1"), "Widget").await, 0);
    }

    #[tokio::test]
    async fn double_validation_is_rejected_without_double_commit() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 100, 0, None, None)
            .await
            .unwrap();

        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();
        db.orders().validate_order(&order.id, "ADV1", None).await.unwrap();

        let err = db.orders().validate_order(&order.id, "ADV2", None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrderNotPending { status: OrderStatus::Validated, .. })
        ));

        // Stock moved exactly once.
        assert_eq!(stock_at(&db, &Location::Distributor, "Widget").await, 70);
        assert_eq!(stock_at(&db, &Location::pos("P1"), "Widget").await, 30);
    }

    #[tokio::test]
    async fn override_quantity_replaces_request_before_checks() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 100, 0, None, None)
            .await
            .unwrap();

        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();
        let validated = db
            .orders()
            .validate_order(&order.id, "ADV1", Some(20))
            .await
            .unwrap();

        assert_eq!(validated.quantity, 20);
        assert_eq!(stock_at(&db, &Location::Distributor, "Widget").await, 80);
        assert_eq!(stock_at(&db, &Location::pos("P1"), "Widget").await, 20);
    }

    #[tokio::test]
    async fn override_is_checked_against_stock() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 25, 0, None, None)
            .await
            .unwrap();

        let order = db.orders().submit_order("P1", "Widget", 10, "S1").await.unwrap();
        let err = db
            .orders()
            .validate_order(&order.id, "ADV1", Some(30))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { requested: 30, .. })
        ));
    }

    #[tokio::test]
    async fn cancel_writes_no_movement() {
        let db = test_db().await;
        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();

        let cancelled = db.orders().cancel_order(&order.id, "ADV1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let history = db
            .ledger()
            .movements_for(&Location::Distributor, Some("Widget"))
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn cancel_of_decided_order_rejected() {
        let db = test_db().await;
        db.ledger()
            .record_movement(&Location::Distributor, "Widget", 100, 0, None, None)
            .await
            .unwrap();
        let order = db.orders().submit_order("P1", "Widget", 30, "S1").await.unwrap();
        db.orders().validate_order(&order.id, "ADV1", None).await.unwrap();

        let err = db.orders().cancel_order(&order.id, "ADV1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::OrderNotPending { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_order_reports_not_found() {
        let db = test_db().await;
        let err = db.orders().validate_order("no-such-id", "ADV1", None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));
    }
}
