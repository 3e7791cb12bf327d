//! # Sale Repository
//!
//! End-customer sales with partial-payment tracking and per-year invoice
//! numbering.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Recording a Sale                                  │
//! │                                                                         │
//! │  record_sale(location, product, qty, unit_price, paid, customer)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prevente-core: totals = qty × price, +19% half-up, payment bounds     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─► stock check at the selling location                          │
//! │        ─► INSERT sales row                                             │
//! │        ─► INSERT customer-sale exit movement (reference = sale id)     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Both rows or neither: no sale without its movement, no movement       │
//! │  without its sale.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invoice numbers (`NNN/YYYY`) are assigned only on request, scan-max+1
//! per calendar year. See `prevente_core::invoice` for the weak-invariant
//! caveat under independent concurrent processes.

use chrono::{DateTime, Datelike, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::ledger;
use prevente_core::invoice::next_invoice_number;
use prevente_core::types::{Customer, Location, SaleRecord, REASON_CUSTOMER_SALE};
use prevente_core::validation::{validate_customer, validate_product_name, validate_quantity};
use prevente_core::{CoreError, Money, SaleTotals, DEFAULT_TAX_RATE};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    location: String,
    product: String,
    quantity: i64,
    unit_price_cents: i64,
    total_before_tax_cents: i64,
    total_with_tax_cents: i64,
    amount_paid_cents: i64,
    balance_due_cents: i64,
    customer_name: String,
    customer_phone: String,
    commerce_registry: Option<String>,
    tax_id: Option<String>,
    article_id: Option<String>,
    address: Option<String>,
    invoice_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self) -> DbResult<SaleRecord> {
        Ok(SaleRecord {
            location: self.location.parse::<Location>()?,
            id: self.id,
            product: self.product,
            quantity: self.quantity,
            unit_price: Money::from_cents(self.unit_price_cents),
            total_before_tax: Money::from_cents(self.total_before_tax_cents),
            total_with_tax: Money::from_cents(self.total_with_tax_cents),
            amount_paid: Money::from_cents(self.amount_paid_cents),
            balance_due: Money::from_cents(self.balance_due_cents),
            customer: Customer {
                name: self.customer_name,
                phone: self.customer_phone,
                commerce_registry: self.commerce_registry,
                tax_id: self.tax_id,
                article_id: self.article_id,
                address: self.address,
            },
            invoice_number: self.invoice_number,
            created_at: self.created_at,
        })
    }
}

const SALE_COLUMNS: &str = "id, location, product, quantity, unit_price_cents, \
                            total_before_tax_cents, total_with_tax_cents, \
                            amount_paid_cents, balance_due_cents, \
                            customer_name, customer_phone, commerce_registry, \
                            tax_id, article_id, address, invoice_number, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale records and invoice numbering.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records an end-customer sale and its matching stock exit, atomically.
    ///
    /// Totals are computed by prevente-core under the fixed 19% policy rate
    /// ([`DEFAULT_TAX_RATE`]) with half-up rounding; the paid amount must
    /// fall in `[0, total_with_tax]`.
    ///
    /// ## Failure Modes
    /// * `InvalidQuantity` - quantity ≤ 0
    /// * `InvalidPayment` - paid amount out of bounds (rejected, not clamped)
    /// * `InsufficientStock` - the selling location cannot cover the quantity
    pub async fn record_sale(
        &self,
        location: &Location,
        product: &str,
        quantity: i64,
        unit_price: Money,
        amount_paid: Money,
        customer: &Customer,
    ) -> DbResult<SaleRecord> {
        validate_quantity(quantity)?;
        validate_product_name(product)?;
        validate_customer(customer)?;

        let totals = SaleTotals::compute(quantity, unit_price, DEFAULT_TAX_RATE)?;
        let balance_due = totals.balance_due(amount_paid)?;

        let sale = SaleRecord {
            id: Uuid::new_v4().to_string(),
            location: location.clone(),
            product: product.to_string(),
            quantity,
            unit_price,
            total_before_tax: totals.total_before_tax,
            total_with_tax: totals.total_with_tax,
            amount_paid,
            balance_due,
            customer: customer.clone(),
            invoice_number: None,
            created_at: Utc::now(),
        };

        let location_key = location.storage_key();
        let mut tx = self.pool.begin().await?;

        // Sufficiency check against the transaction's view of the ledger.
        let available = ledger::stock_level(&mut *tx, &location_key, product).await?;
        if available < quantity {
            return Err(CoreError::InsufficientStock {
                location: location.to_string(),
                product: product.to_string(),
                available,
                requested: quantity,
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, location, product, quantity, unit_price_cents,
                total_before_tax_cents, total_with_tax_cents,
                amount_paid_cents, balance_due_cents,
                customer_name, customer_phone, commerce_registry,
                tax_id, article_id, address, invoice_number, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15, NULL, ?16
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&location_key)
        .bind(&sale.product)
        .bind(sale.quantity)
        .bind(sale.unit_price.cents())
        .bind(sale.total_before_tax.cents())
        .bind(sale.total_with_tax.cents())
        .bind(sale.amount_paid.cents())
        .bind(sale.balance_due.cents())
        .bind(&sale.customer.name)
        .bind(&sale.customer.phone)
        .bind(&sale.customer.commerce_registry)
        .bind(&sale.customer.tax_id)
        .bind(&sale.customer.article_id)
        .bind(&sale.customer.address)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        // The matching exit movement, correlated by the sale id.
        ledger::insert_movement(
            &mut *tx,
            &location_key,
            product,
            0,
            quantity,
            Some(&sale.id),
            Some(REASON_CUSTOMER_SALE),
            sale.created_at,
        )
        .await?;

        tx.commit().await?;

        info!(
            id = %sale.id,
            location = %location,
            product = %product,
            quantity,
            total_with_tax = %sale.total_with_tax,
            balance_due = %sale.balance_due,
            "Sale recorded"
        );

        Ok(sale)
    }

    /// Gets a sale by id.
    pub async fn get(&self, sale_id: &str) -> DbResult<SaleRecord> {
        let row: Option<SaleRow> =
            sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(sale_id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| DbError::not_found("sale", sale_id))?
            .into_sale()
    }

    /// Sale history for a selling location, oldest first.
    pub async fn sales_at(&self, location: &Location) -> DbResult<Vec<SaleRecord>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE location = ?1 ORDER BY created_at, id"
        ))
        .bind(location.storage_key())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SaleRow::into_sale).collect()
    }

    /// Computes the next invoice number for a year without assigning it.
    ///
    /// Scans the invoice numbers already stored, takes the year's maximum
    /// sequence and returns max+1 as `NNN/YYYY` (`"001/<year>"` on an empty
    /// year). Purely derived: calling this twice without an assignment in
    /// between returns the same number.
    pub async fn next_invoice_number(&self, year: i32) -> DbResult<String> {
        let existing: Vec<String> =
            sqlx::query_scalar("SELECT invoice_number FROM sales WHERE invoice_number IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;

        Ok(next_invoice_number(year, &existing))
    }

    /// Assigns the next invoice number of the current year to a sale.
    ///
    /// Idempotent for an already-invoiced sale: the stored number is
    /// returned unchanged. The compute-and-set runs in one transaction with
    /// a `WHERE invoice_number IS NULL` guard, so within this process a sale
    /// is numbered at most once. Independent processes sharing the store can
    /// still race to the same number - the documented weak invariant of the
    /// scan-max+1 design.
    pub async fn assign_invoice_number(&self, sale_id: &str) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Option<String>> =
            sqlx::query_scalar("SELECT invoice_number FROM sales WHERE id = ?1")
                .bind(sale_id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or_else(|| DbError::not_found("sale", sale_id))?;
        if let Some(number) = current {
            return Ok(number);
        }

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT invoice_number FROM sales WHERE invoice_number IS NOT NULL")
                .fetch_all(&mut *tx)
                .await?;

        let year = Utc::now().year();
        let number = next_invoice_number(year, &existing);

        let result =
            sqlx::query("UPDATE sales SET invoice_number = ?2 WHERE id = ?1 AND invoice_number IS NULL")
                .bind(sale_id)
                .bind(&number)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            // Numbered concurrently between our read and write; keep theirs.
            let theirs: Option<String> =
                sqlx::query_scalar("SELECT invoice_number FROM sales WHERE id = ?1")
                    .bind(sale_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return theirs.ok_or_else(|| DbError::not_found("sale", sale_id));
        }

        tx.commit().await?;

        debug!(sale_id = %sale_id, invoice_number = %number, "Invoice number assigned");

        Ok(number)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use prevente_core::types::REASON_PURCHASE;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Puts opening stock at a POS the way it arrives in production:
    /// distributor purchase, order, ADV validation.
    async fn stock_pos(db: &Database, pos: &str, product: &str, quantity: i64) {
        db.ledger()
            .record_movement(&Location::Distributor, product, quantity, 0, None, Some(REASON_PURCHASE))
            .await
            .unwrap();
        let order = db.orders().submit_order(pos, product, quantity, "S1").await.unwrap();
        db.orders().validate_order(&order.id, "ADV1", None).await.unwrap();
    }

    fn customer() -> Customer {
        Customer::new("Amine B", "0550 12 34 56")
    }

    #[tokio::test]
    async fn full_scenario_from_purchase_to_sale() {
        let db = test_db().await;
        let pos = Location::pos("P1");

        // Distributor 100 -> order 30 -> validate -> P1 has 30.
        stock_pos(&db, "P1", "Widget", 30).await;

        // Sell 5 at 1000 with 4000 paid: 5000 net, 5950 gross, 1950 due.
        let sale = db
            .sales()
            .record_sale(&pos, "Widget", 5, Money::from_cents(1000), Money::from_cents(4000), &customer())
            .await
            .unwrap();

        assert_eq!(sale.total_before_tax.cents(), 5000);
        assert_eq!(sale.total_with_tax.cents(), 5950);
        assert_eq!(sale.balance_due.cents(), 1950);

        let stock = db.ledger().current_stock(&pos, Some("Widget")).await.unwrap();
        assert_eq!(stock.level("Widget"), 25);

        // The exit movement exists and is correlated to the sale.
        let history = db.ledger().movements_for(&pos, Some("Widget")).await.unwrap();
        let exit = history.iter().find(|m| m.quantity_out == 5).unwrap();
        assert_eq!(exit.reference.as_deref(), Some(sale.id.as_str()));
        assert_eq!(exit.reason.as_deref(), Some(REASON_CUSTOMER_SALE));
    }

    #[tokio::test]
    async fn payment_bounds() {
        let db = test_db().await;
        let pos = Location::pos("P1");
        stock_pos(&db, "P1", "Widget", 20).await;

        // Full payment: zero balance.
        let sale = db
            .sales()
            .record_sale(&pos, "Widget", 5, Money::from_cents(1000), Money::from_cents(5950), &customer())
            .await
            .unwrap();
        assert!(sale.balance_due.is_zero());

        // No payment: full balance.
        let sale = db
            .sales()
            .record_sale(&pos, "Widget", 5, Money::from_cents(1000), Money::zero(), &customer())
            .await
            .unwrap();
        assert_eq!(sale.balance_due.cents(), 5950);

        // Overpayment rejected.
        let err = db
            .sales()
            .record_sale(&pos, "Widget", 5, Money::from_cents(1000), Money::from_cents(5951), &customer())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidPayment { .. })));
    }

    #[tokio::test]
    async fn sale_rejected_on_insufficient_pos_stock() {
        let db = test_db().await;
        let pos = Location::pos("P1");
        stock_pos(&db, "P1", "Widget", 3).await;

        let err = db
            .sales()
            .record_sale(&pos, "Widget", 5, Money::from_cents(1000), Money::zero(), &customer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 3, requested: 5, .. })
        ));

        // Atomicity: no sale row, no movement, stock unchanged.
        assert!(db.sales().sales_at(&pos).await.unwrap().is_empty());
        let stock = db.ledger().current_stock(&pos, Some("Widget")).await.unwrap();
        assert_eq!(stock.level("Widget"), 3);
    }

    #[tokio::test]
    async fn customer_fields_required() {
        let db = test_db().await;
        let pos = Location::pos("P1");
        stock_pos(&db, "P1", "Widget", 10).await;

        let err = db
            .sales()
            .record_sale(&pos, "Widget", 1, Money::from_cents(1000), Money::zero(), &Customer::new("", "0550"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn invoice_sequence_per_year() {
        let db = test_db().await;
        let pos = Location::pos("P1");
        stock_pos(&db, "P1", "Widget", 10).await;

        let year = Utc::now().year();

        // Empty history starts at 001.
        assert_eq!(
            db.sales().next_invoice_number(year).await.unwrap(),
            format!("001/{year}")
        );

        let first = db
            .sales()
            .record_sale(&pos, "Widget", 1, Money::from_cents(1000), Money::zero(), &customer())
            .await
            .unwrap();
        let assigned = db.sales().assign_invoice_number(&first.id).await.unwrap();
        assert_eq!(assigned, format!("001/{year}"));

        // Next in sequence after one assignment.
        assert_eq!(
            db.sales().next_invoice_number(year).await.unwrap(),
            format!("002/{year}")
        );

        // A past-year invoice does not affect this year's sequence.
        assert_eq!(
            db.sales().next_invoice_number(year - 1).await.unwrap(),
            format!("001/{}", year - 1)
        );

        // Assigning again returns the stored number unchanged.
        let again = db.sales().assign_invoice_number(&first.id).await.unwrap();
        assert_eq!(again, assigned);
        assert_eq!(
            db.sales().get(&first.id).await.unwrap().invoice_number,
            Some(assigned)
        );
    }

    #[tokio::test]
    async fn unknown_sale_reports_not_found() {
        let db = test_db().await;
        let err = db.sales().assign_invoice_number("no-such-sale").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
