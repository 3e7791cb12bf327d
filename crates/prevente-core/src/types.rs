//! # Domain Types
//!
//! Core domain types used throughout Prevente.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockMovement  │   │      Order      │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  location       │   │  pos_code       │   │  location       │       │
//! │  │  quantity_in    │   │  quantity       │   │  totals + paid  │       │
//! │  │  quantity_out   │   │  status         │   │  invoice_number │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Location     │   │   OrderStatus   │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Distributor    │   │  Pending        │   │  name, phone    │       │
//! │  │  Pos(code)      │   │  Validated      │   │  tax registry   │       │
//! │  └─────────────────┘   │  Cancelled      │   │  (optional)     │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Append-Only Discipline
//! `StockMovement` and `SaleRecord` rows are created once and never edited or
//! deleted. `Order` rows flip status exactly once, Pending → terminal.
//! Current stock is always *derived* from the movement ledger (see
//! [`crate::stock`]), never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::Money;

// =============================================================================
// Location
// =============================================================================

/// An inventory pool a stock movement affects.
///
/// ## Storage Key Encoding
/// Encoded as a stable TEXT key in the backing store:
/// - `Distributor` → `"distributor"`
/// - `Pos("P1")`   → `"pos:P1"`
///
/// Decoding failures must surface as a schema error at the storage boundary,
/// never fall back to a default pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Location {
    /// The distributor's central warehouse pool.
    Distributor,
    /// A point-of-sale pool, identified by its POS code.
    Pos(String),
}

impl Location {
    /// Convenience constructor for a POS pool.
    pub fn pos(code: impl Into<String>) -> Self {
        Location::Pos(code.into())
    }

    /// Returns the stable storage key for this location.
    pub fn storage_key(&self) -> String {
        match self {
            Location::Distributor => "distributor".to_string(),
            Location::Pos(code) => format!("pos:{code}"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Distributor => write!(f, "distributor"),
            Location::Pos(code) => write!(f, "pos:{code}"),
        }
    }
}

/// Error returned when a stored location key does not match the encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLocationError(pub String);

impl fmt::Display for ParseLocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid location key: '{}'", self.0)
    }
}

impl std::error::Error for ParseLocationError {}

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "distributor" {
            return Ok(Location::Distributor);
        }
        match s.strip_prefix("pos:") {
            Some(code) if !code.is_empty() => Ok(Location::Pos(code.to_string())),
            _ => Err(ParseLocationError(s.to_string())),
        }
    }
}

// =============================================================================
// Movement Reasons
// =============================================================================
// `reason` is free text by contract (not structurally validated), but the
// core writes a fixed vocabulary for the movements it creates itself.

/// Distributor restock entry.
pub const REASON_PURCHASE: &str = "purchase";
/// Distributor exit on order validation.
pub const REASON_FULFILLMENT: &str = "fulfillment";
/// POS entry on order validation.
pub const REASON_REPLENISHMENT: &str = "replenishment";
/// POS/showroom exit on an end-customer sale.
pub const REASON_CUSTOMER_SALE: &str = "customer-sale";
/// Manual corrective row (may carry both sides nonzero).
pub const REASON_CORRECTION: &str = "correction";

// =============================================================================
// Stock Movement
// =============================================================================

/// One row in the append-only stock ledger.
///
/// An "entry" row has `quantity_out == 0`, an "exit" row has
/// `quantity_in == 0`. Corrective or exchange rows may carry both sides
/// nonzero; the aggregator sums both sides regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Which inventory pool this movement affects.
    pub location: Location,

    /// Product key into the external reference catalog.
    pub product: String,

    /// Units entering the pool (≥ 0).
    pub quantity_in: i64,

    /// Units leaving the pool (≥ 0).
    pub quantity_out: i64,

    /// Opaque correlation id, e.g. the order id linking a distributor exit
    /// to its POS entry, or the sale id for a customer-sale exit.
    pub reference: Option<String>,

    /// Free-text movement cause (see the `REASON_*` constants).
    pub reason: Option<String>,

    /// Set by the writer at creation, never edited.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of a seller's order.
///
/// ```text
/// Pending ──► Validated   (terminal)
///    │
///    └─────► Cancelled    (terminal)
/// ```
/// No transition leaves a terminal state, and no state transitions to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted by a pre-seller, awaiting ADV decision.
    Pending,
    /// Approved by ADV; stock has physically moved distributor → POS.
    Validated,
    /// Rejected by ADV; the requested transfer never happened.
    Cancelled,
}

impl OrderStatus {
    /// Whether this state accepts no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Validated | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Validated => "validated",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A pre-seller's request to move product from the distributor to a POS.
///
/// Submission does not touch stock: an order is a request, not a commitment.
/// Stock is checked and moved only when ADV validates (see the order
/// repository in prevente-db).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID v4), assigned at creation, immutable.
    pub id: String,

    /// Destination point of sale.
    pub pos_code: String,

    /// Requested product.
    pub product: String,

    /// Requested amount (> 0). ADV may override this while the order is
    /// still Pending, immediately before validating.
    pub quantity: i64,

    /// Pre-seller who submitted the order.
    pub seller_code: String,

    /// Lifecycle state.
    pub status: OrderStatus,

    /// When the order was submitted.
    pub created_at: DateTime<Utc>,

    /// Set only on the transition into Validated.
    pub validated_at: Option<DateTime<Utc>>,

    /// ADV identity that validated, set with `validated_at`.
    pub validated_by: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// End-customer identity captured on a sale.
///
/// Name and phone are required; the tax-registry fields are optional and
/// used only when rendering an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    /// Commerce registry number (RC).
    pub commerce_registry: Option<String>,
    /// Tax identification number (NIF).
    pub tax_id: Option<String>,
    /// Tax article number (AI).
    pub article_id: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    /// Minimal customer with just the required fields.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer {
            name: name.into(),
            phone: phone.into(),
            ..Customer::default()
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One finalized end-customer transaction.
///
/// Created once at sale time, immutable, never deleted. Each sale triggers
/// exactly one matching `customer-sale` exit movement at the selling
/// location (written atomically with the sale by the storage layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Selling pool (a POS or the showroom, modeled as a POS code).
    pub location: Location,

    pub product: String,

    /// Units sold (> 0).
    pub quantity: i64,

    /// Unit price at sale time, in centimes.
    pub unit_price: Money,

    /// quantity × unit_price.
    pub total_before_tax: Money,

    /// round_half_up(total_before_tax × (1 + tax)).
    pub total_with_tax: Money,

    /// Amount received so far: 0 ≤ amount_paid ≤ total_with_tax.
    pub amount_paid: Money,

    /// total_with_tax − amount_paid. Never negative.
    pub balance_due: Money,

    pub customer: Customer,

    /// `NNN/YYYY`, assigned sequentially per calendar year only when an
    /// invoice is requested. None until then.
    pub invoice_number: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product Reference
// =============================================================================

/// One row of the external read-only product reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog name, the key movements and sales reference.
    pub name: String,

    /// Current list unit price, in centimes.
    pub unit_price: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_storage_key_round_trip() {
        let cases = [Location::Distributor, Location::pos("P1"), Location::pos("SHOW")];
        for loc in cases {
            let key = loc.storage_key();
            assert_eq!(key.parse::<Location>().unwrap(), loc);
        }
    }

    #[test]
    fn location_rejects_malformed_keys() {
        assert!("".parse::<Location>().is_err());
        assert!("pos:".parse::<Location>().is_err());
        assert!("warehouse".parse::<Location>().is_err());
        assert!("Distributor".parse::<Location>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Validated.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
