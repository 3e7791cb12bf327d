//! # Stock Aggregation
//!
//! Derives current on-hand quantity per product from the append-only
//! movement ledger.
//!
//! ## The Derivation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Stock Is Derived, Never Stored                          │
//! │                                                                         │
//! │  movements (append-only log)                                            │
//! │  ┌──────────────────────────────────────────────┐                       │
//! │  │ Widget  in=100 out=0    (purchase)           │                       │
//! │  │ Widget  in=0   out=30   (fulfillment)        │                       │
//! │  │ Widget  in=2   out=5    (correction)         │                       │
//! │  └──────────────────────────────────────────────┘                       │
//! │                      │                                                  │
//! │                      ▼  Σ quantity_in − Σ quantity_out                  │
//! │                                                                         │
//! │  stock("Widget") = (100 + 2) − (30 + 5) = 67                            │
//! │                                                                         │
//! │  Sums are commutative: the result is independent of append order,      │
//! │  which keeps concurrent writers safe for reads.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative levels can exist from pre-existing bad data; they are reported
//! as-is. Rejecting *new* actions that would create or worsen a negative is
//! the storage layer's job at write time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::StockMovement;

/// Derived per-product stock levels for one location.
///
/// Products with no movements are absent from the map; callers must treat
/// "absent" and "zero" identically, which [`StockLevels::level`] does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels(HashMap<String, i64>);

impl StockLevels {
    /// Aggregates a movement history into per-product levels.
    ///
    /// Both sides of every row are summed independently, so corrective rows
    /// carrying nonzero `quantity_in` *and* `quantity_out` net correctly.
    pub fn from_movements<'a, I>(movements: I) -> Self
    where
        I: IntoIterator<Item = &'a StockMovement>,
    {
        let mut levels: HashMap<String, i64> = HashMap::new();
        for m in movements {
            *levels.entry(m.product.clone()).or_insert(0) += m.quantity_in - m.quantity_out;
        }
        StockLevels(levels)
    }

    /// Current level for one product. Absent means zero.
    pub fn level(&self, product: &str) -> i64 {
        self.0.get(product).copied().unwrap_or(0)
    }

    /// Whether any product has a recorded movement.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of products with at least one movement.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates (product, level) pairs. Unordered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(p, &q)| (p.as_str(), q))
    }

    /// Consumes into the underlying map.
    pub fn into_map(self) -> HashMap<String, i64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use chrono::Utc;

    fn movement(product: &str, q_in: i64, q_out: i64) -> StockMovement {
        StockMovement {
            id: format!("m-{product}-{q_in}-{q_out}"),
            location: Location::Distributor,
            product: product.to_string(),
            quantity_in: q_in,
            quantity_out: q_out,
            reference: None,
            reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sums_entries_minus_exits() {
        let history = vec![movement("Widget", 100, 0), movement("Widget", 0, 30)];
        let levels = StockLevels::from_movements(&history);
        assert_eq!(levels.level("Widget"), 70);
    }

    #[test]
    fn order_independent() {
        let a = vec![movement("W", 100, 0), movement("W", 0, 30), movement("W", 5, 0)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(
            StockLevels::from_movements(&a).level("W"),
            StockLevels::from_movements(&b).level("W")
        );
    }

    #[test]
    fn both_sides_nonzero_nets_correctly() {
        // Exchange row: 2 units returned, 5 taken out, in one record.
        let history = vec![movement("W", 100, 0), movement("W", 2, 5)];
        assert_eq!(StockLevels::from_movements(&history).level("W"), 97);
    }

    #[test]
    fn absent_product_reads_as_zero() {
        let history = vec![movement("Widget", 10, 0)];
        let levels = StockLevels::from_movements(&history);
        assert_eq!(levels.level("Gadget"), 0);
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn negative_drift_is_reported_as_is() {
        // Bad historical data: more exits than entries. Displayed, not hidden.
        let history = vec![movement("W", 10, 0), movement("W", 0, 25)];
        assert_eq!(StockLevels::from_movements(&history).level("W"), -15);
    }

    #[test]
    fn empty_history_is_empty() {
        let levels = StockLevels::from_movements(&[]);
        assert!(levels.is_empty());
        assert_eq!(levels.level("anything"), 0);
    }
}
