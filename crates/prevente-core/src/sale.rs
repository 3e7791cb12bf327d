//! # Sale Math
//!
//! Pure totals and payment arithmetic for end-customer sales.
//!
//! The storage layer persists what these functions compute; it never
//! re-derives totals with its own arithmetic, so tax and rounding policy
//! live in exactly one place.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::validation::validate_quantity;

/// Computed totals for one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    /// quantity × unit_price.
    pub total_before_tax: Money,
    /// round_half_up(total_before_tax × (1 + rate)).
    pub total_with_tax: Money,
}

impl SaleTotals {
    /// Computes totals for `quantity` units at `unit_price` under `rate`.
    ///
    /// ## Example
    /// ```rust
    /// use prevente_core::{Money, SaleTotals, DEFAULT_TAX_RATE};
    ///
    /// let totals = SaleTotals::compute(5, Money::from_cents(1000), DEFAULT_TAX_RATE).unwrap();
    /// assert_eq!(totals.total_before_tax.cents(), 5000);
    /// assert_eq!(totals.total_with_tax.cents(), 5950);
    /// ```
    pub fn compute(quantity: i64, unit_price: Money, rate: TaxRate) -> CoreResult<SaleTotals> {
        validate_quantity(quantity)?;

        let total_before_tax = unit_price.multiply_quantity(quantity).ok_or(
            CoreError::AmountOverflow {
                cents: unit_price.cents(),
                quantity,
            },
        )?;
        Ok(SaleTotals {
            total_before_tax,
            total_with_tax: total_before_tax.with_tax(rate),
        })
    }

    /// Remaining balance after `amount_paid`.
    ///
    /// Rejects rather than clamps: `amount_paid` outside
    /// `[0, total_with_tax]` is an [`CoreError::InvalidPayment`], so a
    /// balance due can never go negative.
    pub fn balance_due(&self, amount_paid: Money) -> CoreResult<Money> {
        if amount_paid.is_negative() || amount_paid > self.total_with_tax {
            return Err(CoreError::InvalidPayment {
                paid: amount_paid,
                total: self.total_with_tax,
            });
        }
        Ok(self.total_with_tax - amount_paid)
    }
}
