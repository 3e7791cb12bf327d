//! # Validation Module
//!
//! Input validation rules for Prevente.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller layer (UI / API)                                      │
//! │  ├── Basic format checks, immediate user feedback                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Runs inside every repository operation, so no write path can      │
//! │  │   skip it regardless of which UI binds on top                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL and CHECK constraints as the last line                   │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Customer;
use crate::MAX_LINE_QUANTITY;

/// Result type for field-level validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates an order or sale quantity.
///
/// ## Rules
/// - Must be strictly positive
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if quantity <= 0 || quantity > MAX_LINE_QUANTITY {
        return Err(CoreError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// Validates the two sides of a stock movement.
///
/// Entries and exits are counts: each side must be ≥ 0. A row may carry
/// both sides nonzero (corrective/exchange rows), and a zero/zero row is
/// tolerated as a no-op.
pub fn validate_movement_sides(quantity_in: i64, quantity_out: i64) -> ValidationResult<()> {
    if quantity_in < 0 {
        return Err(ValidationError::NegativeQuantity {
            field: "quantity_in",
            got: quantity_in,
        });
    }
    if quantity_out < 0 {
        return Err(ValidationError::NegativeQuantity {
            field: "quantity_out",
            got: quantity_out,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if value.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Validates a product catalog name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("product", name, 200)
}

/// Validates a POS code.
pub fn validate_pos_code(code: &str) -> ValidationResult<()> {
    required("pos_code", code, 50)
}

/// Validates a seller or validator code.
pub fn validate_actor_code(code: &str) -> ValidationResult<()> {
    required("actor_code", code, 50)
}

/// Validates the required customer fields for a sale.
///
/// Name and phone are mandatory; the tax-registry fields are free-form and
/// only rendered on invoices, so they are not checked here.
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    required("customer_name", &customer.name, 200)?;
    required("customer_phone", &customer.phone, 50)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn movement_sides_must_be_counts() {
        assert!(validate_movement_sides(100, 0).is_ok());
        assert!(validate_movement_sides(0, 30).is_ok());
        assert!(validate_movement_sides(2, 5).is_ok());
        assert!(validate_movement_sides(0, 0).is_ok());
        assert!(validate_movement_sides(-1, 0).is_err());
        assert!(validate_movement_sides(0, -1).is_err());
    }

    #[test]
    fn customer_requires_name_and_phone() {
        assert!(validate_customer(&Customer::new("Amine B", "0550 12 34 56")).is_ok());
        assert!(validate_customer(&Customer::new("", "0550")).is_err());
        assert!(validate_customer(&Customer::new("Amine", "   ")).is_err());
    }

    #[test]
    fn codes_must_be_present() {
        assert!(validate_pos_code("P1").is_ok());
        assert!(validate_pos_code("").is_err());
        assert!(validate_actor_code("ADV1").is_ok());
        assert!(validate_actor_code(" ").is_err());
    }
}
