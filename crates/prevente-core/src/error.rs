//! # Error Types
//!
//! Domain-specific error types for prevente-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  prevente-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  prevente-db errors (separate crate)                                   │
//! │  └── DbError          - Storage failures, wraps CoreError for the      │
//! │                         domain outcomes of repository operations       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller layer            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, quantities, amounts)
//! 3. Errors are enum variants, never String
//! 4. Validation outcomes are expected results, never panics

use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

/// Result type for pure core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Every variant here is an expected, user-facing outcome: the caller layer
/// shows it and lets the user correct the request. None of these are faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Requested quantity exceeds the derived on-hand stock.
    ///
    /// ## When This Occurs
    /// - ADV validates an order the distributor cannot cover
    /// - A POS sale exceeds what was delivered to that POS
    ///
    /// Recoverable: the user lowers the quantity, or ADV restocks first.
    #[error("insufficient stock for {product} at {location}: available {available}, requested {requested}")]
    InsufficientStock {
        location: String,
        product: String,
        available: i64,
        requested: i64,
    },

    /// No order exists under the given id.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The order already reached a terminal state.
    ///
    /// ## When This Occurs
    /// - Double-validation (a retried validate call after a success)
    /// - Validating or cancelling an already cancelled order
    ///
    /// Rejection is idempotent-safe: no stock moves a second time.
    #[error("order {id} is {status}, expected pending")]
    OrderNotPending { id: String, status: OrderStatus },

    /// Quantity must be strictly positive.
    #[error("invalid quantity: {0} (must be > 0)")]
    InvalidQuantity(i64),

    /// A line total left the representable money range.
    ///
    /// Rejected rather than wrapped: a silently wrong total is worse than a
    /// refused sale.
    #[error("amount overflow: {cents} centimes x {quantity}")]
    AmountOverflow { cents: i64, quantity: i64 },

    /// Paid amount outside `[0, total_with_tax]`.
    ///
    /// Enforced at the boundary rather than clamped silently: a balance due
    /// must never go negative.
    #[error("invalid payment: paid {paid} against total {total}")]
    InvalidPayment { paid: Money, total: Money },

    /// Field-level validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
///
/// These occur when user input doesn't meet structural requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A field exceeds its maximum length.
    #[error("{field} exceeds maximum length of {max}")]
    TooLong { field: &'static str, max: usize },

    /// A movement side was negative (entries and exits are counts).
    #[error("{field} must not be negative, got {got}")]
    NegativeQuantity { field: &'static str, got: i64 },
}
