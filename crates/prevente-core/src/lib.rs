//! # prevente-core: Pure Business Logic for Prevente
//!
//! This crate is the **heart** of Prevente, a pre-sale distribution tracker:
//! a distributor stocks product, pre-sellers submit point-of-sale orders on
//! their visit route, the ADV back office validates them (physically moving
//! stock distributor → POS), and POS staff record end-customer sales with
//! partial-payment tracking and per-year invoice numbering.
//!
//! Everything here is a pure function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Prevente Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller layer (any UI)                        │   │
//! │  │   submit order ─► validate order ─► record sale ─► invoice     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ prevente-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   stock   │  │  invoice  │  │   │
//! │  │   │ Movement  │  │   Money   │  │ StockLvls │  │ NNN/YYYY  │  │   │
//! │  │   │   Order   │  │  TaxRate  │  │ Σin − Σout│  │ sequencer │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO SESSION STATE • PURE FUNCTIONS     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 prevente-db (Storage Layer)                     │   │
//! │  │        SQLite queries, migrations, transactional writes         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockMovement, Order, SaleRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Derived stock aggregation over the movement ledger
//! - [`sale`] - Sale totals and payment math
//! - [`invoice`] - Per-year invoice number sequencing
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centimes (i64), never floats
//! 4. **Derived Stock**: Current stock is computed from the full movement
//!    ledger on every read, never trusted from a stored counter
//! 5. **Explicit Identity**: Every operation takes the acting seller/validator
//!    code as a parameter - the core holds no session of its own

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use prevente_core::Money` instead of
// `use prevente_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::{Money, TaxRate};
pub use sale::SaleTotals;
pub use stock::StockLevels;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to end-customer sales: 19%, expressed in basis points.
///
/// ## Why a constant?
/// The rate is commercial policy, not mechanism. Every total computation
/// takes a [`TaxRate`] parameter; callers that follow current policy pass
/// this constant rather than scattering the literal through the codebase.
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_bps(1900);

/// Maximum quantity accepted for a single order or sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 3000 instead of 30).
pub const MAX_LINE_QUANTITY: i64 = 9_999;
