//! # prevente-db: Database Layer for Prevente
//!
//! SQLite persistence for the Prevente distribution tracker: the append-only
//! movement ledger, the order lifecycle, sale records, and the product price
//! reference.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         prevente-db                                     │
//! │                                                                         │
//! │  Database (pool.rs)                                                    │
//! │  ├── ledger()   ─► LedgerRepository   record_movement, current_stock  │
//! │  ├── orders()   ─► OrderRepository    submit / validate / cancel      │
//! │  ├── sales()    ─► SaleRepository     record_sale, invoice numbers    │
//! │  └── products() ─► ProductRepository  price reference                 │
//! │                                                                         │
//! │  Boundary helpers                                                      │
//! │  ├── StockCache   TTL-bounded memo of derived stock (reads only)       │
//! │  └── with_retry   bounded retry of transient StoreUnavailable          │
//! │                                                                         │
//! │  Consistency rules                                                     │
//! │  • movements and sales are append-only; orders flip status once        │
//! │  • composite effects commit in a single transaction                    │
//! │  • status transitions are compare-and-swap conditional updates         │
//! │  • stock is derived from the ledger on every check, never stored       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod retry;
pub mod stock_cache;

// Re-exports for convenience
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::ledger::LedgerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use retry::with_retry;
pub use stock_cache::StockCache;
