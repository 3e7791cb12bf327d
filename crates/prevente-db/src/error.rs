//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Categorized: transient vs schema vs query     │
//! │       │                                                                 │
//! │       │   Domain outcomes (InsufficientStock, OrderNotPending, ...)    │
//! │       │   travel through the transparent Domain variant so one Result  │
//! │       │   type covers a whole repository operation.                    │
//! │       ▼                                                                 │
//! │  Caller layer shows the message / retries transient failures           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Rule
//! A lookup failure for a financial quantity (a stock level, a price, a
//! balance) is an error, never a silent 0. Nothing in this crate defaults a
//! missing value.

use thiserror::Error;

use prevente_core::types::ParseLocationError;
use prevente_core::CoreError;

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the backing store.
    ///
    /// ## When This Occurs
    /// - Price lookup for a product absent from the reference table
    /// - Fetching a sale by an unknown id
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Transient store failure - the caller may retry.
    ///
    /// ## When This Occurs
    /// - Pool acquire timeout (all connections busy)
    /// - Pool closed during shutdown
    /// - I/O error talking to the database file
    /// - Write lock held by a concurrent writer (SQLITE_BUSY)
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The backing store does not match the expected schema.
    ///
    /// ## When This Occurs
    /// - A column this version expects is missing
    /// - A stored value fails to decode (bad location key, bad status)
    ///
    /// Fatal for the operation and surfaced as-is: never silently defaulted.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Database connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (non-transient, non-schema).
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Expected domain outcome from prevente-core rules.
    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether a bounded retry is worthwhile for this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::StoreUnavailable(_))
    }
}

impl From<prevente_core::ValidationError> for DbError {
    fn from(err: prevente_core::ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

impl From<ParseLocationError> for DbError {
    fn from(err: ParseLocationError) -> Self {
        DbError::SchemaMismatch(err.to_string())
    }
}

/// SQLITE_BUSY (5) / SQLITE_LOCKED (6) and their extended codes: a
/// concurrent writer holds the lock right now. Deferred transactions that
/// read before writing run into this under write-write contention.
fn is_sqlite_busy(err: &dyn sqlx::error::DatabaseError) -> bool {
    matches!(
        err.code().as_deref(),
        Some("5") | Some("6") | Some("261") | Some("262") | Some("517")
    )
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // Transient: retryable by the caller layer.
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                DbError::StoreUnavailable(err.to_string())
            }
            sqlx::Error::Io(e) => DbError::StoreUnavailable(e.to_string()),
            sqlx::Error::Database(e) if is_sqlite_busy(e.as_ref()) => {
                DbError::StoreUnavailable(e.to_string())
            }

            // The store's shape disagrees with this version's expectations.
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::Decode(_) => DbError::SchemaMismatch(err.to_string()),

            sqlx::Error::Migrate(e) => DbError::MigrationFailed(e.to_string()),

            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use prevente_core::types::Location;
    use std::time::Duration;

    #[test]
    fn pool_timeout_is_transient() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn write_lock_contention_is_transient() {
        // Two pools on the same file, as two processes would share a store.
        let path = std::env::temp_dir().join(format!("prevente-busy-{}.db", uuid::Uuid::new_v4()));
        let db1 = Database::new(DbConfig::new(&path).busy_timeout(Duration::from_millis(100)))
            .await
            .unwrap();
        let db2 = Database::new(DbConfig::new(&path).busy_timeout(Duration::from_millis(100)))
            .await
            .unwrap();

        // Take and hold the write lock through an open transaction.
        let mut tx = db1.pool().begin().await.unwrap();
        sqlx::query(
            "INSERT INTO movements (id, location, product, quantity_in, quantity_out, created_at)
             VALUES ('m-lock', 'distributor', 'Widget', 1, 0, '2026-01-01T00:00:00Z')",
        )
        .execute(&mut *tx)
        .await
        .unwrap();

        // The second writer must lose with a retryable error, not a fatal one.
        let err = db2
            .ledger()
            .record_movement(&Location::Distributor, "Widget", 1, 0, None, None)
            .await
            .unwrap_err();
        assert!(err.is_transient(), "busy writer should be retryable, got: {err}");
        assert!(matches!(err, DbError::StoreUnavailable(_)));

        drop(tx);
        db1.close().await;
        db2.close().await;
        let _ = std::fs::remove_file(&path);
        for suffix in ["-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[test]
    fn column_mismatch_is_schema_error() {
        let err: DbError = sqlx::Error::ColumnNotFound("quantity_in".into()).into();
        assert!(matches!(err, DbError::SchemaMismatch(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn domain_errors_pass_through_transparently() {
        let err = DbError::from(CoreError::InvalidQuantity(0));
        assert_eq!(err.to_string(), CoreError::InvalidQuantity(0).to_string());
    }
}
