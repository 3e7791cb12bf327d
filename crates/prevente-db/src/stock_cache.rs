//! # Boundary Stock Cache
//!
//! Optional, explicitly TTL-bounded memoization of derived stock reads.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI page view ──► StockCache::current_stock() ──► fresh? serve memo    │
//! │                                    │                                    │
//! │                                    └── stale? ──► LedgerRepository      │
//! │                                                    (full re-derive)     │
//! │                                                                         │
//! │  Repository write paths NEVER consult this cache: every sufficiency    │
//! │  check inside a transaction re-derives from the ledger. The cache      │
//! │  only bounds the cost of read-heavy display traffic.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cached value can be up to `ttl` stale, including against writes made
//! through this very process - call [`StockCache::invalidate`] after a write
//! when the UI should reflect it immediately.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::ledger::LedgerRepository;
use prevente_core::stock::StockLevels;
use prevente_core::types::Location;

struct CachedLevels {
    cached_at: Instant,
    levels: StockLevels,
}

/// TTL-bounded memo of per-location derived stock.
pub struct StockCache {
    ttl: Duration,
    inner: RwLock<HashMap<String, CachedLevels>>,
}

impl StockCache {
    /// Creates a cache whose entries are served for at most `ttl`.
    ///
    /// A zero `ttl` disables memoization (every read re-derives).
    pub fn new(ttl: Duration) -> Self {
        StockCache {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Current stock for a location, served from the memo when fresh.
    pub async fn current_stock(
        &self,
        ledger: &LedgerRepository,
        location: &Location,
    ) -> DbResult<StockLevels> {
        let key = location.storage_key();

        {
            let cache = self.inner.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.cached_at.elapsed() < self.ttl {
                    return Ok(entry.levels.clone());
                }
            }
        }

        let levels = ledger.current_stock(location, None).await?;

        let mut cache = self.inner.write().await;
        cache.insert(
            key,
            CachedLevels {
                cached_at: Instant::now(),
                levels: levels.clone(),
            },
        );

        Ok(levels)
    }

    /// Drops the memo for one location, forcing the next read to re-derive.
    pub async fn invalidate(&self, location: &Location) {
        let key = location.storage_key();
        self.inner.write().await.remove(&key);
        debug!(location = %location, "Stock cache invalidated");
    }

    /// Drops all memos.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn serves_memo_within_ttl() {
        let db = test_db().await;
        let ledger = db.ledger();
        let cache = StockCache::new(Duration::from_secs(3600));
        let loc = Location::Distributor;

        ledger.record_movement(&loc, "W", 10, 0, None, None).await.unwrap();
        assert_eq!(cache.current_stock(&ledger, &loc).await.unwrap().level("W"), 10);

        // Write behind the cache's back: the memo is intentionally stale.
        ledger.record_movement(&loc, "W", 5, 0, None, None).await.unwrap();
        assert_eq!(cache.current_stock(&ledger, &loc).await.unwrap().level("W"), 10);

        // Invalidation forces a re-derive.
        cache.invalidate(&loc).await;
        assert_eq!(cache.current_stock(&ledger, &loc).await.unwrap().level("W"), 15);
    }

    #[tokio::test]
    async fn zero_ttl_always_re_derives() {
        let db = test_db().await;
        let ledger = db.ledger();
        let cache = StockCache::new(Duration::ZERO);
        let loc = Location::pos("P1");

        ledger.record_movement(&loc, "W", 3, 0, None, None).await.unwrap();
        assert_eq!(cache.current_stock(&ledger, &loc).await.unwrap().level("W"), 3);

        ledger.record_movement(&loc, "W", 4, 0, None, None).await.unwrap();
        assert_eq!(cache.current_stock(&ledger, &loc).await.unwrap().level("W"), 7);
    }

    #[tokio::test]
    async fn locations_are_cached_independently() {
        let db = test_db().await;
        let ledger = db.ledger();
        let cache = StockCache::new(Duration::from_secs(3600));

        ledger.record_movement(&Location::Distributor, "W", 10, 0, None, None).await.unwrap();
        ledger.record_movement(&Location::pos("P1"), "W", 2, 0, None, None).await.unwrap();

        assert_eq!(
            cache.current_stock(&ledger, &Location::Distributor).await.unwrap().level("W"),
            10
        );
        assert_eq!(
            cache.current_stock(&ledger, &Location::pos("P1")).await.unwrap().level("W"),
            2
        );
    }
}
