use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use crate::history::{HistoryPeriod, PricePoint};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    period: HistoryPeriod,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    prices: Arc<Vec<PricePoint>>,
    stored_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
}

/// In-memory cache of fetched price histories, keyed by symbol and period.
#[derive(Debug)]
pub struct HistoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    max_entries: usize,
    ttl: Option<Duration>,
    stats: RwLock<CacheStats>,
}

impl HistoryCache {
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            ttl,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn get(&self, symbol: &str, period: HistoryPeriod) -> Option<Arc<Vec<PricePoint>>> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            period,
        };
        let now = Utc::now();

        let hit = match self.entries.get_mut(&key) {
            Some(mut entry) if !self.is_expired(&entry, now) => {
                entry.last_accessed = now;
                Some(Arc::clone(&entry.prices))
            }
            _ => None,
        };

        let mut stats = self.stats.write();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    pub fn store(&self, symbol: &str, period: HistoryPeriod, prices: Vec<PricePoint>) -> Arc<Vec<PricePoint>> {
        let prices = Arc::new(prices);
        let key = CacheKey {
            symbol: symbol.to_string(),
            period,
        };
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict_lru();
        }

        let now = Utc::now();
        self.entries.insert(
            key,
            CacheEntry {
                prices: Arc::clone(&prices),
                stored_at: now,
                last_accessed: now,
            },
        );
        self.stats.write().stores += 1;
        prices
    }

    /// Drop the least recently accessed entry.
    fn evict_lru(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_accessed)
            .map(|e| e.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.write().evictions += 1;
            debug!(symbol = %key.symbol, period = %key.period, "evicted cached history");
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.ttl.map_or(false, |ttl| now - entry.stored_at > ttl)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        *self.stats.write() = CacheStats::default();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(256, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}
