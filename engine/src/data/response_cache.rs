// In-memory cache of raw API responses, keyed by request URL.
// Widgets refreshing the same URL within the TTL share one upstream fetch.
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStats {
    pub url: String,
    pub age_ms: u128,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub entries: Vec<CacheEntryStats>,
}

pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        ResponseCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, url: &str) -> Option<Value> {
        self.get_at(url, Instant::now())
    }

    /// Cached response for `url` as seen at `now`. An expired entry is evicted
    /// and reported as a miss.
    pub fn get_at(&self, url: &str, now: Instant) -> Option<Value> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(url) {
                None => return None,
                Some(entry) if self.is_fresh(entry, now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have refreshed it between the two locks
        if let Some(entry) = entries.get(url) {
            if self.is_fresh(entry, now) {
                return Some(entry.data.clone());
            }
        }
        entries.remove(url);
        tracing::debug!(url, "Evicted expired cache entry");
        None
    }

    pub fn insert(&self, url: impl Into<String>, data: Value) {
        self.insert_at(url, data, Instant::now());
    }

    pub fn insert_at(&self, url: impl Into<String>, data: Value, now: Instant) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(url.into(), CacheEntry { data, stored_at: now });
    }

    pub fn remove(&self, url: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(url).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    pub fn stats_at(&self, now: Instant) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats: Vec<CacheEntryStats> = entries
            .iter()
            .map(|(url, entry)| CacheEntryStats {
                url: url.clone(),
                age_ms: now.saturating_duration_since(entry.stored_at).as_millis(),
                valid: self.is_fresh(entry, now),
            })
            .collect();
        stats.sort_by(|a, b| a.url.cmp(&b.url));

        CacheStats {
            total_entries: stats.len(),
            valid_entries: stats.iter().filter(|e| e.valid).count(),
            entries: stats,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
