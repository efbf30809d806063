use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub summary: String,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStats {
    pub key: String,
    pub cached_at: DateTime<Utc>,
    pub age_minutes: i64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expiry_hours: i64,
    pub entries: Vec<CacheEntryStats>,
}

/// Summary text keyed by article id. Entries older than the expiry are
/// treated as absent but stay in the map until overwritten or cleared.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    entries: HashMap<String, CacheEntry>,
    expiry: Duration,
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_EXPIRY_HOURS))
    }
}

impl SummaryCache {
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            expiry,
        }
    }

    /// Hours beyond what chrono can represent saturate at the largest expiry.
    pub fn with_expiry_hours(hours: u64) -> Self {
        let expiry = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        Self::new(expiry)
    }

    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<&str> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.summary.as_str())
    }

    pub fn put(&mut self, key: impl Into<String>, summary: impl Into<String>, now: DateTime<Utc>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                summary: summary.into(),
                cached_at: now,
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let mut entries: Vec<CacheEntryStats> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheEntryStats {
                key: key.clone(),
                cached_at: entry.cached_at,
                age_minutes: (now - entry.cached_at).num_minutes(),
                is_valid: self.is_fresh(entry, now),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            total_entries: self.entries.len(),
            expiry_hours: self.expiry.num_hours(),
            entries,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.expiry
    }
}
