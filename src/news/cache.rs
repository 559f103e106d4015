use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::clock::SharedClock;

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    payload: T,
    created: DateTime<Utc>,
}

/// Per-key payloads that expire `ttl` after they were stored.
///
/// Expired entries read as absent; they are overwritten by the next `put`.
pub struct TtlCache<T> {
    ttl: Duration,
    clock: SharedClock,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries
            .get(key)
            .filter(|e| now - e.created < self.ttl)
            .map(|e| e.payload.clone())
    }

    pub fn put(&self, key: &str, payload: T) {
        let entry = CacheEntry {
            payload,
            created: self.clock.now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), entry);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }

    /// Stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::sync::Arc;

    #[test]
    fn entry_is_fresh_strictly_before_ttl() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let cache = TtlCache::new(Duration::minutes(5), Arc::new(clock.clone()));

        cache.put("world-news", vec![1, 2, 3]);
        clock.advance(Duration::seconds(299));
        assert_eq!(cache.get("world-news"), Some(vec![1, 2, 3]));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("world-news"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_independent() {
        let clock = ManualClock::new(Utc::now());
        let cache = TtlCache::new(Duration::minutes(5), Arc::new(clock));
        cache.put("company-news-AAPL", "a");
        assert_eq!(cache.get("company-news-MSFT"), None);
        assert_eq!(cache.get("company-news-AAPL"), Some("a"));
    }
}
