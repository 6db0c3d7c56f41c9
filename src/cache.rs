//! Owned, time-limited memoisation for slow market-data loads.
//!
//! The cache is a plain value handed to whoever needs it; expiry is decided
//! against the `now` the caller passes in, which keeps it deterministic under
//! test.
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) < self.ttl
    }

    pub fn get(&self, key: &K, now: Instant) -> Option<V> {
        self.entries
            .get(key)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Return the cached value for `key`, or compute, store and return it.
    /// A failed computation is not cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, now: Instant, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.get(&key, now) {
            debug!("cache hit for {:?}", key);
            return Ok(v);
        }
        debug!("cache miss for {:?}", key);
        let value = f()?;
        self.insert(key, value.clone(), now);
        Ok(value)
    }

    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.inserted_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let t0 = Instant::now();
        let mut cache = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        cache.insert("wci", 42, t0);
        assert_eq!(cache.get(&"wci", t0 + Duration::from_secs(59)), Some(42));
        assert_eq!(cache.get(&"wci", t0 + Duration::from_secs(60)), None);

        cache.purge_expired(t0 + Duration::from_secs(61));
        assert!(cache.is_empty());
    }

    #[test]
    fn computes_once_while_fresh() {
        let t0 = Instant::now();
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(10));
        let mut calls = 0;
        for secs in [0, 5, 9] {
            let v: Result<u32, String> =
                cache.get_or_try_insert_with("k".to_string(), t0 + Duration::from_secs(secs), || {
                    calls += 1;
                    Ok(7)
                });
            assert_eq!(v, Ok(7));
        }
        assert_eq!(calls, 1);

        let _ = cache.get_or_try_insert_with("k".to_string(), t0 + Duration::from_secs(10), || {
            calls += 1;
            Ok::<u32, String>(8)
        });
        assert_eq!(calls, 2);
        assert_eq!(cache.get(&"k".to_string(), t0 + Duration::from_secs(10)), Some(8));
    }

    #[test]
    fn failures_are_not_cached() {
        let t0 = Instant::now();
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(10));
        let err: Result<u32, &str> = cache.get_or_try_insert_with("k", t0, || Err("offline"));
        assert_eq!(err, Err("offline"));
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&"k", t0).is_none());
    }
}
