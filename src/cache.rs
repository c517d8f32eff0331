use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

pub const ROUTE_CACHE_TTL: Duration = Duration::from_millis(300_000);
pub const TRAFFIC_CACHE_TTL: Duration = Duration::from_millis(30_000);

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key/value store whose entries expire a fixed time after insertion.
///
/// Expiry is checked lazily on read; stale entries stay in the map until the
/// next `put` for the same key overwrites them.
#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;

        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }

        Some(entry.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn get_after_put_returns_value() {
        let cache = ExpiringCache::new(Duration::from_secs(30));
        cache.put(1u32, "route");

        assert_eq!(cache.get(&1), Some("route"));
        assert_eq!(cache.get(&2), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_exactly_at_ttl() {
        let cache = ExpiringCache::new(TRAFFIC_CACHE_TTL);
        cache.put("a", 7);

        tokio::time::advance(TRAFFIC_CACHE_TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get(&"a"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&"a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn put_refreshes_a_stale_entry() {
        let cache = ExpiringCache::new(Duration::from_secs(5));
        cache.put("a", 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get(&"a"), None);

        cache.put("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn route_and_traffic_caches_are_independent() {
        let routes = ExpiringCache::new(ROUTE_CACHE_TTL);
        let traffic = ExpiringCache::new(TRAFFIC_CACHE_TTL);
        routes.put(1u32, "route");
        traffic.put(1u32, "traffic");

        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(routes.get(&1), Some("route"));
        assert_eq!(traffic.get(&1), None);
    }
}
