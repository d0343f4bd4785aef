//! Last-known price per item.
//!
//! Entries are never evicted. Staleness is decided when a record is read
//! ([`is_stale`]), so an old record is still there to fall back on when
//! every source fails.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use log::warn;

use crate::models::{ItemKey, PriceRecord};

/// Price records older than this are refreshed before use.
pub const PRICE_TTL: Duration = Duration::minutes(30);

/// Clock skew tolerated before a future `captured_at` is distrusted.
const MAX_CLOCK_SKEW: Duration = Duration::minutes(1);

/// `now - captured_at >= ttl`. A record stamped more than a minute in the
/// future is stale too, otherwise it would never expire.
pub fn is_stale(record: &PriceRecord, ttl: Duration, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(record.captured_at);
    age >= ttl || age < -MAX_CLOCK_SKEW
}

/// Keyed store of the last resolved record per item.
///
/// A `put` replaces the whole record for its key; readers see either the
/// old record or the new one, never a mix.
pub trait PriceCacheStore: Send + Sync {
    fn get(&self, key: &ItemKey) -> Option<Arc<PriceRecord>>;

    fn put(&self, key: ItemKey, record: PriceRecord);

    /// Copy of every record, for bulk export.
    fn snapshot(&self) -> HashMap<ItemKey, PriceRecord>;

    /// Drop everything and load `records` in its place.
    fn replace_all(&self, records: HashMap<ItemKey, PriceRecord>);

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local [`PriceCacheStore`].
#[derive(Default)]
pub struct InMemoryPriceCache {
    records: RwLock<HashMap<ItemKey, Arc<PriceRecord>>>,
}

impl InMemoryPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: HashMap<ItemKey, PriceRecord>) -> Self {
        let cache = Self::new();
        cache.replace_all(records);
        cache
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ItemKey, Arc<PriceRecord>>> {
        self.records.read().unwrap_or_else(|poisoned| {
            warn!("Price cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ItemKey, Arc<PriceRecord>>> {
        self.records.write().unwrap_or_else(|poisoned| {
            warn!("Price cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl PriceCacheStore for InMemoryPriceCache {
    fn get(&self, key: &ItemKey) -> Option<Arc<PriceRecord>> {
        self.read().get(key).cloned()
    }

    fn put(&self, key: ItemKey, record: PriceRecord) {
        self.write().insert(key, Arc::new(record));
    }

    fn snapshot(&self) -> HashMap<ItemKey, PriceRecord> {
        self.read()
            .iter()
            .map(|(key, record)| (key.clone(), PriceRecord::clone(record)))
            .collect()
    }

    fn replace_all(&self, records: HashMap<ItemKey, PriceRecord>) {
        let records = records
            .into_iter()
            .map(|(key, record)| (key, Arc::new(record)))
            .collect();
        *self.write() = records;
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

/// Shared handle to a cache store.
pub type SharedPriceCache = Arc<dyn PriceCacheStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSource;
    use rust_decimal_macros::dec;

    fn record(name: &str, captured_at: DateTime<Utc>) -> PriceRecord {
        PriceRecord {
            amount: dec!(100.5),
            source: PriceSource::Auction,
            captured_at,
            display_name: name.to_string(),
            bazaar_buy_amount: None,
        }
    }

    #[test]
    fn test_staleness_boundary() {
        let now = Utc::now();
        assert!(is_stale(&record("A", now - Duration::minutes(31)), PRICE_TTL, now));
        assert!(!is_stale(&record("A", now - Duration::minutes(29)), PRICE_TTL, now));
        assert!(is_stale(&record("A", now - PRICE_TTL), PRICE_TTL, now));
    }

    #[test]
    fn test_future_stamped_record_is_stale() {
        let now = Utc::now();
        assert!(is_stale(&record("A", now + Duration::days(365)), PRICE_TTL, now));
        assert!(is_stale(&record("A", now + Duration::minutes(2)), PRICE_TTL, now));
        // Small skew is tolerated
        assert!(!is_stale(&record("A", now + Duration::seconds(30)), PRICE_TTL, now));
    }

    #[test]
    fn test_put_replaces_whole_record() {
        let cache = InMemoryPriceCache::new();
        let key = ItemKey::from_display_name("Hyperion");

        cache.put(key.clone(), record("Hyperion", Utc::now()));
        let first = cache.get(&key).unwrap();

        let mut updated = record("Hyperion", Utc::now());
        updated.amount = dec!(7);
        cache.put(key.clone(), updated);

        // Earlier readers keep their copy
        assert_eq!(first.amount, dec!(100.5));
        assert_eq!(cache.get(&key).unwrap().amount, dec!(7));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_replace_all_and_snapshot() {
        let cache = InMemoryPriceCache::new();
        cache.put(ItemKey::from("old"), record("Old", Utc::now()));

        let mut records = HashMap::new();
        records.insert(ItemKey::from("a"), record("A", Utc::now()));
        records.insert(ItemKey::from("b"), record("B", Utc::now()));
        cache.replace_all(records);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(cache.get(&ItemKey::from("old")).is_none());
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_missing_key() {
        let cache = InMemoryPriceCache::new();
        assert!(cache.get(&ItemKey::from("nothing")).is_none());
        assert!(cache.is_empty());
    }
}
