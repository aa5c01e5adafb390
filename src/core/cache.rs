//! Memoization of dispatcher results
//!
//! A cache entry is keyed by every input that shapes a table: metric name,
//! row limit, medication filter, year range and the protocol-id set. The
//! id set enters the key as its size plus a SHA-256 digest over the sorted
//! identifiers, so distinct sets never share an entry and the key stays
//! small for large sets.
//!
//! Entries expire on a fixed wall-clock time-to-live; nothing invalidates
//! them early.

use crate::config::CacheConfig;
use crate::domain::{MetricTable, ProtocolIdSet, YearRange};
use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic cache key of one dispatcher request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub metric: String,
    pub limit: usize,
    pub medication: Option<String>,
    pub years: Option<YearRange>,
    /// `(set size, hex digest)` of the protocol-id restriction
    pub ids_signature: Option<(usize, String)>,
}

impl CacheKey {
    pub fn new(
        metric: &str,
        limit: usize,
        medication: Option<&str>,
        years: Option<YearRange>,
        protocol_ids: Option<&ProtocolIdSet>,
    ) -> Self {
        Self {
            metric: metric.to_string(),
            limit,
            medication: medication.map(str::to_string),
            years,
            ids_signature: protocol_ids.map(|ids| (ids.len(), ids_digest(ids))),
        }
    }
}

/// SHA-256 over the identifiers in sorted order
///
/// Identifiers are length-prefixed so `["ab", "c"]` and `["a", "bc"]`
/// produce different digests.
pub fn ids_digest(ids: &ProtocolIdSet) -> String {
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update((id.as_str().len() as u64).to_le_bytes());
        hasher.update(id.as_str().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Storage for computed tables
#[async_trait]
pub trait TableCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Arc<MetricTable>>;

    async fn insert(&self, key: CacheKey, table: Arc<MetricTable>);
}

/// Time-bounded in-memory cache
pub struct TtlCache {
    inner: Cache<CacheKey, Arc<MetricTable>>,
}

impl TtlCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_entries)
                .build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_seconds), config.max_entries)
    }
}

#[async_trait]
impl TableCache for TtlCache {
    async fn get(&self, key: &CacheKey) -> Option<Arc<MetricTable>> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: CacheKey, table: Arc<MetricTable>) {
        self.inner.insert(key, table).await;
    }
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl TableCache for NoCache {
    async fn get(&self, _key: &CacheKey) -> Option<Arc<MetricTable>> {
        None
    }

    async fn insert(&self, _key: CacheKey, _table: Arc<MetricTable>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_protocol_id_list, ProtocolId};

    #[test]
    fn test_key_distinguishes_filters() {
        let ids = parse_protocol_id_list("P-1,P-2");
        let base = CacheKey::new("Medikamente", 100, None, None, None);
        assert_ne!(base, CacheKey::new("Medikamente", 100, Some("ASS"), None, None));
        assert_ne!(base, CacheKey::new("Medikamente", 200, None, None, None));
        assert_ne!(base, CacheKey::new("Medikamente", 100, None, None, Some(&ids)));
        assert_ne!(
            base,
            CacheKey::new("Medikamente", 100, None, Some(YearRange::single(2024).unwrap()), None)
        );
        assert_eq!(base, CacheKey::new("Medikamente", 100, None, None, None));
    }

    #[test]
    fn test_digest_is_order_independent_and_unambiguous() {
        let a = parse_protocol_id_list("P-2,P-1");
        let b = parse_protocol_id_list("P-1,P-2");
        assert_eq!(ids_digest(&a), ids_digest(&b));
        assert_eq!(ids_digest(&a).len(), 64);

        let split_one = parse_protocol_id_list("ab,c");
        let split_two = parse_protocol_id_list("a,bc");
        assert_ne!(ids_digest(&split_one), ids_digest(&split_two));

        let empty = ProtocolIdSet::new();
        let one: ProtocolIdSet = [ProtocolId::new("x").unwrap()].into_iter().collect();
        assert_ne!(ids_digest(&empty), ids_digest(&one));
    }

    #[tokio::test]
    async fn test_ttl_cache_roundtrip() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        let key = CacheKey::new("GCS", 10, None, None, None);
        assert!(cache.get(&key).await.is_none());

        let table = Arc::new(MetricTable::empty(&["protocolId"]));
        cache.insert(key.clone(), Arc::clone(&table)).await;
        let hit = cache.get(&key).await.unwrap();
        assert!(Arc::ptr_eq(&hit, &table));
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = TtlCache::new(Duration::from_millis(50), 8);
        let key = CacheKey::new("GCS", 10, None, None, None);
        cache
            .insert(key.clone(), Arc::new(MetricTable::empty(&["protocolId"])))
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_no_cache_never_hits() {
        let cache = NoCache;
        let key = CacheKey::new("GCS", 10, None, None, None);
        cache
            .insert(key.clone(), Arc::new(MetricTable::default()))
            .await;
        assert!(cache.get(&key).await.is_none());
    }
}
