//! Generic concurrent entity store with secondary indexes
//!
//! [`IndexedStore`] keeps a primary `key -> entity` map plus any number of
//! secondary indexes declared through [`IndexDescriptor`]s. Indexes store
//! keys only; every read resolves through the primary map, so a returned
//! entity can never come from a stale index reference.
//!
//! # Concurrency
//!
//! One `RwLock` guards the primary map and all indexes as a single critical
//! section. A reader therefore never observes an entity present in the
//! primary map but missing from an index it matches, or vice versa. Multi-
//! entity reads copy references out of the critical section before cloning
//! entities for the caller (copy-then-iterate).
//!
//! # Example
//!
//! ```rust
//! use gradestore::store::student_store;
//! use gradestore::types::{Student, StudentKind};
//!
//! let store = student_store();
//! store.insert(Student::new("S1", "Ada", "ada@example.edu", StudentKind::Honors)).unwrap();
//!
//! let honors = store.find_by_index("kind", "Honors");
//! assert_eq!(honors.len(), 1);
//! ```

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

use super::descriptor::{IndexDescriptor, IndexKind};
use super::stats::StatsGuard;
use crate::error::StoreError;
use crate::types::Keyed;

/// Default freshness window for [`IndexedStore::metrics`]
pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(30);

/// Aggregate store statistics, refreshed at most once per stats TTL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreMetrics {
    /// Number of entities in the primary map
    pub total_entities: usize,

    /// Distinct bucket count per index name
    pub index_buckets: HashMap<String, usize>,
}

/// Primary map plus all secondary indexes, mutated as one unit
struct StoreInner<E> {
    primary: HashMap<String, E>,
    hashed: HashMap<&'static str, HashMap<String, HashSet<String>>>,
    ordered: HashMap<&'static str, BTreeMap<String, BTreeSet<String>>>,
}

impl<E> StoreInner<E> {
    fn add_membership(&mut self, desc_name: &'static str, kind: IndexKind, value: &str, key: &str) {
        match kind {
            IndexKind::Hashed => {
                self.hashed
                    .entry(desc_name)
                    .or_default()
                    .entry(value.to_string())
                    .or_default()
                    .insert(key.to_string());
            },
            IndexKind::Ordered => {
                self.ordered
                    .entry(desc_name)
                    .or_default()
                    .entry(value.to_string())
                    .or_default()
                    .insert(key.to_string());
            },
        }
    }

    /// Remove a key from one bucket, pruning the bucket when it empties
    fn remove_membership(
        &mut self,
        desc_name: &'static str,
        kind: IndexKind,
        value: &str,
        key: &str,
    ) {
        match kind {
            IndexKind::Hashed => {
                if let Some(buckets) = self.hashed.get_mut(desc_name) {
                    if let Some(bucket) = buckets.get_mut(value) {
                        bucket.remove(key);
                        if bucket.is_empty() {
                            buckets.remove(value);
                        }
                    }
                }
            },
            IndexKind::Ordered => {
                if let Some(buckets) = self.ordered.get_mut(desc_name) {
                    if let Some(bucket) = buckets.get_mut(value) {
                        bucket.remove(key);
                        if bucket.is_empty() {
                            buckets.remove(value);
                        }
                    }
                }
            },
        }
    }

    fn bucket_keys(&self, desc_name: &'static str, kind: IndexKind, value: &str) -> Vec<String> {
        match kind {
            IndexKind::Hashed => self
                .hashed
                .get(desc_name)
                .and_then(|buckets| buckets.get(value))
                .map(|bucket| bucket.iter().cloned().collect())
                .unwrap_or_default(),
            IndexKind::Ordered => self
                .ordered
                .get(desc_name)
                .and_then(|buckets| buckets.get(value))
                .map(|bucket| bucket.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

/// Concurrent primary store with pluggable secondary indexes
///
/// Generic over any [`Keyed`] entity. Index maintenance is data-driven: the
/// descriptor list is fixed at construction and iterated on every mutation,
/// so adding an index is a one-line change at the construction site.
pub struct IndexedStore<E> {
    descriptors: Vec<IndexDescriptor<E>>,
    inner: RwLock<StoreInner<E>>,
    stats: StatsGuard<StoreMetrics>,
}

impl<E: Keyed + Clone> IndexedStore<E> {
    /// Create a store with the given index descriptors and the default
    /// statistics TTL
    pub fn new(descriptors: Vec<IndexDescriptor<E>>) -> Self {
        Self::with_stats_ttl(descriptors, DEFAULT_STATS_TTL)
    }

    /// Create a store with an explicit statistics TTL
    pub fn with_stats_ttl(descriptors: Vec<IndexDescriptor<E>>, stats_ttl: Duration) -> Self {
        Self {
            descriptors,
            inner: RwLock::new(StoreInner {
                primary: HashMap::new(),
                hashed: HashMap::new(),
                ordered: HashMap::new(),
            }),
            stats: StatsGuard::new(stats_ttl),
        }
    }

    /// Insert a new entity under its key
    ///
    /// Fails with [`StoreError::DuplicateKey`] when the key is already
    /// present, leaving the store untouched. On success the primary map and
    /// every matching index are updated within one critical section.
    pub fn insert(&self, entity: E) -> Result<(), StoreError> {
        let key = entity.key().to_string();

        // Compute-then-commit: derive all index memberships before any
        // mutation so a duplicate key cannot leave partial state behind.
        let memberships = self.memberships_of(&entity);

        let mut inner = self.inner.write();
        if inner.primary.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }

        for (name, kind, value) in &memberships {
            inner.add_membership(name, *kind, value, &key);
        }
        inner.primary.insert(key.clone(), entity);
        drop(inner);

        self.stats.invalidate();
        debug!(key = %key, "entity inserted");
        Ok(())
    }

    /// Look up an entity by key
    pub fn get(&self, key: &str) -> Option<E> {
        self.inner.read().primary.get(key).cloned()
    }

    /// Whether an entity with this key is stored
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().primary.contains_key(key)
    }

    /// Replace the entity stored under `key`
    ///
    /// Returns `false` when the key is absent. Index memberships are
    /// recomputed from the new entity; only buckets whose attribute value
    /// actually changed are touched.
    pub fn update(&self, key: &str, entity: E) -> bool {
        let new_memberships = self.memberships_of(&entity);

        let mut inner = self.inner.write();
        let old = match inner.primary.get(key) {
            Some(old) => old.clone(),
            None => return false,
        };
        let old_memberships = self.memberships_of(&old);

        for desc in &self.descriptors {
            let old_value = old_memberships
                .iter()
                .find(|(name, _, _)| *name == desc.name)
                .map(|(_, _, v)| v.as_str());
            let new_value = new_memberships
                .iter()
                .find(|(name, _, _)| *name == desc.name)
                .map(|(_, _, v)| v.as_str());

            if old_value != new_value {
                if let Some(v) = old_value {
                    inner.remove_membership(desc.name, desc.kind, v, key);
                }
                if let Some(v) = new_value {
                    inner.add_membership(desc.name, desc.kind, v, key);
                }
            }
        }
        inner.primary.insert(key.to_string(), entity);
        drop(inner);

        self.stats.invalidate();
        debug!(key = %key, "entity updated");
        true
    }

    /// Remove an entity and all its index memberships
    ///
    /// Returns `false` when the key is absent. Emptied buckets are pruned.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        let old = match inner.primary.remove(key) {
            Some(old) => old,
            None => return false,
        };

        let memberships = self.memberships_of(&old);
        for (name, kind, value) in &memberships {
            inner.remove_membership(name, *kind, value, key);
        }
        drop(inner);

        self.stats.invalidate();
        debug!(key = %key, "entity removed");
        true
    }

    /// All entities grouped under `value` in the named index
    ///
    /// Returns a defensive copy; an absent bucket yields an empty `Vec`.
    /// Querying an undeclared index logs a warning and yields an empty `Vec`.
    pub fn find_by_index(&self, index: &str, value: &str) -> Vec<E> {
        let desc = match self.descriptor(index) {
            Some(desc) => desc,
            None => {
                warn!(index = %index, "query against undeclared index");
                return Vec::new();
            },
        };

        let inner = self.inner.read();
        let keys = inner.bucket_keys(desc.name, desc.kind, value);
        keys.iter()
            .filter_map(|k| inner.primary.get(k).cloned())
            .collect()
    }

    /// Entities whose attribute falls in `[lo, hi)` on an ordered index
    ///
    /// Results follow the index's native value ordering. Fails with
    /// [`StoreError::UnknownIndex`] or [`StoreError::IndexNotOrdered`].
    pub fn range_by_index(&self, index: &str, lo: &str, hi: &str) -> Result<Vec<E>, StoreError> {
        let desc = self
            .descriptor(index)
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?;
        if desc.kind != IndexKind::Ordered {
            return Err(StoreError::IndexNotOrdered(index.to_string()));
        }

        let inner = self.inner.read();
        let mut result = Vec::new();
        if let Some(buckets) = inner.ordered.get(desc.name) {
            for (_, bucket) in buckets.range(lo.to_string()..hi.to_string()) {
                for key in bucket {
                    if let Some(entity) = inner.primary.get(key) {
                        result.push(entity.clone());
                    }
                }
            }
        }
        Ok(result)
    }

    /// Multi-criteria search across indexes
    ///
    /// Filters with an empty value are ignored. The first applied filter
    /// seeds the candidate set; every subsequent filter intersects it
    /// (AND semantics). With no applied filters the result is empty.
    pub fn search(&self, filters: &[(&str, &str)]) -> Vec<E> {
        let inner = self.inner.read();
        let mut candidates: Option<HashSet<String>> = None;

        for (index, value) in filters {
            if value.is_empty() {
                continue;
            }
            let keys: HashSet<String> = match self.descriptor(index) {
                Some(desc) => inner
                    .bucket_keys(desc.name, desc.kind, value)
                    .into_iter()
                    .collect(),
                None => {
                    warn!(index = %index, "search filter against undeclared index");
                    HashSet::new()
                },
            };

            candidates = Some(match candidates {
                None => keys,
                Some(existing) => existing.intersection(&keys).cloned().collect(),
            });
        }

        candidates
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| inner.primary.get(k).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of all stored keys
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().primary.keys().cloned().collect()
    }

    /// Snapshot of all stored entities
    pub fn all(&self) -> Vec<E> {
        self.inner.read().primary.values().cloned().collect()
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.inner.read().primary.len()
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> bool {
        self.inner.read().primary.is_empty()
    }

    /// Drop every entity and index bucket
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.primary.clear();
        inner.hashed.clear();
        inner.ordered.clear();
        drop(inner);
        self.stats.invalidate();
    }

    /// Aggregate statistics, at most one stats TTL stale
    ///
    /// Unlike [`get`](Self::get) and [`find_by_index`](Self::find_by_index),
    /// which are strongly consistent, this value is memoized and may lag
    /// mutations by up to the configured TTL (mutations invalidate it, so
    /// staleness is only observable across concurrent callers).
    pub fn metrics(&self) -> StoreMetrics {
        self.stats.get_or_refresh(|| {
            let inner = self.inner.read();
            let mut index_buckets = HashMap::new();
            for desc in &self.descriptors {
                let buckets = match desc.kind {
                    IndexKind::Hashed => {
                        inner.hashed.get(desc.name).map(|b| b.len()).unwrap_or(0)
                    },
                    IndexKind::Ordered => {
                        inner.ordered.get(desc.name).map(|b| b.len()).unwrap_or(0)
                    },
                };
                index_buckets.insert(desc.name.to_string(), buckets);
            }
            StoreMetrics {
                total_entities: inner.primary.len(),
                index_buckets,
            }
        })
    }

    fn descriptor(&self, name: &str) -> Option<&IndexDescriptor<E>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Every (index, kind, value) membership this entity belongs to
    fn memberships_of(&self, entity: &E) -> Vec<(&'static str, IndexKind, String)> {
        self.descriptors
            .iter()
            .filter_map(|desc| (desc.extract)(entity).map(|value| (desc.name, desc.kind, value)))
            .collect()
    }
}

impl<E> std::fmt::Debug for IndexedStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedStore")
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{grade_store, student_store};
    use crate::types::{Grade, Student, StudentKind};

    fn ada() -> Student {
        Student::new("S1", "Ada Lovelace", "ada@example.edu", StudentKind::Honors)
    }

    fn bob() -> Student {
        Student::new("S2", "Bob Babbage", "bob@example.edu", StudentKind::Regular)
    }

    #[test]
    fn test_insert_and_get() {
        let store = student_store();
        store.insert(ada()).unwrap();

        assert_eq!(store.get("S1").unwrap().name, "Ada Lovelace");
        assert!(store.get("S9").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_key_leaves_state_unchanged() {
        let store = student_store();
        store.insert(ada()).unwrap();

        let mut dup = ada();
        dup.name = "Impostor".to_string();
        let err = store.insert(dup).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(k) if k == "S1"));

        // Original entity and its index memberships are intact
        assert_eq!(store.get("S1").unwrap().name, "Ada Lovelace");
        assert!(store.find_by_index("name", "impostor").is_empty());
        assert_eq!(store.find_by_index("name", "ada lovelace").len(), 1);
    }

    #[test]
    fn test_find_by_index_matches_primary() {
        let store = student_store();
        store.insert(ada()).unwrap();
        store.insert(bob()).unwrap();
        store
            .insert(Student::new(
                "S3",
                "Carol Hopper",
                "carol@example.edu",
                StudentKind::Honors,
            ))
            .unwrap();

        let honors = store.find_by_index("kind", "Honors");
        assert_eq!(honors.len(), 2);
        assert!(honors.iter().all(|s| s.kind == StudentKind::Honors));

        assert!(store.remove("S1"));
        assert_eq!(store.find_by_index("kind", "Honors").len(), 1);
    }

    #[test]
    fn test_update_moves_index_membership() {
        let store = student_store();
        store.insert(ada()).unwrap();

        let mut demoted = ada();
        demoted.kind = StudentKind::Regular;
        assert!(store.update("S1", demoted));

        assert!(store.find_by_index("kind", "Honors").is_empty());
        assert_eq!(store.find_by_index("kind", "Regular").len(), 1);
    }

    #[test]
    fn test_update_absent_key() {
        let store = student_store();
        assert!(!store.update("S1", ada()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_prunes_buckets() {
        let store = student_store();
        store.insert(ada()).unwrap();
        assert!(store.remove("S1"));
        assert!(!store.remove("S1"));

        assert!(store.find_by_index("kind", "Honors").is_empty());
        assert!(store.find_by_index("name", "ada lovelace").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_entity_without_attribute_skips_index() {
        let store = student_store();
        store
            .insert(Student::new("S1", "Ada", "no-at-sign", StudentKind::Regular))
            .unwrap();

        // Present in the primary map and other indexes, absent from the
        // email_domain index
        assert!(store.get("S1").is_some());
        assert_eq!(store.find_by_index("name", "ada").len(), 1);
        assert!(store.find_by_index("email_domain", "no-at-sign").is_empty());
    }

    #[test]
    fn test_range_by_index_ordered() {
        let store = grade_store();
        for (id, date) in [
            ("G1", "2026-01-10"),
            ("G2", "2026-02-20"),
            ("G3", "2026-03-05"),
        ] {
            store
                .insert(Grade::new(id, "S1", "Math", 90.0, date, "2026-Spring"))
                .unwrap();
        }

        let hits = store
            .range_by_index("date", "2026-01-01", "2026-03-01")
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].recorded_on, "2026-01-10");
        assert_eq!(hits[1].recorded_on, "2026-02-20");
    }

    #[test]
    fn test_range_by_index_rejects_hashed() {
        let store = grade_store();
        let err = store.range_by_index("subject", "A", "Z").unwrap_err();
        assert!(matches!(err, StoreError::IndexNotOrdered(_)));

        let err = store.range_by_index("nope", "A", "Z").unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex(_)));
    }

    #[test]
    fn test_search_first_filter_seeds_then_intersects() {
        let store = student_store();
        store.insert(ada()).unwrap();
        store.insert(bob()).unwrap();
        store
            .insert(Student::new(
                "S3",
                "Ada Lovelace",
                "ada2@other.org",
                StudentKind::Regular,
            ))
            .unwrap();

        // Same name, different domain: intersection narrows to one
        let hits = store.search(&[("name", "ada lovelace"), ("email_domain", "example.edu")]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "S1");

        // Empty filter values are skipped
        let hits = store.search(&[("name", ""), ("kind", "Regular")]);
        assert_eq!(hits.len(), 2);

        // No applied filters yields nothing
        assert!(store.search(&[]).is_empty());
        assert!(store.search(&[("name", "")]).is_empty());
    }

    #[test]
    fn test_metrics_counts() {
        let store = student_store();
        store.insert(ada()).unwrap();
        store.insert(bob()).unwrap();

        let metrics = store.metrics();
        assert_eq!(metrics.total_entities, 2);
        assert_eq!(metrics.index_buckets["kind"], 2);
        assert_eq!(metrics.index_buckets["name"], 2);

        // Mutations invalidate the memoized value
        store.remove("S1");
        assert_eq!(store.metrics().total_entities, 1);
    }

    #[test]
    fn test_clear() {
        let store = student_store();
        store.insert(ada()).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.find_by_index("kind", "Honors").is_empty());
        assert_eq!(store.metrics().total_entities, 0);
    }
}
