//! Capacity-bounded, multi-indexed audit log
//!
//! Events are kept in a primary map plus four indexes: time, operation,
//! actor and entity type. Once the log is full, the next append first evicts
//! the oldest ⌈capacity/10⌉ events from the primary map and every index,
//! then proceeds. Eviction is synchronous and invisible to callers except
//! through reduced query results.
//!
//! All five structures are guarded by one `RwLock` so an event is never
//! observable in some indexes but not others.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::event::AuditEvent;
use crate::error::AuditError;

/// Default maximum number of retained events
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Optional narrowing predicates for [`BoundedAuditLog::search`]
///
/// Every set field is an AND predicate; unset fields are ignored. There are
/// no OR semantics.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Exact operation name
    pub operation: Option<String>,
    /// Exact actor identifier
    pub actor: Option<String>,
    /// Exact entity type
    pub entity_type: Option<String>,
    /// Exact entity key
    pub entity_id: Option<String>,
    /// Success flag
    pub success: Option<bool>,
    /// Inclusive lower timestamp bound (epoch millis)
    pub from: Option<i64>,
    /// Inclusive upper timestamp bound (epoch millis)
    pub to: Option<i64>,
}

impl AuditFilter {
    /// Filter by operation name
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Filter by actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Filter by entity type
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Filter by entity key
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Filter by success flag
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Filter by inclusive time range
    pub fn with_time_range(mut self, from: i64, to: i64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(op) = &self.operation {
            if event.operation != *op {
                return false;
            }
        }
        if let Some(actor) = &self.actor {
            if event.actor != *actor {
                return false;
            }
        }
        if let Some(et) = &self.entity_type {
            if event.entity_type != *et {
                return false;
            }
        }
        if let Some(eid) = &self.entity_id {
            if event.entity_id != *eid {
                return false;
            }
        }
        if let Some(success) = self.success {
            if event.success != success {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Aggregate view over the live events, computed per call
#[derive(Debug, Clone, Serialize)]
pub struct AuditStatistics {
    /// Live event count
    pub total: u64,
    /// Live events with `success == true`
    pub success_count: u64,
    /// Live events with `success == false`
    pub failure_count: u64,
    /// success_count / total as a fraction, 0.0 when empty
    pub success_rate: f64,
    /// Live events per operation name
    pub operation_distribution: HashMap<String, usize>,
    /// Live events per actor
    pub actor_activity: HashMap<String, usize>,
    /// Live events per entity type
    pub entity_type_distribution: HashMap<String, usize>,
    /// Timestamp of the oldest live event
    pub oldest: Option<i64>,
    /// Timestamp of the newest live event
    pub newest: Option<i64>,
}

/// Primary map, four indexes and counters, mutated as one unit
struct LogInner {
    capacity: usize,
    by_id: HashMap<String, AuditEvent>,
    /// (timestamp, sequence) -> event id; total order over all live events
    by_time: BTreeMap<(i64, u64), String>,
    by_operation: HashMap<String, HashSet<String>>,
    by_actor: HashMap<String, HashSet<String>>,
    by_entity_type: HashMap<String, HashSet<String>>,
    success_count: u64,
    failure_count: u64,
}

impl LogInner {
    /// Evict the oldest `count` events from the primary map and all indexes
    fn evict_oldest(&mut self, count: usize) {
        let victims: Vec<(i64, u64)> = self.by_time.keys().take(count).copied().collect();
        for time_key in &victims {
            if let Some(id) = self.by_time.remove(time_key) {
                if let Some(event) = self.by_id.remove(&id) {
                    Self::unindex(&mut self.by_operation, &event.operation, &id);
                    Self::unindex(&mut self.by_actor, &event.actor, &id);
                    Self::unindex(&mut self.by_entity_type, &event.entity_type, &id);
                    if event.success {
                        self.success_count -= 1;
                    } else {
                        self.failure_count -= 1;
                    }
                }
            }
        }
        debug!(evicted = victims.len(), "audit log evicted oldest events");
    }

    fn unindex(index: &mut HashMap<String, HashSet<String>>, bucket: &str, id: &str) {
        if let Some(ids) = index.get_mut(bucket) {
            ids.remove(id);
            if ids.is_empty() {
                index.remove(bucket);
            }
        }
    }

    /// Resolve an id bucket to events, newest first
    fn resolve_newest_first(&self, ids: Option<&HashSet<String>>) -> Vec<AuditEvent> {
        let mut events: Vec<AuditEvent> = ids
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        events.sort_by(|a, b| (b.timestamp, b.sequence).cmp(&(a.timestamp, a.sequence)));
        events
    }
}

/// Bounded, multi-indexed, append-mostly event log
///
/// Thread-safe without external synchronization. `append` is the only
/// operation with a non-constant maintenance cost (the 10% eviction batch),
/// which completes synchronously before `append` returns.
pub struct BoundedAuditLog {
    inner: RwLock<LogInner>,
    sequence: AtomicU64,
}

impl BoundedAuditLog {
    /// Create a log with the default capacity
    pub fn new() -> Self {
        Self::build(DEFAULT_AUDIT_CAPACITY)
    }

    /// Create a log bounded at `capacity` events
    pub fn with_capacity(capacity: usize) -> Result<Self, AuditError> {
        if capacity == 0 {
            return Err(AuditError::InvalidCapacity);
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(LogInner {
                capacity,
                by_id: HashMap::new(),
                by_time: BTreeMap::new(),
                by_operation: HashMap::new(),
                by_actor: HashMap::new(),
                by_entity_type: HashMap::new(),
                success_count: 0,
                failure_count: 0,
            }),
            sequence: AtomicU64::new(0),
        }
    }

    /// Record an event
    ///
    /// Validates the required fields first ([`AuditError::InvalidEvent`]
    /// leaves the log untouched), stamps id, timestamp and sequence, evicts
    /// the oldest ⌈capacity/10⌉ events when full, then inserts and indexes.
    /// The log owns the identity fields, so appending the same event value
    /// twice records two distinct occurrences.
    pub fn append(&self, mut event: AuditEvent) -> Result<(), AuditError> {
        event.validate()?;

        event.id = uuid::Uuid::new_v4().to_string();
        event.timestamp = chrono::Utc::now().timestamp_millis();
        event.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.write();
        if inner.by_id.len() >= inner.capacity {
            let batch = inner.capacity.div_ceil(10);
            inner.evict_oldest(batch);
        }

        let id = event.id.clone();
        inner.by_time.insert((event.timestamp, event.sequence), id.clone());
        inner
            .by_operation
            .entry(event.operation.clone())
            .or_default()
            .insert(id.clone());
        inner
            .by_actor
            .entry(event.actor.clone())
            .or_default()
            .insert(id.clone());
        inner
            .by_entity_type
            .entry(event.entity_type.clone())
            .or_default()
            .insert(id.clone());
        if event.success {
            inner.success_count += 1;
        } else {
            inner.failure_count += 1;
        }
        inner.by_id.insert(id, event);
        Ok(())
    }

    /// The `n` most recent events, newest first
    pub fn latest(&self, n: usize) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner
            .by_time
            .values()
            .rev()
            .take(n)
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    /// Events with this operation name, newest first
    pub fn by_operation(&self, operation: &str) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner.resolve_newest_first(inner.by_operation.get(operation))
    }

    /// Events recorded by this actor, newest first
    pub fn by_actor(&self, actor: &str) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner.resolve_newest_first(inner.by_actor.get(actor))
    }

    /// Events touching this entity type, newest first
    pub fn by_entity_type(&self, entity_type: &str) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner.resolve_newest_first(inner.by_entity_type.get(entity_type))
    }

    /// Events with `from <= timestamp <= to`, oldest first
    pub fn by_time_range(&self, from: i64, to: i64) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner
            .by_time
            .range((from, u64::MIN)..=(to, u64::MAX))
            .filter_map(|(_, id)| inner.by_id.get(id).cloned())
            .collect()
    }

    /// Multi-criteria search; every set filter field narrows the result
    ///
    /// Results are ordered oldest first.
    pub fn search(&self, filter: &AuditFilter) -> Vec<AuditEvent> {
        let inner = self.inner.read();
        inner
            .by_time
            .values()
            .filter_map(|id| inner.by_id.get(id))
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    /// Aggregate statistics computed from the live index state
    pub fn statistics(&self) -> AuditStatistics {
        let inner = self.inner.read();
        let total = inner.by_id.len() as u64;

        let distribution = |index: &HashMap<String, HashSet<String>>| {
            index
                .iter()
                .map(|(k, ids)| (k.clone(), ids.len()))
                .collect::<HashMap<String, usize>>()
        };

        AuditStatistics {
            total,
            success_count: inner.success_count,
            failure_count: inner.failure_count,
            success_rate: if total == 0 {
                0.0
            } else {
                inner.success_count as f64 / total as f64
            },
            operation_distribution: distribution(&inner.by_operation),
            actor_activity: distribution(&inner.by_actor),
            entity_type_distribution: distribution(&inner.by_entity_type),
            oldest: inner.by_time.keys().next().map(|(ts, _)| *ts),
            newest: inner.by_time.keys().next_back().map(|(ts, _)| *ts),
        }
    }

    /// Change the capacity, evicting oldest batches until within bound
    pub fn set_capacity(&self, capacity: usize) -> Result<(), AuditError> {
        if capacity == 0 {
            return Err(AuditError::InvalidCapacity);
        }
        let mut inner = self.inner.write();
        inner.capacity = capacity;
        if inner.by_id.len() > capacity {
            let over = inner.by_id.len() - capacity;
            inner.evict_oldest(over);
        }
        Ok(())
    }

    /// Drop every event and reset the counters
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.by_id.clear();
        inner.by_time.clear();
        inner.by_operation.clear();
        inner.by_actor.clear();
        inner.by_entity_type.clear();
        inner.success_count = 0;
        inner.failure_count = 0;
    }

    /// Number of live events
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Whether the log holds no events
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }

    /// Current capacity bound
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity
    }
}

impl Default for BoundedAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoundedAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("BoundedAuditLog")
            .field("len", &inner.by_id.len())
            .field("capacity", &inner.capacity)
            .finish()
    }
}
