//! Indexed entity stores
//!
//! The store layer is one generic component, [`IndexedStore`], instantiated
//! twice: once for students and once for grades. Each instantiation differs
//! only in its [`IndexDescriptor`] list, so index bookkeeping lives in a
//! single place instead of being duplicated per entity type.

pub mod descriptor;
pub mod indexed;
pub mod stats;

pub use descriptor::{IndexDescriptor, IndexKind};
pub use indexed::{IndexedStore, StoreMetrics, DEFAULT_STATS_TTL};
pub use stats::StatsGuard;

use crate::types::{Grade, Student};

/// Store over [`Student`] entities
///
/// Indexes: `name` (lowercased full name), `email_domain` (lowercased text
/// after `@`, skipped for malformed addresses) and `kind`
/// ("Regular"/"Honors").
pub fn student_store() -> IndexedStore<Student> {
    IndexedStore::new(vec![
        IndexDescriptor::hashed("name", |s: &Student| Some(s.name.to_lowercase())),
        IndexDescriptor::hashed("email_domain", |s: &Student| s.email_domain()),
        IndexDescriptor::hashed("kind", |s: &Student| Some(s.kind.as_str().to_string())),
    ])
}

/// Store over [`Grade`] entities
///
/// Indexes: `student`, `subject`, `semester` (skipped when empty) and the
/// ordered `date` index (ISO-8601 strings, so lexicographic order is
/// chronological order).
pub fn grade_store() -> IndexedStore<Grade> {
    IndexedStore::new(vec![
        IndexDescriptor::hashed("student", |g: &Grade| Some(g.student_id.clone())),
        IndexDescriptor::hashed("subject", |g: &Grade| Some(g.subject.clone())),
        IndexDescriptor::hashed("semester", |g: &Grade| {
            if g.semester.is_empty() {
                None
            } else {
                Some(g.semester.clone())
            }
        }),
        IndexDescriptor::ordered("date", |g: &Grade| Some(g.recorded_on.clone())),
    ])
}
