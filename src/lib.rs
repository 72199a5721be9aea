//! gradestore - in-memory indexed data store with caching and bounded auditing
//!
//! The concurrent core of an academic records system:
//! - Generic indexed entity stores over students and grades
//! - LRU cache with TTL expiration for recently viewed entities
//! - Capacity-bounded, multi-indexed audit trail
//!
//! All state is volatile and process-local; persistence, validation rules,
//! reporting and the user interface live in the consuming services.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod types;

/// Indexed entity stores (students, grades) with statistics memoization
pub mod store;

/// LRU/TTL caching for entities and computed values
pub mod cache;

/// Bounded, multi-indexed audit trail
pub mod audit;

/// Thread-safe sequence adapter
pub mod list;

// Re-export main types
pub use audit::{AuditEvent, AuditFilter, AuditStatistics, BoundedAuditLog};
pub use cache::LruCache;
pub use config::CoreConfig;
pub use error::{Error, Result};
pub use list::ConcurrentList;
pub use store::{grade_store, student_store, IndexDescriptor, IndexKind, IndexedStore};
pub use types::{Grade, Keyed, Student, StudentKind};
