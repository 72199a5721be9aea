//! Audit trail
//!
//! Every service records its operations here as fire-and-forget
//! [`AuditEvent`]s; the store components never read the log themselves.
//! [`BoundedAuditLog`] keeps memory bounded by evicting its oldest 10% when
//! full.

pub mod event;
pub mod log;

pub use event::AuditEvent;
pub use log::{AuditFilter, AuditStatistics, BoundedAuditLog, DEFAULT_AUDIT_CAPACITY};
