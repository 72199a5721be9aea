//! Audit event shape and validation

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// One recorded system operation
///
/// Events are immutable once appended to the log. The id, timestamp (epoch
/// milliseconds) and sequence number are assigned by the log at append time,
/// so appending an event value twice records two distinct occurrences; the
/// sequence is monotonic per process so ordering stays total even when two
/// events share a millisecond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier, assigned at append
    pub id: String,

    /// Operation name, e.g. "ADD_STUDENT" (required)
    pub operation: String,

    /// Identifier of the user who performed the operation (required)
    pub actor: String,

    /// Type of the entity acted on, e.g. "Student" (required)
    pub entity_type: String,

    /// Key of the entity acted on
    pub entity_id: String,

    /// Free-text detail
    pub detail: String,

    /// Whether the operation succeeded
    pub success: bool,

    /// Epoch milliseconds, assigned at append
    pub timestamp: i64,

    /// Process-monotonic sequence number, assigned at append
    pub sequence: u64,
}

impl AuditEvent {
    /// Create an event ready for [`append`](crate::audit::BoundedAuditLog::append)
    ///
    /// Id, timestamp and sequence stay unset until the log stamps them.
    pub fn new(
        operation: impl Into<String>,
        actor: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        detail: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            id: String::new(),
            operation: operation.into(),
            actor: actor.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            detail: detail.into(),
            success,
            timestamp: 0,
            sequence: 0,
        }
    }

    /// Check the required fields are present
    pub(crate) fn validate(&self) -> Result<(), AuditError> {
        if self.operation.trim().is_empty() {
            return Err(AuditError::InvalidEvent("operation"));
        }
        if self.actor.trim().is_empty() {
            return Err(AuditError::InvalidEvent("actor"));
        }
        if self.entity_type.trim().is_empty() {
            return Err(AuditError::InvalidEvent("entity_type"));
        }
        Ok(())
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {} {} (actor: {}) - {} {}",
            self.timestamp,
            self.operation,
            self.entity_type,
            self.entity_id,
            self.actor,
            self.detail,
            if self.success { "ok" } else { "failed" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_event() {
        let event = AuditEvent::new("ADD_STUDENT", "admin", "Student", "S1", "created", true);
        assert!(event.validate().is_ok());
        // Identity fields are left for the log to stamp
        assert!(event.id.is_empty());
        assert_eq!(event.timestamp, 0);
        assert_eq!(event.sequence, 0);
    }

    #[test]
    fn test_missing_required_fields() {
        let event = AuditEvent::new("", "admin", "Student", "S1", "", true);
        assert!(matches!(
            event.validate(),
            Err(AuditError::InvalidEvent("operation"))
        ));

        let event = AuditEvent::new("ADD", "  ", "Student", "S1", "", true);
        assert!(matches!(
            event.validate(),
            Err(AuditError::InvalidEvent("actor"))
        ));

        let event = AuditEvent::new("ADD", "admin", "", "S1", "", true);
        assert!(matches!(
            event.validate(),
            Err(AuditError::InvalidEvent("entity_type"))
        ));
    }

    #[test]
    fn test_optional_fields_allowed_empty() {
        let event = AuditEvent::new("CLEAR", "admin", "Student", "", "", false);
        assert!(event.validate().is_ok());
    }
}
