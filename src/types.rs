//! Core entity types stored and indexed by the repositories
//!
//! The store itself is generic over any [`Keyed`] entity; the types below are
//! the two concrete entities the academic records system keeps:
//!
//! - **`Student`**: identity, contact email and enrollment kind
//! - **`Grade`**: a single recorded score, tied to a student and subject
//!
//! Entities are opaque to the store beyond their key and the index attributes
//! registered for them (see [`crate::store`]). Dates are carried as ISO-8601
//! strings so lexicographic index order matches chronological order.
//!
//! # Example
//!
//! ```rust
//! use gradestore::types::{Student, StudentKind};
//!
//! let s = Student::new("S001", "Ada Lovelace", "ada@example.edu", StudentKind::Honors);
//! assert_eq!(s.email_domain(), Some("example.edu".to_string()));
//! ```

use serde::{Deserialize, Serialize};

/// An entity with a stable, immutable, unique string key
///
/// The key identifies the entity inside a store for its whole lifetime;
/// updating an entity replaces it under the same key.
pub trait Keyed {
    /// The entity's unique key
    fn key(&self) -> &str;
}

/// Enrollment kind of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentKind {
    /// Standard enrollment
    Regular,
    /// Honors program enrollment
    Honors,
}

impl StudentKind {
    /// Display label, also used as the `kind` index attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentKind::Regular => "Regular",
            StudentKind::Honors => "Honors",
        }
    }
}

impl std::fmt::Display for StudentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique student identifier
    pub id: String,

    /// Full name
    pub name: String,

    /// Contact email address
    pub email: String,

    /// Enrollment kind
    pub kind: StudentKind,

    /// Whether the student is currently enrolled
    pub active: bool,
}

impl Student {
    /// Create an active student
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        kind: StudentKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            kind,
            active: true,
        }
    }

    /// Lowercased domain part of the email, if the address has one
    pub fn email_domain(&self) -> Option<String> {
        self.email
            .split_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .filter(|d| !d.is_empty())
    }
}

impl Keyed for Student {
    fn key(&self) -> &str {
        &self.id
    }
}

/// A single recorded grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Unique grade identifier
    pub id: String,

    /// Key of the student this grade belongs to
    pub student_id: String,

    /// Subject name
    pub subject: String,

    /// Numeric score
    pub score: f64,

    /// Date recorded, ISO-8601 (`YYYY-MM-DD`)
    pub recorded_on: String,

    /// Semester label, e.g. "2026-Fall"; empty when not assigned
    pub semester: String,
}

impl Grade {
    /// Create a grade record
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        subject: impl Into<String>,
        score: f64,
        recorded_on: impl Into<String>,
        semester: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            subject: subject.into(),
            score,
            recorded_on: recorded_on.into(),
            semester: semester.into(),
        }
    }
}

impl Keyed for Grade {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_domain_extraction() {
        let s = Student::new("S1", "Ada", "Ada@Example.EDU", StudentKind::Honors);
        assert_eq!(s.email_domain(), Some("example.edu".to_string()));
    }

    #[test]
    fn test_email_domain_missing() {
        let s = Student::new("S1", "Ada", "not-an-email", StudentKind::Regular);
        assert_eq!(s.email_domain(), None);

        let s = Student::new("S2", "Bob", "trailing@", StudentKind::Regular);
        assert_eq!(s.email_domain(), None);
    }

    #[test]
    fn test_keyed_impls() {
        let s = Student::new("S1", "Ada", "ada@example.edu", StudentKind::Honors);
        assert_eq!(s.key(), "S1");

        let g = Grade::new("G1", "S1", "Math", 92.5, "2026-03-01", "2026-Spring");
        assert_eq!(g.key(), "G1");
    }

    #[test]
    fn test_student_serde_round_trip() {
        let s = Student::new("S1", "Ada", "ada@example.edu", StudentKind::Honors);
        let json = serde_json::to_string(&s).unwrap();
        let back: Student = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
