//! Index descriptors for [`IndexedStore`](super::IndexedStore)
//!
//! Each secondary index is declared once at store construction as a
//! `(name, kind, extractor)` triple. Index maintenance is data-driven: the
//! store iterates the descriptors on every mutation instead of carrying
//! hand-written per-field bookkeeping.

/// How an index orders its buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Hash buckets, point lookups only
    Hashed,
    /// BTree buckets in lexicographic value order, supports range queries
    Ordered,
}

/// Declaration of one secondary index over entities of type `E`
///
/// The extractor derives the index attribute from an entity. Returning `None`
/// leaves the entity out of this index entirely (e.g. a student with no
/// parseable email domain, or a grade without a semester).
pub struct IndexDescriptor<E> {
    /// Index name, used in queries
    pub name: &'static str,

    /// Hashed or ordered
    pub kind: IndexKind,

    /// Attribute extractor
    pub extract: fn(&E) -> Option<String>,
}

impl<E> IndexDescriptor<E> {
    /// Declare a hashed index
    pub fn hashed(name: &'static str, extract: fn(&E) -> Option<String>) -> Self {
        Self {
            name,
            kind: IndexKind::Hashed,
            extract,
        }
    }

    /// Declare an ordered index
    pub fn ordered(name: &'static str, extract: fn(&E) -> Option<String>) -> Self {
        Self {
            name,
            kind: IndexKind::Ordered,
            extract,
        }
    }
}

impl<E> std::fmt::Debug for IndexDescriptor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Student, StudentKind};

    #[test]
    fn test_extractor_optional_attribute() {
        let desc = IndexDescriptor::hashed("email_domain", |s: &Student| s.email_domain());

        let with = Student::new("S1", "Ada", "ada@example.edu", StudentKind::Regular);
        let without = Student::new("S2", "Bob", "no-domain", StudentKind::Regular);

        assert_eq!((desc.extract)(&with), Some("example.edu".to_string()));
        assert_eq!((desc.extract)(&without), None);
    }
}
