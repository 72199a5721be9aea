//! Thread-safe sequence adapter
//!
//! [`ConcurrentList`] wraps a `Vec` behind a read/write lock and is the
//! building block used wherever the rest of the system needs an ordered,
//! lockable collection (assembling latest-N report rows, batch staging).
//! Readers never observe a torn write: element reads hand out copies, and
//! whole-collection operations (sort, bulk extend) hold the write lock for
//! their full duration, so they are atomic with respect to single-element
//! operations.

use parking_lot::RwLock;

/// Read/write-locked dynamic array
///
/// Index-based accessors return `Option` instead of panicking so concurrent
/// shrinkage between a length check and an access stays benign.
pub struct ConcurrentList<T> {
    inner: RwLock<Vec<T>>,
}

impl<T: Clone> ConcurrentList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty list with reserved capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Append an element
    pub fn push(&self, element: T) {
        self.inner.write().push(element);
    }

    /// Insert at `index`; returns `false` when the index is out of bounds
    pub fn insert(&self, index: usize, element: T) -> bool {
        let mut inner = self.inner.write();
        if index > inner.len() {
            return false;
        }
        inner.insert(index, element);
        true
    }

    /// Copy of the element at `index`
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.read().get(index).cloned()
    }

    /// Replace the element at `index`, returning the previous value
    pub fn set(&self, index: usize, element: T) -> Option<T> {
        let mut inner = self.inner.write();
        let slot = inner.get_mut(index)?;
        Some(std::mem::replace(slot, element))
    }

    /// Remove and return the element at `index`
    pub fn remove(&self, index: usize) -> Option<T> {
        let mut inner = self.inner.write();
        if index >= inner.len() {
            return None;
        }
        Some(inner.remove(index))
    }

    /// Append every element from `iter` under a single lock acquisition
    pub fn extend(&self, iter: impl IntoIterator<Item = T>) {
        self.inner.write().extend(iter);
    }

    /// Sort in place; atomic with respect to element operations
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> std::cmp::Ordering) {
        self.inner.write().sort_by(compare);
    }

    /// Keep only elements matching the predicate
    pub fn retain(&self, predicate: impl FnMut(&T) -> bool) {
        self.inner.write().retain(predicate);
    }

    /// Copies of the elements matching the predicate
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.inner
            .read()
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Apply `f` to every element, collecting the results
    pub fn map<R>(&self, f: impl FnMut(&T) -> R) -> Vec<R> {
        self.inner.read().iter().map(f).collect()
    }

    /// Copy of the whole sequence (copy-then-iterate for callers)
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.read().clone()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Remove every element
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl<T: Clone + PartialEq> ConcurrentList<T> {
    /// Whether any element equals `element`
    pub fn contains(&self, element: &T) -> bool {
        self.inner.read().contains(element)
    }
}

impl<T: Clone> Default for ConcurrentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for ConcurrentList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.read().iter()).finish()
    }
}
