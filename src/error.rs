//! Error types for the store, cache and audit subsystems

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Audit error
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error (configuration file loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by [`IndexedStore`](crate::store::IndexedStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// An entity with this key is already stored
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// No index with this name was declared at construction
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    /// Range queries require an ordered index
    #[error("Index is not ordered: {0}")]
    IndexNotOrdered(String),
}

/// Errors raised by [`LruCache`](crate::cache::LruCache)
#[derive(Error, Debug)]
pub enum CacheError {
    /// Capacity must be at least one entry
    #[error("Cache capacity must be positive")]
    InvalidCapacity,

    /// TTL must be a non-zero duration
    #[error("Cache TTL must be positive")]
    InvalidTtl,
}

/// Errors raised by [`BoundedAuditLog`](crate::audit::BoundedAuditLog)
#[derive(Error, Debug)]
pub enum AuditError {
    /// A required event field is missing or empty
    #[error("Invalid event: missing required field `{0}`")]
    InvalidEvent(&'static str),

    /// Capacity must be at least one event
    #[error("Audit capacity must be positive")]
    InvalidCapacity,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
