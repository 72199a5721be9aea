//! Configuration with TOML support and per-field defaults

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Top-level configuration for the core components
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoreConfig {
    /// Indexed store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Entity cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Audit log settings
    #[serde(default)]
    pub audit: AuditSettings,
}

/// Settings for [`IndexedStore`](crate::store::IndexedStore) instances
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    /// Freshness window for memoized aggregate metrics, in milliseconds
    #[serde(default = "default_stats_ttl_ms")]
    pub stats_ttl_ms: u64,
}

/// Settings for the entity [`LruCache`](crate::cache::LruCache)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Maximum cached entries
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time-to-live, in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
}

/// Settings for the [`BoundedAuditLog`](crate::audit::BoundedAuditLog)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditSettings {
    /// Maximum retained events
    #[serde(default = "default_audit_capacity")]
    pub capacity: usize,
}

// Default value functions
fn default_stats_ttl_ms() -> u64 {
    30_000
}
fn default_cache_capacity() -> usize {
    100
}
fn default_cache_ttl_ms() -> u64 {
    60_000
}
fn default_audit_capacity() -> usize {
    10_000
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            stats_ttl_ms: default_stats_ttl_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_ms: default_cache_ttl_ms(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            capacity: default_audit_capacity(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            audit: AuditSettings::default(),
        }
    }
}

impl CoreConfig {
    /// Parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse TOML configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero capacities and TTLs
    ///
    /// Enforces the same bounds the components enforce at construction, so a
    /// bad file fails at load time rather than at first use.
    pub fn validate(&self) -> Result<()> {
        if self.store.stats_ttl_ms == 0 {
            return Err(Error::Configuration(
                "store.stats_ttl_ms must be positive".to_string(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(Error::Configuration(
                "cache.capacity must be positive".to_string(),
            ));
        }
        if self.cache.ttl_ms == 0 {
            return Err(Error::Configuration(
                "cache.ttl_ms must be positive".to_string(),
            ));
        }
        if self.audit.capacity == 0 {
            return Err(Error::Configuration(
                "audit.capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Stats TTL as a [`Duration`]
    pub fn stats_ttl(&self) -> Duration {
        Duration::from_millis(self.store.stats_ttl_ms)
    }

    /// Cache TTL as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.ttl_ms)
    }
}
