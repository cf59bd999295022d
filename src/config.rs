//! Configuration sources and store connection parameters.
//!
//! The cache reads its connection parameters from a [`ConfigSource`]: an
//! abstraction over "wherever the host keeps its options". A host with a
//! live configuration service implements the trait against that service;
//! a host with a plain options map uses [`StaticOptions`]. The source is
//! resolved once, at [`CacheConfig::from_source`] time.
//!
//! # Consumed keys
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `redis.host` | `"salt"` | store hostname |
//! | `redis.port` | `6379` | store port |
//! | `redis.db` | `0` | logical database index |
//! | `master_id` | unset | relay/master identity added to each load's syndic set |
//!
//! Absent keys fall back to the defaults; values may arrive as JSON
//! numbers or strings (live config services are loosely typed).

use std::collections::HashMap;

use serde_json::Value;

/// Default store hostname.
pub const DEFAULT_HOST: &str = "salt";

/// Default store port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default logical database index.
pub const DEFAULT_DB: i64 = 0;

/// A source of configuration options, keyed by dotted option names.
///
/// Implementations must be `Send + Sync`. Returning `None` for a key is
/// normal; the consumer applies its default.
pub trait ConfigSource: Send + Sync {
    /// Looks up a single option by name.
    fn option(&self, key: &str) -> Option<Value>;
}

/// A [`ConfigSource`] backed by a static options map.
///
/// # Examples
///
/// ```
/// use jobcache::{CacheConfig, ConfigSource, StaticOptions};
/// use serde_json::json;
///
/// let options = StaticOptions::new([
///     ("redis.host".to_string(), json!("cache-1.internal")),
///     ("redis.port".to_string(), json!(6380)),
/// ]);
/// assert_eq!(options.option("redis.port"), Some(json!(6380)));
///
/// let config = CacheConfig::from_source(&options);
/// assert_eq!(config.host, "cache-1.internal");
/// assert_eq!(config.port, 6380);
/// assert_eq!(config.db, 0); // default
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticOptions {
    options: HashMap<String, Value>,
}

impl StaticOptions {
    /// Creates a static options source from key-value pairs.
    pub fn new(options: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }
}

impl ConfigSource for StaticOptions {
    fn option(&self, key: &str) -> Option<Value> {
        self.options.get(key).cloned()
    }
}

/// Connection parameters for the job result cache's store.
///
/// # Examples
///
/// ```
/// use jobcache::CacheConfig;
///
/// let config = CacheConfig::default();
/// assert_eq!(config.host, "salt");
/// assert_eq!(config.port, 6379);
/// assert_eq!(config.db, 0);
/// assert!(config.master_id.is_none());
/// assert_eq!(config.redis_url(), "redis://salt:6379/0");
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Store hostname.
    pub host: String,

    /// Store port.
    pub port: u16,

    /// Logical database index.
    pub db: i64,

    /// Relay/master identity. When set, [`save_load`] adds it to the
    /// load's syndic set on every save, so multi-hop relay topologies
    /// accumulate the full chain of relays that touched a job.
    ///
    /// [`save_load`]: crate::cache::JobResultCache::save_load
    pub master_id: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db: DEFAULT_DB,
            master_id: None,
        }
    }
}

impl CacheConfig {
    /// Resolves a configuration from a [`ConfigSource`], applying defaults
    /// for absent keys.
    ///
    /// Numeric options tolerate both JSON numbers and numeric strings;
    /// unparseable values fall back to the default rather than erroring,
    /// matching the pass-through behavior of unset values.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let defaults = Self::default();
        Self {
            host: source
                .option("redis.host")
                .and_then(|v| as_string(&v))
                .unwrap_or(defaults.host),
            port: source
                .option("redis.port")
                .and_then(|v| as_int(&v))
                .and_then(|n| u16::try_from(n).ok())
                .unwrap_or(defaults.port),
            db: source
                .option("redis.db")
                .and_then(|v| as_int(&v))
                .unwrap_or(defaults.db),
            master_id: source.option("master_id").and_then(|v| as_string(&v)),
        }
    }

    /// Sets the store hostname (builder pattern).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the store port (builder pattern).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the logical database index (builder pattern).
    pub fn with_db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// Sets the relay/master identity (builder pattern).
    pub fn with_master_id(mut self, master_id: impl Into<String>) -> Self {
        self.master_id = Some(master_id.into());
        self
    }

    /// Builds the connection URL `redis://{host}:{port}/{db}`.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.host, "salt");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert!(config.master_id.is_none());
    }

    #[test]
    fn from_source_empty_uses_defaults() {
        let config = CacheConfig::from_source(&StaticOptions::default());
        assert_eq!(config.redis_url(), "redis://salt:6379/0");
    }

    #[test]
    fn from_source_reads_all_keys() {
        let options = StaticOptions::new([
            ("redis.host".to_string(), json!("cache-1")),
            ("redis.port".to_string(), json!(6380)),
            ("redis.db".to_string(), json!(3)),
            ("master_id".to_string(), json!("syndic-east")),
        ]);
        let config = CacheConfig::from_source(&options);
        assert_eq!(config.host, "cache-1");
        assert_eq!(config.port, 6380);
        assert_eq!(config.db, 3);
        assert_eq!(config.master_id.as_deref(), Some("syndic-east"));
        assert_eq!(config.redis_url(), "redis://cache-1:6380/3");
    }

    #[test]
    fn from_source_tolerates_stringly_numbers() {
        let options = StaticOptions::new([
            ("redis.port".to_string(), json!("6380")),
            ("redis.db".to_string(), json!("2")),
        ]);
        let config = CacheConfig::from_source(&options);
        assert_eq!(config.port, 6380);
        assert_eq!(config.db, 2);
    }

    #[test]
    fn from_source_falls_back_on_garbage() {
        let options = StaticOptions::new([
            ("redis.port".to_string(), json!("not-a-port")),
            ("redis.db".to_string(), json!([1, 2])),
        ]);
        let config = CacheConfig::from_source(&options);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.db, DEFAULT_DB);
    }

    #[test]
    fn builder_methods() {
        let config = CacheConfig::default()
            .with_host("cache-2")
            .with_port(7000)
            .with_db(1)
            .with_master_id("relay-1");
        assert_eq!(config.redis_url(), "redis://cache-2:7000/1");
        assert_eq!(config.master_id.as_deref(), Some("relay-1"));
    }
}
