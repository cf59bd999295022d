//! Redis storage backend.
//!
//! [`RedisBackend`] implements [`StorageBackend`] over a Redis server. The
//! 6 trait primitives map one-to-one onto Redis commands:
//!
//! | Primitive | Command |
//! |-----------|---------|
//! | `get` | `GET` |
//! | `set` | `SET` |
//! | `set_add` | `SADD` |
//! | `set_members` | `SMEMBERS` |
//! | `list_push_front` | `LPUSH` |
//! | `list_index` | `LINDEX` |
//!
//! No pooling, retry, or health-check logic lives here: a fresh backend
//! may be constructed per call, and the multiplexed connection owns any
//! underlying reuse. A hung connection blocks the awaiting caller for as
//! long as the client library's own defaults allow.
//!
//! # Usage
//!
//! ```rust,no_run
//! use jobcache::store::redis::RedisBackend;
//! use jobcache::{CacheConfig, JobResultCache};
//!
//! # async fn example() {
//! let config = CacheConfig::default().with_host("127.0.0.1");
//! let backend = RedisBackend::from_config(&config).await.unwrap();
//! let cache = JobResultCache::new(backend);
//! # }
//! ```

use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;

use crate::config::CacheConfig;
use crate::store::backend::{StorageBackend, StorageError};

/// Redis storage backend for job result persistence.
///
/// # Connection Model
///
/// `RedisBackend` holds a [`MultiplexedConnection`], which is designed to
/// be cloned cheaply -- all clones share the same underlying TCP
/// connection. Each method clones the connection for concurrent safety.
///
/// # Key Prefix
///
/// By default keys are written verbatim, exactly matching the documented
/// keyspace (`minions`, `jids`, `{minion_id}:{jid}`, ...). A prefix can be
/// set with [`with_prefix`](RedisBackend::with_prefix) for test isolation;
/// prefixed keys take the form `{prefix}:{key}`.
#[derive(Debug, Clone)]
pub struct RedisBackend {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisBackend {
    /// Creates a backend by connecting to Redis at the given URL.
    ///
    /// The URL format is `redis://[:<password>@]<host>:<port>[/<db>]`.
    /// Fails fast if the connection cannot be established.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the Redis client cannot be
    /// created or the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        let client = ::redis::Client::open(url).map_err(|e| StorageError::Backend {
            message: format!("failed to create Redis client: {e}"),
            source: Some(Box::new(e)),
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Backend {
                message: format!("failed to connect to Redis: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            conn,
            key_prefix: String::new(),
        })
    }

    /// Creates a backend from resolved configuration, connecting to
    /// `redis://{host}:{port}/{db}`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the connection cannot be
    /// established.
    pub async fn from_config(config: &CacheConfig) -> Result<Self, StorageError> {
        Self::new(&config.redis_url()).await
    }

    /// Creates a backend with a pre-built multiplexed connection.
    ///
    /// Useful when the caller manages connection lifecycle or needs custom
    /// connection configuration.
    pub fn with_connection(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: String::new(),
        }
    }

    /// Sets a key prefix (builder pattern).
    ///
    /// Useful for test isolation: each test run can use a unique prefix
    /// so runs do not collide on the shared keyspace.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn full_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

/// Maps a Redis error to a [`StorageError`], surfacing `WRONGTYPE`
/// responses as [`StorageError::WrongType`].
fn map_redis_error(err: ::redis::RedisError, key: &str) -> StorageError {
    if err.code() == Some("WRONGTYPE") {
        return StorageError::WrongType {
            key: key.to_string(),
        };
    }
    StorageError::Backend {
        message: format!("Redis error for key {key}: {err}"),
        source: Some(Box::new(err)),
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(&k).await.map_err(|e| map_redis_error(e, key))?;
        Ok(data)
    }

    async fn set(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(&k, data)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .sadd(&k, member)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .smembers(&k)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(members)
    }

    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .lpush(&k, value)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(())
    }

    async fn list_index(&self, key: &str, index: isize) -> Result<Option<String>, StorageError> {
        let k = self.full_key(key);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .lindex(&k, index)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Integration tests -- Redis backend contract tests
// ---------------------------------------------------------------------------
