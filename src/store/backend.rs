//! Low-level key-value storage backend trait and supporting types.
//!
//! The [`StorageBackend`] trait defines the contract that all storage
//! engines implement. It exposes the 6 KV primitives the cache needs:
//! [`get`](StorageBackend::get), [`set`](StorageBackend::set),
//! [`set_add`](StorageBackend::set_add),
//! [`set_members`](StorageBackend::set_members),
//! [`list_push_front`](StorageBackend::list_push_front), and
//! [`list_index`](StorageBackend::list_index).
//!
//! Domain logic (load merging, target resolution, record serialization)
//! does **not** belong here. Backends are dumb KV stores; domain logic
//! lives in [`JobResultCache`](crate::cache::JobResultCache).
//!
//! # Key Structure
//!
//! Keys are colon-separated composite strings:
//!
//! | Key Pattern | Type | Purpose |
//! |-------------|------|---------|
//! | `{minion_id}:{jid}` | value | full return record, JSON |
//! | `{minion_id}:{fun}` | list | job-id history, newest first |
//! | `{jid}` | value | job load record, JSON |
//! | `minions` | set | all minion ids ever seen |
//! | `jids` | set | all job ids ever seen |
//!
//! The colon separator is safe as long as minion ids, job ids, and function
//! names never contain a colon themselves. That is a constraint on the host
//! dispatcher's identifier scheme, not something the store enforces.
//!
//! # Absence Semantics
//!
//! A missing key is a normal, expected state: [`get`](StorageBackend::get)
//! and [`list_index`](StorageBackend::list_index) return `None`, and
//! [`set_members`](StorageBackend::set_members) returns an empty vector.
//! Backends only error on connectivity/protocol failures or when a key
//! holds a value of the wrong kind.

use std::fmt;

use async_trait::async_trait;

/// Global set of all minion ids that have ever posted a return.
pub const MINIONS_KEY: &str = "minions";

/// Global set of all job ids that have ever been seen.
pub const JIDS_KEY: &str = "jids";

/// Errors that can occur during raw storage operations.
///
/// These are low-level errors from the storage backend.
/// [`JobResultCache`](crate::cache::JobResultCache) wraps them in
/// [`CacheError::Store`](crate::error::CacheError::Store) before surfacing
/// to callers.
///
/// # Examples
///
/// ```
/// use jobcache::store::backend::StorageError;
///
/// let err = StorageError::WrongType { key: "minions".to_string() };
/// assert!(err.to_string().contains("minions"));
/// ```
#[derive(Debug)]
pub enum StorageError {
    /// The key exists but holds a value of a different kind (e.g., a
    /// set operation against a plain value). Mirrors Redis `WRONGTYPE`.
    WrongType {
        /// The key holding the mismatched value.
        key: String,
    },

    /// An I/O or backend-specific error occurred (e.g., connection
    /// failure, protocol error).
    Backend {
        /// Human-readable description of the error.
        message: String,
        /// The underlying error, if available. Accessible via
        /// [`std::error::Error::source()`].
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongType { key } => {
                write!(f, "wrong value kind for key {key}")
            }
            Self::Backend { message, .. } => write!(f, "backend error: {message}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend {
                source: Some(src), ..
            } => Some(src.as_ref()),
            _ => None,
        }
    }
}

/// Key-value storage backend for job result persistence.
///
/// Implementations provide raw storage primitives mapping one-to-one onto
/// the Redis commands the cache issues (GET, SET, SADD, SMEMBERS, LPUSH,
/// LINDEX). Each primitive is individually atomic; no cross-operation
/// transaction is ever requested, so concurrent readers may observe
/// intermediate states between the cache's writes. That is a valid
/// transient state, accepted by the keyspace design.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; multiple dispatcher workers may
/// call into the cache concurrently from separate execution contexts.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves the value stored at `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist -- absence is a
    /// normal state, not an error.
    ///
    /// # Errors
    ///
    /// - [`StorageError::WrongType`] if the key holds a set or list.
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores a value at `key`, unconditionally overwriting any previous
    /// value regardless of its kind (Redis `SET` semantics: last write
    /// wins, no versioning).
    ///
    /// # Errors
    ///
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn set(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Adds `member` to the set stored at `key`, creating the set if the
    /// key does not exist. Adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// - [`StorageError::WrongType`] if the key holds a non-set value.
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn set_add(&self, key: &str, member: &str) -> Result<(), StorageError>;

    /// Returns all members of the set stored at `key`, in no guaranteed
    /// order. A missing key yields an empty vector.
    ///
    /// # Errors
    ///
    /// - [`StorageError::WrongType`] if the key holds a non-set value.
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError>;

    /// Prepends `value` to the list stored at `key`, creating the list if
    /// the key does not exist. Position 0 is always the newest entry.
    ///
    /// # Errors
    ///
    /// - [`StorageError::WrongType`] if the key holds a non-list value.
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns the element at `index` in the list stored at `key`.
    ///
    /// Negative indices count from the end, as in Redis `LINDEX`. A
    /// missing key or out-of-range index yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::WrongType`] if the key holds a non-list value.
    /// - [`StorageError::Backend`] on I/O or backend-specific failures.
    async fn list_index(&self, key: &str, index: isize) -> Result<Option<String>, StorageError>;
}

// Delegation impl so several caches (e.g., one per relay hop) can share
// one backend via `Arc`.
#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<B> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        (**self).set(key, data).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StorageError> {
        (**self).set_add(key, member).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError> {
        (**self).set_members(key).await
    }

    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).list_push_front(key, value).await
    }

    async fn list_index(&self, key: &str, index: isize) -> Result<Option<String>, StorageError> {
        (**self).list_index(key, index).await
    }
}

/// Constructs the key under which one minion's return for one job is stored.
///
/// # Examples
///
/// ```
/// use jobcache::store::backend::result_key;
///
/// assert_eq!(result_key("web1", "20230101120000000001"), "web1:20230101120000000001");
/// ```
pub fn result_key(minion_id: &str, jid: &str) -> String {
    format!("{minion_id}:{jid}")
}

/// Constructs the key of a minion's per-function job-id history list.
///
/// # Examples
///
/// ```
/// use jobcache::store::backend::history_key;
///
/// assert_eq!(history_key("web1", "test.ping"), "web1:test.ping");
/// ```
pub fn history_key(minion_id: &str, fun: &str) -> String {
    format!("{minion_id}:{fun}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- StorageError Display tests ----

    #[test]
    fn storage_error_display_wrong_type() {
        let err = StorageError::WrongType {
            key: "minions".to_string(),
        };
        assert_eq!(err.to_string(), "wrong value kind for key minions");
    }

    #[test]
    fn storage_error_display_backend() {
        let err = StorageError::Backend {
            message: "connection timeout".to_string(),
            source: None,
        };
        assert_eq!(err.to_string(), "backend error: connection timeout");
    }

    // ---- StorageError source() tests ----

    #[test]
    fn storage_error_source_backend_with_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = StorageError::Backend {
            message: "redis failed".to_string(),
            source: Some(Box::new(inner)),
        };
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert!(source.unwrap().to_string().contains("timed out"));
    }

    #[test]
    fn storage_error_source_backend_without_source() {
        let err = StorageError::Backend {
            message: "unknown".to_string(),
            source: None,
        };
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn storage_error_source_wrong_type_returns_none() {
        let err = StorageError::WrongType {
            key: "k".to_string(),
        };
        assert!(std::error::Error::source(&err).is_none());
    }

    // ---- Key helper tests ----

    #[test]
    fn result_key_joins_with_colon() {
        assert_eq!(result_key("web1", "20230101120000000001"), "web1:20230101120000000001");
    }

    #[test]
    fn history_key_joins_with_colon() {
        assert_eq!(history_key("web1", "test.ping"), "web1:test.ping");
    }

    #[test]
    fn global_key_names() {
        assert_eq!(MINIONS_KEY, "minions");
        assert_eq!(JIDS_KEY, "jids");
    }
}
