//! In-memory storage backend.
//!
//! [`InMemoryBackend`] provides a thread-safe [`StorageBackend`]
//! implementation using `DashMap<String, Slot>` for concurrent key-value
//! storage. Each key holds one of three value kinds -- a plain value, a
//! set, or a list -- mirroring the Redis data types the cache uses.
//! Accessing a key with an operation for a different kind returns
//! [`StorageError::WrongType`], matching Redis `WRONGTYPE` behavior.
//!
//! This backend is a dumb KV store with no domain logic. It exists for
//! tests and for embedding the cache without a live Redis.
//!
//! # Examples
//!
//! ```
//! use jobcache::store::memory::InMemoryBackend;
//! use jobcache::JobResultCache;
//!
//! let cache = JobResultCache::new(InMemoryBackend::new());
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::store::backend::{StorageBackend, StorageError};

/// One stored value: a plain byte value, a member set, or an ordered list.
#[derive(Debug, Clone)]
enum Slot {
    Value(Vec<u8>),
    Set(BTreeSet<String>),
    List(Vec<String>),
}

impl Slot {
    fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Set(_) => "set",
            Self::List(_) => "list",
        }
    }
}

fn wrong_type(key: &str) -> StorageError {
    StorageError::WrongType {
        key: key.to_string(),
    }
}

/// Thread-safe in-memory storage backend using [`DashMap`].
///
/// Keys hold typed slots (value, set, or list). [`set`](StorageBackend::set)
/// overwrites a key regardless of its previous kind; the set and list
/// operations reject keys holding a different kind, the way Redis does.
///
/// # Examples
///
/// ```
/// use jobcache::store::memory::InMemoryBackend;
///
/// let backend = InMemoryBackend::new();
/// assert!(backend.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: DashMap<String, Slot>,
}

impl InMemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Returns the number of keys stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the backend contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.data.get(key).as_deref() {
            Some(Slot::Value(data)) => Ok(Some(data.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), Slot::Value(data.to_vec()));
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StorageError> {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Slot::Set(members) => {
                    members.insert(member.to_string());
                    Ok(())
                }
                _ => Err(wrong_type(key)),
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Set(BTreeSet::from([member.to_string()])));
                Ok(())
            }
        }
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError> {
        match self.data.get(key).as_deref() {
            Some(Slot::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn list_push_front(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Slot::List(items) => {
                    items.insert(0, value.to_string());
                    Ok(())
                }
                _ => Err(wrong_type(key)),
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::List(vec![value.to_string()]));
                Ok(())
            }
        }
    }

    async fn list_index(&self, key: &str, index: isize) -> Result<Option<String>, StorageError> {
        match self.data.get(key).as_deref() {
            Some(Slot::List(items)) => {
                let resolved = if index < 0 {
                    items.len().checked_sub(index.unsigned_abs())
                } else {
                    Some(index as usize)
                };
                Ok(resolved.and_then(|i| items.get(i).cloned()))
            }
            Some(slot) => {
                tracing::debug!(key = key, kind = slot.kind(), "list read against non-list key");
                Err(wrong_type(key))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"payload").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn set_overwrites_last_write_wins() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"first").await.unwrap();
        backend.set("k", b"second").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn set_overwrites_other_kinds() {
        let backend = InMemoryBackend::new();
        backend.set_add("k", "m").await.unwrap();
        backend.set("k", b"now a value").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"now a value".to_vec()));
    }

    #[tokio::test]
    async fn set_add_is_idempotent() {
        let backend = InMemoryBackend::new();
        backend.set_add("s", "web1").await.unwrap();
        backend.set_add("s", "web1").await.unwrap();
        backend.set_add("s", "web2").await.unwrap();
        let members = backend.set_members("s").await.unwrap();
        assert_eq!(members, vec!["web1".to_string(), "web2".to_string()]);
    }

    #[tokio::test]
    async fn set_members_missing_key_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.set_members("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_push_front_newest_first() {
        let backend = InMemoryBackend::new();
        backend.list_push_front("h", "jid-1").await.unwrap();
        backend.list_push_front("h", "jid-2").await.unwrap();
        assert_eq!(
            backend.list_index("h", 0).await.unwrap(),
            Some("jid-2".to_string())
        );
        assert_eq!(
            backend.list_index("h", 1).await.unwrap(),
            Some("jid-1".to_string())
        );
    }

    #[tokio::test]
    async fn list_index_negative_counts_from_end() {
        let backend = InMemoryBackend::new();
        backend.list_push_front("h", "older").await.unwrap();
        backend.list_push_front("h", "newer").await.unwrap();
        assert_eq!(
            backend.list_index("h", -1).await.unwrap(),
            Some("older".to_string())
        );
    }

    #[tokio::test]
    async fn list_index_out_of_range_returns_none() {
        let backend = InMemoryBackend::new();
        backend.list_push_front("h", "only").await.unwrap();
        assert_eq!(backend.list_index("h", 5).await.unwrap(), None);
        assert_eq!(backend.list_index("h", -5).await.unwrap(), None);
        assert_eq!(backend.list_index("missing", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrong_kind_access_is_rejected() {
        let backend = InMemoryBackend::new();
        backend.set("v", b"plain").await.unwrap();
        assert!(matches!(
            backend.set_add("v", "m").await,
            Err(StorageError::WrongType { .. })
        ));
        assert!(matches!(
            backend.list_index("v", 0).await,
            Err(StorageError::WrongType { .. })
        ));

        backend.set_add("s", "m").await.unwrap();
        assert!(matches!(
            backend.get("s").await,
            Err(StorageError::WrongType { .. })
        ));
        assert!(matches!(
            backend.list_push_front("s", "x").await,
            Err(StorageError::WrongType { .. })
        ));
    }

    #[tokio::test]
    async fn len_counts_keys() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty());
        backend.set("a", b"1").await.unwrap();
        backend.set_add("b", "m").await.unwrap();
        assert_eq!(backend.len(), 2);
    }
}
