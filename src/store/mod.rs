//! Storage backends for the job result cache.
//!
//! # Architecture
//!
//! Storage is split into two layers:
//!
//! 1. **[`JobResultCache`](crate::cache::JobResultCache)** -- all domain
//!    logic: record serialization, load union-on-save, aggregate reads.
//! 2. **[`StorageBackend`]** -- dumb KV trait that backends implement.
//!    No domain logic.
//!
//! # Backends
//!
//! - [`InMemoryBackend`](memory::InMemoryBackend) -- thread-safe in-memory
//!   backend using `DashMap`. Used in tests and embedded deployments.
//! - [`RedisBackend`](redis::RedisBackend) -- Redis backend for shared
//!   deployments. Available behind the `redis` feature flag.

pub mod backend;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use backend::{StorageBackend, StorageError};
pub use memory::InMemoryBackend;
