//! Redis-backed job result cache for distributed task execution.
//!
//! When a dispatcher fans a job out to a set of minions, each minion's
//! return needs to land somewhere queryable: this crate persists those
//! returns (and each job's dispatch load) into a shared key-value store
//! and offers query helpers that reconstruct job status later -- all
//! results for a job id, the last result per minion per function, the
//! set of known minions, the set of known job ids.
//!
//! # Overview
//!
//! The cache is deliberately thin. It performs no retries, no
//! cross-operation transactions, and never deletes or expires keys;
//! retention is the store's concern, and concurrency safety rests on the
//! store's per-operation atomicity. Group-membership resolution (turning
//! a target expression into concrete minion ids) and job-id generation
//! for forwarded jobs belong to the host dispatcher -- this crate only
//! exposes the seams ([`TargetResolver`], [`JobResultCache::prep_jid`]).
//!
//! # Module Organization
//!
//! - [`cache`] - [`JobResultCache`], the domain operations
//! - [`domain`] - [`ReturnRecord`] and [`JobLoad`] storage records
//! - [`store`] - [`StorageBackend`](store::StorageBackend) trait and the
//!   in-memory / Redis backends
//! - [`config`] - configuration sources and connection parameters
//! - [`targeting`] - target expression types and the resolver seam
//! - [`jid`] - job-id generation
//! - [`error`] - [`CacheError`]
//!
//! # Example
//!
//! ```
//! use jobcache::store::memory::InMemoryBackend;
//! use jobcache::{JobResultCache, ReturnRecord};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), jobcache::CacheError> {
//! let cache = JobResultCache::new(InMemoryBackend::new());
//!
//! let ret = ReturnRecord::new("web1", "20230101120000000001", "test.ping", json!(true));
//! cache.store_return(&ret).await?;
//!
//! let results = cache.get_jid("20230101120000000001").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod jid;
pub mod store;
pub mod targeting;

// Re-exports for ergonomic access
pub use cache::{JobResultCache, LookupPolicy};
pub use config::{CacheConfig, ConfigSource, StaticOptions};
pub use domain::{JobLoad, ReturnRecord};
pub use error::CacheError;
pub use jid::JidGenerator;
pub use targeting::{StaticTargetResolver, TargetResolver, TargetType};
