//! The job result cache: all domain operations over a [`StorageBackend`].
//!
//! [`JobResultCache`] is the entry point the host dispatcher calls into.
//! Writers ([`store_return`](JobResultCache::store_return),
//! [`save_load`](JobResultCache::save_load)) persist records as canonical
//! JSON under the documented keyspace; readers reconstruct aggregate views
//! by combining the backend's primitive operations.
//!
//! # Consistency model
//!
//! Each writer issues several individually-atomic store operations with no
//! cross-operation transaction. If a later mutation fails after an earlier
//! one succeeded (say, the return record is written but the minion never
//! lands in the global set), the inconsistency window stands until a
//! subsequent write repairs it. There are no retries and no compensation;
//! callers own failure handling. Readers may likewise observe a load whose
//! minion set was just unioned while some of the job's returns have not
//! arrived yet -- a valid transient state.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CacheConfig;
use crate::domain::{JobLoad, ReturnRecord};
use crate::error::CacheError;
use crate::jid::JidGenerator;
use crate::store::backend::{history_key, result_key, StorageBackend, JIDS_KEY, MINIONS_KEY};
use crate::targeting::TargetResolver;

/// What to do when a per-minion lookup fails inside
/// [`get_fun`](JobResultCache::get_fun).
///
/// The aggregate readers favor partial results: one minion's corrupt
/// history entry should not hide every other minion's state. [`Skip`]
/// (the default) logs the failure at `warn` and drops that minion from
/// the result; [`Propagate`] fails the whole call instead, for callers
/// that must not mask store errors.
///
/// [`Skip`]: LookupPolicy::Skip
/// [`Propagate`]: LookupPolicy::Propagate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupPolicy {
    /// Log and drop the failing minion, return partial data.
    #[default]
    Skip,
    /// Fail the whole aggregate read on the first per-minion error.
    Propagate,
}

/// Persists job returns and dispatch loads into a key-value store, and
/// reconstructs job status from them.
///
/// Generic over the [`StorageBackend`]; use
/// [`InMemoryBackend`](crate::store::memory::InMemoryBackend) for tests
/// and embedded deployments, [`RedisBackend`](crate::store::redis::RedisBackend)
/// (feature `redis`) for shared deployments.
///
/// Nothing here is ever deleted or expired -- retention is entirely the
/// store's policy.
///
/// # Examples
///
/// ```
/// use jobcache::store::memory::InMemoryBackend;
/// use jobcache::{JobLoad, JobResultCache, StaticTargetResolver};
///
/// # async fn example() -> Result<(), jobcache::CacheError> {
/// let cache = JobResultCache::new(InMemoryBackend::new()).with_master_id("syndic-east");
/// let resolver = StaticTargetResolver::new(["web1", "web2"]);
///
/// let jid = cache.prep_jid(false, None);
/// cache.save_load(&jid, JobLoad::new("*"), &resolver).await?;
/// assert_eq!(cache.get_jid_minions(&jid).await?, vec!["web1", "web2"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JobResultCache<B: StorageBackend> {
    backend: B,
    master_id: Option<String>,
    lookup_policy: LookupPolicy,
    jids: JidGenerator,
}

impl<B: StorageBackend> JobResultCache<B> {
    /// Creates a cache over the given backend, with no master id and the
    /// default [`LookupPolicy::Skip`].
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master_id: None,
            lookup_policy: LookupPolicy::default(),
            jids: JidGenerator::new(),
        }
    }

    /// Sets the relay/master identity added to every saved load's syndic
    /// set (builder pattern).
    pub fn with_master_id(mut self, master_id: impl Into<String>) -> Self {
        self.master_id = Some(master_id.into());
        self
    }

    /// Sets the per-minion lookup failure policy for aggregate reads
    /// (builder pattern).
    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup_policy = policy;
        self
    }

    /// Applies the `master_id` from a resolved configuration
    /// (builder pattern). Connection parameters in the config are the
    /// backend's concern; only the relay identity applies here.
    pub fn with_config(mut self, config: &CacheConfig) -> Self {
        self.master_id = config.master_id.clone();
        self
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ---- Serialization helpers (private) ----

    fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(value).map_err(|source| CacheError::Encode { what, source })
    }

    fn decode<T: DeserializeOwned>(key: &str, data: &[u8]) -> Result<T, CacheError> {
        serde_json::from_slice(data).map_err(|source| CacheError::Decode {
            key: key.to_string(),
            source,
        })
    }

    // ---- Writers ----

    /// Persists one minion's return for one job.
    ///
    /// Issues four store mutations, not atomic as a group:
    /// 1. the full record, JSON-encoded, under `{minion_id}:{jid}`;
    /// 2. the jid prepended to the `{minion_id}:{fun}` history list;
    /// 3. the minion id added to the global `minions` set;
    /// 4. the jid added to the global `jids` set.
    ///
    /// # Errors
    ///
    /// Store failures propagate unhandled -- the dispatcher's
    /// result-collection path owns logging and recovery. A failure
    /// partway through leaves the earlier mutations in place.
    pub async fn store_return(&self, ret: &ReturnRecord) -> Result<(), CacheError> {
        let data = Self::encode("return record", ret)?;
        self.backend
            .set(&result_key(&ret.minion_id, &ret.jid), &data)
            .await?;
        self.backend
            .list_push_front(&history_key(&ret.minion_id, &ret.fun), &ret.jid)
            .await?;
        self.backend.set_add(MINIONS_KEY, &ret.minion_id).await?;
        self.backend.set_add(JIDS_KEY, &ret.jid).await?;
        tracing::debug!(
            minion_id = %ret.minion_id,
            jid = %ret.jid,
            fun = %ret.fun,
            "stored job return"
        );
        Ok(())
    }

    /// Saves (or re-saves) the dispatch load for a job id.
    ///
    /// The target expression is expanded through `resolver`, then any
    /// previously stored load's minion and syndic sets are unioned in, so
    /// the recorded sets grow monotonically across saves -- several relay
    /// layers may each re-save the load with their own view. When a
    /// master id is configured it joins the syndic set.
    ///
    /// The load's own `minions` draft field is ignored; the authoritative
    /// set is always resolved-union-previous.
    ///
    /// # Errors
    ///
    /// Resolver failures surface as [`CacheError::Target`]; store
    /// failures propagate unhandled.
    pub async fn save_load(
        &self,
        jid: &str,
        mut load: JobLoad,
        resolver: &dyn TargetResolver,
    ) -> Result<(), CacheError> {
        load.minions = resolver.resolve(&load.tgt, load.tgt_type).await?;
        if let Some(previous) = self.get_load(jid).await? {
            load.merge_previous(&previous);
        }
        if let Some(master_id) = &self.master_id {
            load.syndics.insert(master_id.clone());
        }

        let data = Self::encode("job load", &load)?;
        self.backend.set(jid, &data).await?;
        self.backend.set_add(JIDS_KEY, jid).await?;
        tracing::debug!(jid = %jid, minions = load.minions.len(), "saved job load");
        Ok(())
    }

    // ---- Readers ----

    /// Returns the stored load for a job id, or `None` if no load exists.
    ///
    /// Absence is a normal, expected state for an unknown or
    /// not-yet-saved job id -- never an error.
    pub async fn get_load(&self, jid: &str) -> Result<Option<JobLoad>, CacheError> {
        match self.backend.get(jid).await? {
            Some(data) => Ok(Some(Self::decode(jid, &data)?)),
            None => Ok(None),
        }
    }

    /// Returns all returns posted for a job id, keyed by minion id.
    ///
    /// Reads the load to learn which minions were targeted, then fetches
    /// each minion's return. Minions that have not (yet) posted a return
    /// are absent from the result -- that is the operation's meaning, not
    /// a failure. No load means an empty map.
    pub async fn get_jid(&self, jid: &str) -> Result<BTreeMap<String, ReturnRecord>, CacheError> {
        let mut results = BTreeMap::new();
        let Some(load) = self.get_load(jid).await? else {
            return Ok(results);
        };
        for minion in &load.minions {
            let key = result_key(minion, jid);
            if let Some(data) = self.backend.get(&key).await? {
                results.insert(minion.clone(), Self::decode(&key, &data)?);
            }
        }
        Ok(results)
    }

    /// Returns the minion ids recorded as targeted by a job id, or an
    /// empty list if no load exists.
    pub async fn get_jid_minions(&self, jid: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .get_load(jid)
            .await?
            .map(|load| load.minions.into_iter().collect())
            .unwrap_or_default())
    }

    /// Returns the last return each minion posted for the given function,
    /// keyed by minion id.
    ///
    /// Walks the global minion set; for each minion, position 0 of its
    /// `{minion_id}:{fun}` history list names the newest jid, whose
    /// return is then fetched. Minions with no history for the function
    /// are excluded. Per-minion lookup failures follow the configured
    /// [`LookupPolicy`].
    pub async fn get_fun(&self, fun: &str) -> Result<BTreeMap<String, ReturnRecord>, CacheError> {
        let mut results = BTreeMap::new();
        for minion in self.backend.set_members(MINIONS_KEY).await? {
            match self.last_return_for(&minion, fun).await {
                Ok(Some(record)) => {
                    results.insert(minion, record);
                }
                Ok(None) => {}
                Err(err) => match self.lookup_policy {
                    LookupPolicy::Skip => {
                        tracing::warn!(
                            minion_id = %minion,
                            fun = %fun,
                            error = %err,
                            "skipping minion after failed history lookup"
                        );
                    }
                    LookupPolicy::Propagate => return Err(err),
                },
            }
        }
        Ok(results)
    }

    /// Fetches one minion's most recent return for a function, if any.
    async fn last_return_for(
        &self,
        minion: &str,
        fun: &str,
    ) -> Result<Option<ReturnRecord>, CacheError> {
        let Some(jid) = self.backend.list_index(&history_key(minion, fun), 0).await? else {
            return Ok(None);
        };
        let key = result_key(minion, &jid);
        match self.backend.get(&key).await? {
            Some(data) => Ok(Some(Self::decode(&key, &data)?)),
            None => Ok(None),
        }
    }

    /// Returns all job ids ever seen, in no guaranteed order.
    pub async fn get_jids(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.backend.set_members(JIDS_KEY).await?)
    }

    /// Returns all minion ids ever seen, in no guaranteed order.
    pub async fn get_minions(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.backend.set_members(MINIONS_KEY).await?)
    }

    // ---- Job-id provisioning ----

    /// Returns `passed_jid` unchanged when supplied (an upstream relay's
    /// id takes precedence); otherwise generates a fresh id.
    ///
    /// The `nocache` flag exists for interface compatibility with sibling
    /// cache backends and has no effect here -- this backend always
    /// persists.
    pub fn prep_jid(&self, nocache: bool, passed_jid: Option<&str>) -> String {
        let _ = nocache;
        match passed_jid {
            Some(jid) => jid.to_string(),
            None => self.jids.generate(),
        }
    }
}
