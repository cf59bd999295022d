//! Job-id generation.
//!
//! Job ids are 20-digit UTC timestamps at microsecond resolution
//! (`%Y%m%d%H%M%S%f`, e.g. `20230101120000000001`), the format the
//! dispatcher stamps on every dispatch event. They sort by generation
//! time, which is what the keyspace relies on for the "newest first"
//! history lists.
//!
//! [`JidGenerator`] guarantees in-process uniqueness: an atomic register
//! holds the last issued microsecond tick, and a generation that lands on
//! a tick already issued (clock resolution, clock skew, or a burst of
//! calls) bumps past it instead of reusing it.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Generates unique, time-ordered job ids.
///
/// No process-wide singleton is required; a cache owns one generator, and
/// independent generators in the same process remain collision-free in
/// practice only through clock resolution. Callers that need cross-process
/// uniqueness should have the upstream dispatcher pass ids through
/// [`prep_jid`](crate::cache::JobResultCache::prep_jid).
///
/// # Examples
///
/// ```
/// use jobcache::JidGenerator;
///
/// let jids = JidGenerator::new();
/// let a = jids.generate();
/// let b = jids.generate();
/// assert_eq!(a.len(), 20);
/// assert_ne!(a, b);
/// assert!(a < b); // time-ordered
/// ```
#[derive(Debug, Default)]
pub struct JidGenerator {
    last_us: AtomicI64,
}

impl JidGenerator {
    /// Creates a generator with no issued ids.
    pub fn new() -> Self {
        Self {
            last_us: AtomicI64::new(0),
        }
    }

    /// Generates a fresh job id, strictly greater than any id this
    /// generator has issued before.
    pub fn generate(&self) -> String {
        let now = Utc::now().timestamp_micros();
        let mut last = self.last_us.load(Ordering::Acquire);
        let claimed = loop {
            let next = if now > last { now } else { last + 1 };
            match self
                .last_us
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break next,
                Err(observed) => last = observed,
            }
        };
        format_jid(claimed)
    }
}

/// Formats a microsecond UTC timestamp as a 20-digit job id.
fn format_jid(timestamp_us: i64) -> String {
    let dt = DateTime::<Utc>::from_timestamp_micros(timestamp_us).unwrap_or_else(Utc::now);
    dt.format("%Y%m%d%H%M%S%6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn jid_is_20_digits() {
        let jid = JidGenerator::new().generate();
        assert_eq!(jid.len(), 20);
        assert!(jid.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn jids_never_collide() {
        let jids = JidGenerator::new();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(jids.generate()));
        }
    }

    #[test]
    fn jids_are_monotonic() {
        let jids = JidGenerator::new();
        let a = jids.generate();
        let b = jids.generate();
        assert!(b > a);
    }

    #[test]
    fn concurrent_generation_stays_unique() {
        let jids = Arc::new(JidGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let jids = Arc::clone(&jids);
                std::thread::spawn(move || (0..200).map(|_| jids.generate()).collect::<Vec<_>>())
            })
            .collect();
        let mut all = std::collections::BTreeSet::new();
        for handle in handles {
            for jid in handle.join().unwrap() {
                assert!(all.insert(jid));
            }
        }
        assert_eq!(all.len(), 1600);
    }

    #[test]
    fn format_matches_timestamp() {
        // 2023-01-01T12:00:00.000001Z
        let us = chrono::DateTime::parse_from_rfc3339("2023-01-01T12:00:00.000001Z")
            .unwrap()
            .timestamp_micros();
        assert_eq!(format_jid(us), "20230101120000000001");
    }
}
