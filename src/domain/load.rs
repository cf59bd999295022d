//! Job load -- the dispatch record for one job id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::targeting::TargetType;

/// The dispatch record describing what a job requested and which minions
/// and relays it reached.
///
/// Unlike a [`ReturnRecord`](crate::domain::ReturnRecord), a load is
/// mutable after creation: every re-save for the same job id unions the
/// newly resolved minion set and the syndic set into what was stored
/// before, so the sets grow monotonically and never shrink. That lets
/// several relay layers each contribute their own view of the job without
/// requiring a single writer.
///
/// # Examples
///
/// ```
/// use jobcache::{JobLoad, TargetType};
///
/// let load = JobLoad::new("web*").with_tgt_type(TargetType::Glob);
/// assert!(load.minions.is_empty()); // populated at save time
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLoad {
    /// The target expression as dispatched.
    pub tgt: String,

    /// The match mode for `tgt`. Defaults to glob when absent.
    #[serde(default)]
    pub tgt_type: TargetType,

    /// The resolved set of targeted minion ids. Computed in advance from
    /// target matching, so it is a superset of the minions that actually
    /// post a return.
    #[serde(default)]
    pub minions: BTreeSet<String>,

    /// Relay/syndic node ids that (re-)saved this load.
    #[serde(default)]
    pub syndics: BTreeSet<String>,

    /// Any additional fields the dispatcher attached, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobLoad {
    /// Creates a load draft for the given target expression, with glob
    /// matching and empty minion/syndic sets.
    pub fn new(tgt: impl Into<String>) -> Self {
        Self {
            tgt: tgt.into(),
            tgt_type: TargetType::default(),
            minions: BTreeSet::new(),
            syndics: BTreeSet::new(),
            extra: Map::new(),
        }
    }

    /// Sets the match mode (builder pattern).
    pub fn with_tgt_type(mut self, tgt_type: TargetType) -> Self {
        self.tgt_type = tgt_type;
        self
    }

    /// Attaches an extra field (builder pattern).
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Unions a previously stored load's minion and syndic sets into this
    /// one. Ordinary key-value stores have no "merge JSON field" primitive,
    /// so the union happens here before the merged load is written back.
    pub fn merge_previous(&mut self, previous: &JobLoad) {
        self.minions.extend(previous.minions.iter().cloned());
        self.syndics.extend(previous.syndics.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tgt_type_defaults_to_glob_when_absent() {
        let load: JobLoad = serde_json::from_str(r#"{"tgt":"*"}"#).unwrap();
        assert_eq!(load.tgt_type, TargetType::Glob);
        assert!(load.minions.is_empty());
        assert!(load.syndics.is_empty());
    }

    #[test]
    fn merge_previous_unions_both_sets() {
        let mut current = JobLoad::new("*");
        current.minions.insert("web2".to_string());
        current.syndics.insert("syndic-west".to_string());

        let mut previous = JobLoad::new("*");
        previous.minions.insert("web1".to_string());
        previous.minions.insert("web2".to_string());
        previous.syndics.insert("syndic-east".to_string());

        current.merge_previous(&previous);
        assert_eq!(current.minions.len(), 2);
        assert_eq!(current.syndics.len(), 2);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let mut load = JobLoad::new("web*")
            .with_tgt_type(TargetType::Glob)
            .with_extra("fun", json!("test.ping"));
        load.minions.insert("web1".to_string());

        let value = serde_json::to_value(&load).unwrap();
        assert_eq!(value["tgt"], "web*");
        assert_eq!(value["tgt_type"], "glob");
        assert_eq!(value["minions"], json!(["web1"]));
        assert_eq!(value["syndics"], json!([]));
        assert_eq!(value["fun"], "test.ping");
    }

    #[test]
    fn round_trips_through_json() {
        let mut load = JobLoad::new("db*").with_extra("user", json!("ops"));
        load.minions.insert("db1".to_string());
        load.syndics.insert("syndic-1".to_string());
        let encoded = serde_json::to_vec(&load).unwrap();
        let decoded: JobLoad = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, load);
    }
}
