//! Return record -- one minion's outcome for one job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One minion's return for one job, identified by the
/// `(minion_id, jid)` pair.
///
/// The record is immutable once written: a rewrite of the same pair is
/// last-write-wins with no versioning. Beyond the identifying metadata
/// and the return payload, dispatchers attach arbitrary extra fields
/// (`success`, `retcode`, timing data, ...); those are carried through
/// `extra` untouched so the stored JSON round-trips losslessly.
///
/// # Examples
///
/// ```
/// use jobcache::ReturnRecord;
/// use serde_json::json;
///
/// let ret = ReturnRecord::new("web1", "20230101120000000001", "test.ping", json!(true));
/// let encoded = serde_json::to_value(&ret).unwrap();
/// assert_eq!(encoded["id"], "web1");
/// assert_eq!(encoded["return"], true);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// The reporting minion's id. Must not contain `:` -- it is joined
    /// into composite storage keys with a colon separator.
    #[serde(rename = "id")]
    pub minion_id: String,

    /// The job id this return belongs to.
    pub jid: String,

    /// The executed function name (e.g., `"test.ping"`).
    pub fun: String,

    /// The minion-supplied return value.
    #[serde(rename = "return", default)]
    pub return_value: Value,

    /// Any additional fields the dispatcher attached, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReturnRecord {
    /// Creates a return record with no extra fields.
    pub fn new(
        minion_id: impl Into<String>,
        jid: impl Into<String>,
        fun: impl Into<String>,
        return_value: Value,
    ) -> Self {
        Self {
            minion_id: minion_id.into(),
            jid: jid.into(),
            fun: fun.into(),
            return_value,
            extra: Map::new(),
        }
    }

    /// Attaches an extra field (builder pattern).
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_field_names() {
        let ret = ReturnRecord::new("web1", "20230101120000000001", "test.ping", json!(true));
        let value = serde_json::to_value(&ret).unwrap();
        assert_eq!(value["id"], "web1");
        assert_eq!(value["jid"], "20230101120000000001");
        assert_eq!(value["fun"], "test.ping");
        assert_eq!(value["return"], true);
    }

    #[test]
    fn extra_fields_round_trip() {
        let ret = ReturnRecord::new("web1", "1", "cmd.run", json!("ok"))
            .with_extra("success", json!(true))
            .with_extra("retcode", json!(0));
        let encoded = serde_json::to_vec(&ret).unwrap();
        let decoded: ReturnRecord = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, ret);
        assert_eq!(decoded.extra["retcode"], json!(0));
    }

    #[test]
    fn missing_return_defaults_to_null() {
        let decoded: ReturnRecord =
            serde_json::from_str(r#"{"id":"web1","jid":"1","fun":"test.ping"}"#).unwrap();
        assert_eq!(decoded.return_value, Value::Null);
    }
}
