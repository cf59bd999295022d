//! Error types for job cache operations.
//!
//! Provides [`CacheError`], the domain-level error surfaced by
//! [`JobResultCache`](crate::cache::JobResultCache). Two failure classes
//! exist: store connectivity/operation failures (wrapped, propagated to the
//! caller) and encode/decode failures at the serialization boundary. Absence
//! of a record is *not* an error anywhere in this crate -- missing loads,
//! missing returns, and missing history lists all surface as empty results.

use std::fmt;

use crate::store::backend::StorageError;

/// Errors that can occur during job cache operations.
///
/// # Examples
///
/// ```
/// use jobcache::CacheError;
///
/// let err = CacheError::Target {
///     message: "unsupported match mode".to_string(),
/// };
/// assert!(err.to_string().contains("unsupported match mode"));
/// ```
#[derive(Debug)]
pub enum CacheError {
    /// A record could not be serialized for storage.
    Encode {
        /// What was being encoded (e.g., `"return record"`).
        what: &'static str,
        /// The underlying serialization error.
        source: serde_json::Error,
    },

    /// A stored record could not be deserialized.
    Decode {
        /// The key whose value failed to decode.
        key: String,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// A storage operation failed. Connectivity and protocol failures from
    /// the backend are never caught locally in the writer paths; they
    /// propagate here for the caller to handle.
    Store(StorageError),

    /// Target expression resolution failed.
    Target {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { what, source } => {
                write!(f, "failed to encode {what}: {source}")
            }
            Self::Decode { key, source } => {
                write!(f, "failed to decode record at key {key}: {source}")
            }
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Target { message } => write!(f, "target resolution failed: {message}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(source),
            Self::Store(err) => Some(err),
            Self::Target { .. } => None,
        }
    }
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        Self::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("not json").unwrap_err()
    }

    #[test]
    fn display_encode() {
        let err = CacheError::Encode {
            what: "job load",
            source: json_error(),
        };
        assert!(err.to_string().starts_with("failed to encode job load"));
    }

    #[test]
    fn display_decode_includes_key() {
        let err = CacheError::Decode {
            key: "web1:20230101120000000001".to_string(),
            source: json_error(),
        };
        assert!(err.to_string().contains("web1:20230101120000000001"));
    }

    #[test]
    fn display_store_wraps_backend_message() {
        let err = CacheError::from(StorageError::Backend {
            message: "connection refused".to_string(),
            source: None,
        });
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn source_chains_through_store_error() {
        let inner = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = CacheError::Store(StorageError::Backend {
            message: "redis failed".to_string(),
            source: Some(Box::new(inner)),
        });
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }

    #[test]
    fn source_none_for_target() {
        let err = CacheError::Target {
            message: "nope".to_string(),
        };
        assert!(std::error::Error::source(&err).is_none());
    }
}
