//! Model — RawRecord, the canonical shape both ingestion sources collapse into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Not a JSON log message")]
    NotJson,

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Line exceeds {0} bytes")]
    TooLong(usize),
}

/// One proxy access record, after normalization.
///
/// `path` is already trimmed: no leading `/`, no trailing `/`, and empty when
/// the raw path was one character or shorter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Request id (protocol messages only)
    #[serde(skip)]
    pub uid: Option<String>,
    pub ip: String,
    /// Proxy-side timestamp as written in the log line (informational)
    pub time: Option<String>,
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: String,
    pub status: i32,
}

/// Strip the leading and one trailing `/` from a request path.
pub fn trim_path(raw: &str) -> String {
    if raw.len() <= 1 {
        return String::new();
    }
    let path = raw.strip_prefix('/').unwrap_or(raw);
    path.strip_suffix('/').unwrap_or(path).to_string()
}
