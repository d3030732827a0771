//! Line — normalizer for the text-stream source.
//!
//! HAProxy writes each access record as a syslog-style prefix followed by a
//! JSON object whose first key is `host`. Everything before that marker is
//! ignored.

use super::model::{trim_path, RawRecord, RecordError};

/// Literal that opens the embedded JSON payload.
pub const PAYLOAD_MARKER: &str = "{\"host";

/// Normalize one log line into a [`RawRecord`].
pub fn from_line(line: &str) -> Result<RawRecord, RecordError> {
    let start = line.find(PAYLOAD_MARKER).ok_or(RecordError::NotJson)?;
    let payload = line[start..].trim_end_matches(|c: char| c == '\n' || c == '\r');

    let mut record: RawRecord = serde_json::from_str(payload)?;
    record.path = trim_path(&record.path);
    Ok(record)
}
