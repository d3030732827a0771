//! Message — normalizer for the request-offload source.
//!
//! A message is a name plus an ordered list of named arguments. Only the
//! arguments the pipeline needs are read; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{trim_path, RawRecord};

/// One offload message as delivered by the listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub name: String,
    #[serde(default)]
    pub args: Vec<MessageArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageArg {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl MessageArg {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    /// Render the value as plain text (strings unquoted, null as empty).
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl AgentMessage {
    pub fn new(name: impl Into<String>, args: Vec<MessageArg>) -> Self {
        Self { name: name.into(), args }
    }
}

/// Walk the argument list of `msg` and build a [`RawRecord`].
///
/// A later argument with the same name overwrites an earlier one. A status
/// that is not an integer leaves `status` at 0.
pub fn from_message(msg: &AgentMessage) -> RawRecord {
    let mut record = RawRecord::default();

    for arg in &msg.args {
        let value = arg.value_text();
        match arg.name.as_str() {
            "uid" => record.uid = Some(value),
            "ip" => record.ip = value,
            "host" => record.host = value,
            "path" => record.path = trim_path(&value),
            "query" => record.query = value,
            "method" => record.method = value,
            "status" => {
                if let Ok(status) = value.trim().parse::<i32>() {
                    record.status = status;
                }
            }
            _ => {}
        }
    }

    record
}
