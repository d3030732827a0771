//! Model — AuditConfig and related structs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which ingestion sources run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Read access-log lines from stdin
    #[default]
    Stream,
    /// Accept offload-agent messages over TCP
    Agent,
    Both,
}

impl SourceMode {
    pub fn reads_stdin(&self) -> bool {
        matches!(self, SourceMode::Stream | SourceMode::Both)
    }

    pub fn listens(&self) -> bool {
        matches!(self, SourceMode::Agent | SourceMode::Both)
    }
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" => Ok(SourceMode::Stream),
            "agent" => Ok(SourceMode::Agent),
            "both" => Ok(SourceMode::Both),
            other => Err(format!("unknown mode {other:?} (expected stream, agent or both)")),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceMode::Stream => "stream",
            SourceMode::Agent => "agent",
            SourceMode::Both => "both",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub connection_string: String,
    pub event_table: String,
    pub mode: SourceMode,
    pub bind_address: String,
    pub port: u16,
    pub message_name: String,
    pub workers: usize,
    pub queue_depth: usize,
    pub persist_timeout_ms: u64,
    pub drain_timeout_secs: u64,
    /// 0 disables the periodic counters report
    pub stats_interval_secs: u64,
    pub filter: FilterConfig,
}

/// Admission and audit rule lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Case-sensitive host prefixes admitted for parsing
    pub host_prefixes: Vec<String>,
    /// HTTP methods admitted for parsing (case-insensitive)
    pub methods: Vec<String>,
    pub ignore_apis: Vec<String>,
    pub ignore_concepts: Vec<String>,
    pub ignore_actions: Vec<String>,
}

pub const DEFAULT_EVENT_TABLE: &str = "event_logs";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_MESSAGE_NAME: &str = "audit-response";

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            event_table: DEFAULT_EVENT_TABLE.to_string(),
            mode: SourceMode::Stream,
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            message_name: DEFAULT_MESSAGE_NAME.to_string(),
            workers: 25,
            queue_depth: 100,
            persist_timeout_ms: 5000,
            drain_timeout_secs: 10,
            stats_interval_secs: 60,
            filter: FilterConfig::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            host_prefixes: strings(&["api", "vk"]),
            methods: strings(&["put", "post", "patch", "delete"]),
            ignore_apis: strings(&["authenticate", "mobile_devices", "report", "jobs"]),
            ignore_concepts: strings(&["send_sempro_message", "disconnect", "armed_status", "cancel"]),
            ignore_actions: strings(&["refresh", "activate", "sign_in"]),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.host_prefixes.is_empty() {
            return Err("filter.host_prefixes must not be empty".to_string());
        }
        if self.host_prefixes.iter().any(|p| p.is_empty()) {
            return Err("filter.host_prefixes must not contain an empty prefix".to_string());
        }
        if self.methods.is_empty() {
            return Err("filter.methods must not be empty".to_string());
        }
        Ok(())
    }
}
