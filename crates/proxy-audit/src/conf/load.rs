//! Load — config loading from file and environment variables.

use std::path::Path;
use std::str::FromStr;

use super::model::{AuditConfig, ConfigError, FilterConfig};
use crate::sink::sql::is_valid_table_name;

const CONFIG_CANDIDATES: &[&str] = &["/etc/proxy-audit/config.toml", "config.toml"];

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}

impl AuditConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match Self::config_path(&lookup) {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path);
                Self::from_file(&path)?
            }
            None => {
                tracing::info!("No config file found, using environment variables");
                Self::from_env_with(&lookup)?
            }
        };

        config.apply_env_overrides(&lookup)?;
        Ok(config)
    }

    /// `AUDIT_CONFIG_FILE` if set, otherwise the first existing default location.
    fn config_path(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(path) = lookup("AUDIT_CONFIG_FILE") {
            return Some(path);
        }
        CONFIG_CANDIDATES
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| p.to_string())
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load configuration from environment variables with defaults
    fn from_env_with(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup("AUDIT_MESSAGE_NAME") {
            config.message_name = v;
        }
        if let Some(v) = parse_env(lookup, "AUDIT_WORKERS")? {
            config.workers = v;
        }
        if let Some(v) = parse_env(lookup, "AUDIT_QUEUE_DEPTH")? {
            config.queue_depth = v;
        }
        if let Some(v) = parse_env(lookup, "AUDIT_PERSIST_TIMEOUT_MS")? {
            config.persist_timeout_ms = v;
        }
        if let Some(v) = parse_env(lookup, "AUDIT_DRAIN_TIMEOUT_SECS")? {
            config.drain_timeout_secs = v;
        }
        if let Some(v) = parse_env(lookup, "AUDIT_STATS_INTERVAL_SECS")? {
            config.stats_interval_secs = v;
        }
        Ok(config)
    }

    /// Environment variables override file config for critical settings
    fn apply_env_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(conn) = lookup("AUDIT_CONNECTION_STRING") {
            self.connection_string = conn;
        }
        if let Some(table) = lookup("AUDIT_EVENT_TABLE") {
            self.event_table = table;
        }
        if let Some(bind) = lookup("AUDIT_BIND_ADDRESS") {
            self.bind_address = bind;
        }
        if let Some(port) = parse_env(lookup, "AUDIT_PORT")? {
            self.port = port;
        }
        if let Some(mode) = parse_env(lookup, "AUDIT_MODE")? {
            self.mode = mode;
        }
        Ok(())
    }

    /// `bind_address:port` for the message listener.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), String> {
        if self.connection_string.trim().is_empty() {
            return Err("connection_string must be set (AUDIT_CONNECTION_STRING)".to_string());
        }
        if !is_valid_table_name(&self.event_table) {
            return Err(format!("event_table {:?} is not a valid table identifier", self.event_table));
        }
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }
        if self.queue_depth == 0 {
            return Err("queue_depth must be > 0".to_string());
        }
        if self.persist_timeout_ms == 0 {
            return Err("persist_timeout_ms must be > 0".to_string());
        }
        if self.mode.listens() {
            if self.bind_address.is_empty() {
                return Err("bind_address must not be empty".to_string());
            }
            if self.message_name.is_empty() {
                return Err("message_name must not be empty".to_string());
            }
        }
        FilterConfig::validate(&self.filter)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::conf::SourceMode;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn valid() -> AuditConfig {
        AuditConfig {
            connection_string: "postgres://audit@localhost/audit".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_env_reads_tuning_values() {
        let cfg = AuditConfig::from_env_with(&env(&[("AUDIT_WORKERS", "4"), ("AUDIT_QUEUE_DEPTH", "8")])).unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.queue_depth, 8);
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn test_from_env_rejects_garbage_number() {
        let err = AuditConfig::from_env_with(&env(&[("AUDIT_WORKERS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "AUDIT_WORKERS", .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AuditConfig::default();
        cfg.apply_env_overrides(&env(&[
            ("AUDIT_CONNECTION_STRING", "postgres://x/y"),
            ("AUDIT_EVENT_TABLE", "audit.events"),
            ("AUDIT_PORT", "9100"),
            ("AUDIT_MODE", "agent"),
        ]))
        .unwrap();
        assert_eq!(cfg.connection_string, "postgres://x/y");
        assert_eq!(cfg.event_table, "audit.events");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.mode, SourceMode::Agent);
    }

    #[test]
    fn test_env_override_bad_port() {
        let mut cfg = AuditConfig::default();
        let err = cfg.apply_env_overrides(&env(&[("AUDIT_PORT", "70000")])).unwrap_err();
        assert!(err.to_string().contains("AUDIT_PORT"));
    }

    #[test]
    fn test_load_from_explicit_file_with_override() {
        let path = std::env::temp_dir().join(format!("proxy-audit-test-{}.toml", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "connection_string = \"postgres://file/db\"").unwrap();
            writeln!(file, "workers = 3").unwrap();
        }
        let path_str = path.to_string_lossy().to_string();

        let cfg = AuditConfig::load_with(env(&[
            ("AUDIT_CONFIG_FILE", path_str.as_str()),
            ("AUDIT_CONNECTION_STRING", "postgres://env/db"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.connection_string, "postgres://env/db");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = AuditConfig::load_with(env(&[("AUDIT_CONFIG_FILE", "/nonexistent/proxy-audit.toml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_default_requires_connection_string() {
        let err = AuditConfig::default().validate().unwrap_err();
        assert!(err.contains("connection_string"), "{}", err);
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_table() {
        let cfg = AuditConfig {
            event_table: "event_logs; DROP TABLE users".into(),
            ..valid()
        };
        assert!(cfg.validate().unwrap_err().contains("event_table"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let cfg = AuditConfig { workers: 0, ..valid() };
        assert!(cfg.validate().unwrap_err().contains("workers"));
        let cfg = AuditConfig { queue_depth: 0, ..valid() };
        assert!(cfg.validate().unwrap_err().contains("queue_depth"));
    }

    #[test]
    fn test_listen_address() {
        let cfg = AuditConfig {
            bind_address: "127.0.0.1".into(),
            port: 9001,
            ..valid()
        };
        assert_eq!(cfg.listen_address(), "127.0.0.1:9001");
    }
}
