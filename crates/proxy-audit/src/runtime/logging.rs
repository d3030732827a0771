//! Logging — tracing subscriber setup.
//!
//! Output goes to stdout unless `LOGFILE` names a file, in which case it is
//! written through a non-blocking daily-rolling appender
//! (`<LOGFILE>.YYYY-MM-DD`). `LOG_FORMAT=json` switches to JSON lines.
//! Levels come from `RUST_LOG`, default `proxy_audit=info`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "proxy_audit=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid LOGFILE path {0:?}")]
    InvalidPath(PathBuf),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            file: lookup("LOGFILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }
}

/// Split a log file path into the appender's directory and file prefix.
fn appender_parts(path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_string()))
}

/// Initialise the tracing / logging subsystem.
///
/// The returned guard flushes the file writer when dropped; hold it for the
/// life of the process.
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (writer, guard) = match &settings.file {
        Some(path) => {
            let (dir, prefix) = appender_parts(path)?;
            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };
    let ansi = settings.file.is_none();

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(ansi).with_writer(writer))
            .try_init()?;
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_to_stdout() {
        let settings = LogSettings::from_lookup(|_| None);
        assert_eq!(settings, LogSettings::default());
    }

    #[test]
    fn test_settings_from_env() {
        let settings = LogSettings::from_lookup(|key| match key {
            "LOGFILE" => Some("/var/log/proxy-audit/audit.log".to_string()),
            "LOG_FORMAT" => Some("JSON".to_string()),
            _ => None,
        });
        assert_eq!(settings.file, Some(PathBuf::from("/var/log/proxy-audit/audit.log")));
        assert!(settings.json);
    }

    #[test]
    fn test_blank_logfile_ignored() {
        let settings = LogSettings::from_lookup(|key| (key == "LOGFILE").then(|| "  ".to_string()));
        assert_eq!(settings.file, None);
    }

    #[test]
    fn test_appender_parts() {
        let (dir, prefix) = appender_parts(Path::new("/var/log/audit.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(prefix, "audit.log");

        let (dir, prefix) = appender_parts(Path::new("audit.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(prefix, "audit.log");

        assert!(appender_parts(Path::new("/")).is_err());
    }
}
