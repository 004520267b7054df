//! Shared observability helpers for binaries and integration tests.
//!
//! The logging initializer centralises our `tracing` setup so that every
//! binary emits into the same file sink and, optionally, standard output.
//! Call [`init_logging`] once near process start; additional callers are
//! treated as no-ops and simply receive the resolved log file path.
//!
//! Components log under their own `target` (`marquee.scraper`,
//! `marquee.orchestrator`, ...) so a single `RUST_LOG` directive can scope
//! output per component.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for the default file name).
    pub app_name: &'static str,
    /// Optional explicit directory for log output. If `None`, we consult
    /// `MARQUEE_LOG_DIR` and finally fall back to the working directory.
    pub log_dir: Option<PathBuf>,
    /// File name inside the log directory; defaults to `<app_name>.log`.
    pub file_name: Option<String>,
    /// Whether to duplicate events to `stdout` in addition to the file sink.
    pub emit_stdout: bool,
    /// Preferred log encoding.
    pub format: LogFormat,
    /// Default filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "marquee",
            log_dir: None,
            file_name: None,
            emit_stdout: true,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    fn resolved_file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.log", self.app_name))
    }
}

/// Initialise the global `tracing` subscriber.
///
/// The file sink is never rotated; each run appends to the same file.
/// Returns the concrete log file path. Subsequent calls hand back the
/// originally resolved location without touching the subscriber.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let resolved_dir = resolve_log_dir(config.log_dir.as_deref());
    std::fs::create_dir_all(&resolved_dir)
        .with_context(|| format!("failed to create log directory: {}", resolved_dir.display()))?;

    let log_filename = config.resolved_file_name();
    let full_path = resolved_dir.join(&log_filename);

    let appender = rolling::never(&resolved_dir, &log_filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    match (config.format, config.emit_stdout) {
        (LogFormat::Text, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
        }
        (LogFormat::Text, true) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(fmt::layer().with_writer(std::io::stdout))
                .try_init()
                .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
        }
        (LogFormat::Json, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .try_init()
                .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
        }
        (LogFormat::Json, true) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .with(fmt::layer().json().with_writer(std::io::stdout))
                .try_init()
                .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
        }
    }

    let _ = LOG_PATH.set(full_path.clone());
    Ok(full_path)
}

fn resolve_log_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }

    if let Ok(env_dir) = std::env::var("MARQUEE_LOG_DIR") {
        return expand_home(Path::new(&env_dir));
    }

    PathBuf::from(".")
}

fn expand_home(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_log_dir(Some(dir.path())), dir.path());
    }

    #[test]
    fn absolute_paths_are_not_expanded() {
        assert_eq!(
            expand_home(Path::new("/var/log/marquee")),
            PathBuf::from("/var/log/marquee")
        );
    }

    #[test]
    fn file_name_defaults_to_app_name() {
        let cfg = LogConfig::default();
        assert_eq!(cfg.resolved_file_name(), "marquee.log");

        let cfg = LogConfig {
            file_name: Some("agent.log".into()),
            ..LogConfig::default()
        };
        assert_eq!(cfg.resolved_file_name(), "agent.log");
    }
}
