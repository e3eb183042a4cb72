//! Logging setup.
//!
//! Log records are JSON lines in a daily file. Nothing is logged to stdout,
//! which may carry the changelog; when no file can be opened the records go
//! to stderr instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const ENV_LOG_PATH: &str = "GHLOG_LOG_PATH";
const ENV_LOG_DIR: &str = "GHLOG_LOG_DIR";
const LOG_PREFIX: &str = env!("CARGO_PKG_NAME");
const LOG_SUFFIX: &str = "jsonl";

/// A daily log file: `{dir}/{prefix}.{date}.{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogFile {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl LogFile {
    fn in_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            prefix: LOG_PREFIX.to_string(),
            suffix: LOG_SUFFIX.to_string(),
        }
    }

    /// `/tmp/run.log` rolls over as `/tmp/run.<date>.log`.
    fn at_path(path: &Path) -> Result<Self> {
        let prefix = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("{ENV_LOG_PATH} has no usable file name: {}", path.display()))?;
        let suffix = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(LOG_SUFFIX);
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    fn appender(&self) -> Result<RollingFileAppender> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create log directory {}", self.dir.display()))?;
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(self.prefix.as_str())
            .filename_suffix(self.suffix.as_str())
            .build(&self.dir)
            .with_context(|| format!("cannot open log file in {}", self.dir.display()))
    }
}

/// Pick the log file: explicit path, then env dir, then config dir, then the
/// platform data dir. `None` means log to stderr.
fn choose_log_file(
    path: Option<PathBuf>,
    dir: Option<PathBuf>,
    config_dir: Option<&Path>,
    platform_dir: Option<PathBuf>,
) -> Result<Option<LogFile>> {
    if let Some(path) = path {
        return LogFile::at_path(&path).map(Some);
    }
    Ok(dir
        .or_else(|| config_dir.map(Path::to_path_buf))
        .or(platform_dir)
        .map(LogFile::in_dir))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn platform_log_dir() -> Option<PathBuf> {
    ghlog_core::config::user_data_local_dir().map(|dir| dir.into_std_path_buf().join("logs"))
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered records when dropped, so hold it
/// until `main` returns.
pub fn init(config_log_dir: Option<&Path>, filter: EnvFilter) -> Result<WorkerGuard> {
    let appender = choose_log_file(
        env_path(ENV_LOG_PATH),
        env_path(ENV_LOG_DIR),
        config_log_dir,
        platform_log_dir(),
    )
    .and_then(|file| file.map(|file| file.appender()).transpose());

    let (writer, guard) = match appender {
        Ok(Some(appender)) => tracing_appender::non_blocking(appender),
        Ok(None) => tracing_appender::non_blocking(std::io::stderr()),
        Err(err) => {
            eprintln!("warning: {err:#}; logging to stderr");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer),
        )
        .try_init()
        .context("failed to install the log subscriber")?;

    tracing::debug!("logging initialized");
    Ok(guard)
}

/// Build the filter: `-q`, then `-v`/`-vv`, then `RUST_LOG`, then the
/// configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 1) => EnvFilter::new("debug"),
        (false, 2..) => EnvFilter::new("trace"),
        (false, 0) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(env_filter(true, 2, "info").to_string(), "error");
    }

    #[test]
    fn verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 3, "info").to_string(), "trace");
    }

    #[test]
    fn log_path_wins_over_every_dir() {
        let chosen = choose_log_file(
            Some(PathBuf::from("/tmp/ghlog-runs/run.log")),
            Some(PathBuf::from("/tmp/env-dir")),
            Some(Path::new("/tmp/config-dir")),
            Some(PathBuf::from("/tmp/platform")),
        )
        .unwrap()
        .unwrap();

        assert_eq!(chosen.dir, PathBuf::from("/tmp/ghlog-runs"));
        assert_eq!(chosen.prefix, "run");
        assert_eq!(chosen.suffix, "log");
    }

    #[test]
    fn dirs_are_tried_in_order() {
        let env_dir = choose_log_file(
            None,
            Some(PathBuf::from("/tmp/env-dir")),
            Some(Path::new("/tmp/config-dir")),
            Some(PathBuf::from("/tmp/platform")),
        )
        .unwrap();
        assert_eq!(env_dir, Some(LogFile::in_dir(PathBuf::from("/tmp/env-dir"))));

        let config_dir = choose_log_file(
            None,
            None,
            Some(Path::new("/tmp/config-dir")),
            Some(PathBuf::from("/tmp/platform")),
        )
        .unwrap();
        assert_eq!(config_dir, Some(LogFile::in_dir(PathBuf::from("/tmp/config-dir"))));

        let platform = choose_log_file(None, None, None, Some(PathBuf::from("/tmp/platform")));
        assert_eq!(
            platform.unwrap(),
            Some(LogFile::in_dir(PathBuf::from("/tmp/platform")))
        );
    }

    #[test]
    fn nothing_configured_means_stderr() {
        assert_eq!(choose_log_file(None, None, None, None).unwrap(), None);
    }

    #[test]
    fn bare_file_name_logs_to_current_dir() {
        let file = LogFile::at_path(Path::new("trace")).unwrap();
        assert_eq!(file.dir, PathBuf::from("."));
        assert_eq!(file.prefix, "trace");
        assert_eq!(file.suffix, LOG_SUFFIX);
    }

    #[test]
    fn root_path_is_rejected() {
        let err = LogFile::at_path(Path::new("/")).unwrap_err();
        assert!(err.to_string().contains(ENV_LOG_PATH));
    }

    #[test]
    fn appender_creates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("logs");

        LogFile::in_dir(dir.clone()).appender().unwrap();
        assert!(dir.is_dir());
    }
}
