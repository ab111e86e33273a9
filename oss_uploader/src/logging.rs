use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::constants::{DEFAULT_LOG_LEVEL_CONSOLE, DEFAULT_LOG_LEVEL_FILE, LOG_FILE_PREFIX, PROGRAM_NAME};

const LOG_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3f%z";

#[derive(Clone, Debug, PartialEq)]
pub enum LoggingMode {
    Directory(PathBuf),
    File(PathBuf),
    Console,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub logging_mode: LoggingMode,
    pub use_json: bool,
    /// Filter used when `RUST_LOG` is not set.
    pub default_level: String,
    pub version: String,
}

impl LoggingConfig {
    /// Build the logging setup from the `--log` and `-v` command line options.
    ///
    /// A `--log` value that names an existing directory, or ends with a path
    /// separator, selects a directory; anything else is a log file.
    pub fn from_cli(log: Option<&Path>, verbose: u8, version: impl Into<String>) -> Self {
        let logging_mode = match log {
            None => LoggingMode::Console,
            Some(p) if p.as_os_str().is_empty() => LoggingMode::Console,
            Some(p) => {
                let raw = p.to_string_lossy();
                if raw.ends_with('/') || raw.ends_with('\\') || p.is_dir() {
                    LoggingMode::Directory(p.to_path_buf())
                } else {
                    LoggingMode::File(p.to_path_buf())
                }
            },
        };

        let use_json = logging_mode != LoggingMode::Console;
        let base_level = if use_json {
            DEFAULT_LOG_LEVEL_FILE
        } else {
            DEFAULT_LOG_LEVEL_CONSOLE
        };

        Self {
            logging_mode,
            use_json,
            default_level: level_for_verbosity(base_level, verbose).to_owned(),
            version: version.into(),
        }
    }
}

/// Each `-v` raises the level one step above `base`, saturating at trace.
fn level_for_verbosity(base: &'static str, verbose: u8) -> &'static str {
    const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    let start = LEVELS.iter().position(|l| *l == base).unwrap_or(1);
    LEVELS[(start + verbose as usize).min(LEVELS.len() - 1)]
}

/// Install the global subscriber.  Should only be called once.
pub fn init_logging(cfg: LoggingConfig) {
    let log_file = match &cfg.logging_mode {
        LoggingMode::Directory(dir) => Some(log_file_in_dir(dir)),
        LoggingMode::File(path) => Some(path.clone()),
        LoggingMode::Console => None,
    };

    if let Some(log_file) = log_file {
        if let Err(e) = init_logging_to_file(&log_file, &cfg) {
            init_logging_to_console(&cfg);
            error!("Error logging to file {log_file:?} ({e}); falling back to console logging.");
        }
    } else {
        init_logging_to_console(&cfg);
    }

    info!("{PROGRAM_NAME} {}", cfg.version);
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_default()
}

fn init_logging_to_console(cfg: &LoggingConfig) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(&cfg.default_level));

    tracing_subscriber::registry().with(fmt_layer).init();
}

fn init_logging_to_file(path: &Path, cfg: &LoggingConfig) -> std::io::Result<()> {
    let default_name = format!("{LOG_FILE_PREFIX}.log");
    let (path, file_name) = match path.file_name() {
        Some(name) => (path.to_path_buf(), name.to_os_string()),
        None => (path.join(&default_name), OsStr::new(&default_name).to_os_string()),
    };

    let log_directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent.to_path_buf()
        },
        _ => PathBuf::from("."),
    };

    // Fail here, before the subscriber is installed, if the file is not writable.
    std::fs::OpenOptions::new().create(true).append(true).open(&path)?;

    let appender = tracing_appender::rolling::never(log_directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // The guard flushes pending lines on drop, so it lives for the whole process.
    static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_writer(writer);
    let filter = env_filter(&cfg.default_level);

    if cfg.use_json {
        tracing_subscriber::registry().with(fmt_layer.json().with_filter(filter)).init();
    } else {
        tracing_subscriber::registry().with(fmt_layer.with_filter(filter)).init();
    }

    Ok(())
}

/// Build `<prefix>_<YYYYMMDD>T<HHMMSS><mmm><+/-HHMM>_<pid>.log` in `dir`, using
/// local time with a numeric offset.
pub fn log_file_in_dir(dir: impl AsRef<Path>) -> PathBuf {
    let now_local: DateTime<Local> = Local::now();
    let now_fixed: DateTime<FixedOffset> = now_local.with_timezone(now_local.offset());
    let ts = now_fixed.format(LOG_FILE_TIMESTAMP_FORMAT);

    dir.as_ref().join(format!("{LOG_FILE_PREFIX}_{ts}_{}.log", std::process::id()))
}
