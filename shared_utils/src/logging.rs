//! Logging Module
//!
//! tracing-based logging shared by the conversion tools:
//! - log file in the system temp directory, rotated daily
//! - old log files pruned to a fixed count
//! - optional echo of log events to stderr (verbose runs)
//!
//! # Examples
//!
//! ```no_run
//! use shared_utils::logging::{LogConfig, init_logging};
//! use tracing::info;
//!
//! init_logging("img_convert", LogConfig::default()).expect("Failed to initialize logging");
//! info!("Program started");
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Where and how verbosely to log. Built with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Defaults to the system temp directory.
    pub log_dir: PathBuf,
    /// Number of `<program>.log*` files kept after pruning.
    pub max_files: usize,
    /// Level for the log file when `RUST_LOG` is not set.
    pub level: Level,
    /// Echo events at or above this level to stderr. `None` keeps stderr for
    /// user-facing messages only.
    pub stderr_level: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: std::env::temp_dir(),
            max_files: 5,
            level: Level::INFO,
            stderr_level: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write log files under `dir`; created on init if missing.
    pub fn with_log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Keep at most `count` log files of this program after init.
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Also echo events at `level` or above to stderr.
    pub fn with_stderr_level(mut self, level: Level) -> Self {
        self.stderr_level = Some(level);
        self
    }

    /// Filter directive used when `RUST_LOG` is not set: the program's own
    /// target plus the shared crate, both at the configured level.
    pub fn default_directive(&self, program_name: &str) -> String {
        format!(
            "{}={},shared_utils={}",
            program_name, self.level, self.level
        )
    }
}

/// Install the global subscriber.
///
/// Log file name: `{program_name}.log` (plus the appender's date suffix).
/// `RUST_LOG` overrides the file filter; the stderr echo only follows
/// `stderr_level`. Old files are pruned to `max_files` once the subscriber
/// is up.
///
/// # Errors
///
/// Fails if the log directory cannot be created or read, or if a global
/// subscriber is already installed.
pub fn init_logging(program_name: &str, config: LogConfig) -> Result<()> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

    let log_file_name = format!("{}.log", program_name);
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, &log_file_name);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive(program_name)));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let stderr_layer = config.stderr_level.map(|level| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .with_filter(LevelFilter::from_level(level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Logging already initialized")?;

    tracing::info!(
        program = program_name,
        log_dir = ?config.log_dir,
        log_file = log_file_name,
        max_files = config.max_files,
        level = ?config.level,
        "Logging system initialized"
    );

    cleanup_old_logs(&config.log_dir, program_name, config.max_files)?;

    Ok(())
}

/// Keep the newest `max_files` log files of `program_name`, delete the rest.
/// Returns how many files were removed.
///
/// A file belongs to the program when its name starts with `program_name`
/// and contains `.log`. Files that cannot be removed are logged and skipped.
pub fn cleanup_old_logs(log_dir: &Path, program_name: &str, max_files: usize) -> Result<usize> {
    use std::fs;

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {:?}", log_dir))?;

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_ours = path
            .file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.starts_with(program_name) && name.contains(".log")
            })
            .unwrap_or(false);
        if !is_ours {
            continue;
        }

        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    if log_files.len() <= max_files {
        return Ok(0);
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files) {
        match fs::remove_file(path) {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = ?path, "Removed old log file");
            }
            Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to remove old log file"),
        }
    }

    Ok(removed)
}
