//! Batch Processing Module
//!
//! Directory listing and outcome bookkeeping for one-pass batch conversion.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every entry directly inside `dir` (files, directories, anything else),
/// sorted by file name. Does not descend into subdirectories.
pub fn list_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map(|e| e.into_path()).map_err(io::Error::from))
        .collect()
}

/// Last path component, lossily decoded.
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Counters for one pass over a directory.
///
/// Every entry lands in exactly one of `succeeded`, `failed` or `skipped`,
/// so `total` is always their sum.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries deliberately left alone (the output folder itself).
    pub skipped: usize,
    /// Failed entry and its rendered error, in processing order.
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a converted entry.
    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    /// Record a failed entry together with its error text.
    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    /// Record an entry that was not attempted.
    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    /// Percentage of entries that converted. An empty batch counts as 100%.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    /// Write the counters to the log. Nothing goes to the console.
    pub fn log_summary(&self, operation_name: &str) {
        tracing::info!(
            operation = operation_name,
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            success_rate = %format!("{:.1}%", self.success_rate()),
            "Batch finished"
        );
        for (path, error) in &self.errors {
            tracing::debug!(path = ?path, error = %error, "Failed entry");
        }
    }
}
