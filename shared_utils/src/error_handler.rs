//! Error reporting for batch conversion.
//!
//! ## Categories
//! - Recoverable: one file failed, report it and move to the next entry
//! - Fatal: the run cannot continue, report it and exit non-zero

use crate::img_errors::{ConvertError, FileError};
use std::fmt;
use std::panic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Recoverable,
    Fatal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Recoverable => write!(f, "RECOVERABLE"),
            ErrorCategory::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Render an error followed by its `source()` chain, one cause per line.
pub fn format_error_chain<E: std::error::Error + ?Sized>(error: &E) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    let mut level = 1;
    while let Some(err) = source {
        out.push_str(&format!("\n   {}. Caused by: {}", level, err));
        source = err.source();
        level += 1;
    }
    out
}

/// Print a per-file failure the way the batch loop reports it and log it
/// under the error's own category.
pub fn report_file_error(error: &FileError) {
    eprintln!("Error converting {}: {}", error.file(), root_cause(error));
    tracing::warn!(
        file = error.file(),
        category = %error.category(),
        error = %format_error_chain(error),
        "Conversion failed"
    );
}

/// Print a run-aborting error with its cause chain and log it.
pub fn report_fatal(error: &ConvertError) {
    let rendered = format_error_chain(error);
    eprintln!("Error: {}", rendered);
    tracing::error!(category = %error.category(), "{}", rendered);
}

/// The innermost error text; codec messages are the useful part for users.
fn root_cause<E: std::error::Error + ?Sized>(error: &E) -> String {
    let mut current: &dyn std::error::Error = match error.source() {
        Some(src) => src,
        None => return error.to_string(),
    };
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "Unknown location".to_string());

        tracing::error!("PANIC: {} at {}", message, location);

        default_hook(panic_info);
    }));
}
