//! Shared Utilities for the image conversion tools
//!
//! - Logging setup (tracing, rolling log file)
//! - Typed conversion errors and error reporting
//! - Directory listing and batch bookkeeping

pub mod batch;
pub mod error_handler;
pub mod img_errors;
pub mod logging;

pub use batch::{list_entries, BatchResult};
pub use error_handler::ErrorCategory;
pub use img_errors::{ConvertError, FileError};
