//! Shared Image Conversion Error Types
//!
//! Two tiers: [`FileError`] for a single directory entry (recorded, batch
//! continues) and [`ConvertError`] for the whole invocation (aborts).

use crate::error_handler::ErrorCategory;
use std::path::PathBuf;
use thiserror::Error;

/// Failure converting one directory entry. Every variant names the file.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("cannot decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot encode {file}: {source}")]
    Encode {
        file: String,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode HEIF {file}: {message}")]
    Heic { file: String, message: String },
}

impl FileError {
    pub fn file(&self) -> &str {
        match self {
            FileError::Decode { file, .. }
            | FileError::Encode { file, .. }
            | FileError::Io { file, .. }
            | FileError::Heic { file, .. } => file,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Recoverable
    }
}

/// Failure that stops the run before (or instead of) any conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("The specified directory '{}' does not exist.", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error(
        "Output folder '{}' already exists; remove it or pass --output",
        .path.display()
    )]
    OutputDirExists { path: PathBuf },

    #[error("Failed to create output directory '{}': {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Fatal
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
