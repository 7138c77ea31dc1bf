//! Conversion API Module
//!
//! Request and outcome types for one batch run.

use image::ImageFormat;
use shared_utils::img_errors::FileError;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// Subfolder created under the source directory when no output directory is
/// given. Entries with this stem are never converted.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "converted_images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    Jpeg,
    #[default]
    Png,
}

impl TargetFormat {
    pub fn from_jpeg_flag(to_jpeg: bool) -> Self {
        if to_jpeg {
            TargetFormat::Jpeg
        } else {
            TargetFormat::Png
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Jpeg => write!(f, "JPEG"),
            TargetFormat::Png => write!(f, "PNG"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_directory: PathBuf,
    pub target_format: TargetFormat,
    /// `None` means `<source_directory>/converted_images`, which must not exist yet.
    pub output_directory: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(source_directory: impl Into<PathBuf>, target_format: TargetFormat) -> Self {
        Self {
            source_directory: source_directory.into(),
            target_format,
            output_directory: None,
        }
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }
}

/// `<output_dir>/<stem>.<jpeg|png>`, keeping the stem's raw bytes so
/// non-UTF-8 names stay distinct.
pub fn output_path(output_dir: &Path, stem: &OsStr, target: TargetFormat) -> PathBuf {
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(target.extension());
    output_dir.join(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Converted,
    Skipped,
    Failed,
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file_name: String,
    pub status: OutcomeStatus,
    pub error: Option<FileError>,
    pub output_path: Option<PathBuf>,
}

impl FileOutcome {
    pub fn converted(file_name: String, output_path: PathBuf) -> Self {
        Self {
            file_name,
            status: OutcomeStatus::Converted,
            error: None,
            output_path: Some(output_path),
        }
    }

    pub fn skipped(file_name: String) -> Self {
        Self {
            file_name,
            status: OutcomeStatus::Skipped,
            error: None,
            output_path: None,
        }
    }

    pub fn failed(file_name: String, error: FileError) -> Self {
        Self {
            file_name,
            status: OutcomeStatus::Failed,
            error: Some(error),
            output_path: None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

/// Everything one run produced, in directory-listing order.
#[derive(Debug)]
pub struct ConversionReport {
    pub output_dir: PathBuf,
    pub outcomes: Vec<FileOutcome>,
}

impl ConversionReport {
    pub fn outcome(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file_name == file_name)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
