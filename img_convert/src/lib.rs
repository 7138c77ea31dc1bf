pub mod conversion_api;
pub mod converter;
pub mod heic;

pub use conversion_api::{
    output_path, ConversionReport, ConversionRequest, FileOutcome, OutcomeStatus, TargetFormat,
    DEFAULT_OUTPUT_DIR_NAME,
};
pub use converter::{
    convert_entry, convert_images_in_directory, decode_image, encode_image, prepare_for_target,
    resolve_output_dir,
};

pub use shared_utils::img_errors::{ConvertError, FileError, Result};
