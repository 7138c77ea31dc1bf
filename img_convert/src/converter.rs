//! Directory Converter
//!
//! Decodes every entry of a directory and re-encodes it as JPEG or PNG.
//! One entry failing never stops the batch; only pre-flight problems
//! (missing input, unusable output directory) abort the run.

use crate::conversion_api::{
    output_path, ConversionReport, ConversionRequest, FileOutcome, OutcomeStatus, TargetFormat,
    DEFAULT_OUTPUT_DIR_NAME,
};
use image::{ColorType, DynamicImage, ImageReader};
use shared_utils::batch::{file_name_lossy, list_entries, BatchResult};
use shared_utils::error_handler::report_file_error;
use shared_utils::img_errors::{ConvertError, FileError, Result};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Convert every entry of `request.source_directory` to the target format.
///
/// Per-file failures are printed, logged and recorded as
/// [`OutcomeStatus::Failed`]; the returned report lists every entry.
pub fn convert_images_in_directory(request: &ConversionRequest) -> Result<ConversionReport> {
    let source = &request.source_directory;
    if !source.is_dir() {
        return Err(ConvertError::DirectoryNotFound {
            path: source.clone(),
        });
    }

    let output_dir = resolve_output_dir(source, request.output_directory.as_deref())?;

    // listed after the output folder exists so it shows up and is skipped
    let entries = list_entries(source).map_err(|e| ConvertError::ReadDir {
        path: source.clone(),
        source: e,
    })?;

    info!(
        source = %source.display(),
        output = %output_dir.display(),
        target = %request.target_format,
        entries = entries.len(),
        "Starting conversion"
    );

    let mut batch = BatchResult::new();
    let mut outcomes = Vec::with_capacity(entries.len());

    for entry in &entries {
        let outcome = convert_entry(entry, request.target_format, &output_dir);
        match outcome.status {
            OutcomeStatus::Converted => batch.success(),
            OutcomeStatus::Skipped => batch.skip(),
            OutcomeStatus::Failed => {
                if let Some(err) = &outcome.error {
                    report_file_error(err);
                }
                batch.fail(entry.clone(), outcome.error_message().unwrap_or_default());
            }
        }
        outcomes.push(outcome);
    }

    batch.log_summary("image conversion");

    Ok(ConversionReport {
        output_dir,
        outcomes,
    })
}

/// Pick and create the output directory.
///
/// Without an explicit directory, `<source>/converted_images` is created and
/// must not already exist. An explicit directory is created with its parents
/// if missing and reused otherwise.
pub fn resolve_output_dir(source: &Path, output: Option<&Path>) -> Result<PathBuf> {
    match output {
        None => {
            let dir = source.join(DEFAULT_OUTPUT_DIR_NAME);
            fs::create_dir(&dir).map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ConvertError::OutputDirExists { path: dir.clone() },
                _ => ConvertError::CreateOutputDir {
                    path: dir.clone(),
                    source: e,
                },
            })?;
            debug!(path = %dir.display(), "Created default output folder");
            Ok(dir)
        }
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| ConvertError::CreateOutputDir {
                path: dir.to_path_buf(),
                source: e,
            })?;
            Ok(dir.to_path_buf())
        }
    }
}

/// Convert a single directory entry. Never fails; errors land in the outcome.
pub fn convert_entry(path: &Path, target: TargetFormat, output_dir: &Path) -> FileOutcome {
    // lossy name for messages only; the output name uses the raw stem
    let file_name = file_name_lossy(path);
    let stem = path.file_stem().unwrap_or_default();

    if stem == DEFAULT_OUTPUT_DIR_NAME {
        debug!(file = %file_name, "Skipping output folder");
        return FileOutcome::skipped(file_name);
    }

    match convert_file(path, &file_name, stem, target, output_dir) {
        Ok(out) => {
            debug!(file = %file_name, output = %out.display(), "Converted");
            FileOutcome::converted(file_name, out)
        }
        Err(err) => FileOutcome::failed(file_name, err),
    }
}

fn convert_file(
    path: &Path,
    file_name: &str,
    stem: &OsStr,
    target: TargetFormat,
    output_dir: &Path,
) -> std::result::Result<PathBuf, FileError> {
    let img = decode_image(path, file_name)?;

    // encode fully before touching the output file
    let bytes = encode_image(&img, target).map_err(|source| FileError::Encode {
        file: file_name.to_string(),
        source,
    })?;

    let out = output_path(output_dir, stem, target);
    fs::write(&out, bytes).map_err(|source| FileError::Io {
        file: file_name.to_string(),
        source,
    })?;
    Ok(out)
}

/// Open `path` and decode it, sniffing the format from its content.
pub fn decode_image(path: &Path, file_name: &str) -> std::result::Result<DynamicImage, FileError> {
    #[cfg(feature = "heic")]
    if crate::heic::is_heif_file(path) {
        return crate::heic::decode_heif(path, file_name);
    }

    let io_err = |source| FileError::Io {
        file: file_name.to_string(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;

    reader.decode().map_err(|source| FileError::Decode {
        file: file_name.to_string(),
        source,
    })
}

/// Color layout the encoder for `target` gets.
///
/// JPEG has no alpha, so everything becomes 8-bit RGB. PNG keeps the image
/// as decoded; float buffers, which PNG cannot store, drop to 16 bits.
pub fn prepare_for_target(img: &DynamicImage, target: TargetFormat) -> Cow<'_, DynamicImage> {
    match target {
        TargetFormat::Jpeg => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        TargetFormat::Png => match img.color() {
            ColorType::Rgb32F => Cow::Owned(DynamicImage::ImageRgb16(img.to_rgb16())),
            ColorType::Rgba32F => Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16())),
            _ => Cow::Borrowed(img),
        },
    }
}

pub fn encode_image(img: &DynamicImage, target: TargetFormat) -> image::ImageResult<Vec<u8>> {
    let prepared = prepare_for_target(img, target);
    let mut buf = Cursor::new(Vec::new());
    prepared.write_to(&mut buf, target.image_format())?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, Rgba32FImage, RgbaImage};
    use tempfile::TempDir;

    fn write_rgba_png(path: &Path) {
        let img = RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 0])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    fn write_rgb_jpeg(path: &Path) {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 200, 30]));
        img.save_with_format(path, ImageFormat::Jpeg).unwrap();
    }

    fn setup_source() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_rgba_png(&dir.path().join("alpha.png"));
        write_rgb_jpeg(&dir.path().join("photo.jpg"));
        dir
    }

    #[test]
    fn test_jpeg_target_produces_three_channel_files() {
        let src = setup_source();
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Jpeg).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();
        assert_eq!(report.count(OutcomeStatus::Converted), 2);

        for stem in ["alpha", "photo"] {
            let path = out.path().join(format!("{}.jpeg", stem));
            let decoded = image::open(&path).unwrap();
            assert_eq!(decoded.color(), ColorType::Rgb8, "{} should be RGB", stem);
            assert!(!decoded.color().has_alpha());
        }
    }

    #[test]
    fn test_png_target_preserves_transparency() {
        let src = setup_source();
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        convert_images_in_directory(&request).unwrap();

        let converted = image::open(out.path().join("alpha.png")).unwrap();
        assert!(converted.color().has_alpha());
        assert_eq!(converted.get_pixel(0, 0)[3], 0);
        assert_eq!(converted.get_pixel(3, 3)[3], 255);

        let from_jpeg = image::open(out.path().join("photo.png")).unwrap();
        assert_eq!(from_jpeg.dimensions(), (8, 8));
    }

    #[test]
    fn test_non_image_file_fails_without_aborting() {
        let src = setup_source();
        fs::write(src.path().join("notes.txt"), "just some text").unwrap();
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();

        let notes = report.outcome("notes.txt").unwrap();
        assert_eq!(notes.status, OutcomeStatus::Failed);
        assert!(matches!(notes.error, Some(FileError::Decode { ref file, .. }) if file == "notes.txt"));
        assert!(notes.error_message().unwrap().contains("notes.txt"));
        assert!(!out.path().join("notes.png").exists());

        assert_eq!(report.count(OutcomeStatus::Converted), 2);
    }

    #[test]
    fn test_subdirectory_entry_fails_as_io() {
        let src = setup_source();
        fs::create_dir(src.path().join("raw")).unwrap();
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();

        let raw = report.outcome("raw").unwrap();
        assert_eq!(raw.status, OutcomeStatus::Failed);
        assert_eq!(raw.error.as_ref().map(|e| e.file()), Some("raw"));
        assert_eq!(report.count(OutcomeStatus::Converted), 2);
    }

    #[test]
    fn test_default_output_folder_first_and_second_run() {
        let src = TempDir::new().unwrap();
        // PNG bytes behind a HEIC name: decoding sniffs the content
        write_rgba_png(&src.path().join("photo.HEIC"));

        let request = ConversionRequest::new(src.path(), TargetFormat::Png);
        let report = convert_images_in_directory(&request).unwrap();

        let converted_dir = src.path().join(DEFAULT_OUTPUT_DIR_NAME);
        assert_eq!(report.output_dir, converted_dir);
        assert!(converted_dir.join("photo.png").exists());
        assert_eq!(
            report.outcome(DEFAULT_OUTPUT_DIR_NAME).map(|o| o.status),
            Some(OutcomeStatus::Skipped)
        );

        fs::remove_file(converted_dir.join("photo.png")).unwrap();
        let second = convert_images_in_directory(&request);
        assert!(matches!(second, Err(ConvertError::OutputDirExists { .. })));
        assert!(!converted_dir.join("photo.png").exists());
    }

    #[test]
    fn test_explicit_output_dir_overwrites_existing_file() {
        let src = TempDir::new().unwrap();
        write_rgba_png(&src.path().join("photo.heic"));
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("photo.png"), b"stale").unwrap();

        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());
        convert_images_in_directory(&request).unwrap();

        let written = fs::read(out.path().join("photo.png")).unwrap();
        assert_ne!(written, b"stale");
        assert_eq!(image::load_from_memory(&written).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_explicit_output_dir_is_idempotent() {
        let src = setup_source();
        let base = TempDir::new().unwrap();
        let out = base.path().join("nested").join("out");
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Jpeg).with_output_directory(&out);

        convert_images_in_directory(&request).unwrap();
        let again = convert_images_in_directory(&request).unwrap();

        assert_eq!(again.count(OutcomeStatus::Converted), 2);
        assert!(out.join("photo.jpeg").exists());
    }

    #[test]
    fn test_missing_directory_creates_nothing() {
        let base = TempDir::new().unwrap();
        let missing = base.path().join("missing");
        let out = base.path().join("out");
        let request =
            ConversionRequest::new(&missing, TargetFormat::Png).with_output_directory(&out);

        let result = convert_images_in_directory(&request);
        assert!(matches!(result, Err(ConvertError::DirectoryNotFound { ref path }) if *path == missing));
        assert!(!missing.exists());
        assert!(!out.exists());
    }

    #[test]
    fn test_file_as_source_is_not_a_directory() {
        let base = TempDir::new().unwrap();
        let file = base.path().join("photo.png");
        write_rgba_png(&file);

        let result = convert_images_in_directory(&ConversionRequest::new(&file, TargetFormat::Png));
        assert!(matches!(result, Err(ConvertError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_converted_images_stem_is_skipped() {
        let src = setup_source();
        write_rgba_png(&src.path().join("converted_images.png"));
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();

        assert_eq!(
            report.outcome("converted_images.png").map(|o| o.status),
            Some(OutcomeStatus::Skipped)
        );
        assert!(!out.path().join("converted_images.png").exists());
    }

    #[test]
    fn test_same_stem_last_listed_wins() {
        let src = TempDir::new().unwrap();
        write_rgb_jpeg(&src.path().join("shot.jpg"));
        write_rgba_png(&src.path().join("shot.png"));
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();
        assert_eq!(report.count(OutcomeStatus::Converted), 2);

        // shot.png sorts after shot.jpg and overwrites its output
        let written = image::open(out.path().join("shot.png")).unwrap();
        assert_eq!(written.dimensions(), (4, 4));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_stems_get_distinct_outputs() {
        use std::os::unix::ffi::OsStrExt;

        let src = TempDir::new().unwrap();
        write_rgba_png(&src.path().join(OsStr::from_bytes(b"a\xff.png")));
        write_rgba_png(&src.path().join(OsStr::from_bytes(b"a\xfe.png")));
        let out = TempDir::new().unwrap();
        let request =
            ConversionRequest::new(src.path(), TargetFormat::Png).with_output_directory(out.path());

        let report = convert_images_in_directory(&request).unwrap();
        assert_eq!(report.count(OutcomeStatus::Converted), 2);

        let written = list_entries(out.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(out.path().join(OsStr::from_bytes(b"a\xff.png")).exists());
        assert!(out.path().join(OsStr::from_bytes(b"a\xfe.png")).exists());
    }

    #[test]
    fn test_resolve_output_dir_rejects_file_path() {
        let base = TempDir::new().unwrap();
        let file = base.path().join("occupied");
        fs::write(&file, b"x").unwrap();

        let result = resolve_output_dir(base.path(), Some(file.as_path()));
        assert!(matches!(result, Err(ConvertError::CreateOutputDir { .. })));
    }

    #[test]
    fn test_prepare_for_jpeg_drops_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        let prepared = prepare_for_target(&img, TargetFormat::Jpeg);
        assert_eq!(prepared.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_prepare_for_png_keeps_layout() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert!(matches!(prepare_for_target(&img, TargetFormat::Png), Cow::Borrowed(_)));
    }

    #[test]
    fn test_float_image_encodes_as_sixteen_bit_png() {
        let img = DynamicImage::ImageRgba32F(Rgba32FImage::from_pixel(
            2,
            2,
            Rgba([1.0, 0.5, 0.0, 0.5]),
        ));
        assert_eq!(prepare_for_target(&img, TargetFormat::Png).color(), ColorType::Rgba16);

        let bytes = encode_image(&img, TargetFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgba16);
    }

    #[test]
    fn test_decode_error_variants() {
        let dir = TempDir::new().unwrap();
        let garbage = dir.path().join("broken.png");
        fs::write(&garbage, b"\x89PNG\r\n\x1a\nnot really").unwrap();

        let err = decode_image(&garbage, "broken.png").unwrap_err();
        assert!(matches!(err, FileError::Decode { .. }));

        let missing = decode_image(&dir.path().join("gone.png"), "gone.png").unwrap_err();
        assert!(matches!(missing, FileError::Io { .. }));
    }
}
