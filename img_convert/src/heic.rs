//! HEIC/HEIF input support.
//!
//! Detection is by content: an ISO-BMFF `ftyp` box carrying a HEIF brand.
//! Decoding goes through libheif-rs and is only compiled with the `heic`
//! feature.

use std::io::Read;
use std::path::Path;

const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx", b"mif1", b"msf1",
];

/// True if the file starts with an `ftyp` box whose major brand is a HEIF brand.
pub fn is_heif_file(path: &Path) -> bool {
    let mut header = [0u8; 12];
    match std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut header)) {
        Ok(()) => is_heif_header(&header),
        Err(_) => false,
    }
}

fn is_heif_header(header: &[u8; 12]) -> bool {
    &header[4..8] == b"ftyp" && HEIF_BRANDS.iter().any(|brand| &header[8..12] == *brand)
}

#[cfg(feature = "heic")]
pub use decode::decode_heif;

#[cfg(feature = "heic")]
mod decode {
    use image::{DynamicImage, RgbImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
    use shared_utils::img_errors::FileError;
    use std::path::Path;

    /// Decode the primary image, keeping alpha when the file has it.
    pub fn decode_heif(path: &Path, file_name: &str) -> Result<DynamicImage, FileError> {
        let heif_err = |message: String| FileError::Heic {
            file: file_name.to_string(),
            message,
        };

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref())
            .map_err(|e| heif_err(format!("Failed to read HEIF container: {}", e)))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| heif_err(format!("Failed to get primary image: {}", e)))?;

        let has_alpha = handle.has_alpha_channel();
        let (chroma, channels) = if has_alpha {
            (RgbChroma::Rgba, 4usize)
        } else {
            (RgbChroma::Rgb, 3usize)
        };

        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(|e| heif_err(format!("Failed to decode: {}", e)))?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| heif_err("No interleaved RGB plane".to_string()))?;

        let width = plane.width;
        let height = plane.height;
        let row_len = width as usize * channels;

        // rows may be padded past width * channels
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            let row = row
                .get(..row_len)
                .ok_or_else(|| heif_err("Truncated pixel row".to_string()))?;
            pixels.extend_from_slice(row);
        }

        let image = if has_alpha {
            RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        };
        image.ok_or_else(|| heif_err("Pixel buffer does not match image size".to_string()))
    }
}
