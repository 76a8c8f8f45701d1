use std::io::Cursor;

use base64::prelude::*;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageReader};
use thiserror::Error;

/// Soft target for one encoded image string
pub const MAX_ENCODED_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Hard ceiling for raw uploads, rejected before any decode attempt
pub const HARD_INPUT_LIMIT: usize = MAX_ENCODED_SIZE * 2; // 10MB

/// Max width or height after resizing
pub const MAX_DIMENSION: u32 = 1200;

const QUALITY_START: u8 = 90;
const QUALITY_FLOOR: u8 = 10;
const QUALITY_STEP: u8 = 10;

/// Per-file failures; one bad file never aborts the rest of a batch.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported file type '{0}', expected an image")]
    UnsupportedType(String),

    #[error("file is too large ({0} bytes), maximum size is {limit}MB", limit = HARD_INPUT_LIMIT / (1024 * 1024))]
    TooLarge(usize),

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("failed to encode image: {0}")]
    EncodeFailed(String),

    #[error("image is too large even after compression")]
    CompressionFailed,

    #[error("compression task failed: {0}")]
    TaskFailed(String),
}

/// Everything the uploader needs for feedback ("compressed 73%")
#[derive(Debug, Clone)]
pub struct CompressionOutput {
    /// data:image/jpeg;base64,... string, ready to embed in a report
    pub data: String,
    pub original_size: usize,
    pub compressed_size: usize,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

/// Resize and re-encode one uploaded image into a size-bounded data URL.
///
/// The longer side is capped at [`MAX_DIMENSION`] (aspect ratio preserved,
/// never upscaled), then the image is JPEG-encoded at decreasing quality
/// steps until the encoded string fits [`MAX_ENCODED_SIZE`] or the quality
/// floor is reached.
pub fn compress_image(bytes: &[u8], mime_type: &str) -> Result<CompressionOutput, ImageError> {
    if !mime_type.starts_with("image/") {
        return Err(ImageError::UnsupportedType(mime_type.to_string()));
    }

    if bytes.len() > HARD_INPUT_LIMIT {
        return Err(ImageError::TooLarge(bytes.len()));
    }

    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?
        .decode()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    // JPEG has no alpha channel; flatten up front
    let image = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let image = if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        image
    };
    let (width, height) = (image.width(), image.height());

    let mut quality = QUALITY_START;
    let mut encoded = encode_jpeg_data_url(&image, quality)?;

    while encoded.len() > MAX_ENCODED_SIZE && quality > QUALITY_FLOOR {
        quality -= QUALITY_STEP;
        encoded = encode_jpeg_data_url(&image, quality)?;
    }

    if encoded.len() > MAX_ENCODED_SIZE {
        return Err(ImageError::CompressionFailed);
    }

    Ok(CompressionOutput {
        compressed_size: encoded.len(),
        data: encoded,
        original_size: bytes.len(),
        width,
        height,
        quality,
    })
}

fn encode_jpeg_data_url(image: &DynamicImage, quality: u8) -> Result<String, ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64_STANDARD.encode(&buf)
    ))
}

/// Service wrapper running the CPU-bound pipeline off the async runtime,
/// one blocking task per file.
pub struct ImageService;

impl ImageService {
    pub fn new() -> Self {
        Self
    }

    pub async fn compress(
        &self,
        bytes: Vec<u8>,
        mime_type: String,
    ) -> Result<CompressionOutput, ImageError> {
        tokio::task::spawn_blocking(move || compress_image(&bytes, &mime_type))
            .await
            .map_err(|e| ImageError::TaskFailed(e.to_string()))?
    }
}

impl Default for ImageService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_landscape_resized_to_longer_side_bound() {
        let input = png_bytes(2400, 1200);
        let out = compress_image(&input, "image/png").unwrap();
        assert_eq!(out.width, 1200);
        assert_eq!(out.height, 600);
    }

    #[test]
    fn test_portrait_resized_to_longer_side_bound() {
        let input = png_bytes(600, 2400);
        let out = compress_image(&input, "image/png").unwrap();
        assert_eq!(out.width, 300);
        assert_eq!(out.height, 1200);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let input = png_bytes(320, 200);
        let out = compress_image(&input, "image/png").unwrap();
        assert_eq!(out.width, 320);
        assert_eq!(out.height, 200);
    }

    #[test]
    fn test_output_is_bounded_data_url() {
        let input = png_bytes(1600, 900);
        let out = compress_image(&input, "image/png").unwrap();
        assert!(out.data.starts_with("data:image/jpeg;base64,"));
        assert!(out.compressed_size <= MAX_ENCODED_SIZE);
        assert_eq!(out.compressed_size, out.data.len());
        assert!(out.quality <= QUALITY_START && out.quality >= QUALITY_FLOOR);
        assert_eq!(out.original_size, input.len());
    }

    #[test]
    fn test_non_image_mime_rejected() {
        let err = compress_image(b"%PDF-1.4", "application/pdf").unwrap_err();
        assert!(matches!(err, ImageError::UnsupportedType(_)));
    }

    #[test]
    fn test_oversized_input_rejected_before_decode() {
        // 11MB of garbage; must fail on size, not on decoding
        let input = vec![0u8; 11 * 1024 * 1024];
        let err = compress_image(&input, "image/jpeg").unwrap_err();
        assert!(matches!(err, ImageError::TooLarge(_)));
    }

    #[test]
    fn test_undecodable_payload_rejected() {
        let err = compress_image(b"this is not an image", "image/png").unwrap_err();
        assert!(matches!(err, ImageError::DecodeFailed(_)));
    }

    #[tokio::test]
    async fn test_service_compresses_off_the_runtime() {
        let service = ImageService::new();
        let out = service
            .compress(png_bytes(1400, 700), "image/png".to_string())
            .await
            .unwrap();
        assert_eq!(out.width, 1200);
        assert_eq!(out.height, 600);
    }
}
