use serde::Serialize;
use utoipa::ToSchema;

use crate::features::images::services::CompressionOutput;

/// Schema-only DTO documenting the multipart/form-data request.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CompressImagesDto {
    /// One or more image files to compress
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// One successfully compressed image
#[derive(Debug, Serialize, ToSchema)]
pub struct CompressedImageDto {
    /// data:image/jpeg;base64,... string, ready to embed in a report
    pub data: String,
    pub original_size: usize,
    pub compressed_size: usize,
    pub width: u32,
    pub height: u32,
    /// Final JPEG quality factor (10..=90)
    pub quality: u8,
}

impl From<CompressionOutput> for CompressedImageDto {
    fn from(out: CompressionOutput) -> Self {
        Self {
            data: out.data,
            original_size: out.original_size,
            compressed_size: out.compressed_size,
            width: out.width,
            height: out.height,
            quality: out.quality,
        }
    }
}

/// Per-file outcome; failures are reported next to successes so one bad
/// file never aborts the batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageOutcomeDto {
    pub file_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CompressedImageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageOutcomeDto {
    pub fn ok(file_name: String, out: CompressionOutput) -> Self {
        Self {
            file_name,
            success: true,
            image: Some(out.into()),
            error: None,
        }
    }

    pub fn failed(file_name: String, message: String) -> Self {
        Self {
            file_name,
            success: false,
            image: None,
            error: Some(message),
        }
    }
}
