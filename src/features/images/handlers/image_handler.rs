use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::images::dtos::{CompressImagesDto, ImageOutcomeDto};
use crate::features::images::services::ImageService;
use crate::shared::types::ApiResponse;

/// Compress uploaded images for embedding in a report
///
/// Accepts multipart/form-data with one or more `file` parts. Every file is
/// processed independently and gets its own outcome entry; a file that fails
/// compression does not abort the others.
#[utoipa::path(
    post,
    path = "/api/images/compress",
    tag = "images",
    request_body(
        content = CompressImagesDto,
        content_type = "multipart/form-data",
        description = "One or more image files to compress",
    ),
    responses(
        (status = 200, description = "Per-file compression outcomes", body = ApiResponse<Vec<ImageOutcomeDto>>),
        (status = 400, description = "Malformed multipart request")
    )
)]
pub async fn compress_images(
    State(service): State<Arc<ImageService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<ImageOutcomeDto>>>> {
    let mut outcomes: Vec<ImageOutcomeDto> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name != "file" {
            // Ignore unknown fields
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        match service.compress(data.to_vec(), content_type).await {
            Ok(out) => {
                tracing::info!(
                    "Compressed {}: {} -> {} bytes at quality {}",
                    file_name,
                    out.original_size,
                    out.compressed_size,
                    out.quality
                );
                outcomes.push(ImageOutcomeDto::ok(file_name, out));
            }
            Err(e) => {
                tracing::warn!("Compression failed for {}: {}", file_name, e);
                outcomes.push(ImageOutcomeDto::failed(file_name, e.to_string()));
            }
        }
    }

    if outcomes.is_empty() {
        return Err(AppError::BadRequest(
            "At least one 'file' part is required".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(Some(outcomes), None, None)))
}
