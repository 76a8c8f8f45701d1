use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::images::{handlers, services::ImageService};

pub fn routes(service: Arc<ImageService>) -> Router {
    Router::new()
        .route("/api/images/compress", post(handlers::compress_images))
        .with_state(service)
}
