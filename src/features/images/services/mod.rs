mod compression_service;

pub use compression_service::{
    compress_image, CompressionOutput, ImageError, ImageService, HARD_INPUT_LIMIT,
    MAX_DIMENSION, MAX_ENCODED_SIZE,
};
