use thiserror::Error;

/// Errors produced by the rectangle detection pipeline and its wrappers
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Input image has zero width/height or an unusable pixel buffer
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A mask does not match the dimensions of the image it was derived from
    #[error("invalid mask for channel {channel}, level {level}: {reason}")]
    InvalidMask {
        channel: usize,
        level: usize,
        reason: String,
    },

    /// Polygon has too few points for the requested computation
    #[error("invalid geometry: need at least {required} points, got {actual}")]
    InvalidGeometry { required: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
