mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from receiptscan for tests
pub use receiptscan::{
    BoundingBox, DetectionConfig, DetectionError, Polygon, RectDetection, RectPipeline, ResultSet,
};
