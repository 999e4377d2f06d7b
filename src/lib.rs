pub mod config;
pub mod debug;
pub mod detection;
pub mod error;
pub mod models;
pub mod render;

pub use config::DetectionConfig;
pub use debug::DebugConfig;
pub use detection::RectPipeline;
pub use error::{DetectionError, Result};
pub use models::{BoundingBox, Polygon, RectDetection, RegionText, ResultSet};
