use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DetectionError, Result};

/// Tunable parameters of the rectangle detector.
///
/// Defaults reproduce the behaviour of the original hard-coded detector:
/// Canny upper threshold 50, 11 threshold levels, minimum area 1000,
/// maximum corner cosine 0.3 and a polygon tolerance of 2% of the perimeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Upper hysteresis threshold for the level-0 Canny pass (lower is 0)
    pub canny_threshold: f32,

    /// Number of levels per channel: one edge mask plus `N - 1` binarizations
    pub threshold_levels: u32,

    /// Quadrilaterals with an absolute area at or below this are dropped
    pub min_area: f64,

    /// Largest accepted |cos| of any corner angle
    pub max_cosine: f64,

    /// Douglas-Peucker tolerance as a fraction of the contour perimeter
    pub epsilon_fraction: f64,

    /// Merge detections whose corners all lie within this many pixels.
    /// `None` keeps every detection.
    pub dedup_tolerance: Option<f64>,

    /// Run the (channel, level) combinations on the rayon thread pool
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            canny_threshold: 50.0,
            threshold_levels: 11,
            min_area: 1000.0,
            max_cosine: 0.3,
            epsilon_fraction: 0.02,
            dedup_tolerance: None,
            parallel: false,
        }
    }
}

impl DetectionConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold_levels == 0 {
            return Err(DetectionError::InvalidConfig(
                "threshold_levels must be at least 1".to_string(),
            ));
        }
        if !(self.canny_threshold.is_finite() && self.canny_threshold >= 0.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "canny_threshold must be a non-negative number, got {}",
                self.canny_threshold
            )));
        }
        if !(self.min_area.is_finite() && self.min_area >= 0.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        if !(self.max_cosine > 0.0 && self.max_cosine <= 1.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "max_cosine must be in (0, 1], got {}",
                self.max_cosine
            )));
        }
        if !(self.epsilon_fraction.is_finite() && self.epsilon_fraction > 0.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "epsilon_fraction must be positive, got {}",
                self.epsilon_fraction
            )));
        }
        if let Some(tol) = self.dedup_tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(DetectionError::InvalidConfig(format!(
                    "dedup_tolerance must be non-negative, got {}",
                    tol
                )));
            }
        }
        Ok(())
    }
}
