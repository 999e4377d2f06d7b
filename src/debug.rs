use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::error::{DetectionError, Result};

/// Where intermediate images of a detection run are written
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent; it is created if missing
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(DetectionError::Io(std::io::Error::other(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                ))));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Directory for one stage, e.g. `02_masks`
    pub fn stage_dir(&self, stage_index: usize, stage_name: &str) -> PathBuf {
        let name = format!(
            "{:02}_{}",
            stage_index,
            stage_name.to_lowercase().replace(' ', "_")
        );
        self.output_dir.join(name)
    }

    /// Save `img` as `<stage dir>/<file_name>` and return the written path
    pub fn save(
        &self,
        stage_index: usize,
        stage_name: &str,
        file_name: &str,
        img: &DynamicImage,
    ) -> Result<PathBuf> {
        let step_dir = self.stage_dir(stage_index, stage_name);
        std::fs::create_dir_all(&step_dir)?;
        let output_path = step_dir.join(file_name);
        img.save(&output_path)?;
        log::debug!("debug: saved {}", relative(&self.output_dir, &output_path));
        Ok(output_path)
    }
}

/// File name for the mask of one (channel, level) pair, e.g. `c0-l03.png`
pub fn mask_file_name(channel: usize, level: usize) -> String {
    format!("c{}-l{:02}.png", channel, level)
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
