use image::DynamicImage;
pub use ocrs::{ImageSource, OcrEngine};
use ocrs::OcrEngineParams;
use rten::Model;
use std::path::{Path, PathBuf};

use crate::error::{DetectionError, Result};
use crate::models::{BoundingBox, Polygon, RegionText};

/// Regions smaller than this on either side are not worth recognizing
const MIN_REGION_SIDE: u32 = 8;

/// Default model directory: `$HOME/.cache/ocrs`
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| DetectionError::Ocr("neither HOME nor USERPROFILE is set".to_string()))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with the detection and recognition models in `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(DetectionError::Ocr(format!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        )));
    }

    let detection_model = Model::load_file(&detection_model_path)
        .map_err(|e| DetectionError::Ocr(format!("failed to load detection model: {}", e)))?;
    let recognition_model = Model::load_file(&recognition_model_path)
        .map_err(|e| DetectionError::Ocr(format!("failed to load recognition model: {}", e)))?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| DetectionError::Ocr(format!("failed to create OCR engine: {}", e)))
}

/// Recognize all text in an image; `Ok(None)` when nothing was read
pub fn recognize_text(engine: &OcrEngine, img: &DynamicImage) -> Result<Option<String>> {
    let rgb = img.to_rgb8();
    let img_source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
        .map_err(|e| DetectionError::Ocr(format!("unsupported image layout: {:?}", e)))?;
    let ocr_input = engine
        .prepare_input(img_source)
        .map_err(|e| DetectionError::Ocr(format!("failed to prepare OCR input: {}", e)))?;
    let text = engine
        .get_text(&ocr_input)
        .map_err(|e| DetectionError::Ocr(format!("text recognition failed: {}", e)))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

/// Crop the bounding box of a polygon, clamped to the image
pub fn crop_region(img: &DynamicImage, polygon: &Polygon) -> Option<(BoundingBox, DynamicImage)> {
    let bbox = polygon.bounding_box()?;
    if bbox.x >= img.width() || bbox.y >= img.height() {
        return None;
    }
    let width = bbox.width.min(img.width() - bbox.x);
    let height = bbox.height.min(img.height() - bbox.y);
    if width < MIN_REGION_SIDE || height < MIN_REGION_SIDE {
        return None;
    }
    let clamped = BoundingBox { width, height, ..bbox };
    Some((clamped, img.crop_imm(bbox.x, bbox.y, width, height)))
}

/// Recognize text inside each polygon's bounding box, skipping empty regions
pub fn recognize_regions<'a>(
    engine: &OcrEngine,
    img: &DynamicImage,
    polygons: impl IntoIterator<Item = &'a Polygon>,
) -> Result<Vec<RegionText>> {
    let mut results = Vec::new();
    for (i, polygon) in polygons.into_iter().enumerate() {
        let Some((bbox, roi)) = crop_region(img, polygon) else {
            log::warn!("region {} is too small or outside the image, skipped", i + 1);
            continue;
        };
        match recognize_text(engine, &roi)? {
            Some(text) => {
                log::debug!("region {} at ({}, {}): {:?}", i + 1, bbox.x, bbox.y, text);
                results.push(RegionText {
                    bbox: Some(bbox),
                    text,
                });
            }
            None => log::debug!("region {}: no text detected", i + 1),
        }
    }
    Ok(results)
}
