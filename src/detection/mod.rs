pub mod contours;
pub mod dedup;
pub mod edges;
pub mod ocr;
pub mod preprocessing;
pub mod quads;

use image::{DynamicImage, GrayImage, ImageBuffer, Pixel};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::DetectionConfig;
use crate::debug::{mask_file_name, DebugConfig};
use crate::error::{DetectionError, Result};
use crate::models::{Polygon, RectDetection, ResultSet};
use crate::render;
use edges::{BinaryMask, EdgeExtractor};
use preprocessing::WorkingImage;
use quads::QuadFilter;

const STAGE_INPUT: (usize, &str) = (0, "input");
const STAGE_SMOOTHED: (usize, &str) = (1, "smoothed");
const STAGE_MASKS: (usize, &str) = (2, "masks");
const STAGE_RECTANGLES: (usize, &str) = (3, "rectangles");

/// Rectangle detector: smoothing, per-channel edge and threshold masks,
/// contour extraction and quadrilateral filtering
pub struct RectPipeline {
    config: DetectionConfig,
    extractor: EdgeExtractor,
    quad_filter: QuadFilter,
    debug: Option<DebugConfig>,
}

impl RectPipeline {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: EdgeExtractor::new(&config),
            quad_filter: QuadFilter::new(&config),
            config,
            debug: None,
        })
    }

    /// Write intermediate images of every run into `debug`
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect on a decoded image: luma images use one channel, anything else three
    pub fn detect_dynamic(&self, img: &DynamicImage) -> Result<ResultSet> {
        match preprocessing::to_working_image(img) {
            WorkingImage::Gray(gray) => self.detect(&gray),
            WorkingImage::Rgb(rgb) => self.detect(&rgb),
        }
    }

    /// Run the full detection. Any stage failure aborts the run.
    pub fn detect<P>(&self, img: &ImageBuffer<P, Vec<u8>>) -> Result<ResultSet>
    where
        P: Pixel<Subpixel = u8> + Send + Sync,
        ImageBuffer<P, Vec<u8>>: Into<DynamicImage>,
    {
        let (width, height) = img.dimensions();
        let channels = P::CHANNEL_COUNT as usize;
        info!(
            "Detecting rectangles in {}x{} image ({} channels, {} levels)",
            width,
            height,
            channels,
            self.extractor.levels()
        );

        debug!("Smoothing image...");
        let smoothed = preprocessing::smooth(img)?;
        if let Some(dbg) = &self.debug {
            dbg.save(STAGE_INPUT.0, STAGE_INPUT.1, "01.png", &img.clone().into())?;
            dbg.save(STAGE_SMOOTHED.0, STAGE_SMOOTHED.1, "01.png", &smoothed.clone().into())?;
        }

        // Masks -> contours -> quads for every (channel, level)
        let mut detections = if self.config.parallel {
            self.detect_parallel(&smoothed)?
        } else {
            self.detect_sequential(&smoothed)?
        };
        info!("Found {} rectangles", detections.len());

        if let Some(tolerance) = self.config.dedup_tolerance {
            let before = detections.len();
            detections = dedup::dedup_by_corners(detections, tolerance);
            info!(
                "Merged duplicates within {:.1}px: {} -> {} rectangles",
                tolerance,
                before,
                detections.len()
            );
        }

        let results = ResultSet::from_detections(detections);
        // Overlay on the unsmoothed input
        if let Some(dbg) = &self.debug {
            let overlay = render::draw_polygons(&img.clone().into(), results.polygons());
            dbg.save(
                STAGE_RECTANGLES.0,
                STAGE_RECTANGLES.1,
                "01.png",
                &DynamicImage::ImageRgb8(overlay),
            )?;
        }

        Ok(results)
    }

    fn detect_sequential<P>(&self, smoothed: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<RectDetection>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let mut detections = Vec::new();
        for mask in self.extractor.extract_masks(smoothed) {
            let mask = mask?;
            detections.extend(self.process_mask(&mask, smoothed.dimensions())?);
        }
        Ok(detections)
    }

    /// Combinations are independent; the indexed collect keeps (channel, level) order
    fn detect_parallel<P>(&self, smoothed: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<RectDetection>>
    where
        P: Pixel<Subpixel = u8> + Send + Sync,
    {
        let channels = P::CHANNEL_COUNT as usize;
        let levels = self.extractor.levels();
        let planes: Vec<GrayImage> = (0..channels)
            .map(|c| preprocessing::extract_channel(smoothed, c))
            .collect::<Result<_>>()?;

        let per_mask: Vec<Vec<RectDetection>> = (0..channels * levels)
            .into_par_iter()
            .map(|index| {
                let (channel, level) = (index / levels, index % levels);
                let mask = self.extractor.mask_for(&planes[channel], channel, level);
                self.process_mask(&mask, smoothed.dimensions())
            })
            .collect::<Result<_>>()?;

        Ok(per_mask.into_iter().flatten().collect())
    }

    fn process_mask(&self, mask: &BinaryMask, expected: (u32, u32)) -> Result<Vec<RectDetection>> {
        if mask.image.dimensions() != expected {
            return Err(DetectionError::InvalidMask {
                channel: mask.channel,
                level: mask.level,
                reason: format!(
                    "mask is {:?} but the source image is {:?}",
                    mask.image.dimensions(),
                    expected
                ),
            });
        }

        if let Some(dbg) = &self.debug {
            dbg.save(
                STAGE_MASKS.0,
                STAGE_MASKS.1,
                &mask_file_name(mask.channel, mask.level),
                &DynamicImage::ImageLuma8(mask.image.clone()),
            )?;
        }

        let contours = contours::find_contours(&mask.image);
        let accepted = self.quad_filter.filter(&contours);
        debug!(
            "channel {} level {} ({:?}): {} contours, {} accepted",
            mask.channel,
            mask.level,
            mask.source,
            contours.len(),
            accepted.len()
        );

        Ok(accepted
            .into_iter()
            .map(|polygon| RectDetection {
                polygon,
                channel: mask.channel,
                level: mask.level,
            })
            .collect())
    }

    /// All masks of an image, in (channel, level) order (for debugging)
    pub fn masks<P>(&self, img: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<BinaryMask>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let smoothed = preprocessing::smooth(img)?;
        self.extractor.extract_masks(&smoothed).collect()
    }

    /// Raw contours of a single (channel, level) mask (for debugging)
    pub fn contours<P>(
        &self,
        img: &ImageBuffer<P, Vec<u8>>,
        channel: usize,
        level: usize,
    ) -> Result<Vec<Polygon>>
    where
        P: Pixel<Subpixel = u8>,
    {
        let smoothed = preprocessing::smooth(img)?;
        let plane = preprocessing::extract_channel(&smoothed, channel)?;
        let mask = self.extractor.mask_for(&plane, channel, level);
        Ok(contours::find_contours(&mask.image))
    }
}
