use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::PathBuf;

use receiptscan::detection::{ocr, preprocessing};
use receiptscan::{render, DebugConfig, DetectionConfig, RectPipeline, RegionText};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OcrMode {
    /// Skip text recognition
    Off,
    /// Recognize the whole image
    Image,
    /// Recognize each detected rectangle separately
    Regions,
}

#[derive(Parser)]
#[command(name = "receiptscan")]
#[command(about = "Find receipt and label rectangles in a photo and read their text")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Detection parameters as JSON (missing fields use defaults)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upper Canny threshold for the edge level
    #[arg(long)]
    canny_threshold: Option<f32>,

    /// Threshold levels per channel (edge level included)
    #[arg(long)]
    levels: Option<u32>,

    /// Minimum rectangle area in pixels
    #[arg(long)]
    min_area: Option<f64>,

    /// Maximum |cos| of any corner angle
    #[arg(long)]
    max_cosine: Option<f64>,

    /// Polygon approximation tolerance as a fraction of the perimeter
    #[arg(long)]
    epsilon: Option<f64>,

    /// Merge rectangles whose corners are all within this many pixels
    #[arg(long, value_name = "PX")]
    dedup: Option<f64>,

    /// Process channel/level combinations in parallel
    #[arg(long)]
    parallel: bool,

    /// Sharpen the image before detection and OCR
    #[arg(long, value_name = "STRENGTH")]
    sharpen: Option<f32>,

    /// Write the image with detected rectangles outlined
    #[arg(long, value_name = "FILE")]
    draw: Option<PathBuf>,

    /// Write the (sharpened) working image as TIFF
    #[arg(long, value_name = "FILE")]
    tiff: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// What to run OCR on
    #[arg(long, value_enum, default_value_t = OcrMode::Image)]
    ocr: OcrMode,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,
}

impl Cli {
    fn detection_config(&self) -> anyhow::Result<DetectionConfig> {
        let mut config = match &self.config {
            Some(path) => DetectionConfig::from_json_file(path)?,
            None => DetectionConfig::default(),
        };
        if let Some(v) = self.canny_threshold {
            config.canny_threshold = v;
        }
        if let Some(v) = self.levels {
            config.threshold_levels = v;
        }
        if let Some(v) = self.min_area {
            config.min_area = v;
        }
        if let Some(v) = self.max_cosine {
            config.max_cosine = v;
        }
        if let Some(v) = self.epsilon {
            config.epsilon_fraction = v;
        }
        if self.dedup.is_some() {
            config.dedup_tolerance = self.dedup;
        }
        config.parallel |= self.parallel;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!("Loading image: {:?}", args.image_path);
    let mut img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    log::info!("Image loaded: {}x{}", img.width(), img.height());

    if let Some(strength) = args.sharpen {
        log::info!("Sharpening with strength {}", strength);
        img = preprocessing::sharpen_dynamic(&img, strength);
    }

    if let Some(tiff_path) = &args.tiff {
        render::save_tiff(&img, tiff_path)?;
        log::info!("Saved TIFF to {:?}", tiff_path);
    }

    let mut pipeline = RectPipeline::new(args.detection_config()?)?;
    if let Some(debug_dir) = &args.debug_out {
        pipeline = pipeline.with_debug(DebugConfig::new(debug_dir)?);
    }

    let results = pipeline.detect_dynamic(&img)?;

    println!("=== Rectangle Detection Results ===");
    println!("Total rectangles detected: {}", results.len());
    for (i, det) in results.iter().enumerate() {
        let corners: Vec<String> = det
            .corners()
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect();
        println!(
            "  Rectangle {} [channel {}, level {}]: {}",
            i + 1,
            det.channel,
            det.level,
            corners.join(" ")
        );
    }

    if let Some(draw_path) = &args.draw {
        let overlay = render::draw_polygons(&img, results.polygons());
        overlay
            .save(draw_path)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay: {}", e))?;
        log::info!("Saved overlay to {:?}", draw_path);
    }

    if args.ocr == OcrMode::Off {
        return Ok(());
    }

    let model_dir = match &args.model_dir {
        Some(dir) => dir.clone(),
        None => ocr::default_model_dir()?,
    };
    log::info!("Initializing OCR engine from {:?}", model_dir);
    let engine = ocr::init_ocr_engine(&model_dir)?;

    let texts: Vec<RegionText> = match args.ocr {
        OcrMode::Regions => ocr::recognize_regions(&engine, &img, results.polygons())?,
        _ => ocr::recognize_text(&engine, &img)?
            .map(|text| RegionText { bbox: None, text })
            .into_iter()
            .collect(),
    };

    println!("\n=== Recognized Text ===");
    if texts.is_empty() {
        println!("No text detected.");
    }
    for region in &texts {
        if let Some(bbox) = &region.bbox {
            println!(
                "--- region at ({}, {}) {}x{} ---",
                bbox.x, bbox.y, bbox.width, bbox.height
            );
        }
        println!("{}", region.text);
    }

    Ok(())
}
