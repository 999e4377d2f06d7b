//! Integration tests for the (channel x level) mask ladder.

mod common;

use common::*;
use image::{GrayImage, Luma};
use receiptscan::detection::edges::{EdgeExtractor, MaskSource};

#[test]
fn test_eleven_masks_per_channel_in_order() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig::default());
    let img = square_outline_image(120, 60, 3);

    let masks = extractor
        .extract_masks(&img)
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(masks.len(), 3 * 11);
    for (i, mask) in masks.iter().enumerate() {
        assert_eq!((mask.channel, mask.level), (i / 11, i % 11));
        assert_eq!(mask.image.dimensions(), img.dimensions());
    }
    Ok(())
}

#[test]
fn test_level_zero_marks_a_band_around_the_outline() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig::default());
    let img = square_outline_image(120, 60, 3);

    let first = extractor
        .extract_masks(&img)
        .next()
        .expect("at least one mask")?;
    assert_eq!(first.source, MaskSource::Edges);

    // Top side of the outline covers rows 30..33; dilated edges are at least 3px thick
    let column: Vec<u8> = (22..42).map(|y| first.image.get_pixel(60, y)[0]).collect();
    let longest_run = column
        .split(|&v| v == 0)
        .map(|run| run.len())
        .max()
        .unwrap_or(0);
    assert!(longest_run >= 3, "edge band too thin: {:?}", column);

    // Flat areas stay empty
    assert_eq!(first.image.get_pixel(60, 60)[0], 0);
    assert_eq!(first.image.get_pixel(5, 5)[0], 0);
    assert_eq!(first.image.get_pixel(114, 114)[0], 0);
    Ok(())
}

#[test]
fn test_level_zero_handles_edges_reaching_the_border() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig::default());
    // Black left half, white right half: the step runs from the top row to the bottom row
    let img = GrayImage::from_fn(40, 40, |x, _| Luma([if x < 20 { 0 } else { 255 }]));

    let first = extractor
        .extract_masks(&img)
        .next()
        .expect("at least one mask")?;

    assert!((16..24).any(|x| first.image.get_pixel(x, 20)[0] == 255));
    assert!((0..8).all(|x| first.image.get_pixel(x, 20)[0] == 0));
    Ok(())
}

#[test]
fn test_full_detection_survives_strong_edges() -> anyhow::Result<()> {
    let pipeline = RectPipeline::new(DetectionConfig::default())?;
    let img = square_outline_image(600, 200, 3);

    let masks = pipeline.masks(&img)?;
    assert_eq!(masks.len(), 33);
    assert!(!pipeline.detect(&img)?.is_empty());
    Ok(())
}

#[test]
fn test_threshold_ladder_follows_formula() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig::default());
    let img = gradient_image(256, 4);

    let masks = extractor
        .extract_masks(&img)
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(masks.len(), 11);

    for mask in masks.iter().skip(1) {
        let threshold = ((mask.level + 1) * 255 / 11) as u8;
        assert_eq!(mask.source, MaskSource::Threshold(threshold));
        assert_eq!(extractor.threshold_for(mask.level), threshold);
        for (x, y, p) in mask.image.enumerate_pixels() {
            let value = img.get_pixel(x, y)[0];
            let expected = if value >= threshold { 255 } else { 0 };
            assert_eq!(p[0], expected, "level {} at ({}, {})", mask.level, x, y);
        }
    }

    assert_eq!(extractor.threshold_for(1), 46);
    assert_eq!(extractor.threshold_for(10), 255);
    Ok(())
}

#[test]
fn test_masks_are_strictly_binary() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig::default());
    let img = noise_image(40, 30, 3);

    for mask in extractor.extract_masks(&img) {
        let mask = mask?;
        assert!(mask.image.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
    Ok(())
}

#[test]
fn test_iteration_restarts_on_each_call() {
    let extractor = EdgeExtractor::new(&DetectionConfig {
        threshold_levels: 4,
        ..DetectionConfig::default()
    });
    let img: GrayImage = gradient_image(32, 8);

    let iter = extractor.extract_masks(&img);
    assert_eq!(iter.size_hint(), (4, Some(4)));
    assert_eq!(iter.count(), 4);
    assert_eq!(extractor.extract_masks(&img).count(), 4);
}

#[test]
fn test_zero_canny_threshold_still_builds_edge_mask() -> anyhow::Result<()> {
    let extractor = EdgeExtractor::new(&DetectionConfig {
        canny_threshold: 0.0,
        ..DetectionConfig::default()
    });
    let img = square_outline_image(60, 30, 2);

    let first = extractor
        .extract_masks(&img)
        .next()
        .expect("at least one mask")?;
    assert_eq!(first.source, MaskSource::Edges);
    assert!(first.image.pixels().any(|p| p[0] == 255));
    Ok(())
}
