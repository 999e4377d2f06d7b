//! Integration tests for the pyramid smoothing pass.

mod common;

use common::*;
use image::{GrayImage, Luma, RgbImage};
use receiptscan::detection::preprocessing::{sharpen, smooth};

#[test]
fn test_smoothing_is_deterministic() -> anyhow::Result<()> {
    let img = noise_image(64, 48, 7);

    let first = smooth(&img)?;
    let second = smooth(&img)?;

    assert_eq!(first.as_raw(), second.as_raw(), "smoothing must be bitwise repeatable");
    Ok(())
}

#[test]
fn test_smoothing_preserves_dimensions() -> anyhow::Result<()> {
    for (w, h) in [(64, 48), (37, 21), (1, 1), (2, 9), (600, 3)] {
        let img = noise_image(w, h, w + h);
        let out = smooth(&img)?;
        assert_eq!(out.dimensions(), (w, h), "size changed for {}x{}", w, h);
    }
    Ok(())
}

#[test]
fn test_uniform_image_is_unchanged() -> anyhow::Result<()> {
    let img = RgbImage::from_pixel(31, 17, image::Rgb([12, 200, 255]));
    let out = smooth(&img)?;
    assert_eq!(out, img);
    Ok(())
}

#[test]
fn test_isolated_spike_is_suppressed() -> anyhow::Result<()> {
    let mut img = GrayImage::from_pixel(21, 21, Luma([100]));
    img.put_pixel(10, 10, Luma([255]));

    let out = smooth(&img)?;
    let center = out.get_pixel(10, 10)[0];
    assert!(center < 200, "spike survived smoothing: {}", center);
    assert!(center > 100, "spike vanished completely: {}", center);
    Ok(())
}

#[test]
fn test_empty_image_is_rejected() {
    let img = GrayImage::new(0, 10);
    let result = smooth(&img);
    assert!(
        matches!(result, Err(DetectionError::InvalidImage(_))),
        "expected InvalidImage, got {:?}",
        result.map(|i| i.dimensions())
    );
}

#[test]
fn test_sharpen_increases_edge_contrast() {
    let mut img = GrayImage::from_pixel(9, 9, Luma([100]));
    for y in 0..9 {
        for x in 5..9 {
            img.put_pixel(x, y, Luma([200]));
        }
    }

    let out = sharpen(&img, 0.5);

    assert!(out.get_pixel(4, 4)[0] < 100);
    assert!(out.get_pixel(5, 4)[0] > 200);
    // Border is copied untouched
    assert_eq!(out.get_pixel(0, 4)[0], 100);
}
