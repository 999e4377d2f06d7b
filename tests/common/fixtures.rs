#![allow(dead_code)]

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use receiptscan::{DetectionConfig, Polygon, RectPipeline};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// White canvas with a black square outline of side `side` centered in it.
/// The outline is `line` pixels wide and drawn inside the square.
pub fn square_outline_image(size: u32, side: u32, line: u32) -> RgbImage {
    let start = (size - side) / 2;
    let end = start + side;
    ImageBuffer::from_fn(size, size, |x, y| {
        let inside = x >= start && x < end && y >= start && y < end;
        let on_line = x < start + line || x >= end - line || y < start + line || y >= end - line;
        if inside && on_line { BLACK } else { WHITE }
    })
}

/// True corners of the square drawn by `square_outline_image`
pub fn square_corners(size: u32, side: u32) -> [(i32, i32); 4] {
    let start = ((size - side) / 2) as i32;
    let end = start + side as i32;
    [(start, start), (end, start), (end, end), (start, end)]
}

/// Deterministic pseudo-random noise (LCG), identical on every run
pub fn noise_image(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(747796405).wrapping_add(2891336453);
    ImageBuffer::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    })
}

/// Horizontal gray ramp from 0 on the left to 255 on the right
pub fn gradient_image(width: u32, height: u32) -> GrayImage {
    ImageBuffer::from_fn(width, height, |x, _| {
        Luma([(x * 255 / (width - 1).max(1)) as u8])
    })
}

/// Pipeline with the stock detection parameters
pub fn default_pipeline() -> RectPipeline {
    RectPipeline::new(DetectionConfig::default()).expect("default config is valid")
}

pub fn poly(coords: &[(i32, i32)]) -> Polygon {
    Polygon::from_coords(coords)
}

/// Every expected corner has a polygon vertex within `tolerance` on both axes
pub fn corners_near(polygon: &Polygon, expected: &[(i32, i32)], tolerance: i32) -> bool {
    polygon.len() == expected.len()
        && expected.iter().all(|&(ex, ey)| {
            polygon
                .points
                .iter()
                .any(|p| (p.x - ex).abs() <= tolerance && (p.y - ey).abs() <= tolerance)
        })
}
