use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::Path;

use crate::error::Result;
use crate::models::Polygon;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline thickness in pixels
pub const OUTLINE_THICKNESS: i32 = 3;

/// Copy of `img` with every polygon drawn as a closed green outline
pub fn draw_polygons<'a>(
    img: &DynamicImage,
    polygons: impl IntoIterator<Item = &'a Polygon>,
) -> RgbImage {
    let mut canvas = img.to_rgb8();
    for polygon in polygons {
        draw_closed_outline(&mut canvas, polygon, OUTLINE_COLOR);
    }
    canvas
}

/// Draw a closed polyline, thickened by offsetting a 1px line
pub fn draw_closed_outline(canvas: &mut RgbImage, polygon: &Polygon, color: Rgb<u8>) {
    let points = &polygon.points;
    let n = points.len();
    if n < 2 {
        return;
    }
    let reach = OUTLINE_THICKNESS / 2;
    for i in 0..n {
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        for oy in -reach..=reach {
            for ox in -reach..=reach {
                draw_line_segment_mut(
                    canvas,
                    ((p1.x + ox) as f32, (p1.y + oy) as f32),
                    ((p2.x + ox) as f32, (p2.y + oy) as f32),
                    color,
                );
            }
        }
    }
}

/// Write the image as TIFF, the intermediate format handed to OCR tooling
pub fn save_tiff(img: &DynamicImage, path: impl AsRef<Path>) -> Result<()> {
    // TIFF has no encoder for every layout; RGB8 is always supported
    DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(path.as_ref(), ImageFormat::Tiff)?;
    Ok(())
}
