use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, RgbImage};

use crate::error::{DetectionError, Result};

/// 5-tap binomial approximation of a Gaussian, sums to 16
const PYR_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

type Buffer<P> = ImageBuffer<P, Vec<u8>>;

/// Working image for detection: luma stays single-channel, everything else is RGB
pub fn to_working_image(img: &DynamicImage) -> WorkingImage {
    match img {
        DynamicImage::ImageLuma8(gray) => WorkingImage::Gray(gray.clone()),
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLumaA16(_) => WorkingImage::Gray(img.to_luma8()),
        _ => WorkingImage::Rgb(img.to_rgb8()),
    }
}

/// Image with the channel layout the detector runs on
#[derive(Debug, Clone)]
pub enum WorkingImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

/// Suppress sensor noise with a pyramid down/up pass.
///
/// The image is reduced to half size with a Gaussian low-pass and then
/// interpolated back to its original dimensions. Odd sizes round the
/// half-size image up rather than down, so 1-pixel edges and images still
/// have a source row or column to interpolate from.
pub fn smooth<P>(img: &Buffer<P>) -> Result<Buffer<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidImage(format!(
            "cannot smooth a {}x{} image",
            width, height
        )));
    }

    // Low-pass and decimate, then interpolate back to full size
    let down = pyr_down(img)?;
    pyr_up(&down, width, height)
}

/// Blur and decimate by two; output is `((w + 1) / 2, (h + 1) / 2)`
pub fn pyr_down<P>(img: &Buffer<P>) -> Result<Buffer<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (width as usize, height as usize);
    let (dw, dh) = ((w + 1) / 2, (h + 1) / 2);
    let src = img.as_raw();

    // Horizontal pass: h rows x dw columns
    let mut rows = vec![0u32; h * dw * channels];
    for y in 0..h {
        for x in 0..dw {
            for (k, weight) in PYR_KERNEL.iter().enumerate() {
                let sx = reflect_101(2 * x as isize + k as isize - 2, w);
                let src_idx = (y * w + sx) * channels;
                let dst_idx = (y * dw + x) * channels;
                for c in 0..channels {
                    rows[dst_idx + c] += weight * src[src_idx + c] as u32;
                }
            }
        }
    }

    // Vertical pass on every other row; weights total 256
    let mut out = vec![0u8; dw * dh * channels];
    for y in 0..dh {
        for x in 0..dw {
            let dst_idx = (y * dw + x) * channels;
            for c in 0..channels {
                let mut acc = 0u32;
                for (k, weight) in PYR_KERNEL.iter().enumerate() {
                    let sy = reflect_101(2 * y as isize + k as isize - 2, h);
                    acc += weight * rows[(sy * dw + x) * channels + c];
                }
                out[dst_idx + c] = ((acc + 128) >> 8) as u8;
            }
        }
    }

    ImageBuffer::from_raw(dw as u32, dh as u32, out)
        .ok_or_else(|| DetectionError::InvalidImage("pyramid-down buffer size mismatch".to_string()))
}

/// Upsample to exactly `width x height` with the Gaussian interpolation taps
pub fn pyr_up<P>(img: &Buffer<P>, width: u32, height: u32) -> Result<Buffer<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let (sw, sh) = (img.width() as usize, img.height() as usize);
    if sw == 0 || sh == 0 {
        return Err(DetectionError::InvalidImage(format!(
            "cannot upsample a {}x{} image",
            sw, sh
        )));
    }
    let channels = P::CHANNEL_COUNT as usize;
    let (w, h) = (width as usize, height as usize);
    let src = img.as_raw();

    let x_taps: Vec<[(usize, u32); 3]> = (0..w).map(|x| up_taps(x, sw)).collect();
    let y_taps: Vec<[(usize, u32); 3]> = (0..h).map(|y| up_taps(y, sh)).collect();

    // Horizontal pass: sh rows x w columns, weights sum to 8
    let mut rows = vec![0u32; sh * w * channels];
    for y in 0..sh {
        for (x, taps) in x_taps.iter().enumerate() {
            let dst_idx = (y * w + x) * channels;
            for &(sx, weight) in taps {
                if weight == 0 {
                    continue;
                }
                let src_idx = (y * sw + sx) * channels;
                for c in 0..channels {
                    rows[dst_idx + c] += weight * src[src_idx + c] as u32;
                }
            }
        }
    }

    // Vertical pass; total weight 64, rounded
    let mut out = vec![0u8; w * h * channels];
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..w {
            let dst_idx = (y * w + x) * channels;
            for c in 0..channels {
                let acc: u32 = taps
                    .iter()
                    .map(|&(sy, weight)| weight * rows[(sy * w + x) * channels + c])
                    .sum();
                out[dst_idx + c] = ((acc + 32) >> 6) as u8;
            }
        }
    }

    ImageBuffer::from_raw(width, height, out)
        .ok_or_else(|| DetectionError::InvalidImage("pyramid-up buffer size mismatch".to_string()))
}

/// Source taps for output coordinate `pos`: even outputs use 1-6-1, odd use 4-4
fn up_taps(pos: usize, len: usize) -> [(usize, u32); 3] {
    let half = (pos / 2) as isize;
    if pos % 2 == 0 {
        [
            (reflect_101(half - 1, len), 1),
            (reflect_101(half, len), 6),
            (reflect_101(half + 1, len), 1),
        ]
    } else {
        [
            (reflect_101(half, len), 4),
            (reflect_101(half + 1, len), 4),
            (0, 0),
        ]
    }
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        } else {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Copy one channel out of an interleaved image
pub fn extract_channel<P>(img: &Buffer<P>, channel: usize) -> Result<GrayImage>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = P::CHANNEL_COUNT as usize;
    if channel >= channels {
        return Err(DetectionError::InvalidImage(format!(
            "channel {} requested from a {}-channel image",
            channel, channels
        )));
    }
    Ok(GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y).channels()[channel]])
    }))
}

/// Sharpen each channel: center * (1 + 4*strength) - neighbors * strength.
/// Border pixels are copied unchanged.
pub fn sharpen<P>(img: &Buffer<P>, strength: f32) -> Buffer<P>
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = img.dimensions();
    let mut sharpened = img.clone();
    if width < 3 || height < 3 {
        return sharpened;
    }

    let channels = P::CHANNEL_COUNT as usize;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = img.get_pixel(x, y).channels();
            let top = img.get_pixel(x, y - 1).channels();
            let bottom = img.get_pixel(x, y + 1).channels();
            let left = img.get_pixel(x - 1, y).channels();
            let right = img.get_pixel(x + 1, y).channels();

            let out = sharpened.get_pixel_mut(x, y).channels_mut();
            for c in 0..channels {
                let neighbors =
                    top[c] as f32 + bottom[c] as f32 + left[c] as f32 + right[c] as f32;
                let value = center[c] as f32 * (1.0 + 4.0 * strength) - neighbors * strength;
                out[c] = value.clamp(0.0, 255.0) as u8;
            }
        }
    }

    sharpened
}

/// Sharpen a decoded image, keeping its color layout where possible
pub fn sharpen_dynamic(img: &DynamicImage, strength: f32) -> DynamicImage {
    match to_working_image(img) {
        WorkingImage::Gray(gray) => DynamicImage::ImageLuma8(sharpen(&gray, strength)),
        WorkingImage::Rgb(rgb) => DynamicImage::ImageRgb8(sharpen(&rgb, strength)),
    }
}
