use image::{GrayImage, ImageBuffer, Luma, Pixel};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;

use crate::config::DetectionConfig;
use crate::detection::preprocessing::extract_channel;
use crate::error::Result;

const MASK_ON: u8 = 255;

/// Smallest positive lower hysteresis bound, i.e. `magnitude > 0`
pub const CANNY_LOW: f32 = f32::MIN_POSITIVE;

/// How a mask was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskSource {
    /// Canny edges followed by one 3x3 dilation
    Edges,
    /// `plane >= threshold`
    Threshold(u8),
}

/// Single-channel 0/255 mask derived from one channel at one level
#[derive(Debug, Clone)]
pub struct BinaryMask {
    pub channel: usize,
    pub level: usize,
    pub source: MaskSource,
    pub image: GrayImage,
}

/// Produces edge and threshold masks for every (channel, level) pair
#[derive(Debug, Clone)]
pub struct EdgeExtractor {
    canny_threshold: f32,
    levels: usize,
}

impl EdgeExtractor {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            canny_threshold: config.canny_threshold,
            levels: config.threshold_levels as usize,
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Binarization cutoff for `level >= 1`: `(level + 1) * 255 / N`
    pub fn threshold_for(&self, level: usize) -> u8 {
        ((level + 1) * 255 / self.levels.max(1)).min(255) as u8
    }

    /// Lazily yield masks, channel ascending then level ascending.
    /// Each call starts over from the same image.
    pub fn extract_masks<'a, P>(&'a self, img: &'a ImageBuffer<P, Vec<u8>>) -> MaskIter<'a, P>
    where
        P: Pixel<Subpixel = u8>,
    {
        MaskIter {
            extractor: self,
            image: img,
            channel: 0,
            level: 0,
            plane: None,
        }
    }

    /// Build the mask for one level of an already extracted channel plane
    pub fn mask_for(&self, plane: &GrayImage, channel: usize, level: usize) -> BinaryMask {
        if level == 0 {
            // Keep every nonzero gradient connected to a strong edge. The lower bound
            // must stay positive: hysteresis accepts `>= low` and would otherwise
            // walk past the zeroed image border.
            let edges = canny(plane, CANNY_LOW, self.canny_threshold.max(CANNY_LOW));
            // Close small gaps between edge segments
            let image = dilate(&edges, Norm::LInf, 1);
            BinaryMask {
                channel,
                level,
                source: MaskSource::Edges,
                image,
            }
        } else {
            let threshold = self.threshold_for(level);
            let image = GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
                if plane.get_pixel(x, y)[0] >= threshold {
                    Luma([MASK_ON])
                } else {
                    Luma([0])
                }
            });
            BinaryMask {
                channel,
                level,
                source: MaskSource::Threshold(threshold),
                image,
            }
        }
    }
}

/// Finite iterator over the (channel x level) masks of one image
pub struct MaskIter<'a, P>
where
    P: Pixel<Subpixel = u8>,
{
    extractor: &'a EdgeExtractor,
    image: &'a ImageBuffer<P, Vec<u8>>,
    channel: usize,
    level: usize,
    plane: Option<GrayImage>,
}

impl<P> Iterator for MaskIter<'_, P>
where
    P: Pixel<Subpixel = u8>,
{
    type Item = Result<BinaryMask>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.channel >= P::CHANNEL_COUNT as usize || self.extractor.levels == 0 {
            return None;
        }

        if self.plane.is_none() {
            match extract_channel(self.image, self.channel) {
                Ok(plane) => self.plane = Some(plane),
                Err(e) => {
                    self.channel = P::CHANNEL_COUNT as usize;
                    return Some(Err(e));
                }
            }
        }

        let plane = self.plane.as_ref()?;
        let mask = self.extractor.mask_for(plane, self.channel, self.level);

        self.level += 1;
        if self.level == self.extractor.levels {
            self.level = 0;
            self.channel += 1;
            self.plane = None;
        }

        Some(Ok(mask))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let channels = P::CHANNEL_COUNT as usize;
        let remaining = if self.channel >= channels {
            0
        } else {
            (channels - self.channel) * self.extractor.levels - self.level
        };
        (remaining, Some(remaining))
    }
}
