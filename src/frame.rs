//! Frame and mask buffers.
//!
//! - `Frame`: decoded RGB image, 8 bits per channel.
//! - `ForegroundMask`: frame-shaped binary classification, one 0/255 value per channel.
//!
//! Frames are produced by the ingestion layer and owned by whichever step is
//! processing them. Masks are recomputed every step and never retained.

use image::{Rgb, RgbImage};

use crate::roi::Roi;

/// Channel value for an active (foreground) mask entry.
pub const MASK_ON: u8 = 255;

/// A decoded frame.
pub type Frame = RgbImage;

// ----------------------------------------------------------------------------
// ForegroundMask
// ----------------------------------------------------------------------------

/// Per-channel binary foreground mask.
///
/// Each channel is either 0 or `MASK_ON`. A pixel counts as active when any of
/// its channels is on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForegroundMask {
    image: RgbImage,
}

impl ForegroundMask {
    /// All-background mask of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    /// Wrap an already-thresholded image. Non-zero channels are normalized to `MASK_ON`.
    pub fn from_image(mut image: RgbImage) -> Self {
        for value in image.iter_mut() {
            if *value != 0 {
                *value = MASK_ON;
            }
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// True when any channel of the pixel is on.
    pub fn is_active(&self, x: u32, y: u32) -> bool {
        let Rgb([r, g, b]) = *self.image.get_pixel(x, y);
        (r | g | b) != 0
    }

    /// Count active pixels inside `roi`.
    ///
    /// The three channels are OR-collapsed into one "any channel active" value
    /// before counting. The part of `roi` that lies outside the mask is ignored.
    pub fn count_active_in(&self, roi: &Roi) -> u64 {
        let roi = roi.clamp_to(self.width(), self.height());
        let mut active = 0u64;
        for y in roi.y..roi.y + roi.height {
            for x in roi.x..roi.x + roi.width {
                if self.is_active(x, y) {
                    active += 1;
                }
            }
        }
        active
    }

    /// Count active pixels over the whole mask.
    pub fn count_active(&self) -> u64 {
        self.image
            .pixels()
            .filter(|p| (p[0] | p[1] | p[2]) != 0)
            .count() as u64
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
