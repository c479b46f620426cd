//! Running-average background subtraction.

use anyhow::{bail, Result};
use image::{Rgb, RgbImage};

use super::bilateral::{bilateral_filter, FilterConfig};
use crate::frame::{ForegroundMask, Frame, MASK_ON};

/// Background model parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundConfig {
    /// Weight of the new frame in the running average.
    pub learning_rate: f32,
    /// Per-channel difference above which a channel is foreground.
    pub threshold: u8,
    pub filter: FilterConfig,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.025,
            threshold: 80,
            filter: FilterConfig::default(),
        }
    }
}

/// Output of one subtraction step.
#[derive(Clone, Debug)]
pub struct Subtraction {
    /// Denoised copy of the input frame.
    pub filtered: Frame,
    pub mask: ForegroundMask,
}

/// Background subtractor with a running-average estimate.
///
/// The first frame seeds the estimate and yields an all-background mask.
/// Every later frame is compared against the estimate and then blended into it.
pub struct BackgroundSubtractor {
    config: BackgroundConfig,
    estimate: Option<Estimate>,
}

struct Estimate {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl BackgroundSubtractor {
    pub fn new(config: BackgroundConfig) -> Self {
        Self {
            config,
            estimate: None,
        }
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.estimate.is_some()
    }

    /// Filter `frame`, classify it against the estimate and update the estimate.
    ///
    /// `frame` is not modified; the filtered copy is returned in the result.
    pub fn apply(&mut self, frame: &Frame) -> Result<Subtraction> {
        let filtered = bilateral_filter(frame, &self.config.filter);
        let (width, height) = filtered.dimensions();

        let Some(estimate) = self.estimate.as_mut() else {
            self.estimate = Some(Estimate {
                width,
                height,
                values: filtered.as_raw().iter().map(|&v| v as f32).collect(),
            });
            log::trace!("background model seeded from {}x{} frame", width, height);
            return Ok(Subtraction {
                filtered,
                mask: ForegroundMask::empty(width, height),
            });
        };

        if (estimate.width, estimate.height) != (width, height) {
            bail!(
                "frame is {}x{} but the background model is {}x{}",
                width,
                height,
                estimate.width,
                estimate.height
            );
        }

        let threshold = self.config.threshold as f32;
        let rate = self.config.learning_rate;
        let mut mask = vec![0u8; estimate.values.len()];
        for ((bg, &value), out) in estimate
            .values
            .iter_mut()
            .zip(filtered.as_raw())
            .zip(mask.iter_mut())
        {
            let value = value as f32;
            if (value - *bg).abs() > threshold {
                *out = MASK_ON;
            }
            *bg = *bg * (1.0 - rate) + value * rate;
        }

        let mask = RgbImage::from_raw(width, height, mask)
            .map(ForegroundMask::from_image)
            .unwrap_or_else(|| ForegroundMask::empty(width, height));
        Ok(Subtraction { filtered, mask })
    }

    /// Snapshot of the estimate rounded to 8 bits.
    pub fn background(&self) -> Option<Frame> {
        let estimate = self.estimate.as_ref()?;
        let mut image = RgbImage::new(estimate.width, estimate.height);
        for (pixel, values) in image.pixels_mut().zip(estimate.values.chunks_exact(3)) {
            *pixel = Rgb([
                round_channel(values[0]),
                round_channel(values[1]),
                round_channel(values[2]),
            ]);
        }
        Some(image)
    }
}

fn round_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unfiltered() -> BackgroundConfig {
        // A tiny color sigma keeps flat synthetic frames unchanged by the filter.
        BackgroundConfig {
            filter: FilterConfig {
                color_sigma: 0.01,
                space_sigma: 0.5,
            },
            ..BackgroundConfig::default()
        }
    }

    #[test]
    fn first_frame_seeds_model_with_empty_mask() {
        let mut model = BackgroundSubtractor::new(BackgroundConfig::default());
        assert!(!model.is_initialized());

        let frame = RgbImage::from_pixel(6, 4, Rgb([200, 200, 200]));
        let step = model.apply(&frame).unwrap();

        assert!(model.is_initialized());
        assert_eq!(step.mask.count_active(), 0);
        assert_eq!(model.background().unwrap(), frame);
    }

    #[test]
    fn identical_frames_produce_no_foreground() {
        let mut model = BackgroundSubtractor::new(BackgroundConfig::default());
        let frame = RgbImage::from_pixel(8, 8, Rgb([90, 140, 30]));
        model.apply(&frame).unwrap();
        let step = model.apply(&frame).unwrap();
        assert_eq!(step.mask.count_active(), 0);
    }

    #[test]
    fn large_difference_is_foreground_per_channel() {
        let mut model = BackgroundSubtractor::new(unfiltered());
        model
            .apply(&RgbImage::from_pixel(4, 4, Rgb([10, 10, 10])))
            .unwrap();

        let step = model
            .apply(&RgbImage::from_pixel(4, 4, Rgb([200, 50, 91])))
            .unwrap();
        // 190 > 80, 40 <= 80, 81 > 80
        assert_eq!(step.mask.as_image().get_pixel(0, 0), &Rgb([255, 0, 255]));
        assert_eq!(step.mask.count_active(), 16);
    }

    #[test]
    fn difference_at_threshold_is_background() {
        let mut model = BackgroundSubtractor::new(unfiltered());
        model
            .apply(&RgbImage::from_pixel(3, 3, Rgb([0, 0, 0])))
            .unwrap();
        let step = model
            .apply(&RgbImage::from_pixel(3, 3, Rgb([80, 80, 80])))
            .unwrap();
        assert_eq!(step.mask.count_active(), 0);
    }

    #[test]
    fn running_average_blends_with_learning_rate() {
        let mut model = BackgroundSubtractor::new(BackgroundConfig {
            learning_rate: 0.25,
            ..unfiltered()
        });
        model
            .apply(&RgbImage::from_pixel(2, 2, Rgb([100, 0, 40])))
            .unwrap();
        model
            .apply(&RgbImage::from_pixel(2, 2, Rgb([200, 255, 40])))
            .unwrap();

        // 100*0.75 + 200*0.25 = 125, 0*0.75 + 255*0.25 = 63.75
        let bg = model.background().unwrap();
        assert_eq!(bg.get_pixel(1, 1), &Rgb([125, 64, 40]));
    }

    #[test]
    fn input_frame_is_not_modified() {
        let mut model = BackgroundSubtractor::new(BackgroundConfig::default());
        let mut frame = RgbImage::from_pixel(9, 9, Rgb([100, 100, 100]));
        frame.put_pixel(4, 4, Rgb([104, 100, 100]));
        let before = frame.clone();

        let step = model.apply(&frame).unwrap();
        assert_eq!(frame, before);
        assert_ne!(step.filtered, before);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let mut model = BackgroundSubtractor::new(BackgroundConfig::default());
        model.apply(&RgbImage::new(4, 4)).unwrap();
        assert!(model.apply(&RgbImage::new(5, 4)).is_err());
    }
}
