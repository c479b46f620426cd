//! Edge-preserving bilateral smoothing for RGB frames.
//!
//! Each output pixel is a weighted mean over a circular neighbourhood. The
//! weight is the product of a spatial Gaussian on the pixel distance and a
//! color Gaussian on the L1 distance between the two RGB values. Pixels past
//! the frame edge are read through reflect border handling (the edge pixel is
//! repeated: `cba|abcd|dcb`).

use image::{Rgb, RgbImage};

const CHANNELS: usize = 3;

/// Bilateral filter parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterConfig {
    /// Color-similarity tolerance (intensity units).
    pub color_sigma: f32,
    /// Spatial tolerance (pixels). The kernel radius is `round(1.5 * space_sigma)`.
    pub space_sigma: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            color_sigma: 5.0,
            space_sigma: 2.5,
        }
    }
}

impl FilterConfig {
    pub fn radius(&self) -> i64 {
        let sigma = if self.space_sigma <= 0.0 {
            1.0
        } else {
            self.space_sigma
        };
        ((sigma * 1.5).round() as i64).max(1)
    }
}

struct Kernel {
    /// (dx, dy, spatial weight) for every offset inside the circle.
    offsets: Vec<(i64, i64, f32)>,
    /// Color weight indexed by the L1 distance of two RGB values.
    color_weights: Vec<f32>,
}

impl Kernel {
    fn new(config: &FilterConfig) -> Self {
        let color_sigma = if config.color_sigma <= 0.0 {
            1.0
        } else {
            config.color_sigma
        };
        let space_sigma = if config.space_sigma <= 0.0 {
            1.0
        } else {
            config.space_sigma
        };
        let color_coeff = -0.5 / (color_sigma * color_sigma);
        let space_coeff = -0.5 / (space_sigma * space_sigma);

        let radius = config.radius();
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist > radius as f32 {
                    continue;
                }
                offsets.push((dx, dy, (dist * dist * space_coeff).exp()));
            }
        }

        let color_weights = (0..256 * CHANNELS)
            .map(|d| {
                let d = d as f32;
                (d * d * color_coeff).exp()
            })
            .collect();

        Self {
            offsets,
            color_weights,
        }
    }
}

/// Reflect an out-of-range coordinate back into `0..len`.
fn reflect(mut i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - i - 1;
        } else {
            return i as u32;
        }
    }
}

/// Return a bilaterally filtered copy of `frame`.
pub fn bilateral_filter(frame: &RgbImage, config: &FilterConfig) -> RgbImage {
    let (width, height) = frame.dimensions();
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let kernel = Kernel::new(config);
    let (w, h) = (width as i64, height as i64);

    for y in 0..h {
        for x in 0..w {
            let Rgb(center) = *frame.get_pixel(x as u32, y as u32);
            let mut sum = [0f32; CHANNELS];
            let mut weight_sum = 0f32;

            for &(dx, dy, space_weight) in &kernel.offsets {
                let Rgb(sample) = *frame.get_pixel(reflect(x + dx, w), reflect(y + dy, h));
                let distance: usize = sample
                    .iter()
                    .zip(center.iter())
                    .map(|(&s, &c)| (s as i32 - c as i32).unsigned_abs() as usize)
                    .sum();
                let weight = space_weight * kernel.color_weights[distance];
                for c in 0..CHANNELS {
                    sum[c] += sample[c] as f32 * weight;
                }
                weight_sum += weight;
            }

            // The center offset always contributes weight 1, so weight_sum > 0.
            let mut value = [0u8; CHANNELS];
            for c in 0..CHANNELS {
                value[c] = (sum[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x as u32, y as u32, Rgb(value));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_radius_matches_space_sigma() {
        assert_eq!(FilterConfig::default().radius(), 4);
    }

    #[test]
    fn reflect_repeats_edge_pixel() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(-7, 3), 0);
        assert_eq!(reflect(4, 1), 0);
    }

    #[test]
    fn uniform_frame_is_unchanged() {
        let frame = RgbImage::from_pixel(7, 5, Rgb([120, 33, 250]));
        let filtered = bilateral_filter(&frame, &FilterConfig::default());
        assert_eq!(filtered, frame);
    }

    #[test]
    fn strong_edges_survive() {
        let mut frame = RgbImage::from_pixel(12, 12, Rgb([20, 20, 20]));
        for y in 0..12 {
            for x in 6..12 {
                frame.put_pixel(x, y, Rgb([220, 220, 220]));
            }
        }
        let filtered = bilateral_filter(&frame, &FilterConfig::default());
        assert_eq!(filtered.get_pixel(5, 6), &Rgb([20, 20, 20]));
        assert_eq!(filtered.get_pixel(6, 6), &Rgb([220, 220, 220]));
    }

    #[test]
    fn small_noise_is_smoothed() {
        let mut frame = RgbImage::from_pixel(9, 9, Rgb([100, 100, 100]));
        frame.put_pixel(4, 4, Rgb([104, 100, 100]));
        let filtered = bilateral_filter(&frame, &FilterConfig::default());
        let Rgb([r, _, _]) = *filtered.get_pixel(4, 4);
        assert!(r < 104);
        assert!(r >= 100);
    }

    #[test]
    fn empty_frame_is_empty() {
        let frame = RgbImage::new(0, 0);
        assert_eq!(bilateral_filter(&frame, &FilterConfig::default()).dimensions(), (0, 0));
    }
}
