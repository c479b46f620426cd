//! Region of interest.
//!
//! An ROI is an axis-aligned rectangle in frame coordinates. Width and height
//! are unsigned, so a normalized ROI always has its origin at the top-left
//! corner. Before detection starts the ROI is clamped to the frame and an
//! empty result is rejected.

use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// ROI covering the whole frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Build a normalized ROI from two drag corners given in any order.
    ///
    /// Negative coordinates (pointer dragged past the window edge) are clamped to 0.
    pub fn from_corners(ax: i32, ay: i32, bx: i32, by: i32) -> Self {
        let (x0, x1) = if ax <= bx { (ax, bx) } else { (bx, ax) };
        let (y0, y1) = if ay <= by { (ay, by) } else { (by, ay) };
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.max(0);
        let y1 = y1.max(0);
        Self::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `frame_width` x `frame_height` frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Self {
        let x = self.x.min(frame_width);
        let y = self.y.min(frame_height);
        let right = self.x.saturating_add(self.width).min(frame_width);
        let bottom = self.y.saturating_add(self.height).min(frame_height);
        Self::new(x, y, right - x, bottom - y)
    }

    /// Clamp to the frame and reject an empty result.
    pub fn validated_for(&self, frame_width: u32, frame_height: u32) -> Result<Self> {
        let clamped = self.clamp_to(frame_width, frame_height);
        if clamped.is_empty() {
            bail!(
                "ROI {} has no area inside the {}x{} frame",
                self,
                frame_width,
                frame_height
            );
        }
        if clamped != *self {
            log::debug!("ROI {} clamped to {}", self, clamped);
        }
        Ok(clamped)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Parses `X,Y,W,H`.
impl FromStr for Roi {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(|part| part.trim()).collect();
        if parts.len() != 4 {
            return Err(anyhow!("ROI must be given as X,Y,W,H (got {:?})", s));
        }
        let mut values = [0u32; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| anyhow!("ROI component {:?} is not a non-negative integer", part))?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_normalize_in_every_direction() {
        let expected = Roi::new(10, 20, 30, 40);
        assert_eq!(Roi::from_corners(10, 20, 40, 60), expected);
        assert_eq!(Roi::from_corners(40, 60, 10, 20), expected);
        assert_eq!(Roi::from_corners(40, 20, 10, 60), expected);
        assert_eq!(Roi::from_corners(10, 60, 40, 20), expected);
    }

    #[test]
    fn corners_outside_window_clamp_to_zero() {
        assert_eq!(Roi::from_corners(-5, -5, 10, 10), Roi::new(0, 0, 10, 10));
        assert!(Roi::from_corners(-5, 3, -1, 9).is_empty());
    }

    #[test]
    fn clamp_trims_to_frame() {
        let roi = Roi::new(50, 60, 100, 100);
        assert_eq!(roi.clamp_to(120, 100), Roi::new(50, 60, 70, 40));
        assert!(Roi::new(200, 0, 5, 5).clamp_to(100, 100).is_empty());
    }

    #[test]
    fn validation_rejects_empty_roi() {
        assert!(Roi::new(0, 0, 0, 10).validated_for(100, 100).is_err());
        assert!(Roi::new(100, 0, 10, 10).validated_for(100, 100).is_err());
        assert_eq!(
            Roi::new(90, 90, 20, 20).validated_for(100, 100).unwrap(),
            Roi::new(90, 90, 10, 10)
        );
    }

    #[test]
    fn parses_and_displays() {
        let roi: Roi = " 1, 2,3 ,4".parse().unwrap();
        assert_eq!(roi, Roi::new(1, 2, 3, 4));
        assert_eq!(roi.to_string(), "1,2,3,4");
        assert_eq!(roi.area(), 12);

        assert!("1,2,3".parse::<Roi>().is_err());
        assert!("1,2,3,-4".parse::<Roi>().is_err());
        assert!("a,b,c,d".parse::<Roi>().is_err());
    }
}
