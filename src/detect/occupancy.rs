//! ROI occupancy decision with hysteresis.
//!
//! The detector tracks whether an object is present in the ROI. It enters the
//! present state when more than `enter_percent` of the ROI is foreground and
//! leaves it when fewer than `leave_percent` is. Between the two limits nothing
//! changes, which keeps the state from flickering at the boundary.
//!
//! Limits use truncating integer math: `area / 100 * percent`.

use std::fmt;

use crate::frame::ForegroundMask;
use crate::roi::Roi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OccupancyConfig {
    pub enter_percent: u32,
    pub leave_percent: u32,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            enter_percent: 20,
            leave_percent: 1,
        }
    }
}

impl OccupancyConfig {
    pub fn enter_limit(&self, area: u64) -> u64 {
        area / 100 * self.enter_percent as u64
    }

    pub fn leave_limit(&self, area: u64) -> u64 {
        area / 100 * self.leave_percent as u64
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OccupancyState {
    pub present: bool,
    /// Number of entries so far. Never decremented.
    pub entries: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyEvent {
    Entered { object: u32 },
    Left { object: u32 },
}

impl OccupancyEvent {
    pub fn object(&self) -> u32 {
        match self {
            OccupancyEvent::Entered { object } | OccupancyEvent::Left { object } => *object,
        }
    }
}

impl fmt::Display for OccupancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyEvent::Entered { object } => {
                write!(f, "Object {{{}}} entered selected ROI.", object)
            }
            OccupancyEvent::Left { object } => {
                write!(f, "Object {{{}}} left selected ROI.", object)
            }
        }
    }
}

pub struct OccupancyDetector {
    config: OccupancyConfig,
    state: OccupancyState,
}

impl OccupancyDetector {
    pub fn new(config: OccupancyConfig) -> Self {
        Self {
            config,
            state: OccupancyState::default(),
        }
    }

    pub fn state(&self) -> OccupancyState {
        self.state
    }

    pub fn is_present(&self) -> bool {
        self.state.present
    }

    pub fn entries(&self) -> u32 {
        self.state.entries
    }

    /// Count foreground pixels of `mask` inside `roi` and apply the hysteresis rule.
    pub fn update(&mut self, mask: &ForegroundMask, roi: &Roi) -> Option<OccupancyEvent> {
        let active = mask.count_active_in(roi);
        let area = roi.clamp_to(mask.width(), mask.height()).area();
        self.evaluate(active, area)
    }

    /// Apply the hysteresis rule to `active` foreground pixels out of `area`.
    pub fn evaluate(&mut self, active: u64, area: u64) -> Option<OccupancyEvent> {
        let enter_limit = self.config.enter_limit(area);
        let leave_limit = self.config.leave_limit(area);
        log::debug!(
            "{}>{} {} | {} < {} {}",
            active,
            enter_limit,
            active > enter_limit,
            active,
            leave_limit,
            active < leave_limit
        );

        let event = if !self.state.present && active > enter_limit {
            self.state.present = true;
            self.state.entries += 1;
            Some(OccupancyEvent::Entered {
                object: self.state.entries,
            })
        } else if self.state.present && active < leave_limit {
            self.state.present = false;
            Some(OccupancyEvent::Left {
                object: self.state.entries,
            })
        } else {
            None
        };

        if let Some(event) = &event {
            log::info!("{}", event);
        }
        event
    }
}

impl Default for OccupancyDetector {
    fn default() -> Self {
        Self::new(OccupancyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MASK_ON;
    use image::{Rgb, RgbImage};

    fn mask_with_active(width: u32, height: u32, active: u32) -> ForegroundMask {
        let mut img = RgbImage::new(width, height);
        for (i, pixel) in img.pixels_mut().enumerate() {
            if (i as u32) < active {
                *pixel = Rgb([0, MASK_ON, 0]);
            }
        }
        ForegroundMask::from_image(img)
    }

    #[test]
    fn limits_use_truncating_division() {
        let config = OccupancyConfig::default();
        assert_eq!(config.enter_limit(10_000), 2_000);
        assert_eq!(config.leave_limit(10_000), 100);
        assert_eq!(config.enter_limit(199), 20);
        assert_eq!(config.leave_limit(199), 1);
        assert_eq!(config.enter_limit(99), 0);
        assert_eq!(config.leave_limit(99), 0);
    }

    #[test]
    fn enters_once_above_upper_limit() {
        let mut detector = OccupancyDetector::default();
        assert_eq!(detector.evaluate(2_000, 10_000), None);
        assert_eq!(
            detector.evaluate(2_001, 10_000),
            Some(OccupancyEvent::Entered { object: 1 })
        );
        assert_eq!(detector.evaluate(9_000, 10_000), None);
        assert!(detector.is_present());
        assert_eq!(detector.entries(), 1);
    }

    #[test]
    fn leaves_once_below_lower_limit() {
        let mut detector = OccupancyDetector::default();
        detector.evaluate(10_000, 10_000);
        assert_eq!(detector.evaluate(100, 10_000), None);
        assert_eq!(
            detector.evaluate(99, 10_000),
            Some(OccupancyEvent::Left { object: 1 })
        );
        assert_eq!(detector.evaluate(0, 10_000), None);
        assert!(!detector.is_present());
        assert_eq!(detector.entries(), 1);
    }

    #[test]
    fn dead_band_does_not_flap() {
        let mut detector = OccupancyDetector::default();
        detector.evaluate(5_000, 10_000);
        for active in [150, 1_999, 100, 2_000, 500, 1_500, 120] {
            assert_eq!(detector.evaluate(active, 10_000), None);
        }
        assert!(detector.is_present());
        assert_eq!(detector.entries(), 1);
    }

    #[test]
    fn absent_state_ignores_dead_band() {
        let mut detector = OccupancyDetector::default();
        for active in [0, 100, 1_999, 2_000] {
            assert_eq!(detector.evaluate(active, 10_000), None);
        }
        assert!(!detector.is_present());
    }

    #[test]
    fn counter_increments_per_entry() {
        let mut detector = OccupancyDetector::default();
        let events: Vec<_> = [9_000, 0, 9_000, 0]
            .into_iter()
            .filter_map(|active| detector.evaluate(active, 10_000))
            .collect();
        assert_eq!(
            events,
            vec![
                OccupancyEvent::Entered { object: 1 },
                OccupancyEvent::Left { object: 1 },
                OccupancyEvent::Entered { object: 2 },
                OccupancyEvent::Left { object: 2 },
            ]
        );
    }

    #[test]
    fn update_counts_mask_inside_roi() {
        let mut detector = OccupancyDetector::default();
        let roi = Roi::new(0, 0, 10, 10);

        // 21 of 100 ROI pixels active: limit is 100/100*20 = 20
        let mask = mask_with_active(10, 10, 21);
        assert_eq!(
            detector.update(&mask, &roi),
            Some(OccupancyEvent::Entered { object: 1 })
        );

        let mask = mask_with_active(10, 10, 0);
        assert_eq!(
            detector.update(&mask, &roi),
            Some(OccupancyEvent::Left { object: 1 })
        );
    }

    #[test]
    fn empty_mask_never_enters() {
        let mut detector = OccupancyDetector::default();
        let mask = ForegroundMask::empty(32, 32);
        assert_eq!(detector.update(&mask, &Roi::full_frame(32, 32)), None);
        assert_eq!(detector.state(), OccupancyState::default());
    }

    #[test]
    fn event_messages() {
        assert_eq!(
            OccupancyEvent::Entered { object: 3 }.to_string(),
            "Object {3} entered selected ROI."
        );
        assert_eq!(
            OccupancyEvent::Left { object: 3 }.to_string(),
            "Object {3} left selected ROI."
        );
        assert_eq!(OccupancyEvent::Left { object: 3 }.object(), 3);
    }
}
