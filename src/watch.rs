//! Watch session: setup followed by the detection loop.
//!
//! Setup runs in three steps, each exposed separately so callers can report
//! progress between them:
//! 1. `prime`: read the initial frame and warm the background model with the
//!    frames `warmup..=1` (relative to the start index), newest first
//! 2. `select_roi`: let the viewer pick the ROI over the initial frame
//! 3. `run`: process the remaining frames until the sequence is exhausted

use anyhow::{anyhow, bail, Result};

use crate::config::WatchConfig;
use crate::detect::{BackgroundSubtractor, OccupancyDetector, OccupancyEvent};
use crate::display::{draw_roi, RoiColor, Viewer};
use crate::frame::Frame;
use crate::ingest::ImageSequence;
use crate::roi::Roi;

pub const MISSING_INITIAL_FRAME: &str = "Could not find initial frame!";
pub const MISSING_WARMUP_FRAMES: &str =
    "There aren't enough frames to set up the background subtractor!";

/// Result of a finished session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// ROI that was watched; `None` if selection was abandoned.
    pub roi: Option<Roi>,
    pub frames_processed: u64,
    /// Number of objects that entered the ROI.
    pub entries: u32,
    pub events: Vec<OccupancyEvent>,
}

pub struct WatchSession<V> {
    source: ImageSequence,
    viewer: V,
    config: WatchConfig,
    subtractor: BackgroundSubtractor,
    detector: OccupancyDetector,
    initial: Option<Frame>,
    roi: Option<Roi>,
}

impl<V: Viewer> WatchSession<V> {
    pub fn new(source: ImageSequence, viewer: V, config: WatchConfig) -> Self {
        Self {
            source,
            viewer,
            subtractor: BackgroundSubtractor::new(config.background),
            detector: OccupancyDetector::new(config.occupancy),
            config,
            initial: None,
            roi: None,
        }
    }

    /// Read the initial frame and warm up the background model.
    pub fn prime(&mut self) -> Result<()> {
        let initial = self
            .source
            .next()
            .ok_or_else(|| anyhow!(MISSING_INITIAL_FRAME))?;
        log::debug!(
            "initial frame {}x{} from {}",
            initial.width(),
            initial.height(),
            self.source.path_for(self.source.cursor() - 1).display()
        );

        let start = self.source.config().start_index;
        for offset in (1..=i64::from(self.config.warmup_frames)).rev() {
            let frame = self
                .source
                .load_image(start + offset)
                .ok_or_else(|| anyhow!(MISSING_WARMUP_FRAMES))?;
            self.subtractor.apply(&frame)?;
        }
        log::debug!(
            "background model warmed with {} frames",
            self.config.warmup_frames
        );

        self.initial = Some(initial);
        Ok(())
    }

    /// Ask the viewer for the ROI over the initial frame.
    ///
    /// The selection is clamped to the frame; an empty result is an error.
    /// Returns `None` if the viewer was closed without a selection.
    pub fn select_roi(&mut self) -> Result<Option<Roi>> {
        let Some(initial) = self.initial.as_ref() else {
            bail!("select_roi called before prime");
        };
        let Some(selected) = self.viewer.select_roi(initial)? else {
            return Ok(None);
        };
        let roi = selected.validated_for(initial.width(), initial.height())?;
        log::debug!("watching ROI {} via {} viewer", roi, self.viewer.name());
        self.roi = Some(roi);
        Ok(Some(roi))
    }

    /// Process frames until the sequence runs out.
    pub fn run(&mut self) -> Result<WatchSummary> {
        let Some(roi) = self.roi else {
            bail!("run called before a ROI was selected");
        };

        let mut summary = WatchSummary {
            roi: Some(roi),
            ..WatchSummary::default()
        };
        while let Some(frame) = self.source.next() {
            let step = self.subtractor.apply(&frame)?;
            if !self.viewer.is_dragging() {
                let color = RoiColor::for_presence(self.detector.is_present());
                self.viewer.show(&draw_roi(&step.filtered, &roi, color))?;
            }
            if let Some(event) = self.detector.update(&step.mask, &roi) {
                summary.events.push(event);
            }
            summary.frames_processed += 1;
            self.viewer.pause(self.config.frame_delay)?;
        }

        let stats = self.source.stats();
        log::trace!(
            "sequence drained at index {} ({} frames read, {} misses)",
            self.source.cursor() - 1,
            stats.frames_loaded,
            stats.misses
        );
        summary.entries = self.detector.entries();
        Ok(summary)
    }

    /// `prime`, `select_roi` and `run` in one call.
    pub fn watch(mut self) -> Result<WatchSummary> {
        self.prime()?;
        if self.select_roi()?.is_none() {
            log::debug!("no ROI selected; nothing to watch");
            return Ok(WatchSummary::default());
        }
        self.run()
    }
}
