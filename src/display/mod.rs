//! Frame presentation and ROI selection.
//!
//! A `Viewer` lets the operator pick the ROI over the first frame and then
//! presents every processed frame with the ROI overlay. Two backends exist:
//! - `HeadlessViewer`: ROI fixed up front, frames optionally written as PNGs
//! - `HighguiViewer`: OpenCV window with press-drag-release selection
//!   (feature: display-highgui)

use anyhow::Result;
use std::time::Duration;

use crate::frame::Frame;
use crate::roi::Roi;

mod headless;
#[cfg(feature = "display-highgui")]
mod highgui;
pub mod overlay;

pub use headless::HeadlessViewer;
#[cfg(feature = "display-highgui")]
pub use highgui::HighguiViewer;
pub use overlay::{draw_roi, RoiColor};

/// Window (or stand-in) the watcher talks to.
pub trait Viewer {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Let the operator choose the ROI over `first`.
    ///
    /// Returns `None` when the operator closed the view without selecting.
    fn select_roi(&mut self, first: &Frame) -> Result<Option<Roi>>;

    /// Present an already-annotated frame.
    fn show(&mut self, frame: &Frame) -> Result<()>;

    /// True while the operator is dragging a new rectangle. The overlay is
    /// skipped during a drag so the preview stays visible.
    fn is_dragging(&self) -> bool {
        false
    }

    /// Pace playback and let the view refresh.
    fn pause(&mut self, delay: Duration) -> Result<()>;
}
