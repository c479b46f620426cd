//! ROI occupancy watcher
//!
//! Counts how many times an object enters a rectangular region of interest in
//! a numbered sequence of still images.
//!
//! # Architecture
//!
//! Frames flow through one pipeline:
//!
//! 1. **Frame source**: images named `basename + printf(pattern, i) + extension`
//!    are decoded in increasing index order until one is missing.
//! 2. **Background model**: each frame is bilateral-filtered, compared with a
//!    running-average estimate of the static scene and blended into it.
//! 3. **Occupancy detector**: the share of foreground pixels inside the ROI is
//!    compared with an enter and a leave threshold; crossings are logged.
//!
//! The viewer picks the ROI once, over the first frame, and afterwards only
//! presents annotated frames.
//!
//! # Module Structure
//!
//! - `frame`: frame and foreground mask types
//! - `roi`: region of interest geometry
//! - `ingest`: image sequence source and index pattern rendering
//! - `detect`: bilateral filter, background subtractor, occupancy detector
//! - `display`: viewer backends and the ROI overlay
//! - `watch`: session driving setup and the detection loop
//! - `config`, `logging`: runtime tunables and console output

pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod logging;
pub mod roi;
pub mod watch;

pub use config::WatchConfig;
pub use detect::{
    bilateral_filter, BackgroundConfig, BackgroundSubtractor, FilterConfig, OccupancyConfig,
    OccupancyDetector, OccupancyEvent, OccupancyState, Subtraction,
};
#[cfg(feature = "display-highgui")]
pub use display::HighguiViewer;
pub use display::{draw_roi, HeadlessViewer, RoiColor, Viewer};
pub use frame::{ForegroundMask, Frame, MASK_ON};
pub use ingest::{ImageSequence, IndexFormat, SequenceConfig, SequenceStats};
pub use roi::Roi;
pub use watch::{WatchSession, WatchSummary};
