mod background;
mod bilateral;
mod occupancy;

pub use background::{BackgroundConfig, BackgroundSubtractor, Subtraction};
pub use bilateral::{bilateral_filter, FilterConfig};
pub use occupancy::{OccupancyConfig, OccupancyDetector, OccupancyEvent, OccupancyState};
