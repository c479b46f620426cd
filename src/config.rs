use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{BackgroundConfig, FilterConfig, OccupancyConfig};

const DEFAULT_WARMUP_FRAMES: u32 = 10;
const DEFAULT_FRAME_DELAY_MS: u64 = 15;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct WatchConfigFile {
    learning_rate: Option<f32>,
    threshold: Option<u8>,
    warmup_frames: Option<u32>,
    frame_delay_ms: Option<u64>,
    filter: Option<FilterConfigFile>,
    occupancy: Option<OccupancyConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FilterConfigFile {
    color_sigma: Option<f32>,
    space_sigma: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OccupancyConfigFile {
    enter_percent: Option<u32>,
    leave_percent: Option<u32>,
}

/// Tunables for a watch run.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub background: BackgroundConfig,
    pub occupancy: OccupancyConfig,
    /// Frames `warmup_frames..=1` are fed to the background model before detection.
    pub warmup_frames: u32,
    /// Pause after each detection step.
    pub frame_delay: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            background: BackgroundConfig::default(),
            occupancy: OccupancyConfig::default(),
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            frame_delay: Duration::from_millis(DEFAULT_FRAME_DELAY_MS),
        }
    }
}

impl WatchConfig {
    /// Defaults, then the config file (`path`, else `ROI_CONFIG`), then `ROI_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("ROI_CONFIG").ok().map(PathBuf::from));
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: WatchConfigFile) -> Self {
        let defaults = Self::default();
        let filter = FilterConfig {
            color_sigma: file
                .filter
                .as_ref()
                .and_then(|filter| filter.color_sigma)
                .unwrap_or(defaults.background.filter.color_sigma),
            space_sigma: file
                .filter
                .as_ref()
                .and_then(|filter| filter.space_sigma)
                .unwrap_or(defaults.background.filter.space_sigma),
        };
        let background = BackgroundConfig {
            learning_rate: file
                .learning_rate
                .unwrap_or(defaults.background.learning_rate),
            threshold: file.threshold.unwrap_or(defaults.background.threshold),
            filter,
        };
        let occupancy = OccupancyConfig {
            enter_percent: file
                .occupancy
                .as_ref()
                .and_then(|occupancy| occupancy.enter_percent)
                .unwrap_or(defaults.occupancy.enter_percent),
            leave_percent: file
                .occupancy
                .as_ref()
                .and_then(|occupancy| occupancy.leave_percent)
                .unwrap_or(defaults.occupancy.leave_percent),
        };
        Self {
            background,
            occupancy,
            warmup_frames: file.warmup_frames.unwrap_or(defaults.warmup_frames),
            frame_delay: file
                .frame_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_delay),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(rate) = env_value::<f32>("ROI_LEARNING_RATE")? {
            self.background.learning_rate = rate;
        }
        if let Some(threshold) = env_value::<u8>("ROI_THRESHOLD")? {
            self.background.threshold = threshold;
        }
        if let Some(percent) = env_value::<u32>("ROI_ENTER_PERCENT")? {
            self.occupancy.enter_percent = percent;
        }
        if let Some(percent) = env_value::<u32>("ROI_LEAVE_PERCENT")? {
            self.occupancy.leave_percent = percent;
        }
        if let Some(frames) = env_value::<u32>("ROI_WARMUP_FRAMES")? {
            self.warmup_frames = frames;
        }
        if let Some(ms) = env_value::<u64>("ROI_FRAME_DELAY_MS")? {
            self.frame_delay = Duration::from_millis(ms);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let rate = self.background.learning_rate;
        if !(rate > 0.0 && rate <= 1.0) {
            bail!("learning_rate must be in (0, 1], got {}", rate);
        }
        let filter = &self.background.filter;
        if !(filter.color_sigma > 0.0 && filter.space_sigma > 0.0) {
            bail!("filter sigmas must be greater than zero");
        }
        let occupancy = &self.occupancy;
        if occupancy.enter_percent > 100 {
            bail!("enter_percent must be at most 100");
        }
        if occupancy.leave_percent > occupancy.enter_percent {
            bail!(
                "leave_percent ({}) must not exceed enter_percent ({})",
                occupancy.leave_percent,
                occupancy.enter_percent
            );
        }
        Ok(())
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value {:?}", key, raw)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<WatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
