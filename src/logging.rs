//! Console logging.
//!
//! Lines go to stdout as `[LEVEL] message` with the level padded to five
//! characters, e.g. `[INFO ] Object {1} entered selected ROI.`.

use anyhow::{anyhow, Result};
use log::LevelFilter;
use std::io::Write;

/// Verbosity: 0 = errors only, 1 = info, 2 = debug, 3 = trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger. `RUST_LOG`, when set, refines the verbosity filter.
pub fn init(verbosity: u8) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(verbosity));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "[{:<5}] {}", record.level(), record.args()))
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}
