//! roi_watch - count objects entering a region of interest
//!
//! Reads `<basename><index><extension>` frames starting at index 0, learns
//! the static background, lets the operator pick a ROI over the first frame
//! and logs every time an object enters or leaves it.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use roi_occupancy::{
    logging, HeadlessViewer, ImageSequence, Roi, SequenceConfig, Viewer, WatchConfig,
    WatchSession, WatchSummary,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "roi_watch",
    version,
    about = "Count objects entering a region of interest in an image sequence"
)]
struct Args {
    /// Path prefix of every frame, e.g. `frames/img_`
    basename: String,

    /// printf-style index pattern with exactly one integer conversion, e.g. `%04i`
    #[arg(value_name = "CONTINUOUS_VAR_FORMAT")]
    format: String,

    /// Suffix of every frame including the dot, e.g. `.png`
    extension: String,

    /// Region of interest as X,Y,W,H (headless default: whole frame)
    #[arg(long, value_name = "X,Y,W,H")]
    roi: Option<Roi>,

    /// 0 = errors, 1 = info, 2 = debug, 3 = trace
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    verbosity: u8,

    /// JSON file with watcher tunables
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write every annotated frame as PNG into this directory (headless only)
    #[arg(long, value_name = "DIR")]
    annotate_dir: Option<PathBuf>,

    /// Pause between frames in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Run without a window even when one is available
    #[arg(long)]
    headless: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(-1);
            }
        },
    };

    if let Err(err) = logging::init(args.verbosity) {
        eprintln!("{err:#}");
        std::process::exit(-1);
    }

    match run(args) {
        Ok(summary) => println!("Detected Objects in selected ROI: {}", summary.entries),
        Err(err) => {
            log::error!("{:#}", err);
            std::process::exit(-1);
        }
    }
}

fn run(args: Args) -> Result<WatchSummary> {
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let config = {
        let _stage = ui.stage("Load configuration");
        let mut config = WatchConfig::load(args.config.as_deref())?;
        if let Some(ms) = args.delay_ms {
            config.frame_delay = Duration::from_millis(ms);
        }
        config.validate().context("invalid configuration")?;
        config
    };
    log::debug!("configuration: {:?}", config);

    let source = {
        let _stage = ui.stage("Open image sequence");
        ImageSequence::new(SequenceConfig {
            basename: args.basename.clone(),
            pattern: args.format.clone(),
            extension: args.extension.clone(),
            ..SequenceConfig::default()
        })?
    };

    #[cfg(feature = "display-highgui")]
    {
        if !args.headless {
            let ignored = headless_only_flags(&args);
            if !ignored.is_empty() {
                log::warn!(
                    "{} only apply to the headless viewer; pass --headless to use them",
                    ignored.join(" and ")
                );
            }
            let viewer = roi_occupancy::HighguiViewer::open("roi_watch")?;
            return watch(&ui, WatchSession::new(source, viewer, config));
        }
    }

    log::debug!("headless viewer (requested: {})", args.headless);
    let mut viewer = HeadlessViewer::new(args.roi);
    if let Some(dir) = &args.annotate_dir {
        viewer = viewer.with_annotate_dir(dir);
    }
    watch(&ui, WatchSession::new(source, viewer, config))
}

/// Flags given on the command line that the window viewer does not use.
#[cfg(any(feature = "display-highgui", test))]
fn headless_only_flags(args: &Args) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if args.roi.is_some() {
        flags.push("--roi");
    }
    if args.annotate_dir.is_some() {
        flags.push("--annotate-dir");
    }
    flags
}

fn watch<V: Viewer>(ui: &ui::Ui, mut session: WatchSession<V>) -> Result<WatchSummary> {
    {
        let _stage = ui.stage("Prime background model");
        session.prime()?;
    }
    let selected = {
        let _stage = ui.stage("Select ROI");
        session.select_roi()?
    };
    if selected.is_none() {
        log::debug!("window closed before a ROI was selected");
        return Ok(WatchSummary::default());
    }
    session.run()
}
