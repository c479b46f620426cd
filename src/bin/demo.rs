//! demo - end-to-end synthetic run of the ROI occupancy watcher
//!
//! Writes a numbered PNG sequence (a static noisy scene with a dark block
//! sweeping across it `--passes` times) to `--out`, then watches the centre of
//! the frame headless and prints how many objects entered.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use roi_occupancy::{
    logging, HeadlessViewer, ImageSequence, IndexFormat, Roi, SequenceConfig, WatchConfig,
    WatchSession,
};

#[path = "../ui.rs"]
mod ui;

const PATTERN: &str = "%04i";
const EXTENSION: &str = ".png";
const BLOCK_SIZE: u32 = 30;
const BLOCK_COLOR: Rgb<u8> = Rgb([20, 24, 30]);
const BLOCK_STEP: i64 = 6;
const GAP_FRAMES: u32 = 5;
const NOISE: i16 = 3;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of times the block crosses the frame.
    #[arg(long, default_value_t = 2)]
    passes: u32,
    /// Frame width in pixels.
    #[arg(long, default_value_t = 160)]
    width: u32,
    /// Frame height in pixels.
    #[arg(long, default_value_t = 120)]
    height: u32,
    /// Output directory for the generated sequence.
    #[arg(long, default_value = "demo_out")]
    out: String,
    /// Also write annotated frames to `<out>/annotated`.
    #[arg(long)]
    annotate: bool,
    /// Optional deterministic seed for the sensor noise.
    #[arg(long)]
    seed: Option<u64>,
    /// 0 = errors, 1 = info, 2 = debug, 3 = trace
    #[arg(short, long, default_value_t = 1)]
    verbosity: u8,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.width < BLOCK_SIZE * 2 || args.height < BLOCK_SIZE * 2 {
        return Err(anyhow!(
            "frame must be at least {}x{}",
            BLOCK_SIZE * 2,
            BLOCK_SIZE * 2
        ));
    }
    logging::init(args.verbosity)?;

    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let out_dir = PathBuf::from(&args.out);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let config = WatchConfig {
        frame_delay: Duration::ZERO,
        ..WatchConfig::default()
    };
    let roi = Roi::new(
        args.width / 2 - BLOCK_SIZE / 2 - 5,
        args.height / 2 - BLOCK_SIZE / 2 - 5,
        BLOCK_SIZE + 10,
        BLOCK_SIZE + 10,
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let scene = Scene::new(args.width, args.height);
    let plan = plan_frames(&scene, config.warmup_frames, args.passes);

    let basename = out_dir.join("frame_").to_string_lossy().into_owned();
    {
        let format = IndexFormat::parse(PATTERN)?;
        let bar = frame_bar(plan.len() as u64, is_tty && args.ui != "plain");
        for (index, block_x) in plan.iter().enumerate() {
            let frame = scene.render(*block_x, &mut rng);
            let path = format!("{}{}{}", basename, format.render(index as i64), EXTENSION);
            frame
                .save(&path)
                .with_context(|| format!("failed to write {}", path))?;
            bar.inc(1);
        }
        bar.finish_with_message(format!("wrote {} frames to {}", plan.len(), out_dir.display()));
    }

    let source = ImageSequence::new(SequenceConfig {
        basename: basename.clone(),
        pattern: PATTERN.to_string(),
        extension: EXTENSION.to_string(),
        start_index: 0,
    })?;
    let mut viewer = HeadlessViewer::new(Some(roi));
    let annotated = out_dir.join("annotated");
    if args.annotate {
        viewer = viewer.with_annotate_dir(&annotated);
    }

    let mut session = WatchSession::new(source, viewer, config);
    {
        let _stage = ui.stage("Prime background model");
        session.prime()?;
    }
    session.select_roi()?;
    let summary = {
        let _stage = ui.stage("Watch sequence");
        session.run()?
    };

    println!("demo summary:");
    println!("  frames written: {}", plan.len());
    println!("  frames processed: {}", summary.frames_processed);
    println!("  roi: {}", roi);
    println!("  block passes: {}", args.passes);
    println!("  objects detected: {}", summary.entries);
    if args.annotate {
        println!("  annotated frames: {}", annotated.display());
    }
    println!("next steps:");
    println!(
        "  cargo run --bin roi_watch -- {} {} {} --roi {}",
        basename, PATTERN, EXTENSION, roi
    );
    println!("  ls -la {}", out_dir.display());

    if summary.entries != args.passes {
        log::error!(
            "expected {} objects but detected {}",
            args.passes,
            summary.entries
        );
    }
    Ok(())
}

/// Frame-writing progress on stderr; hidden when stderr is not a terminal.
fn frame_bar(total: u64, visible: bool) -> ProgressBar {
    if !visible {
        eprintln!("==> Write synthetic frames ({} frames)", total);
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_draw_target(ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));
    bar.set_message("Write synthetic frames");
    bar
}

/// Static background: a soft diagonal gradient.
struct Scene {
    background: RgbImage,
}

impl Scene {
    fn new(width: u32, height: u32) -> Self {
        let background = RgbImage::from_fn(width, height, |x, y| {
            let shade = 110 + ((x + y) * 40 / (width + height)) as u8;
            Rgb([shade, shade.saturating_add(10), shade.saturating_sub(10)])
        });
        Self { background }
    }

    fn width(&self) -> u32 {
        self.background.width()
    }

    fn height(&self) -> u32 {
        self.background.height()
    }

    /// Background plus per-pixel noise, with the block's left edge at `block_x` when set.
    fn render(&self, block_x: Option<i64>, rng: &mut StdRng) -> RgbImage {
        let mut frame = self.background.clone();
        for pixel in frame.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                let noisy = *channel as i16 + rng.gen_range(-NOISE..=NOISE);
                *channel = noisy.clamp(0, 255) as u8;
            }
        }

        if let Some(left) = block_x {
            let top = (self.height() / 2 - BLOCK_SIZE / 2) as i64;
            for y in top..top + BLOCK_SIZE as i64 {
                for x in left..left + BLOCK_SIZE as i64 {
                    if x >= 0 && x < self.width() as i64 {
                        frame.put_pixel(x as u32, y as u32, BLOCK_COLOR);
                    }
                }
            }
        }
        frame
    }
}

/// Block position for every frame index. Frame 0 and the warm-up frames are empty.
fn plan_frames(scene: &Scene, warmup: u32, passes: u32) -> Vec<Option<i64>> {
    let mut plan = vec![None; warmup as usize + 1];
    for _ in 0..passes {
        plan.extend((0..GAP_FRAMES).map(|_| None));
        let mut x = -(BLOCK_SIZE as i64);
        while x < scene.width() as i64 {
            plan.push(Some(x));
            x += BLOCK_STEP;
        }
    }
    plan.extend((0..GAP_FRAMES).map(|_| None));
    plan
}
