//! shelfscan CLI: run image files through one scanner as a frame sequence.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use shelfscan::detect::{load_rgba, rgba_view};
use shelfscan::{
    ScanFrame, ScanReport, SegmentPreset, ShelfDimensions, ShelfScanConfig, ShelfScanner,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "shelfscan")]
#[command(about = "Detect book spines on shelf photos and suggest space-saving placements")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Emit `tracing` spans as JSON lines (feature `tracing`).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process images in the given order, carrying tracks between them.
    Scan(ScanArgs),

    /// Print the default config as JSON.
    DefaultConfig {
        /// Start from a threshold preset.
        #[arg(long, value_enum, default_value_t = SegmentPreset::Default)]
        preset: SegmentPreset,

        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Input images, treated as consecutive frames.
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// JSON config; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replace the config's segmentation thresholds with a preset.
    #[arg(long, value_enum)]
    preset: Option<SegmentPreset>,

    /// Shelf width in pixels for utilization stats (default: frame width).
    #[arg(long, requires = "shelf_height")]
    shelf_width: Option<f32>,

    /// Shelf height in pixels for utilization stats.
    #[arg(long, requires = "shelf_width")]
    shelf_height: Option<f32>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip unreadable frames instead of stopping.
    #[arg(long)]
    keep_going: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args),
        Commands::DefaultConfig { preset, out } => run_default_config(preset, out),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: LogLevel, json: bool) -> CliResult<()> {
    shelfscan::core::init_tracing(json);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LogLevel, json: bool) -> CliResult<()> {
    shelfscan::core::init_with_level(level.into())?;
    if json {
        log::warn!("--log-json needs the `tracing` feature; using plain logs");
    }
    Ok(())
}

// ── scan ────────────────────────────────────────────────────────────────

fn run_scan(args: &ScanArgs) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading config: {}", path.display());
            ShelfScanConfig::load_json(path)?
        }
        None => ShelfScanConfig::default(),
    };
    if let Some(preset) = args.preset {
        config.segment = preset.params();
    }
    if let (Some(width), Some(height)) = (args.shelf_width, args.shelf_height) {
        config.shelf = Some(ShelfDimensions::new(width, height));
    }
    config.validate()?;

    let mut scanner = ShelfScanner::new(&config);
    let mut report = ScanReport::default();
    for path in &args.frames {
        let img = match load_rgba(path) {
            Ok(img) => img,
            Err(err) if args.keep_going => {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
            Err(err) => return Err(format!("{}: {err}", path.display()).into()),
        };
        log::debug!("{}: {}x{}", path.display(), img.width(), img.height());
        let frame = scanner.process(&rgba_view(&img))?;
        report.frames.push(ScanFrame {
            path: path.display().to_string(),
            report: frame,
        });
    }

    match &args.out {
        Some(out) => {
            report.write_json(out)?;
            log::info!("Report written to {}", out.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

// ── default-config ──────────────────────────────────────────────────────

fn run_default_config(preset: SegmentPreset, out: Option<PathBuf>) -> CliResult<()> {
    let config = ShelfScanConfig::with_preset(preset);
    match out {
        Some(path) => {
            config.write_json(&path)?;
            log::info!("Config written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}
