//! High-level facade of the `shelfscan-*` workspace.
//!
//! This crate provides:
//! - re-exports of the stage crates (segmentation, stabilization, advice)
//! - [`DetectionPipeline`]: an optional external detector, run with a bounded
//!   timeout, with local spine segmentation as the fallback
//! - [`ShelfScanner`]: pipeline, stabilizer and advisor over a frame stream
//! - JSON configuration and reports
//! - (feature `image`) helpers from `image` buffers in [`detect`]
//!
//! ## Quickstart
//!
//! ```
//! use shelfscan::{ShelfScanConfig, ShelfScanner};
//! use shelfscan::core::RgbaImage;
//!
//! let mut frame = RgbaImage::filled(400, 300, [240, 240, 240]);
//! for (i, x) in (40..360).step_by(40).enumerate() {
//!     let rgb = if i % 2 == 0 { [200, 30, 30] } else { [30, 200, 200] };
//!     frame.fill_rect(x, 60, 40, 190, rgb);
//! }
//! frame.fill_rect(0, 250, 400, 12, [60, 40, 20]);
//!
//! let mut scanner = ShelfScanner::new(&ShelfScanConfig::default());
//! let report = scanner.process(&frame.view()).expect("valid frame");
//! println!(
//!     "{} books, {:.0}% of the shelf used",
//!     report.stats.books_found, report.stats.space_used_percent
//! );
//! ```
//!
//! ## API map
//! - `shelfscan::core`: frame views, `Detection`, logging.
//! - `shelfscan::segment`: shelf bands, spine edges, the size table.
//! - `shelfscan::track`: the temporal stabilizer.
//! - `shelfscan::advisor`: placement heuristics and utilization stats.

pub use shelfscan_advisor as advisor;
pub use shelfscan_core as core;
pub use shelfscan_segment as segment;
pub use shelfscan_track as track;

pub use shelfscan_advisor::{ShelfDimensions, ShelfStats, Suggestion, SuggestionKind};
pub use shelfscan_core::{Detection, ImageError, RgbaImageView, SourceMethod};

mod config;
mod error;
mod external;
mod pipeline;
mod report;
mod scanner;

pub use config::{SegmentPreset, ShelfScanConfig};
pub use error::{ConfigError, IoError, PipelineError};
pub use external::{
    adapt_external, detect_with_timeout, ExternalDetection, ExternalDetector,
    ExternalDetectorError,
};
pub use pipeline::{DetectionPipeline, FrameDetections, DEFAULT_EXTERNAL_TIMEOUT};
pub use report::{FrameDiagnostics, FrameReport, ScanFrame, ScanReport};
pub use scanner::ShelfScanner;

#[cfg(feature = "image")]
pub mod detect;
