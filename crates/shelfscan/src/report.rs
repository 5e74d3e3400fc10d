use std::fs;
use std::path::Path;

use serde::Serialize;
use shelfscan_advisor::{ShelfStats, Suggestion};
use shelfscan_core::{Detection, SourceMethod};
use shelfscan_segment::SegmentPass;
use shelfscan_track::StabilizeReport;

use crate::error::IoError;

/// Segmentation and tracking counters of one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameDiagnostics {
    /// `None` when the external detector produced the frame.
    pub segment_pass: Option<SegmentPass>,
    pub bands: usize,
    pub raw_edges: usize,
    pub filtered_edges: usize,
    /// Spines reported by more than one overlapping band, dropped.
    pub duplicate_spines: usize,
    pub raw_detections: usize,
    pub stabilize: StabilizeReport,
}

/// Everything the scanner knows after one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Stabilized set.
    pub detections: Vec<Detection>,
    pub suggestions: Vec<Suggestion>,
    pub stats: ShelfStats,
    pub source_method: SourceMethod,
    pub diagnostics: FrameDiagnostics,
}

/// Reports of a frame sequence, as written by the CLI.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    pub frames: Vec<ScanFrame>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScanFrame {
    pub path: String,
    #[serde(flatten)]
    pub report: FrameReport,
}

impl ScanReport {
    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
