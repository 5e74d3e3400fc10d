//! JSON configuration of a [`ShelfScanner`](crate::ShelfScanner).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelfscan_advisor::{AdvisorParams, ShelfDimensions};
use shelfscan_segment::SegmentParams;
use shelfscan_track::StabilizerParams;

use crate::error::{ConfigError, IoError};

fn default_external_timeout_ms() -> u64 {
    10_000
}

/// Named starting points for the segmentation thresholds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SegmentPreset {
    #[default]
    Default,
    Sensitive,
    Conservative,
}

impl SegmentPreset {
    pub fn params(self) -> SegmentParams {
        match self {
            SegmentPreset::Default => SegmentParams::default(),
            SegmentPreset::Sensitive => SegmentParams::sensitive(),
            SegmentPreset::Conservative => SegmentParams::conservative(),
        }
    }
}

/// Every tunable of the scanner. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfScanConfig {
    pub segment: SegmentParams,
    pub stabilizer: StabilizerParams,
    pub advisor: AdvisorParams,
    /// Shelf extent for utilization stats; the frame size when absent.
    pub shelf: Option<ShelfDimensions>,
    #[serde(default = "default_external_timeout_ms")]
    pub external_timeout_ms: u64,
}

impl Default for ShelfScanConfig {
    fn default() -> Self {
        Self {
            segment: SegmentParams::default(),
            stabilizer: StabilizerParams::default(),
            advisor: AdvisorParams::default(),
            shelf: None,
            external_timeout_ms: default_external_timeout_ms(),
        }
    }
}

impl ShelfScanConfig {
    pub fn with_preset(preset: SegmentPreset) -> Self {
        Self {
            segment: preset.params(),
            ..Self::default()
        }
    }

    /// Load a JSON config from disk and validate it.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(IoError::from)?;
        let config: Self = serde_json::from_str(&raw).map_err(IoError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    /// Reject values the stages cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seg = &self.segment;
        check(seg.shelf.row_step > 0, "segment.shelf.row_step", "must be positive")?;
        check(seg.shelf.column_step > 0, "segment.shelf.column_step", "must be positive")?;
        check(seg.edges.sample_step > 0, "segment.edges.sample_step", "must be positive")?;
        check(
            seg.edges.edge_threshold >= 0.0,
            "segment.edges.edge_threshold",
            "must not be negative",
        )?;
        check(
            seg.filter.min_edge_separation >= 0.0,
            "segment.filter.min_edge_separation",
            "must not be negative",
        )?;
        check(
            seg.books.min_book_width <= seg.books.max_book_width,
            "segment.books.min_book_width",
            "exceeds max_book_width",
        )?;
        check(
            seg.books.min_book_height <= seg.books.max_book_height,
            "segment.books.min_book_height",
            "exceeds max_book_height",
        )?;
        check(
            (0.0..=1.0).contains(&seg.books.confidence_floor),
            "segment.books.confidence_floor",
            "must lie in [0, 1]",
        )?;
        check(
            seg.books.duplicate_overlap > 0.0 && seg.books.duplicate_overlap <= 1.0,
            "segment.books.duplicate_overlap",
            "must lie in (0, 1]",
        )?;
        if let Some(scale) = seg.retry_threshold_scale {
            check(
                scale > 0.0 && scale < 1.0,
                "segment.retry_threshold_scale",
                "must lie in (0, 1)",
            )?;
        }

        let st = &self.stabilizer;
        check((0.0..=1.0).contains(&st.alpha), "stabilizer.alpha", "must lie in [0, 1]")?;
        check(st.match_distance > 0.0, "stabilizer.match_distance", "must be positive")?;
        check(
            (0.0..=1.0).contains(&st.miss_decay),
            "stabilizer.miss_decay",
            "must lie in [0, 1]",
        )?;
        check(
            (0.0..=1.0).contains(&st.drop_confidence),
            "stabilizer.drop_confidence",
            "must lie in [0, 1]",
        )?;

        if let Some(shelf) = self.shelf {
            check(shelf.width > 0.0, "shelf.width", "must be positive")?;
            check(shelf.height > 0.0, "shelf.height", "must be positive")?;
        }
        Ok(())
    }
}

fn check(ok: bool, field: &'static str, reason: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        })
    }
}
