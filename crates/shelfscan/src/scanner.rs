use std::sync::Arc;

use shelfscan_advisor::{OptimizationAdvisor, ShelfDimensions};
use shelfscan_core::RgbaImageView;
use shelfscan_segment::SpineDetector;
use shelfscan_track::TemporalStabilizer;

use crate::config::ShelfScanConfig;
use crate::error::PipelineError;
use crate::external::ExternalDetector;
use crate::pipeline::DetectionPipeline;
use crate::report::{FrameDiagnostics, FrameReport};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detection, stabilization and advice over a stream of frames.
///
/// Holds the tracks carried between frames; `process` takes `&mut self`, so
/// frames are handled strictly one after another.
#[derive(Debug, Default)]
pub struct ShelfScanner {
    pipeline: DetectionPipeline,
    stabilizer: TemporalStabilizer,
    advisor: OptimizationAdvisor,
    shelf: Option<ShelfDimensions>,
    frames: u64,
}

impl ShelfScanner {
    pub fn new(config: &ShelfScanConfig) -> Self {
        let pipeline = DetectionPipeline::new(SpineDetector::new(config.segment.clone()))
            .with_external_timeout(config.external_timeout());
        Self {
            pipeline,
            stabilizer: TemporalStabilizer::new(config.stabilizer.clone()),
            advisor: OptimizationAdvisor::new(config.advisor.clone()),
            shelf: config.shelf,
            frames: 0,
        }
    }

    pub fn with_external(mut self, detector: Arc<dyn ExternalDetector>) -> Self {
        self.pipeline = self.pipeline.with_external(detector);
        self
    }

    pub fn pipeline(&self) -> &DetectionPipeline {
        &self.pipeline
    }

    pub fn stabilizer(&self) -> &TemporalStabilizer {
        &self.stabilizer
    }

    /// Number of frames processed successfully.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Drop all tracks, e.g. after the camera moved to another shelf.
    pub fn reset(&mut self) {
        self.stabilizer.reset();
    }

    /// Run one frame. On error nothing carried between frames changes.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(frame = self.frames))
    )]
    pub fn process(&mut self, img: &RgbaImageView<'_>) -> Result<FrameReport, PipelineError> {
        let raw = self.pipeline.detect(img)?;
        let stabilize = self.stabilizer.update(&raw.detections);

        let shelf = self
            .shelf
            .unwrap_or_else(|| ShelfDimensions::new(img.width as f32, img.height as f32));
        let advice = self.advisor.analyze(self.stabilizer.detections(), shelf);

        let diagnostics = match &raw.segmentation {
            Some(seg) => FrameDiagnostics {
                segment_pass: Some(seg.pass),
                bands: seg.bands.len(),
                raw_edges: seg.raw_edges,
                filtered_edges: seg.filtered_edges,
                duplicate_spines: seg.duplicates,
                raw_detections: raw.detections.len(),
                stabilize,
            },
            None => FrameDiagnostics {
                raw_detections: raw.detections.len(),
                stabilize,
                ..FrameDiagnostics::default()
            },
        };

        let report = FrameReport {
            frame_index: self.frames,
            detections: self.stabilizer.detections().to_vec(),
            suggestions: advice.suggestions,
            stats: advice.stats,
            source_method: raw.source,
            diagnostics,
        };
        self.frames += 1;
        log::info!(
            "frame {}: {} books via {}, {} suggestions",
            report.frame_index,
            report.stats.books_found,
            report.source_method,
            report.suggestions.len()
        );
        Ok(report)
    }
}
