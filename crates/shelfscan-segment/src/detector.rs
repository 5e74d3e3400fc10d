use serde::{Deserialize, Serialize};
use shelfscan_core::{Detection, ImageError, RgbaImageView, SourceMethod};

use crate::books::{extract_books, merge_band_detections};
use crate::dimensions::DimensionValidator;
use crate::edges::{extract_edges, EdgeCandidate};
use crate::nms::filter_edges;
use crate::params::SegmentParams;
use crate::shelf::{segment_shelves, ShelfBand};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which threshold pass produced a segmentation result.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentPass {
    Primary,
    Retry,
}

impl SegmentPass {
    /// Source tag carried by detections of this pass.
    pub fn source(self) -> SourceMethod {
        match self {
            SegmentPass::Primary => SourceMethod::Segmentation,
            SegmentPass::Retry => SourceMethod::SegmentationFallback,
        }
    }
}

/// Edges found by one pass, per band (same order as the bands).
#[derive(Clone, Debug, Default)]
pub struct PassOutcome {
    pub raw_edges: usize,
    pub filtered: Vec<Vec<EdgeCandidate>>,
}

/// Run `pass` at full threshold; when it finds no edge at all and a retry
/// scale is configured, run it once more with the scaled threshold.
///
/// `pass` receives the threshold multiplier.
pub fn two_pass<F>(retry_scale: Option<f32>, mut pass: F) -> (SegmentPass, PassOutcome)
where
    F: FnMut(f32) -> PassOutcome,
{
    let first = pass(1.0);
    match retry_scale {
        Some(scale) if first.raw_edges == 0 => {
            log::debug!("no edges at full threshold, retrying with scale {scale}");
            (SegmentPass::Retry, pass(scale))
        }
        _ => (SegmentPass::Primary, first),
    }
}

/// Per-frame output of the local spine segmentation.
#[derive(Clone, Debug, Serialize)]
pub struct SpineReport {
    pub bands: Vec<ShelfBand>,
    pub pass: SegmentPass,
    pub raw_edges: usize,
    pub filtered_edges: usize,
    /// Spines dropped because an overlapping band already reported them.
    pub duplicates: usize,
    pub detections: Vec<Detection>,
}

impl SpineReport {
    pub fn source(&self) -> SourceMethod {
        self.pass.source()
    }
}

/// Shelf → edges → suppression → spine pairing, with the retry pass.
#[derive(Clone, Debug, Default)]
pub struct SpineDetector {
    params: SegmentParams,
    validator: DimensionValidator,
}

impl SpineDetector {
    pub fn new(params: SegmentParams) -> Self {
        Self {
            params,
            validator: DimensionValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: DimensionValidator) -> Self {
        self.validator = validator;
        self
    }

    #[inline]
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// Segment one frame. Detection ids are numbered from 1 in band order.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, img),
            fields(width = img.width, height = img.height)
        )
    )]
    pub fn detect(&self, img: &RgbaImageView<'_>) -> Result<SpineReport, ImageError> {
        img.validate()?;

        let bands = segment_shelves(img, &self.params.shelf);
        let (pass, outcome) = two_pass(self.params.retry_threshold_scale, |scale| {
            self.edges_per_band(img, &bands, scale)
        });

        let source = pass.source();
        let per_band = bands
            .iter()
            .zip(&outcome.filtered)
            .map(|(band, edges)| {
                let books = extract_books(edges, band, &self.validator, &self.params.books, source);
                (*band, books)
            })
            .collect();
        let (mut detections, duplicates) =
            merge_band_detections(per_band, self.params.books.duplicate_overlap);
        for (idx, det) in detections.iter_mut().enumerate() {
            det.id = idx as u64 + 1;
        }

        let filtered_edges = outcome.filtered.iter().map(Vec::len).sum();
        log::debug!(
            "{} bands, {} raw / {} filtered edges, {} spines, {} duplicates ({:?} pass)",
            bands.len(),
            outcome.raw_edges,
            filtered_edges,
            detections.len(),
            duplicates,
            pass
        );

        Ok(SpineReport {
            bands,
            pass,
            raw_edges: outcome.raw_edges,
            filtered_edges,
            duplicates,
            detections,
        })
    }

    fn edges_per_band(
        &self,
        img: &RgbaImageView<'_>,
        bands: &[ShelfBand],
        threshold_scale: f32,
    ) -> PassOutcome {
        let params = self.params.with_edge_threshold_scaled(threshold_scale);
        let mut outcome = PassOutcome::default();
        for band in bands {
            let edges = extract_edges(img, band, &params.edges);
            outcome.raw_edges += edges.len();
            outcome.filtered.push(filter_edges(&edges, &params.filter));
        }
        outcome
    }
}
