use std::sync::Arc;
use std::time::Duration;

use shelfscan_core::{Detection, RgbaImageView, SourceMethod};
use shelfscan_segment::{SpineDetector, SpineReport};

use crate::error::PipelineError;
use crate::external::{adapt_external, detect_with_timeout, ExternalDetector};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const DEFAULT_EXTERNAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw detections of one frame and where they came from.
#[derive(Clone, Debug)]
pub struct FrameDetections {
    pub detections: Vec<Detection>,
    pub source: SourceMethod,
    /// Present whenever the local segmentation ran.
    pub segmentation: Option<SpineReport>,
}

/// External detector when configured and healthy, local spine segmentation
/// otherwise.
#[derive(Clone)]
pub struct DetectionPipeline {
    segmenter: SpineDetector,
    external: Option<Arc<dyn ExternalDetector>>,
    external_timeout: Duration,
}

impl std::fmt::Debug for DetectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("segmenter", &self.segmenter)
            .field("external", &self.external.is_some())
            .field("external_timeout", &self.external_timeout)
            .finish()
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new(SpineDetector::default())
    }
}

impl DetectionPipeline {
    pub fn new(segmenter: SpineDetector) -> Self {
        Self {
            segmenter,
            external: None,
            external_timeout: DEFAULT_EXTERNAL_TIMEOUT,
        }
    }

    pub fn with_external(mut self, detector: Arc<dyn ExternalDetector>) -> Self {
        self.external = Some(detector);
        self
    }

    pub fn with_external_timeout(mut self, timeout: Duration) -> Self {
        self.external_timeout = timeout;
        self
    }

    pub fn segmenter(&self) -> &SpineDetector {
        &self.segmenter
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Raw detections for one frame. Only an invalid buffer is an error;
    /// external detector failures fall back to segmentation.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width, height = img.height))
    )]
    pub fn detect(&self, img: &RgbaImageView<'_>) -> Result<FrameDetections, PipelineError> {
        img.validate()?;

        if let Some(external) = &self.external {
            match detect_with_timeout(external, img, self.external_timeout) {
                Ok(raw) => {
                    let detections = adapt_external(raw);
                    log::debug!("external detector returned {} boxes", detections.len());
                    return Ok(FrameDetections {
                        detections,
                        source: SourceMethod::External,
                        segmentation: None,
                    });
                }
                Err(err) => log::warn!("{err}; falling back to spine segmentation"),
            }
        }

        let report = self.segmenter.detect(img)?;
        Ok(FrameDetections {
            detections: report.detections.clone(),
            source: report.source(),
            segmentation: Some(report),
        })
    }
}
