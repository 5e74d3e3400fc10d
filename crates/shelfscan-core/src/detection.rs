use std::ops::RangeInclusive;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Height-to-width ratio of the most space-efficient spine.
pub const IDEAL_ASPECT_RATIO: f32 = 2.5;

/// Book depth estimated from the visible spine width.
pub const THICKNESS_RATIO: f32 = 0.6;

pub const CONFIDENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Which path produced a detection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMethod {
    /// First pass of the local spine segmentation.
    #[default]
    Segmentation,
    /// Second, looser-threshold pass of the local segmentation.
    SegmentationFallback,
    /// An external object detector.
    External,
}

impl SourceMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceMethod::Segmentation => "segmentation",
            SourceMethod::SegmentationFallback => "segmentation-fallback",
            SourceMethod::External => "external",
        }
    }
}

impl std::fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One book-spine region, raw or stabilized.
///
/// `x`/`y` are the top-left corner in image pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub estimated_thickness: f32,
    pub can_rotate: bool,
    pub can_stack: bool,
    pub volume_efficiency: f32,
    pub stable: bool,
    pub source: SourceMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Detection {
    /// Build a detection and fill every derived field from its geometry.
    ///
    /// Returns `None` for a non-finite position or a non-positive or
    /// non-finite size.
    pub fn new(
        id: u64,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        confidence: f32,
        source: SourceMethod,
    ) -> Option<Self> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return None;
        }
        let mut det = Self {
            id,
            x,
            y,
            width,
            height,
            confidence: 0.0,
            estimated_thickness: 0.0,
            can_rotate: false,
            can_stack: false,
            volume_efficiency: 0.0,
            stable: false,
            source,
            label: None,
        };
        det.set_confidence(confidence);
        det.refresh_derived();
        Some(det)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Store `confidence` clamped to `[0, 1]`; NaN maps to 0.
    pub fn set_confidence(&mut self, confidence: f32) {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(*CONFIDENCE_RANGE.start(), *CONFIDENCE_RANGE.end())
        };
    }

    /// Recompute thickness, handling flags and volume efficiency.
    pub fn refresh_derived(&mut self) {
        self.estimated_thickness = self.width * THICKNESS_RATIO;
        self.can_rotate = self.height < self.width * 3.0;
        self.can_stack = self.height > 100.0 && self.width < 30.0;
        self.volume_efficiency = volume_efficiency(self.width, self.height);
    }

    /// Top-left corner, the point the stabilizer associates on.
    #[inline]
    pub fn origin(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    /// Shelf footprint of the upright book (`width × thickness`).
    #[inline]
    pub fn footprint(&self) -> f32 {
        self.width * self.estimated_thickness
    }
}

/// Aspect-ratio desirability in `[0.1, 0.9]`, best at `height / width = 2.5`.
pub fn volume_efficiency(width: f32, height: f32) -> f32 {
    if width <= 0.0 || !width.is_finite() || !height.is_finite() {
        return 0.1;
    }
    let aspect = height / width;
    (1.0 - (aspect - IDEAL_ASPECT_RATIO).abs() / IDEAL_ASPECT_RATIO).clamp(0.1, 0.9)
}
