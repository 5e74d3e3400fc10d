use serde::{Deserialize, Serialize};

/// Association and smoothing constants of [`crate::TemporalStabilizer`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StabilizerParams {
    /// Weight of the previous geometry when blending a matched track.
    pub alpha: f32,
    /// A new detection matches a track only strictly below this distance (px).
    pub match_distance: f32,
    /// Weight of the previous confidence on a match.
    pub confidence_carry: f32,
    /// Lower bound of a matched track's confidence.
    pub matched_confidence_floor: f32,
    /// Confidence multiplier for a track missing from the current frame.
    pub miss_decay: f32,
    /// A missed track stays `stable` while its confidence is above this.
    pub stable_confidence: f32,
    /// Tracks at or below this confidence are dropped.
    pub drop_confidence: f32,
    /// Best and second-best candidates closer than this are ambiguous.
    pub ambiguity_tolerance: f32,
}

impl Default for StabilizerParams {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            match_distance: 50.0,
            confidence_carry: 0.8,
            matched_confidence_floor: 0.3,
            miss_decay: 0.9,
            stable_confidence: 0.3,
            drop_confidence: 0.15,
            ambiguity_tolerance: 1e-3,
        }
    }
}
