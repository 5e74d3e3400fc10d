//! Ordered placement heuristics: each entry pairs an applicability test with
//! a scorer, and the first entry that scores a benefit wins.

use serde::{Deserialize, Serialize};
use shelfscan_core::Detection;

use crate::params::AdvisorParams;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Lay the book on its side within the row.
    Rotate,
    /// Move the book onto a horizontal stack.
    Stack,
    /// Show the cover instead of the spine.
    FaceOut,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Rotate => "rotate",
            SuggestionKind::Stack => "stack",
            SuggestionKind::FaceOut => "face_out",
        }
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of a beneficial heuristic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gain {
    /// Percent of the current footprint saved, or visibility gain for face-out.
    pub efficiency: f32,
    /// Footprint saved, or percent volume change for face-out (may be negative).
    pub volume: f32,
}

pub struct Heuristic {
    pub kind: SuggestionKind,
    pub applies: fn(&Detection, &AdvisorParams) -> bool,
    /// `None` when applicable but not worth suggesting.
    pub score: fn(&Detection, &AdvisorParams) -> Option<Gain>,
}

/// Evaluation order is priority order.
pub static HEURISTICS: [Heuristic; 3] = [
    Heuristic {
        kind: SuggestionKind::Rotate,
        applies: rotate_applies,
        score: rotate_score,
    },
    Heuristic {
        kind: SuggestionKind::Stack,
        applies: stack_applies,
        score: stack_score,
    },
    Heuristic {
        kind: SuggestionKind::FaceOut,
        applies: face_out_applies,
        score: face_out_score,
    },
];

/// First beneficial heuristic for `det`.
pub fn evaluate(det: &Detection, params: &AdvisorParams) -> Option<(SuggestionKind, Gain)> {
    HEURISTICS.iter().find_map(|h| {
        if !(h.applies)(det, params) {
            return None;
        }
        let gain = (h.score)(det, params);
        if gain.is_none() {
            log::trace!("{} not beneficial for detection {}", h.kind, det.id);
        }
        gain.map(|g| (h.kind, g))
    })
}

/// Footprint a rotation would save, `None` when rotation does not apply.
pub fn rotate_saving(det: &Detection, params: &AdvisorParams) -> Option<f32> {
    rotate_applies(det, params)
        .then(|| (det.width - det.height) * det.estimated_thickness)
}

/// Footprint stacking would save, `None` when stacking does not apply.
pub fn stack_saving(det: &Detection, params: &AdvisorParams) -> Option<f32> {
    stack_applies(det, params).then(|| det.footprint() * (1.0 - params.stack_packing))
}

/// Footprint saved by the better of rotate and stack, counting only savings
/// that clear the same benefit gates as the suggestions.
pub fn beneficial_saving(det: &Detection, params: &AdvisorParams) -> f32 {
    let rotate = rotate_score(det, params).map_or(0.0, |g| g.volume);
    let stack = stack_score(det, params).map_or(0.0, |g| g.volume);
    rotate.max(stack)
}

fn rotate_applies(det: &Detection, params: &AdvisorParams) -> bool {
    det.height < det.width * params.rotate_max_aspect && det.width > params.rotate_min_width
}

fn rotate_score(det: &Detection, params: &AdvisorParams) -> Option<Gain> {
    let before = det.footprint();
    let saved = rotate_saving(det, params)?;
    (saved > params.rotate_min_saving && before > 0.0).then(|| Gain {
        efficiency: saved / before * 100.0,
        volume: saved,
    })
}

fn stack_applies(det: &Detection, params: &AdvisorParams) -> bool {
    det.height > params.stack_min_height
        && det.width < params.stack_max_width
        && det.estimated_thickness < params.stack_max_thickness
}

fn stack_score(det: &Detection, params: &AdvisorParams) -> Option<Gain> {
    let before = det.footprint();
    let saved = stack_saving(det, params)?;
    (saved > params.stack_min_saving && before > 0.0).then(|| Gain {
        efficiency: saved / before * 100.0,
        volume: saved,
    })
}

fn face_out_applies(det: &Detection, params: &AdvisorParams) -> bool {
    det.width > params.face_out_min_width && det.height > params.face_out_min_height
}

fn face_out_score(det: &Detection, params: &AdvisorParams) -> Option<Gain> {
    let visibility = det.width * params.face_out_visibility;
    if visibility <= params.face_out_min_visibility {
        return None;
    }
    let before = det.footprint();
    let after = params.face_out_footprint * det.height * det.estimated_thickness;
    let volume = if before > 0.0 {
        (before - after) / before * 100.0
    } else {
        0.0
    };
    Some(Gain {
        efficiency: visibility,
        volume,
    })
}
