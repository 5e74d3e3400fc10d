use serde::{Deserialize, Serialize};

/// Gates and constants of the three placement heuristics.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisorParams {
    /// Rotate applies below `height < width * rotate_max_aspect`.
    pub rotate_max_aspect: f32,
    pub rotate_min_width: f32,
    /// Footprint a rotation must save to be suggested.
    pub rotate_min_saving: f32,

    pub stack_min_height: f32,
    pub stack_max_width: f32,
    pub stack_max_thickness: f32,
    /// Fraction of the upright footprint a stacked book occupies.
    pub stack_packing: f32,
    pub stack_min_saving: f32,

    pub face_out_min_width: f32,
    pub face_out_min_height: f32,
    /// Visibility gain per pixel of spine width.
    pub face_out_visibility: f32,
    pub face_out_min_visibility: f32,
    /// Depth share of the cover footprint when shown face-out.
    pub face_out_footprint: f32,
}

impl Default for AdvisorParams {
    fn default() -> Self {
        Self {
            rotate_max_aspect: 2.5,
            rotate_min_width: 30.0,
            rotate_min_saving: 5.0,
            stack_min_height: 120.0,
            stack_max_width: 35.0,
            stack_max_thickness: 25.0,
            stack_packing: 0.6,
            stack_min_saving: 3.0,
            face_out_min_width: 45.0,
            face_out_min_height: 80.0,
            face_out_visibility: 0.8,
            face_out_min_visibility: 25.0,
            face_out_footprint: 0.7,
        }
    }
}

/// Physical extent of the analysed shelf, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ShelfDimensions {
    pub width: f32,
    pub height: f32,
}

impl ShelfDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
