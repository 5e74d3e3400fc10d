//! Shelf-space optimization over a stabilized set of book-spine detections.
//!
//! Each detection gets at most one suggestion from an ordered table of
//! heuristics (rotate, stack, face-out); the set as a whole is summarized in
//! [`ShelfStats`].

mod advisor;
mod heuristics;
mod params;

pub use advisor::{Advice, OptimizationAdvisor, ShelfStats, Suggestion};
pub use heuristics::{
    beneficial_saving, evaluate, rotate_saving, stack_saving, Gain, Heuristic, SuggestionKind,
    HEURISTICS,
};
pub use params::{AdvisorParams, ShelfDimensions};
