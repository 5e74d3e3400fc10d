//! Temporal stabilization of per-frame book-spine detections.
//!
//! Every frame's raw detections are associated greedily with the tracks kept
//! from the previous frame by nearest top-left corner. Matched tracks blend
//! their geometry toward the new observation and keep their id; tracks that
//! disappear decay in confidence until they fall below the drop floor.
//!
//! ```
//! use shelfscan_core::{Detection, SourceMethod};
//! use shelfscan_track::TemporalStabilizer;
//!
//! let raw = vec![
//!     Detection::new(1, 100.0, 0.0, 40.0, 150.0, 0.5, SourceMethod::Segmentation).unwrap(),
//! ];
//! let mut stabilizer = TemporalStabilizer::default();
//! stabilizer.update(&raw);
//! assert!(!stabilizer.detections()[0].stable);
//! stabilizer.update(&raw);
//! assert!(stabilizer.detections()[0].stable);
//! ```

mod params;
mod stabilizer;

pub use params::StabilizerParams;
pub use stabilizer::{StabilizeReport, TemporalStabilizer};
