//! Heuristic book-spine segmentation built on top of `shelfscan-core`.
//!
//! ## Quickstart
//!
//! ```
//! use shelfscan_core::RgbaImage;
//! use shelfscan_segment::{SegmentParams, SpineDetector};
//!
//! let frame = RgbaImage::filled(320, 240, [200, 200, 200]);
//! let detector = SpineDetector::new(SegmentParams::default());
//! let report = detector.detect(&frame.view()).expect("valid frame");
//! assert!(!report.bands.is_empty());
//! println!("spines: {}", report.detections.len());
//! ```
//!
//! Algorithm (per frame):
//! 1. Probe a sparse row grid for strong vertical luminance steps; each strong
//!    row seeds a shelf band, nearby bands are merged. No strong rows means
//!    two default half-frame bands.
//! 2. Inside every band, score sampled columns by the luminance and colour
//!    difference across them; columns that stay strong through the band become
//!    edge candidates.
//! 3. Strength-first suppression leaves well separated vertical lines.
//! 4. Each adjacent pair of lines is a spine hypothesis, scored by edge
//!    strength, width, symmetry, sample support and the book size table.
//!    A spine seen through two overlapping bands is kept once.
//! 5. If no band produced a single edge, the whole pass is repeated once with
//!    a looser edge threshold.

mod books;
mod detector;
mod dimensions;
mod edges;
mod nms;
mod params;
mod shelf;

pub use books::{extract_books, merge_band_detections};
pub use detector::{two_pass, PassOutcome, SegmentPass, SpineDetector, SpineReport};
pub use dimensions::{
    BookSizeClass, DimensionRange, DimensionValidator, SizeMatch, BOOK_SIZE_CLASSES,
};
pub use edges::{extract_edges, EdgeCandidate};
pub use nms::filter_edges;
pub use params::{
    BookParams, EdgeFilterParams, EdgeParams, SegmentParams, SensitivityProfile, ShelfParams,
};
pub use shelf::{segment_shelves, ShelfBand};
