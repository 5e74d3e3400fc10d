//! Core types and utilities for bookshelf spine detection.
//!
//! This crate is intentionally small. It holds the borrowed RGBA frame view
//! every stage reads from, the `Detection` record shared by the segmentation,
//! stabilization and advisor crates, and the aspect-ratio desirability
//! function they all agree on. It does *not* depend on any concrete image
//! decoding crate.

mod detection;
mod image;
mod logger;

pub use detection::{
    volume_efficiency, Detection, SourceMethod, CONFIDENCE_RANGE, IDEAL_ASPECT_RATIO,
    THICKNESS_RATIO,
};
pub use image::{luminance, rgb_distance, ImageError, RgbaImage, RgbaImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
