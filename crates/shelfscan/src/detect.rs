//! Helpers from `image` types to the borrowed frame views used by the stages.

use std::path::Path;

use shelfscan_core::RgbaImageView;

use crate::error::PipelineError;
use crate::report::FrameReport;
use crate::scanner::ShelfScanner;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::RgbaImage` as a frame view.
pub fn rgba_view(img: &::image::RgbaImage) -> RgbaImageView<'_> {
    RgbaImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode any supported image file into RGBA8.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
pub fn load_rgba(path: impl AsRef<Path>) -> Result<::image::RgbaImage, ::image::ImageError> {
    Ok(::image::open(path)?.to_rgba8())
}

/// Run one decoded image through the scanner.
pub fn process_image(
    scanner: &mut ShelfScanner,
    img: &::image::DynamicImage,
) -> Result<FrameReport, PipelineError> {
    let rgba = img.to_rgba8();
    scanner.process(&rgba_view(&rgba))
}
