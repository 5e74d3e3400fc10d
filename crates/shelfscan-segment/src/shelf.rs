use serde::{Deserialize, Serialize};
use shelfscan_core::RgbaImageView;

use crate::params::ShelfParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Horizontal slice of the frame believed to hold one shelf of spines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShelfBand {
    pub center_y: f32,
    pub top_y: f32,
    pub bottom_y: f32,
    pub strength: f32,
}

impl ShelfBand {
    #[inline]
    pub fn height(&self) -> f32 {
        (self.bottom_y - self.top_y).max(0.0)
    }
}

/// Find shelf bands, top to bottom. Never returns an empty list.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, params), fields(width = img.width, height = img.height))
)]
pub fn segment_shelves(img: &RgbaImageView<'_>, params: &ShelfParams) -> Vec<ShelfBand> {
    let candidates = shelf_line_candidates(img, params);
    let bands = merge_bands(&candidates, params.merge_distance);

    if bands.is_empty() {
        log::debug!("no shelf lines above threshold, using default half-frame bands");
        return default_bands(img.height);
    }

    log::debug!(
        "{} shelf line rows merged into {} bands",
        candidates.len(),
        bands.len()
    );
    bands
}

fn shelf_line_candidates(img: &RgbaImageView<'_>, params: &ShelfParams) -> Vec<ShelfBand> {
    let h = img.height as f32;
    let offset = params.probe_offset.max(1) as i64;
    let row_step = params.row_step.max(1);
    let column_step = params.column_step.max(1);

    let y0 = ((h * params.search_top_frac) as i64).max(offset);
    let y1 = ((h * params.search_bottom_frac) as i64).min(img.height as i64 - 1 - offset);
    if y1 < y0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    for y in (y0..=y1).step_by(row_step) {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for x in (0..img.width as i64).step_by(column_step) {
            let (Some(above), Some(below)) = (img.luma(x, y - offset), img.luma(x, y + offset))
            else {
                continue;
            };
            sum += (above - below).abs();
            count += 1;
        }
        if count == 0 {
            continue;
        }
        let strength = sum / count as f32;
        if strength > params.strength_threshold {
            let center = y as f32;
            out.push(ShelfBand {
                center_y: center,
                top_y: (center - params.band_half_height).max(0.0),
                bottom_y: (center + params.band_half_height).min(h),
                strength,
            });
        }
    }
    out
}

/// Merge y-ordered bands whose shelf lines are within `merge_distance`.
fn merge_bands(candidates: &[ShelfBand], merge_distance: f32) -> Vec<ShelfBand> {
    let mut merged: Vec<ShelfBand> = Vec::with_capacity(candidates.len());
    for band in candidates {
        match merged.last_mut() {
            Some(last) if band.center_y - last.center_y < merge_distance => {
                last.strength = last.strength.max(band.strength);
                last.bottom_y = last.bottom_y.max(band.bottom_y);
            }
            _ => merged.push(*band),
        }
    }
    merged
}

fn default_bands(height: usize) -> Vec<ShelfBand> {
    let h = height as f32;
    let mid = 0.5 * h;
    vec![
        ShelfBand {
            center_y: 0.5 * mid,
            top_y: 0.0,
            bottom_y: mid,
            strength: 0.0,
        },
        ShelfBand {
            center_y: mid + 0.5 * (h - mid),
            top_y: mid,
            bottom_y: h,
            strength: 0.0,
        },
    ]
}
