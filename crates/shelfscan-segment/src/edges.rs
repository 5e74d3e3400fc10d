use serde::{Deserialize, Serialize};
use shelfscan_core::{luminance, rgb_distance, RgbaImageView};

use crate::params::EdgeParams;
use crate::shelf::ShelfBand;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A vertical line inside a band with aggregated discontinuity strength.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeCandidate {
    pub x: f32,
    /// Mean strength over all in-bounds samples of the column.
    pub strength: f32,
    /// Samples whose own strength exceeded the edge threshold.
    pub sample_count: usize,
}

/// Scan a band for vertical spine edges. Output is sorted by `x`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(img, band, params),
        fields(top = band.top_y, bottom = band.bottom_y)
    )
)]
pub fn extract_edges(
    img: &RgbaImageView<'_>,
    band: &ShelfBand,
    params: &EdgeParams,
) -> Vec<EdgeCandidate> {
    let step = params.sample_step.max(1);
    let rows = sample_rows(band, params.band_sample_frac, step);
    if rows.is_empty() || img.width <= 2 * step {
        return Vec::new();
    }

    let (w_luma, w_color) = params.profile.weights();
    (step..img.width - step)
        .step_by(step)
        .filter_map(|x| {
            column_edge(img, x as i64, step as i64, &rows, w_luma, w_color, params)
        })
        .collect()
}

fn sample_rows(band: &ShelfBand, frac: f32, step: usize) -> Vec<i64> {
    let margin = 0.5 * (1.0 - frac.clamp(0.0, 1.0)) * band.height();
    let y0 = (band.top_y + margin).ceil() as i64;
    let y1 = (band.bottom_y - margin).floor() as i64;
    if y1 < y0 {
        return Vec::new();
    }
    (y0..=y1).step_by(step).collect()
}

fn column_edge(
    img: &RgbaImageView<'_>,
    x: i64,
    step: i64,
    rows: &[i64],
    w_luma: f32,
    w_color: f32,
    params: &EdgeParams,
) -> Option<EdgeCandidate> {
    let mut sum = 0.0f32;
    let mut in_bounds = 0usize;
    let mut supporting = 0usize;

    for &y in rows {
        let (Some(left), Some(right)) = (img.rgb(x - step, y), img.rgb(x + step, y)) else {
            continue;
        };
        let luma_grad = (luminance(left) - luminance(right)).abs();
        let strength = (w_luma * luma_grad + w_color * rgb_distance(left, right)).max(0.0);
        sum += strength;
        in_bounds += 1;
        if strength > params.edge_threshold {
            supporting += 1;
        }
    }

    if in_bounds == 0 || supporting == 0 {
        return None;
    }
    let strength = sum / in_bounds as f32;
    if strength > params.edge_threshold && supporting >= params.min_edge_samples {
        Some(EdgeCandidate {
            x: x as f32,
            strength,
            sample_count: supporting,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SensitivityProfile;
    use approx::assert_relative_eq;
    use shelfscan_core::RgbaImage;

    fn full_band(h: f32) -> ShelfBand {
        ShelfBand {
            center_y: 0.5 * h,
            top_y: 0.0,
            bottom_y: h,
            strength: 0.0,
        }
    }

    #[test]
    fn finds_single_vertical_boundary() {
        let mut img = RgbaImage::filled(120, 100, [20, 20, 20]);
        img.fill_rect(60, 0, 60, 100, [220, 220, 220]);
        let edges = extract_edges(&img.view(), &full_band(100.0), &EdgeParams::default());
        assert!(!edges.is_empty());
        for e in &edges {
            assert!((e.x - 60.0).abs() <= 3.0, "edge at {}", e.x);
            assert!(e.strength > 0.0);
            assert!(e.sample_count >= 3);
        }
        assert!(edges.windows(2).all(|p| p[0].x < p[1].x));
    }

    #[test]
    fn flat_band_has_no_edges() {
        let img = RgbaImage::filled(120, 100, [90, 140, 60]);
        let edges = extract_edges(&img.view(), &full_band(100.0), &EdgeParams::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn short_edge_near_band_border_is_rejected() {
        // boundary only in the top rows, outside the sampled middle 80%
        let mut img = RgbaImage::filled(120, 100, [20, 20, 20]);
        img.fill_rect(60, 0, 60, 8, [220, 220, 220]);
        let edges = extract_edges(&img.view(), &full_band(100.0), &EdgeParams::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn profile_changes_strength_weighting() {
        let mut img = RgbaImage::filled(60, 60, [200, 0, 0]);
        img.fill_rect(30, 0, 30, 60, [0, 0, 200]);
        let band = full_band(60.0);
        let balanced = extract_edges(&img.view(), &band, &EdgeParams::default());
        let luma_heavy = extract_edges(
            &img.view(),
            &band,
            &EdgeParams {
                profile: SensitivityProfile::Luminance,
                ..EdgeParams::default()
            },
        );
        assert_eq!(balanced.len(), luma_heavy.len());
        assert!(!balanced.is_empty());
        let (l, c) = (200.0 * 0.299 - 200.0 * 0.114, (2.0f32 * 200.0 * 200.0).sqrt());
        let expected = 0.7 * l + 0.3 * c;
        assert_relative_eq!(balanced[0].strength, expected, epsilon = 1e-2);
        assert!(balanced[0].strength > luma_heavy[0].strength);
    }

    #[test]
    fn narrow_image_yields_nothing() {
        let img = RgbaImage::filled(5, 50, [0, 0, 0]);
        assert!(extract_edges(&img.view(), &full_band(50.0), &EdgeParams::default()).is_empty());
    }
}
