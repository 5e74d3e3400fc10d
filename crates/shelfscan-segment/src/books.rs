use std::cmp::Ordering;

use shelfscan_core::{Detection, SourceMethod};

use crate::dimensions::DimensionValidator;
use crate::edges::EdgeCandidate;
use crate::params::BookParams;
use crate::shelf::ShelfBand;

/// Pair adjacent filtered edges of one band into scored spine rectangles.
///
/// `edges` must be x-ascending (the output of `filter_edges`). Returned
/// detections carry id 0; the caller numbers them per frame.
pub fn extract_books(
    edges: &[EdgeCandidate],
    band: &ShelfBand,
    validator: &DimensionValidator,
    params: &BookParams,
    source: SourceMethod,
) -> Vec<Detection> {
    let height = params.height_fraction * band.height();
    if height < params.min_book_height || height > params.max_book_height || height <= 0.0 {
        log::trace!("band at y={} rejected, spine height {height}", band.center_y);
        return Vec::new();
    }
    let y = band.top_y + 0.5 * (band.height() - height);

    let mut books: Vec<Detection> = edges
        .windows(2)
        .filter_map(|pair| {
            let (left, right) = (&pair[0], &pair[1]);
            let confidence = pair_confidence(left, right, height, validator, params)?;
            Detection::new(0, left.x, y, right.x - left.x, height, confidence, source)
        })
        .collect();

    if books.len() > params.max_books_per_band {
        books.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        books.truncate(params.max_books_per_band);
        books.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    books
}

/// Drop spines seen a second time through an overlapping band.
///
/// `per_band` holds every band with its detections, top to bottom. A
/// detection is a duplicate when a higher-confidence one from another band,
/// whose y-range overlaps its own band, covers at least `min_overlap` of the
/// narrower x-interval. Survivors keep band order, then x order. Returns the
/// survivors and the number dropped.
pub fn merge_band_detections(
    per_band: Vec<(ShelfBand, Vec<Detection>)>,
    min_overlap: f32,
) -> (Vec<Detection>, usize) {
    let bands: Vec<ShelfBand> = per_band.iter().map(|(band, _)| *band).collect();
    let flat: Vec<(usize, Detection)> = per_band
        .into_iter()
        .enumerate()
        .flat_map(|(i, (_, dets))| dets.into_iter().map(move |d| (i, d)))
        .collect();

    // stable sort: equal confidence keeps the upper band
    let mut order: Vec<usize> = (0..flat.len()).collect();
    order.sort_by(|&a, &b| flat[b].1.confidence.total_cmp(&flat[a].1.confidence));

    let mut keep = vec![false; flat.len()];
    let mut kept: Vec<usize> = Vec::with_capacity(flat.len());
    for idx in order {
        let (band, det) = &flat[idx];
        let duplicate = kept.iter().any(|&k| {
            let (other_band, other) = &flat[k];
            other_band != band
                && bands_overlap(&bands[*band], &bands[*other_band])
                && x_coverage(det, other) >= min_overlap
        });
        if duplicate {
            log::trace!("spine at x={:.1} already seen in another band", det.x);
        } else {
            keep[idx] = true;
            kept.push(idx);
        }
    }

    let dropped = keep.iter().filter(|k| !**k).count();
    let survivors = flat
        .into_iter()
        .zip(keep)
        .filter_map(|((_, det), k)| k.then_some(det))
        .collect();
    (survivors, dropped)
}

fn bands_overlap(a: &ShelfBand, b: &ShelfBand) -> bool {
    a.top_y < b.bottom_y && b.top_y < a.bottom_y
}

/// Shared x-extent over the narrower width.
fn x_coverage(a: &Detection, b: &Detection) -> f32 {
    let shared = ((a.x + a.width).min(b.x + b.width) - a.x.max(b.x)).max(0.0);
    let narrow = a.width.min(b.width);
    if narrow > 0.0 {
        shared / narrow
    } else {
        0.0
    }
}

/// Final confidence of a spine hypothesis, `None` when rejected.
fn pair_confidence(
    left: &EdgeCandidate,
    right: &EdgeCandidate,
    height: f32,
    validator: &DimensionValidator,
    params: &BookParams,
) -> Option<f32> {
    let width = right.x - left.x;
    if width < params.min_book_width || width > params.max_book_width {
        return None;
    }
    if left.sample_count.min(right.sample_count) < params.min_pair_samples {
        return None;
    }

    let strongest = left.strength.max(right.strength);
    if strongest <= 0.0 {
        return None;
    }
    let symmetry = left.strength.min(right.strength) / strongest;
    if symmetry < params.min_symmetry {
        return None;
    }

    let strength_score = if params.expected_max_strength > 0.0 {
        (0.5 * (left.strength + right.strength) / params.expected_max_strength).min(1.0)
    } else {
        1.0
    };
    let sample_score = if params.target_samples > 0 {
        (left.sample_count.min(right.sample_count) as f32 / params.target_samples as f32).min(1.0)
    } else {
        1.0
    };
    let [w_strength, w_width, w_symmetry, w_samples] = params.weights;
    let blended = w_strength * strength_score
        + w_width * width_desirability(width, params.ideal_width, params.width_tolerance)
        + w_symmetry * symmetry
        + w_samples * sample_score;

    let confidence = (blended * validator.confidence_factor(width, height)).clamp(0.0, 1.0);
    (confidence >= params.confidence_floor).then_some(confidence)
}

/// 1 at the ideal width, 0.7 at the tolerance edge, 0 one tolerance further.
fn width_desirability(width: f32, ideal: f32, tolerance: f32) -> f32 {
    if tolerance <= 0.0 {
        return if width == ideal { 1.0 } else { 0.0 };
    }
    let d = (width - ideal).abs();
    if d <= tolerance {
        1.0 - 0.3 * d / tolerance
    } else {
        (0.7 * (1.0 - (d - tolerance) / tolerance)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn band() -> ShelfBand {
        ShelfBand {
            center_y: 100.0,
            top_y: 0.0,
            bottom_y: 200.0,
            strength: 50.0,
        }
    }

    fn edge(x: f32, strength: f32, sample_count: usize) -> EdgeCandidate {
        EdgeCandidate {
            x,
            strength,
            sample_count,
        }
    }

    fn run(edges: &[EdgeCandidate]) -> Vec<Detection> {
        extract_books(
            edges,
            &band(),
            &DimensionValidator::default(),
            &BookParams::default(),
            SourceMethod::Segmentation,
        )
    }

    #[test]
    fn pairs_adjacent_edges_into_spines() {
        let edges = [
            edge(10.0, 90.0, 20),
            edge(45.0, 85.0, 20),
            edge(80.0, 95.0, 20),
        ];
        let books = run(&edges);
        assert_eq!(books.len(), 2);
        let b = &books[0];
        assert_relative_eq!(b.x, 10.0);
        assert_relative_eq!(b.width, 35.0);
        assert_relative_eq!(b.height, 170.0);
        assert_relative_eq!(b.y, 15.0);
        assert_relative_eq!(b.estimated_thickness, 21.0);
        assert!(!b.can_rotate);
        assert!(!b.can_stack);
        assert!(b.confidence > 0.8 && b.confidence <= 1.0);
        assert_eq!(b.source, SourceMethod::Segmentation);
    }

    #[test]
    fn rejects_out_of_range_widths() {
        let books = run(&[edge(0.0, 90.0, 20), edge(5.0, 90.0, 20), edge(300.0, 90.0, 20)]);
        assert!(books.is_empty());
    }

    #[test]
    fn rejects_asymmetric_pairs() {
        let books = run(&[edge(10.0, 100.0, 20), edge(45.0, 20.0, 20)]);
        assert!(books.is_empty());
    }

    #[test]
    fn rejects_poorly_sampled_edges() {
        let books = run(&[edge(10.0, 90.0, 2), edge(45.0, 90.0, 20)]);
        assert!(books.is_empty());
    }

    #[test]
    fn caps_books_per_band_and_keeps_x_order() {
        let params = BookParams {
            max_books_per_band: 3,
            ..BookParams::default()
        };
        let edges: Vec<_> = (0..8)
            .map(|i| edge(i as f32 * 35.0, 20.0 + i as f32 * 8.0, 20))
            .collect();
        let books = extract_books(
            &edges,
            &band(),
            &DimensionValidator::default(),
            &params,
            SourceMethod::Segmentation,
        );
        assert_eq!(books.len(), 3);
        assert!(books.windows(2).all(|p| p[0].x < p[1].x));
        // strongest pairs sit on the right
        assert_relative_eq!(books[2].x, 210.0);
    }

    #[test]
    fn confidence_and_size_invariants_hold() {
        let edges: Vec<_> = (0..30)
            .map(|i| edge(i as f32 * 17.0, 25.0 + (i % 7) as f32 * 30.0, 3 + i % 9))
            .collect();
        for d in run(&edges) {
            assert!((0.0..=1.0).contains(&d.confidence));
            assert!(d.width > 0.0 && d.height > 0.0);
        }
    }

    #[test]
    fn short_band_yields_nothing() {
        let flat = ShelfBand {
            center_y: 10.0,
            top_y: 0.0,
            bottom_y: 20.0,
            strength: 10.0,
        };
        let books = extract_books(
            &[edge(10.0, 90.0, 20), edge(45.0, 90.0, 20)],
            &flat,
            &DimensionValidator::default(),
            &BookParams::default(),
            SourceMethod::Segmentation,
        );
        assert!(books.is_empty());
    }

    #[test]
    fn width_desirability_curve() {
        assert_relative_eq!(width_desirability(35.0, 35.0, 20.0), 1.0);
        assert_relative_eq!(width_desirability(55.0, 35.0, 20.0), 0.7, epsilon = 1e-6);
        assert_relative_eq!(width_desirability(75.0, 35.0, 20.0), 0.0);
        assert_relative_eq!(width_desirability(5.0, 35.0, 20.0), 0.35, epsilon = 1e-6);
    }

    fn spine(x: f32, y: f32, confidence: f32) -> Detection {
        Detection::new(0, x, y, 40.0, 130.0, confidence, SourceMethod::Segmentation).unwrap()
    }

    fn band_at(top_y: f32, bottom_y: f32) -> ShelfBand {
        ShelfBand {
            center_y: 0.5 * (top_y + bottom_y),
            top_y,
            bottom_y,
            strength: 30.0,
        }
    }

    #[test]
    fn overlapping_bands_report_each_spine_once() {
        let upper = band_at(0.0, 160.0);
        let lower = band_at(145.0, 300.0);
        let (merged, dropped) = merge_band_detections(
            vec![
                (upper, vec![spine(40.0, 12.0, 0.8), spine(80.0, 12.0, 0.6)]),
                (lower, vec![spine(41.0, 157.0, 0.7), spine(80.0, 157.0, 0.9)]),
            ],
            0.7,
        );
        assert_eq!(dropped, 2);
        assert_eq!(merged.len(), 2);
        // the more confident copy survives, band order preserved
        assert_relative_eq!(merged[0].x, 40.0);
        assert_relative_eq!(merged[0].confidence, 0.8);
        assert_relative_eq!(merged[1].x, 80.0);
        assert_relative_eq!(merged[1].confidence, 0.9);
        assert_relative_eq!(merged[1].y, 157.0);
    }

    #[test]
    fn separate_shelves_keep_aligned_spines() {
        let (merged, dropped) = merge_band_detections(
            vec![
                (band_at(0.0, 150.0), vec![spine(40.0, 10.0, 0.8)]),
                (band_at(200.0, 350.0), vec![spine(40.0, 210.0, 0.8)]),
            ],
            0.7,
        );
        assert_eq!(dropped, 0);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn partially_shifted_spines_are_distinct() {
        let (merged, dropped) = merge_band_detections(
            vec![
                (band_at(0.0, 160.0), vec![spine(40.0, 12.0, 0.8)]),
                (band_at(145.0, 300.0), vec![spine(60.0, 157.0, 0.8)]),
            ],
            0.7,
        );
        assert_eq!(dropped, 0);
        assert_eq!(merged.len(), 2);
    }
}
