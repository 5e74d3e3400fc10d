use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use shelfscan_core::Detection;

use crate::heuristics::{beneficial_saving, evaluate, SuggestionKind};
use crate::params::{AdvisorParams, ShelfDimensions};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One placement change proposed for a detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub detection_id: u64,
    pub kind: SuggestionKind,
    pub efficiency_gain: f32,
    pub volume_gain: f32,
    /// Horizontal centre of the detection at its top edge.
    pub anchor_x: f32,
    pub anchor_y: f32,
}

/// Aggregate utilization figures of one frame, all percentages in `[0, 100]`
/// except `mean_volume_efficiency` which is in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShelfStats {
    pub books_found: usize,
    pub space_used_percent: f32,
    pub potential_gain_percent: f32,
    pub detection_stability: f32,
    pub mean_volume_efficiency: f32,
}

/// Suggestions and stats for one stabilized set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub suggestions: Vec<Suggestion>,
    pub stats: ShelfStats,
}

#[derive(Clone, Debug, Default)]
pub struct OptimizationAdvisor {
    params: AdvisorParams,
}

impl OptimizationAdvisor {
    pub fn new(params: AdvisorParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &AdvisorParams {
        &self.params
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn analyze(&self, detections: &[Detection], shelf: ShelfDimensions) -> Advice {
        let advice = Advice {
            suggestions: self.suggest(detections),
            stats: self.stats(detections, shelf),
        };
        log::debug!(
            "{} suggestions for {} books, {:.1}% space used",
            advice.suggestions.len(),
            advice.stats.books_found,
            advice.stats.space_used_percent
        );
        advice
    }

    /// At most one suggestion per detection, best efficiency gain first.
    pub fn suggest(&self, detections: &[Detection]) -> Vec<Suggestion> {
        let mut out: Vec<Suggestion> = detections
            .iter()
            .filter_map(|det| {
                let (kind, gain) = evaluate(det, &self.params)?;
                Some(Suggestion {
                    detection_id: det.id,
                    kind,
                    efficiency_gain: gain.efficiency,
                    volume_gain: gain.volume,
                    anchor_x: det.x + 0.5 * det.width,
                    anchor_y: det.y,
                })
            })
            .collect();
        // stable sort keeps input order on ties
        out.sort_by(|a, b| {
            b.efficiency_gain
                .partial_cmp(&a.efficiency_gain)
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    pub fn stats(&self, detections: &[Detection], shelf: ShelfDimensions) -> ShelfStats {
        let n = detections.len();
        if n == 0 {
            return ShelfStats::default();
        }

        let total_width: f32 = detections.iter().map(|d| d.width).sum();
        let space_used_percent = if shelf.width > 0.0 {
            (total_width / shelf.width * 100.0).min(100.0)
        } else {
            0.0
        };

        let footprint: f32 = detections.iter().map(Detection::footprint).sum();
        let saving: f32 = detections
            .iter()
            .map(|d| beneficial_saving(d, &self.params))
            .sum();
        let potential_gain_percent = if footprint > 0.0 {
            saving / footprint * 100.0
        } else {
            0.0
        };

        let stable = detections.iter().filter(|d| d.stable).count();
        ShelfStats {
            books_found: n,
            space_used_percent,
            potential_gain_percent,
            detection_stability: stable as f32 / n as f32 * 100.0,
            mean_volume_efficiency: detections.iter().map(|d| d.volume_efficiency).sum::<f32>()
                / n as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use shelfscan_core::SourceMethod;

    fn book(id: u64, x: f32, width: f32, height: f32, stable: bool) -> Detection {
        let mut det =
            Detection::new(id, x, 10.0, width, height, 0.8, SourceMethod::Segmentation).unwrap();
        det.stable = stable;
        det
    }

    #[test]
    fn suggestions_are_ordered_by_gain_with_anchor_on_top_edge() {
        let advisor = OptimizationAdvisor::default();
        let dets = vec![
            // stack: 40% gain
            book(1, 0.0, 20.0, 150.0, true),
            // face-out: visibility 0.8 * 100 = 80
            book(2, 30.0, 100.0, 300.0, true),
            // nothing applies
            book(3, 140.0, 30.0, 80.0, true),
        ];
        let out = advisor.suggest(&dets);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].detection_id, 2);
        assert_eq!(out[0].kind, SuggestionKind::FaceOut);
        assert_relative_eq!(out[0].anchor_x, 80.0);
        assert_relative_eq!(out[0].anchor_y, 10.0);
        assert_eq!(out[1].detection_id, 1);
        assert_eq!(out[1].kind, SuggestionKind::Stack);
    }

    #[test]
    fn equal_gains_keep_input_order() {
        let advisor = OptimizationAdvisor::default();
        let dets = vec![
            book(7, 0.0, 20.0, 150.0, true),
            book(3, 50.0, 20.0, 150.0, true),
        ];
        let ids: Vec<u64> = advisor.suggest(&dets).iter().map(|s| s.detection_id).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn stats_over_a_mixed_shelf() {
        let advisor = OptimizationAdvisor::default();
        let dets = vec![
            book(1, 0.0, 20.0, 150.0, true),
            book(2, 30.0, 40.0, 100.0, false),
        ];
        let stats = advisor.stats(&dets, ShelfDimensions::new(200.0, 300.0));
        assert_eq!(stats.books_found, 2);
        assert_relative_eq!(stats.space_used_percent, 30.0);
        assert_relative_eq!(stats.detection_stability, 50.0);
        // stack saves 0.4 * 20 * 12 = 96, 40x100 cannot rotate or stack
        let footprint = 20.0 * 12.0 + 40.0 * 24.0;
        assert_relative_eq!(
            stats.potential_gain_percent,
            96.0 / footprint * 100.0,
            epsilon = 1e-3
        );
        let mean = (dets[0].volume_efficiency + dets[1].volume_efficiency) / 2.0;
        assert_relative_eq!(stats.mean_volume_efficiency, mean);
    }

    #[test]
    fn potential_gain_ignores_savings_never_suggested() {
        let advisor = OptimizationAdvisor::default();
        // 3 px wide: stack applies but saves under the benefit gate
        let dets = vec![book(1, 0.0, 3.0, 150.0, true)];
        let advice = advisor.analyze(&dets, ShelfDimensions::new(200.0, 300.0));
        assert!(advice.suggestions.is_empty());
        assert_relative_eq!(advice.stats.potential_gain_percent, 0.0);
    }

    #[test]
    fn space_used_is_capped() {
        let advisor = OptimizationAdvisor::default();
        let dets: Vec<_> = (0..10)
            .map(|i| book(i, i as f32 * 40.0, 40.0, 100.0, true))
            .collect();
        let stats = advisor.stats(&dets, ShelfDimensions::new(100.0, 100.0));
        assert_relative_eq!(stats.space_used_percent, 100.0);
    }

    #[test]
    fn empty_set_has_zero_stats() {
        let advice =
            OptimizationAdvisor::default().analyze(&[], ShelfDimensions::new(640.0, 480.0));
        assert!(advice.suggestions.is_empty());
        assert_eq!(advice.stats, ShelfStats::default());
    }
}
