//! Strength-first, minimum-separation suppression of edge candidates.

use std::cmp::Ordering;

use crate::edges::EdgeCandidate;
use crate::params::EdgeFilterParams;

/// Reduce candidates to strictly x-ascending, well separated edges.
///
/// The strongest `max_edges` survive the first cut. Walking them left to
/// right, a candidate closer than `min_edge_separation` to the last kept edge
/// only replaces it when stronger by `replace_margin`; otherwise the kept edge
/// wins.
pub fn filter_edges(edges: &[EdgeCandidate], params: &EdgeFilterParams) -> Vec<EdgeCandidate> {
    let mut strongest: Vec<EdgeCandidate> = edges
        .iter()
        .copied()
        .filter(|e| e.strength.is_finite() && e.x.is_finite())
        .collect();
    strongest.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(Ordering::Equal));
    strongest.truncate(params.max_edges);
    strongest.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    let min_sep = params.min_edge_separation.max(f32::EPSILON);
    let mut kept: Vec<EdgeCandidate> = Vec::with_capacity(strongest.len());
    for cand in strongest {
        match kept.last_mut() {
            Some(last) if cand.x - last.x < min_sep => {
                if cand.strength > last.strength * (1.0 + params.replace_margin) {
                    // `cand.x >= last.x`, so the gap to the previous edge only grows
                    *last = cand;
                }
            }
            _ => kept.push(cand),
        }
    }
    kept
}
