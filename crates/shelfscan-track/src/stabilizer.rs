use serde::Serialize;
use shelfscan_core::Detection;

use crate::params::StabilizerParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What one [`TemporalStabilizer::update`] did with the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StabilizeReport {
    /// New detections associated with an existing track.
    pub matched: usize,
    /// New detections that opened a track.
    pub added: usize,
    /// Missed tracks kept with decayed confidence.
    pub retained: usize,
    /// Tracks and detections discarded at or below the drop floor.
    pub dropped: usize,
    /// Matches whose best and second-best candidates were equidistant.
    pub ambiguous: usize,
}

/// Nearest-neighbour tracker over consecutive frames.
///
/// Association is a global greedy pass over all detection/track pairs,
/// closest first, an approximation of a bipartite assignment. Each previous
/// track is claimed at most once, so the result depends on input order only
/// when distances tie, and those matches are reported as ambiguous.
#[derive(Clone, Debug)]
pub struct TemporalStabilizer {
    params: StabilizerParams,
    tracks: Vec<Detection>,
    next_id: u64,
}

impl Default for TemporalStabilizer {
    fn default() -> Self {
        Self::new(StabilizerParams::default())
    }
}

/// A raw detection and a previous track within matching distance.
struct Pair {
    det: usize,
    track: usize,
    distance: f32,
}

impl TemporalStabilizer {
    pub fn new(params: StabilizerParams) -> Self {
        Self {
            params,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn params(&self) -> &StabilizerParams {
        &self.params
    }

    /// Current stabilized set.
    #[inline]
    pub fn detections(&self) -> &[Detection] {
        &self.tracks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Forget every track. Ids keep counting up.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    /// Fold one frame of raw detections into the stabilized set.
    ///
    /// Output order: the current frame's detections in input order, then the
    /// missed tracks in their previous order.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, raw),
            fields(raw = raw.len(), tracks = self.tracks.len())
        )
    )]
    pub fn update(&mut self, raw: &[Detection]) -> StabilizeReport {
        let previous = std::mem::take(&mut self.tracks);
        let mut report = StabilizeReport::default();
        let assigned = self.associate(raw, &previous, &mut report);
        let mut claimed = vec![false; previous.len()];
        let mut next = Vec::with_capacity(raw.len() + previous.len());

        for (det, track) in raw.iter().zip(&assigned) {
            match *track {
                Some(index) => {
                    claimed[index] = true;
                    report.matched += 1;
                    next.push(self.blend(&previous[index], det));
                }
                None if det.confidence <= self.params.drop_confidence => report.dropped += 1,
                None => {
                    report.added += 1;
                    let mut track = det.clone();
                    track.id = self.next_id;
                    track.stable = false;
                    self.next_id += 1;
                    next.push(track);
                }
            }
        }

        for (mut track, _) in previous.into_iter().zip(claimed).filter(|(_, c)| !c) {
            let decayed = track.confidence * self.params.miss_decay;
            if decayed <= self.params.drop_confidence {
                report.dropped += 1;
                continue;
            }
            track.set_confidence(decayed);
            track.stable = track.confidence > self.params.stable_confidence;
            report.retained += 1;
            next.push(track);
        }

        self.tracks = next;
        log::debug!(
            "stabilized {} tracks: {} matched, {} added, {} retained, {} dropped",
            self.tracks.len(),
            report.matched,
            report.added,
            report.retained,
            report.dropped
        );
        report
    }

    /// Track index for each raw detection, closest pairs first.
    ///
    /// Equal distances fall back to input order, then track order; every
    /// assignment made that way counts as ambiguous.
    fn associate(
        &self,
        raw: &[Detection],
        previous: &[Detection],
        report: &mut StabilizeReport,
    ) -> Vec<Option<usize>> {
        let mut pairs: Vec<Pair> = Vec::new();
        for (det_index, det) in raw.iter().enumerate() {
            let origin = det.origin();
            for (track_index, track) in previous.iter().enumerate() {
                let distance = nalgebra::distance(&origin, &track.origin());
                if distance.is_finite() && distance < self.params.match_distance {
                    pairs.push(Pair {
                        det: det_index,
                        track: track_index,
                        distance,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.det.cmp(&b.det))
                .then(a.track.cmp(&b.track))
        });

        let mut assigned = vec![None; raw.len()];
        let mut claimed = vec![false; previous.len()];
        for (k, pair) in pairs.iter().enumerate() {
            if assigned[pair.det].is_some() || claimed[pair.track] {
                continue;
            }
            let contested = pairs[k + 1..]
                .iter()
                .take_while(|p| p.distance - pair.distance <= self.params.ambiguity_tolerance)
                .any(|p| {
                    (p.det == pair.det && !claimed[p.track])
                        || (p.track == pair.track && assigned[p.det].is_none())
                });
            if contested {
                report.ambiguous += 1;
                log::debug!(
                    "ambiguous match for detection at ({:.1}, {:.1}), picked track {}",
                    raw[pair.det].x,
                    raw[pair.det].y,
                    previous[pair.track].id
                );
            }
            assigned[pair.det] = Some(pair.track);
            claimed[pair.track] = true;
        }
        assigned
    }

    fn blend(&self, old: &Detection, new: &Detection) -> Detection {
        let a = self.params.alpha;
        let mix = |o: f32, n: f32| o * a + n * (1.0 - a);
        let mut track = new.clone();
        track.id = old.id;
        track.x = mix(old.x, new.x);
        track.y = mix(old.y, new.y);
        track.width = mix(old.width, new.width);
        track.height = mix(old.height, new.height);
        let carry = self.params.confidence_carry;
        let confidence = (old.confidence * carry + new.confidence * (1.0 - carry))
            .max(self.params.matched_confidence_floor);
        track.set_confidence(confidence);
        track.stable = true;
        if track.label.is_none() {
            track.label = old.label.clone();
        }
        track.refresh_derived();
        track
    }
}
