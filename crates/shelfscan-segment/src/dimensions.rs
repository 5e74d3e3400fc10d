//! Reference table of book size classes and plausibility scoring.

use serde::Serialize;
use shelfscan_core::THICKNESS_RATIO;

/// Accepted interval of one dimension with its most typical value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DimensionRange {
    pub min: f32,
    pub ideal: f32,
    pub max: f32,
}

impl DimensionRange {
    pub const fn new(min: f32, ideal: f32, max: f32) -> Self {
        Self { min, ideal, max }
    }

    #[inline]
    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    /// 1 at the ideal value, 0.5 at either end of the range, 0 outside.
    pub fn score(&self, v: f32) -> f32 {
        if !self.contains(v) {
            return 0.0;
        }
        let half_span = if v < self.ideal {
            self.ideal - self.min
        } else {
            self.max - self.ideal
        };
        if half_span <= 0.0 {
            return 1.0;
        }
        1.0 - 0.5 * ((v - self.ideal).abs() / half_span).min(1.0)
    }
}

/// A known kind of book as it appears on a shelf, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BookSizeClass {
    pub name: &'static str,
    pub width: DimensionRange,
    pub height: DimensionRange,
    /// Estimated book depth, see `THICKNESS_RATIO`.
    pub spine: DimensionRange,
    /// Accepted `height / width` interval.
    pub aspect: (f32, f32),
    /// Upper bound of the class score.
    pub confidence_ceiling: f32,
}

impl BookSizeClass {
    /// Class score in `[0, confidence_ceiling]`, `None` when the book does not fit.
    pub fn score(&self, width: f32, height: f32) -> Option<f32> {
        if width <= 0.0 || !self.width.contains(width) || !self.height.contains(height) {
            return None;
        }
        let aspect = height / width;
        if aspect < self.aspect.0 || aspect > self.aspect.1 {
            return None;
        }
        let spine = width * THICKNESS_RATIO;
        let mean = (self.width.score(width) + self.height.score(height) + self.spine.score(spine))
            / 3.0;
        Some(mean * self.confidence_ceiling)
    }
}

pub static BOOK_SIZE_CLASSES: [BookSizeClass; 5] = [
    BookSizeClass {
        name: "pocket paperback",
        width: DimensionRange::new(10.0, 22.0, 35.0),
        height: DimensionRange::new(80.0, 140.0, 220.0),
        spine: DimensionRange::new(6.0, 13.0, 21.0),
        aspect: (2.5, 12.0),
        confidence_ceiling: 0.9,
    },
    BookSizeClass {
        name: "trade paperback",
        width: DimensionRange::new(18.0, 32.0, 55.0),
        height: DimensionRange::new(100.0, 170.0, 280.0),
        spine: DimensionRange::new(10.0, 19.0, 33.0),
        aspect: (2.0, 9.0),
        confidence_ceiling: 0.95,
    },
    BookSizeClass {
        name: "hardcover",
        width: DimensionRange::new(25.0, 45.0, 80.0),
        height: DimensionRange::new(120.0, 200.0, 340.0),
        spine: DimensionRange::new(15.0, 27.0, 48.0),
        aspect: (1.8, 8.0),
        confidence_ceiling: 1.0,
    },
    BookSizeClass {
        name: "textbook",
        width: DimensionRange::new(35.0, 60.0, 120.0),
        height: DimensionRange::new(150.0, 250.0, 420.0),
        spine: DimensionRange::new(21.0, 36.0, 72.0),
        aspect: (1.4, 7.0),
        confidence_ceiling: 0.9,
    },
    BookSizeClass {
        name: "magazine",
        width: DimensionRange::new(4.0, 8.0, 15.0),
        height: DimensionRange::new(120.0, 220.0, 340.0),
        spine: DimensionRange::new(2.0, 5.0, 9.0),
        aspect: (8.0, 40.0),
        confidence_ceiling: 0.7,
    },
];

/// Best class for a spine rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SizeMatch {
    pub class: &'static BookSizeClass,
    pub score: f32,
}

/// Scales spine confidence by how well its size matches a known book class.
#[derive(Clone, Copy, Debug)]
pub struct DimensionValidator {
    classes: &'static [BookSizeClass],
    /// Multiplier when nothing matches.
    pub mismatch_penalty: f32,
}

impl Default for DimensionValidator {
    fn default() -> Self {
        Self {
            classes: &BOOK_SIZE_CLASSES,
            mismatch_penalty: 0.3,
        }
    }
}

impl DimensionValidator {
    pub fn with_classes(classes: &'static [BookSizeClass]) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    pub fn classes(&self) -> &'static [BookSizeClass] {
        self.classes
    }

    /// Highest-scoring class; the first listed wins ties.
    pub fn best_match(&self, width: f32, height: f32) -> Option<SizeMatch> {
        let mut best: Option<SizeMatch> = None;
        for class in self.classes {
            let Some(score) = class.score(width, height) else {
                continue;
            };
            if best.map(|b| score > b.score).unwrap_or(true) {
                best = Some(SizeMatch { class, score });
            }
        }
        best
    }

    /// Confidence multiplier: `0.8 + 0.4 * score` on a match, the penalty otherwise.
    pub fn confidence_factor(&self, width: f32, height: f32) -> f32 {
        match self.best_match(width, height) {
            Some(m) => 0.8 + 0.4 * m.score,
            None => self.mismatch_penalty,
        }
    }
}
