use serde::{Deserialize, Serialize};

/// Shelf-line search over a sparse row/column grid.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShelfParams {
    /// Distance between probed rows.
    pub row_step: usize,
    /// Distance between probed columns on each row.
    pub column_step: usize,
    /// Rows compared are `y - probe_offset` and `y + probe_offset`.
    pub probe_offset: usize,
    /// Minimal mean absolute luminance step (0..255) for a shelf line.
    pub strength_threshold: f32,
    /// Band extent above and below the shelf line.
    pub band_half_height: f32,
    /// Shelf lines closer than this are merged into one band.
    pub merge_distance: f32,
    /// Searched vertical extent as fractions of the image height.
    pub search_top_frac: f32,
    pub search_bottom_frac: f32,
}

impl Default for ShelfParams {
    fn default() -> Self {
        Self {
            row_step: 8,
            column_step: 16,
            probe_offset: 5,
            strength_threshold: 15.0,
            band_half_height: 100.0,
            merge_distance: 80.0,
            search_top_frac: 0.1,
            search_bottom_frac: 0.9,
        }
    }
}

/// Weighting of luminance gradient vs. RGB distance in the edge score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityProfile {
    /// 0.7 luminance / 0.3 colour.
    #[default]
    Balanced,
    /// 0.8 luminance / 0.2 colour, for washed-out or monochrome shelves.
    Luminance,
    Custom { luminance: f32, color: f32 },
}

impl SensitivityProfile {
    /// `(luminance_weight, color_weight)`.
    pub fn weights(self) -> (f32, f32) {
        match self {
            SensitivityProfile::Balanced => (0.7, 0.3),
            SensitivityProfile::Luminance => (0.8, 0.2),
            SensitivityProfile::Custom { luminance, color } => (luminance.max(0.0), color.max(0.0)),
        }
    }
}

/// Vertical edge extraction inside a band.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Column stride, row stride and half-width of the column comparison.
    pub sample_step: usize,
    /// Minimal mean strength of a column.
    pub edge_threshold: f32,
    /// Minimal number of samples that individually exceed the threshold.
    pub min_edge_samples: usize,
    /// Fraction of the band height sampled (centred).
    pub band_sample_frac: f32,
    pub profile: SensitivityProfile,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            sample_step: 3,
            edge_threshold: 20.0,
            min_edge_samples: 3,
            band_sample_frac: 0.8,
            profile: SensitivityProfile::Balanced,
        }
    }
}

/// Non-maximum suppression over edge candidates.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeFilterParams {
    /// Strongest candidates kept before spatial suppression.
    pub max_edges: usize,
    /// Minimal horizontal distance between two kept edges.
    pub min_edge_separation: f32,
    /// A close candidate replaces the kept one only when stronger by this
    /// relative margin.
    pub replace_margin: f32,
}

impl Default for EdgeFilterParams {
    fn default() -> Self {
        Self {
            max_edges: 40,
            min_edge_separation: 12.0,
            replace_margin: 0.3,
        }
    }
}

/// Spine rectangle validation and scoring.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BookParams {
    pub min_book_width: f32,
    pub max_book_width: f32,
    pub min_book_height: f32,
    pub max_book_height: f32,
    /// Spine height as a fraction of the band height.
    pub height_fraction: f32,
    pub ideal_width: f32,
    pub width_tolerance: f32,
    /// Edge strength mapped to a full strength score.
    pub expected_max_strength: f32,
    /// Supporting samples mapped to a full adequacy score.
    pub target_samples: usize,
    /// Hard minimum of supporting samples on both edges.
    pub min_pair_samples: usize,
    /// Hard minimum of `min(strength) / max(strength)`.
    pub min_symmetry: f32,
    pub confidence_floor: f32,
    pub max_books_per_band: usize,
    /// Blend weights: strength, width, symmetry, samples.
    pub weights: [f32; 4],
    /// Share of the narrower x-interval two spines from overlapping bands
    /// must have in common to count as the same spine.
    pub duplicate_overlap: f32,
}

impl Default for BookParams {
    fn default() -> Self {
        Self {
            min_book_width: 15.0,
            max_book_width: 120.0,
            min_book_height: 40.0,
            max_book_height: 600.0,
            height_fraction: 0.85,
            ideal_width: 35.0,
            width_tolerance: 20.0,
            expected_max_strength: 100.0,
            target_samples: 8,
            min_pair_samples: 3,
            min_symmetry: 0.3,
            confidence_floor: 0.3,
            max_books_per_band: 20,
            weights: [0.4, 0.3, 0.2, 0.1],
            duplicate_overlap: 0.7,
        }
    }
}

/// Parameters of the full spine segmentation pass.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentParams {
    pub shelf: ShelfParams,
    pub edges: EdgeParams,
    pub filter: EdgeFilterParams,
    pub books: BookParams,
    /// Edge threshold multiplier for the second pass; `None` disables it.
    pub retry_threshold_scale: Option<f32>,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            shelf: ShelfParams::default(),
            edges: EdgeParams::default(),
            filter: EdgeFilterParams::default(),
            books: BookParams::default(),
            retry_threshold_scale: Some(0.6),
        }
    }
}

impl SegmentParams {
    /// Looser thresholds for dim or low-contrast shelves.
    pub fn sensitive() -> Self {
        let mut params = Self::default();
        params.shelf.strength_threshold = 10.0;
        params.edges.edge_threshold = 12.0;
        params.edges.profile = SensitivityProfile::Luminance;
        params.books.min_book_width = 10.0;
        params.books.max_book_width = 150.0;
        params.books.confidence_floor = 0.2;
        params
    }

    /// Stricter thresholds for busy backgrounds.
    pub fn conservative() -> Self {
        let mut params = Self::default();
        params.edges.edge_threshold = 30.0;
        params.edges.min_edge_samples = 5;
        params.books.min_book_width = 20.0;
        params.books.max_book_width = 100.0;
        params.books.confidence_floor = 0.45;
        params.retry_threshold_scale = None;
        params
    }

    /// Copy with the edge threshold scaled, used by the retry pass.
    pub fn with_edge_threshold_scaled(&self, scale: f32) -> Self {
        let mut params = self.clone();
        params.edges.edge_threshold *= scale;
        params
    }
}
