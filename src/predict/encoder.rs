//! Categorical slot encoding and feature scaling for the win model.

use crate::dataset::DRAFT_SLOTS;
use crate::hero::HeroId;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Code reserved for values never seen while fitting.
pub const UNKNOWN_CODE: f64 = 0.0;
/// Category used for an unfilled slot.
pub const EMPTY_SLOT: &str = "None";

/// Model input width: every draft slot plus the first-picker flag.
pub const FEATURE_WIDTH: usize = DRAFT_SLOTS + 1;

/// Raw model input: one category per draft slot plus the first-picker flag.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFeatures {
    pub slots: [String; DRAFT_SLOTS],
    pub main_first: bool,
}

impl DraftFeatures {
    pub fn new(slots: [Option<&HeroId>; DRAFT_SLOTS], main_first: bool) -> Self {
        DraftFeatures {
            slots: slots.map(|slot| slot.map_or_else(|| EMPTY_SLOT.to_string(), |h| h.to_string())),
            main_first,
        }
    }
}

/// Label encoder for one column. Known categories map to `1..=n` in sorted
/// order; everything else maps to [`UNKNOWN_CODE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    categories: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        CategoryEncoder { categories }
    }

    pub fn encode(&self, value: &str) -> f64 {
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(index) => (index + 1) as f64,
            Err(_) => UNKNOWN_CODE,
        }
    }
}

/// Per-slot encoders turning [`DraftFeatures`] into a numeric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<CategoryEncoder>,
}

impl FeatureEncoder {
    pub fn fit(rows: &[DraftFeatures]) -> Self {
        let columns = (0..DRAFT_SLOTS)
            .map(|col| CategoryEncoder::fit(rows.iter().map(|row| row.slots[col].as_str())))
            .collect();
        FeatureEncoder { columns }
    }

    fn value(&self, row: &DraftFeatures, col: usize) -> f64 {
        match self.columns.get(col) {
            Some(encoder) => encoder.encode(&row.slots[col]),
            None if row.main_first => 1.0,
            None => 0.0,
        }
    }

    pub fn encode(&self, row: &DraftFeatures) -> Array1<f64> {
        Array1::from_shape_fn(FEATURE_WIDTH, |col| self.value(row, col))
    }

    /// One encoded row per draft, shaped `(rows.len(), FEATURE_WIDTH)`.
    pub fn encode_matrix(&self, rows: &[DraftFeatures]) -> Array2<f64> {
        Array2::from_shape_fn((rows.len(), FEATURE_WIDTH), |(i, col)| self.value(&rows[i], col))
    }
}

/// Zero-mean, unit-variance scaling fitted per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(records: &Array2<f64>) -> Self {
        let means = records
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(records.ncols()));
        // constant columns keep their offset only
        let scales = records
            .std_axis(Axis(0), 0.0)
            .mapv(|std| if std == 0.0 || !std.is_finite() { 1.0 } else { std });
        StandardScaler { means, scales }
    }

    pub fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        (records - &self.means) / &self.scales
    }
}
