//! Synthetic bootstrap dataset for the anomaly model
//!
//! There is no labelled corpus of real profiles, so the model is fitted on
//! six hand-authored exemplars: two tight "normal" rows, a looser
//! normal-leaning row and three "suspicious" rows (low footprint, no
//! picture, short or random usernames). This is a placeholder prior.
//! Changing the rows changes every score, so bump `BOOTSTRAP_VERSION`
//! whenever they are edited; the version is written into the artifact.

use super::features::{FeatureVector, FEATURE_COUNT};

/// Version of the exemplar rows below
pub const BOOTSTRAP_VERSION: u32 = 1;

/// Rows in `FeatureName::ALL` order:
/// entropy, footprint, completeness, image, age
pub const BOOTSTRAP_ROWS: [[f64; FEATURE_COUNT]; 6] = [
    [0.2, 0.8, 1.0, 1.0, 0.9], // normal
    [0.3, 0.7, 1.0, 1.0, 0.8], // normal
    [0.6, 0.2, 0.3, 0.0, 0.2], // suspicious
    [0.7, 0.1, 0.3, 0.0, 0.1], // suspicious
    [0.4, 0.6, 0.8, 1.0, 0.7], // normal-leaning
    [0.8, 0.1, 0.2, 0.0, 0.1], // suspicious
];

/// The bootstrap dataset as feature vectors
pub fn bootstrap_dataset() -> Vec<FeatureVector> {
    BOOTSTRAP_ROWS.iter().map(|row| FeatureVector::new(*row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::features::FeatureName;

    #[test]
    fn test_dataset_shape() {
        let data = bootstrap_dataset();
        assert_eq!(data.len(), 6);
        for row in &data {
            for (_, v) in row.iter() {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_dataset_is_unchanged_by_clamping() {
        for (row, vector) in BOOTSTRAP_ROWS.iter().zip(bootstrap_dataset()) {
            assert_eq!(row, vector.values());
        }
    }

    #[test]
    fn test_three_rows_carry_a_picture() {
        let with_picture = bootstrap_dataset()
            .iter()
            .filter(|v| v.get(FeatureName::ProfileImagePresence) > 0.5)
            .count();
        assert_eq!(with_picture, 3);
    }
}
