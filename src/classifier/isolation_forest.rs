//! Isolation forest anomaly detector
//!
//! Pure Rust, small-data implementation of the classic isolation forest:
//! random axis-aligned splits isolate outliers in fewer steps than inliers,
//! so a short average path length means "anomalous".
//!
//! Conventions match the usual library definition:
//!
//! ```text
//! score_samples(x)     = -2^(-E[h(x)] / c(max_samples))
//! offset               = percentile(score_samples(train), 100 * contamination)
//! decision_function(x) = score_samples(x) - offset
//! ```
//!
//! so negative decisions are outliers and positive decisions inliers.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::features::{FeatureVector, FEATURE_COUNT};
use super::model::AnomalyModel;
use super::train::TrainConfig;
use super::{ModelError, ModelResult};

/// Euler-Mascheroni constant, for the harmonic number approximation
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

type Row = [f64; FEATURE_COUNT];

/// One node of an isolation tree. Children always sit at higher indices
/// than their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// A single randomly grown tree, stored as a flat arena rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(rows: &[Row], height_limit: u32, rng: &mut ChaCha8Rng) -> Self {
        let mut nodes = Vec::new();
        grow_node(&mut nodes, rows, 0, height_limit, rng);
        Self { nodes }
    }

    /// Depth of the leaf `x` lands in, plus the expected remaining depth
    /// for the rows that leaf still holds
    fn path_length(&self, x: &Row) -> f64 {
        let mut id = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = *node
            {
                if feature >= FEATURE_COUNT {
                    return Err(format!("node {id} splits on unknown feature {feature}"));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {id} has a non-finite threshold"));
                }
                // children after parent rules out cycles
                for child in [left, right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(format!("node {id} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

fn grow_node(
    nodes: &mut Vec<Node>,
    rows: &[Row],
    depth: u32,
    height_limit: u32,
    rng: &mut ChaCha8Rng,
) -> usize {
    let id = nodes.len();
    nodes.push(Node::Leaf { size: rows.len() });

    if depth >= height_limit || rows.len() <= 1 {
        return id;
    }

    // Only features that still vary on this node can split it
    let splittable: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
        .filter_map(|feature| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r[feature]), hi.max(r[feature]))
            });
            (hi > lo).then_some((feature, lo, hi))
        })
        .collect();
    if splittable.is_empty() {
        return id;
    }

    let (feature, lo, hi) = splittable[rng.random_range(0..splittable.len())];
    let threshold = rng.random_range(lo..hi);
    let (left_rows, right_rows): (Vec<Row>, Vec<Row>) =
        rows.iter().partition(|r| r[feature] <= threshold);

    let left = grow_node(nodes, &left_rows, depth + 1, height_limit, rng);
    let right = grow_node(nodes, &right_rows, depth + 1, height_limit, rng);
    nodes[id] = Node::Split {
        feature,
        threshold,
        left,
        right,
    };
    id
}

/// Average path length of an unsuccessful BST search over `n` items,
/// `c(n)` in the isolation forest paper
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Percentile with linear interpolation between closest ranks.
/// `sorted` must be non-empty and ascending.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// A fitted isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Rows each tree was grown on
    max_samples: usize,
    contamination: f64,
    /// Subtracted from `score_samples` so the decision boundary sits at zero
    offset: f64,
}

impl IsolationForest {
    /// Fit a forest on `data`. Deterministic for a given config seed.
    pub fn fit(data: &[FeatureVector], config: &TrainConfig) -> ModelResult<Self> {
        config.validate()?;
        if data.len() < 2 {
            return Err(ModelError::InsufficientData(data.len()));
        }

        let rows: Vec<Row> = data.iter().map(|v| *v.values()).collect();
        let max_samples = config.max_samples.min(rows.len());
        let height_limit = (max_samples as f64).log2().ceil() as u32;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut indices: Vec<usize> = (0..rows.len()).collect();

        let trees: Vec<IsolationTree> = (0..config.n_estimators)
            .map(|_| {
                // subsample without replacement
                indices.shuffle(&mut rng);
                let sample: Vec<Row> = indices[..max_samples].iter().map(|&i| rows[i]).collect();
                IsolationTree::grow(&sample, height_limit, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            max_samples,
            contamination: config.contamination,
            offset: 0.0,
        };

        let mut train_scores: Vec<f64> = rows.iter().map(|r| forest.score_row(r)).collect();
        train_scores.sort_by(|a, b| a.total_cmp(b));
        forest.offset = percentile(&train_scores, 100.0 * config.contamination);

        tracing::debug!(
            "isolation forest: {} trees, {} samples/tree, height limit {}, offset {:.4}",
            forest.trees.len(),
            max_samples,
            height_limit,
            forest.offset
        );

        Ok(forest)
    }

    fn score_row(&self, row: &Row) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        -(2f64.powf(-mean_path / average_path_length(self.max_samples)))
    }

    /// Opposite of the anomaly score from the paper: in [-1, 0), lower is
    /// more anomalous
    pub fn score_samples(&self, features: &FeatureVector) -> f64 {
        self.score_row(features.values())
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Structural checks for forests read back from disk
    pub fn validate(&self) -> ModelResult<()> {
        if self.trees.is_empty() {
            return Err(ModelError::InvalidArtifact("forest has no trees".into()));
        }
        if self.max_samples < 2 {
            return Err(ModelError::InvalidArtifact(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        if !self.offset.is_finite() {
            return Err(ModelError::InvalidArtifact("offset is not finite".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| ModelError::InvalidArtifact(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

impl AnomalyModel for IsolationForest {
    fn decision_function(&self, features: &FeatureVector) -> f64 {
        self.score_samples(features) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::bootstrap::bootstrap_dataset;

    fn fitted() -> IsolationForest {
        IsolationForest::fit(&bootstrap_dataset(), &TrainConfig::default()).unwrap()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(6) = 2 * (ln 5 + gamma) - 10/6
        let expected = 2.0 * (5f64.ln() + EULER_GAMMA) - 10.0 / 6.0;
        assert!((average_path_length(6) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        // rank 0.3 * 5 = 1.5 -> halfway between 2 and 3
        assert!((percentile(&sorted, 30.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 6.0);
        assert_eq!(percentile(&[7.0], 30.0), 7.0);
    }

    #[test]
    fn test_fit_uses_configured_shape() {
        let forest = fitted();
        assert_eq!(forest.n_estimators(), 100);
        assert_eq!(forest.max_samples, 6);
        assert!((forest.contamination() - 0.3).abs() < f64::EPSILON);
        forest.validate().unwrap();
        // six rows, height limit 3: at most 15 nodes per tree
        for tree in &forest.trees {
            assert!(!tree.is_empty());
            assert!(tree.len() <= 15);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = fitted();
        let b = fitted();
        assert_eq!(a, b);

        let sample = FeatureVector::new([0.5, 0.5, 0.5, 0.5, 0.5]);
        assert_eq!(a.decision_function(&sample), b.decision_function(&sample));
    }

    #[test]
    fn test_different_seed_changes_trees() {
        let config = TrainConfig {
            seed: 7,
            ..TrainConfig::default()
        };
        let other = IsolationForest::fit(&bootstrap_dataset(), &config).unwrap();
        assert_ne!(fitted().trees, other.trees);
    }

    #[test]
    fn test_scores_are_in_range() {
        let forest = fitted();
        for row in bootstrap_dataset() {
            let s = forest.score_samples(&row);
            assert!(s < 0.0 && s >= -1.0, "score {s} out of range");
        }
    }

    #[test]
    fn test_offset_splits_training_rows() {
        let forest = fitted();
        let decisions: Vec<f64> = bootstrap_dataset()
            .iter()
            .map(|r| forest.decision_function(r))
            .collect();
        // the contamination percentile lies between the lowest and highest
        // training score, so both sides of the boundary are populated
        assert!(decisions.iter().any(|&d| d <= 0.0));
        assert!(decisions.iter().any(|&d| d >= 0.0));
    }

    #[test]
    fn test_fit_rejects_tiny_datasets() {
        let one = vec![FeatureVector::new([0.1; FEATURE_COUNT])];
        let err = IsolationForest::fit(&one, &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientData(1)));
    }

    #[test]
    fn test_constant_data_yields_leaves() {
        let same = vec![FeatureVector::new([0.4; FEATURE_COUNT]); 4];
        let forest = IsolationForest::fit(&same, &TrainConfig::default()).unwrap();
        // nothing to split on: every tree is a single leaf holding all rows
        assert!(forest.trees.iter().all(|t| t.len() == 1));
        assert_eq!(forest.decision_function(&same[0]), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_children() {
        let mut forest = fitted();
        forest.trees[0] = IsolationTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 0,
            }],
        };
        assert!(matches!(
            forest.validate(),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let mut forest = fitted();
        forest.trees[0] = IsolationTree {
            nodes: vec![
                Node::Split {
                    feature: FEATURE_COUNT,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { size: 1 },
                Node::Leaf { size: 1 },
            ],
        };
        assert!(forest.validate().is_err());
    }
}
