//! Random-forest classifier evaluated from exported tree arrays.
//!
//! Each tree uses the flat layout of a fitted scikit-learn `tree_`:
//! parallel arrays indexed by node id, with `-1` children marking leaves
//! and per-leaf class weights in `value`. Training happens offline.

use serde::{Deserialize, Serialize};

use super::artifacts::ArtifactError;
use super::PredictionError;

/// Child index marking a leaf node.
pub const TREE_LEAF: i64 = -1;

/// A fitted multi-class probabilistic classifier.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// Class probability distribution for one scaled row.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError>;

    /// Index of the most probable class; the lowest index wins ties.
    fn predict(&self, row: &[f64]) -> Result<usize, PredictionError> {
        Ok(argmax(&self.predict_proba(row)?))
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class weights per node; only leaf rows are read.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Structural checks that make `leaf_for` total: every split points
    /// strictly forward to an existing node and reads an existing column.
    fn validate(&self, tree: usize, n_features: usize, n_classes: usize) -> Result<(), ArtifactError> {
        let n = self.node_count();
        if n == 0 {
            return Err(invalid(format!("tree {tree} has no nodes")));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(invalid(format!("tree {tree} has node arrays of differing lengths")));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(invalid(format!("tree {tree} node {node} has a single child")));
                }
                let weights = &self.value[node];
                if weights.len() != n_classes {
                    return Err(invalid(format!(
                        "tree {tree} leaf {node} has {} class weights, expected {n_classes}",
                        weights.len()
                    )));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(format!("tree {tree} leaf {node} has a negative or non-finite weight")));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(invalid(format!("tree {tree} leaf {node} has no class weight")));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!(
                        "tree {tree} node {node} points to invalid child {child}"
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(invalid(format!(
                    "tree {tree} node {node} splits on unknown feature {feature}"
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("tree {tree} node {node} has a NaN threshold")));
            }
        }
        Ok(())
    }

    fn leaf_for(&self, row: &[f64]) -> usize {
        let mut node = 0;
        loop {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return node;
            }
            let feature = self.feature[node] as usize;
            // Inputs are compared at f32 precision against f64 thresholds,
            // matching how the trees were fitted.
            let x = f64::from(row[feature] as f32);
            node = if x <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// Ensemble of decision trees; probabilities are the mean of per-tree
/// normalized leaf weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees".into()));
        }
        if self.n_classes == 0 {
            return Err(invalid("forest has no classes".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features, self.n_classes)?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.n_features {
            return Err(PredictionError::FeatureCount {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let weights = &tree.value[tree.leaf_for(row)];
            let total: f64 = weights.iter().sum();
            for (p, w) in proba.iter_mut().zip(weights) {
                *p += w / total;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }
}

fn invalid(reason: String) -> ArtifactError {
    ArtifactError::Invalid {
        artifact: "classifier",
        reason,
    }
}
