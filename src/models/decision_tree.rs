//! CART regression tree

use crate::error::{RegforgeError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Node of a fitted regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node predicting the mean of its training targets
    Leaf { value: f64, n_samples: usize },
    /// Binary split on one feature
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Configuration for a regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    /// Maximum tree depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples each child must keep
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl DecisionTreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }
}

/// Regression tree grown by recursive variance-reduction splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
}

impl DecisionTree {
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples < self.config.min_samples_split {
            return Err(RegforgeError::TrainingError(format!(
                "need at least {} samples to fit, got {}",
                self.config.min_samples_split, n_samples
            )));
        }

        self.n_features = x.ncols();

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0));

        Ok(())
    }

    fn build_tree(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();

        let should_stop = n_samples < self.config.min_samples_split
            || n_samples <= self.config.min_samples_leaf
            || self.config.max_depth.map_or(false, |d| depth >= d)
            || is_constant(y, indices);

        if should_stop {
            return TreeNode::Leaf {
                value: mean_of(y, indices),
                n_samples,
            };
        }

        match self.find_best_split(x, y, indices) {
            Some((feature_idx, threshold, _gain)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.config.min_samples_leaf
                    || right_indices.len() < self.config.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        value: mean_of(y, indices),
                        n_samples,
                    };
                }

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                }
            }
            None => TreeNode::Leaf {
                value: mean_of(y, indices),
                n_samples,
            },
        }
    }

    /// Scan every feature in parallel for the variance-reducing split with
    /// the highest gain. Each feature sorts its rows once and sweeps the
    /// boundaries between distinct values with running sums.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len() as f64;
        let (total_sum, total_sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let parent_impurity = variance_from_sums(indices.len(), total_sum, total_sq_sum);

        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature_idx]]
                        .partial_cmp(&x[[b, feature_idx]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                let mut left_count = 0usize;
                let mut left_sum = 0.0f64;
                let mut left_sq_sum = 0.0f64;

                for pos in 0..order.len() - 1 {
                    let idx = order[pos];
                    let yi = y[idx];
                    left_count += 1;
                    left_sum += yi;
                    left_sq_sum += yi * yi;

                    // Splits only between distinct feature values
                    let here = x[[idx, feature_idx]];
                    let next = x[[order[pos + 1], feature_idx]];
                    if here == next {
                        continue;
                    }

                    let right_count = order.len() - left_count;
                    if left_count < self.config.min_samples_leaf
                        || right_count < self.config.min_samples_leaf
                    {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq_sum = total_sq_sum - left_sq_sum;

                    let weighted_impurity = (left_count as f64
                        * variance_from_sums(left_count, left_sum, left_sq_sum)
                        + right_count as f64
                            * variance_from_sums(right_count, right_sum, right_sq_sum))
                        / n;

                    let gain = parent_impurity - weighted_impurity;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = (here + next) / 2.0;
                    }
                }

                if best_gain > 0.0 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(RegforgeError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(RegforgeError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| predict_row(root, &x.row(i)))
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Depth of the fitted tree (0 when unfitted)
    pub fn depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => node_depth(node),
        }
    }
}

fn predict_row(node: &TreeNode, row: &ArrayView1<f64>) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if row[*feature_idx] <= *threshold {
                predict_row(left, row)
            } else {
                predict_row(right, row)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

/// Var = E[X²] - E[X]²
fn variance_from_sums(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    sq_sum / n - (sum / n).powi(2)
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first_idx) => {
            let first = y[first_idx];
            indices.iter().all(|&i| (y[i] - first).abs() < 1e-10)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTree::new(DecisionTreeConfig::default());
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&array![[2.0], [11.0]]).unwrap();
        assert!((pred[0] - 5.0).abs() < 1e-12);
        assert!((pred[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_ramp_low_mse() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new(DecisionTreeConfig::default());
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        assert!(mse < 1.0, "MSE too high: {}", mse);
    }

    #[test]
    fn test_max_depth_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

        let mut tree = DecisionTree::new(DecisionTreeConfig::new().with_max_depth(2));
        tree.fit(&x, &y).unwrap();

        // depth() counts nodes on the longest path, so max_depth 2 allows
        // at most 2 split levels above the leaves.
        assert!(tree.depth() <= 3, "depth = {}", tree.depth());
    }

    #[test]
    fn test_constant_target_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];

        let mut tree = DecisionTree::new(DecisionTreeConfig::default());
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.depth(), 1);
        let pred = tree.predict(&array![[99.0]]).unwrap();
        assert!((pred[0] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples_errors() {
        let x = array![[1.0]];
        let y = array![1.0];

        let mut tree = DecisionTree::new(DecisionTreeConfig::new().with_min_samples_split(2));
        assert!(matches!(
            tree.fit(&x, &y),
            Err(RegforgeError::TrainingError(_))
        ));
    }

    #[test]
    fn test_predict_unfitted_errors() {
        let tree = DecisionTree::new(DecisionTreeConfig::default());
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(RegforgeError::ModelNotFitted)
        ));
    }
}
