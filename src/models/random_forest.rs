//! Random forest regressor

use crate::error::{RegforgeError, Result};
use crate::models::decision_tree::{DecisionTree, DecisionTreeConfig};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the number of features each tree sees
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        let count = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => *n,
            MaxFeatures::All => n_features,
        };
        count.clamp(1, n_features)
    }
}

/// Configuration for a random forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree (None = unbounded)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in a leaf
    pub min_samples_leaf: usize,
    /// Feature subset per tree
    pub max_features: MaxFeatures,
    /// Bootstrap row sampling
    pub bootstrap: bool,
    /// Seed for per-tree RNGs
    pub random_state: Option<u64>,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: Some(42),
        }
    }
}

impl RandomForestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}

/// Bagged ensemble of regression trees, mean-aggregated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    trees: Vec<DecisionTree>,
    feature_indices: Vec<Vec<usize>>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_indices: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.n_features = n_features;
        let features_per_tree = self.config.max_features.resolve(n_features);
        let base_seed = self.config.random_state.unwrap_or(42);

        // Each tree gets its own deterministic RNG; results do not depend on
        // thread scheduling.
        let fitted: Result<Vec<(DecisionTree, Vec<usize>)>> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let row_indices: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples)
                        .map(|_| (rng.next_u64() as usize) % n_samples)
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut col_indices: Vec<usize> = (0..n_features).collect();
                col_indices.shuffle(&mut rng);
                col_indices.truncate(features_per_tree);
                col_indices.sort_unstable();

                let x_boot = x
                    .select(Axis(0), &row_indices)
                    .select(Axis(1), &col_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(row_indices.iter().map(|&i| y[i]).collect());

                let tree_config = DecisionTreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                };
                let mut tree = DecisionTree::new(tree_config);
                tree.fit(&x_boot, &y_boot)?;

                Ok((tree, col_indices))
            })
            .collect();

        let (trees, feature_indices): (Vec<_>, Vec<_>) = fitted?.into_iter().unzip();
        self.trees = trees;
        self.feature_indices = feature_indices;

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(RegforgeError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(RegforgeError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let per_tree: Result<Vec<Array1<f64>>> = self
            .trees
            .par_iter()
            .zip(self.feature_indices.par_iter())
            .map(|(tree, cols)| {
                let x_sub = x.select(Axis(1), cols);
                tree.predict(&x_sub)
            })
            .collect();
        let per_tree = per_tree?;

        let n_samples = x.nrows();
        let n_trees = per_tree.len() as f64;
        let predictions: Vec<f64> = (0..n_samples)
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / n_trees)
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
