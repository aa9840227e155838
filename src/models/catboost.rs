//! CatBoost-style boosting with symmetric (oblivious) trees
//!
//! Every level of a tree shares one split, so a tree of depth d is a table
//! of d (feature, threshold) pairs plus 2^d leaf values, and prediction is
//! d comparisons building a leaf index bit by bit.

use crate::error::{RegforgeError, Result};
use crate::models::sample_fraction_indices;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 smoothing on leaf values
    pub reg_lambda: f64,
    pub subsample: f64,
    pub random_state: Option<u64>,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            reg_lambda: 3.0,
            subsample: 1.0,
            random_state: Some(42),
        }
    }
}

impl CatBoostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
}

/// Oblivious tree: one (feature, threshold) per level, 2^depth leaves
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    splits: Vec<(usize, f64)>,
    leaf_values: Vec<f64>,
}

impl SymmetricTree {
    fn predict(&self, row: &ArrayView1<f64>) -> f64 {
        let mut idx = 0usize;
        for &(feature, threshold) in &self.splits {
            idx = idx * 2 + usize::from(row[feature] > threshold);
        }
        self.leaf_values[idx.min(self.leaf_values.len() - 1)]
    }
}

fn build_symmetric_tree(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    max_depth: usize,
    reg_lambda: f64,
) -> SymmetricTree {
    let n_features = x.ncols();
    let mut splits = Vec::with_capacity(max_depth);

    // Current partition of the sample into leaf buckets
    let mut buckets: Vec<Vec<usize>> = vec![indices.to_vec()];

    for _depth in 0..max_depth {
        // The level split is chosen globally: the same (feature, threshold)
        // must pay off summed over every bucket.
        let best = (0..n_features)
            .into_par_iter()
            .filter_map(|feat| {
                let mut all_vals: Vec<f64> = buckets
                    .iter()
                    .flat_map(|b| b.iter().map(|&i| x[[i, feat]]))
                    .collect();
                all_vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                all_vals.dedup();

                if all_vals.len() < 2 {
                    return None;
                }

                let mut best_gain = f64::NEG_INFINITY;
                let mut best_thr = 0.0;

                // Cap candidate thresholds at 256 per feature
                let step = (all_vals.len() / 256).max(1);
                for i in (0..all_vals.len() - 1).step_by(step) {
                    let thr = (all_vals[i] + all_vals[i + 1]) / 2.0;
                    let mut total_gain = 0.0;

                    for bucket in &buckets {
                        let (lg, lh, rg, rh) = bucket.iter().fold(
                            (0.0, 0.0, 0.0, 0.0),
                            |(lg, lh, rg, rh), &idx| {
                                if x[[idx, feat]] <= thr {
                                    (lg + gradients[idx], lh + hessians[idx], rg, rh)
                                } else {
                                    (lg, lh, rg + gradients[idx], rh + hessians[idx])
                                }
                            },
                        );
                        let parent_g = lg + rg;
                        let parent_h = lh + rh;
                        let parent_score = parent_g * parent_g / (parent_h + reg_lambda);
                        let left_score = lg * lg / (lh + reg_lambda);
                        let right_score = rg * rg / (rh + reg_lambda);
                        total_gain += left_score + right_score - parent_score;
                    }

                    if total_gain > best_gain {
                        best_gain = total_gain;
                        best_thr = thr;
                    }
                }

                if best_gain > 0.0 {
                    Some((feat, best_thr, best_gain))
                } else {
                    None
                }
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((feat, thr, _)) => {
                splits.push((feat, thr));
                let mut new_buckets = Vec::with_capacity(buckets.len() * 2);
                for bucket in &buckets {
                    let (left, right): (Vec<usize>, Vec<usize>) =
                        bucket.iter().partition(|&&i| x[[i, feat]] <= thr);
                    new_buckets.push(left);
                    new_buckets.push(right);
                }
                buckets = new_buckets;
            }
            None => break,
        }
    }

    let leaf_values: Vec<f64> = buckets
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                return 0.0;
            }
            let g: f64 = bucket.iter().map(|&i| gradients[i]).sum();
            let h: f64 = bucket.iter().map(|&i| hessians[i]).sum();
            -g / (h + reg_lambda)
        })
        .collect();

    SymmetricTree {
        splits,
        leaf_values,
    }
}

/// Squared-loss booster over symmetric trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
    n_features: usize,
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(RegforgeError::TrainingError("empty dataset".to_string()));
        }
        if n != y.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.n_features = x.ncols();
        self.base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));

        self.trees.clear();

        for _ in 0..self.config.n_estimators {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(y.iter())
                .map(|(&p, &yi)| p - yi)
                .collect();
            let hessians: Vec<f64> = vec![1.0; n];

            let indices = sample_fraction_indices(n, self.config.subsample, &mut rng);

            let tree = build_symmetric_tree(
                x,
                &gradients,
                &hessians,
                &indices,
                self.config.max_depth,
                self.config.reg_lambda,
            );

            for i in 0..n {
                predictions[i] += self.config.learning_rate * tree.predict(&x.row(i));
            }
            self.trees.push(tree);
        }

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

        Ok(Array1::from_vec(
            x.rows()
                .into_iter()
                .map(|row| {
                    self.base_prediction
                        + self
                            .trees
                            .iter()
                            .map(|t| self.config.learning_rate * t.predict(&row))
                            .sum::<f64>()
                })
                .collect(),
        ))
    }
}
