//! AdaBoost.R2 regression
//!
//! Each round fits a shallow decision tree on a weighted bootstrap of the
//! training data, then reweights samples by their normalized absolute error.
//! Prediction is the weighted median of the weak learners.

use crate::error::{RegforgeError, Result};
use crate::models::decision_tree::{DecisionTree, DecisionTreeConfig};
use ndarray::{Array1, Array2, Axis};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth of the weak-learner trees
    pub max_depth: usize,
    pub random_state: Option<u64>,
}

impl Default for AdaBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            max_depth: 3,
            random_state: Some(42),
        }
    }
}

impl AdaBoostConfig {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    config: AdaBoostConfig,
    learners: Vec<DecisionTree>,
    learner_weights: Vec<f64>,
    n_features: usize,
}

impl AdaBoostRegressor {
    pub fn new(config: AdaBoostConfig) -> Self {
        Self {
            config,
            learners: Vec::new(),
            learner_weights: Vec::new(),
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
        self.learners.clear();
        self.learner_weights.clear();

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut weights = Array1::from_elem(n, 1.0 / n as f64);

        for _round in 0..self.config.n_estimators {
            let dist = WeightedIndex::new(weights.iter()).map_err(|e| {
                RegforgeError::TrainingError(format!("invalid sample weights: {}", e))
            })?;
            let rows: Vec<usize> = (0..n).map(|_| dist.sample(&mut rng)).collect();
            let x_boot = x.select(Axis(0), &rows);
            let y_boot: Array1<f64> = rows.iter().map(|&i| y[i]).collect();

            let mut tree = DecisionTree::new(
                DecisionTreeConfig::new().with_max_depth(self.config.max_depth),
            );
            tree.fit(&x_boot, &y_boot)?;

            // Losses are measured on the full training set, not the bootstrap
            let pred = tree.predict(x)?;
            let abs_err: Array1<f64> =
                (0..n).map(|i| (pred[i] - y[i]).abs()).collect();
            let max_err = abs_err.iter().cloned().fold(0.0, f64::max);

            if max_err < 1e-12 {
                // Already exact, nothing left to reweight
                self.learners.push(tree);
                self.learner_weights.push(1.0);
                break;
            }

            let losses = abs_err.mapv(|e| e / max_err);
            let avg_loss: f64 = weights
                .iter()
                .zip(losses.iter())
                .map(|(w, l)| w * l)
                .sum();

            if avg_loss >= 0.5 {
                // Learner no better than chance; keep it only if the
                // ensemble would otherwise be empty
                if self.learners.is_empty() {
                    self.learners.push(tree);
                    self.learner_weights.push(1.0);
                }
                break;
            }

            let avg_loss = avg_loss.max(1e-15);
            let beta = avg_loss / (1.0 - avg_loss);
            let alpha = self.config.learning_rate * (1.0 / beta).ln();

            for i in 0..n {
                weights[i] *= beta.powf(self.config.learning_rate * (1.0 - losses[i]));
            }
            let w_sum = weights.sum();
            if w_sum > 0.0 {
                weights /= w_sum;
            }

            self.learners.push(tree);
            self.learner_weights.push(alpha);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.learners.is_empty() {
            return Err(RegforgeError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(RegforgeError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let per_learner: Vec<Array1<f64>> = self
            .learners
            .iter()
            .map(|t| t.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut predictions = Array1::zeros(x.nrows());
        let mut row_preds = vec![0.0; self.learners.len()];
        for i in 0..x.nrows() {
            for (j, preds) in per_learner.iter().enumerate() {
                row_preds[j] = preds[i];
            }
            predictions[i] = weighted_median(&row_preds, &self.learner_weights);
        }

        Ok(predictions)
    }
}

/// Value whose cumulative weight first reaches half of the total, taken in
/// ascending value order.
fn weighted_median(values: &[f64], weights: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let total: f64 = weights.iter().sum();
    let mut cumulative = 0.0;
    for &j in &order {
        cumulative += weights[j];
        if cumulative >= total / 2.0 {
            return values[j];
        }
    }
    values[order[order.len() - 1]]
}
