//! Regression estimators
//!
//! The candidate pool covers:
//! - Decision trees and random forests
//! - Gradient boosting, XGBoost-style and CatBoost-style boosters
//! - Ordinary least squares (with a ridge fallback)
//! - K-nearest neighbors
//! - AdaBoost.R2

pub mod adaboost;
pub mod catboost;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod linear;
pub mod random_forest;
pub mod xgboost;

pub use adaboost::{AdaBoostConfig, AdaBoostRegressor};
pub use catboost::{CatBoostConfig, CatBoostRegressor};
pub use decision_tree::{DecisionTree, DecisionTreeConfig, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use knn::{KNNConfig, KNNRegressor};
pub use linear::{LinearRegression, LinearRegressionConfig};
pub use random_forest::{MaxFeatures, RandomForest, RandomForestConfig};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};

use crate::error::Result;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Row indices for a subsampled fit: shuffle, keep ceil(n * fraction),
/// return in ascending order. A fraction of 1.0 or more keeps every row.
pub(crate) fn sample_fraction_indices<R: Rng>(
    n: usize,
    fraction: f64,
    rng: &mut R,
) -> Vec<usize> {
    if fraction >= 1.0 {
        return (0..n).collect();
    }
    let keep = ((n as f64) * fraction).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(keep.max(1));
    indices.sort_unstable();
    indices
}

/// A fitted (or not-yet-fitted) estimator of any supported kind.
///
/// Enum dispatch keeps the whole value serializable, which is what lets a
/// selection winner round-trip through the artifact file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    GradientBoosting(GradientBoostingRegressor),
    LinearRegression(LinearRegression),
    KNeighbors(KNNRegressor),
    XGBoost(XGBoostRegressor),
    CatBoost(CatBoostRegressor),
    AdaBoost(AdaBoostRegressor),
}

impl Estimator {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::RandomForest(m) => m.fit(x, y),
            Estimator::DecisionTree(m) => m.fit(x, y),
            Estimator::GradientBoosting(m) => m.fit(x, y),
            Estimator::LinearRegression(m) => m.fit(x, y),
            Estimator::KNeighbors(m) => m.fit(x, y),
            Estimator::XGBoost(m) => m.fit(x, y),
            Estimator::CatBoost(m) => m.fit(x, y),
            Estimator::AdaBoost(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::DecisionTree(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
            Estimator::LinearRegression(m) => m.predict(x),
            Estimator::KNeighbors(m) => m.predict(x),
            Estimator::XGBoost(m) => m.predict(x),
            Estimator::CatBoost(m) => m.predict(x),
            Estimator::AdaBoost(m) => m.predict(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_fraction_keeps_everything_at_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(sample_fraction_indices(5, 1.0, &mut rng), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_fraction_indices(3, 1.5, &mut rng), vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_fraction_rounds_up_and_sorts() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let indices = sample_fraction_indices(10, 0.25, &mut rng);
        // ceil(10 * 0.25) = 3
        assert_eq!(indices.len(), 3);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(indices.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_sample_fraction_never_returns_empty_for_nonempty_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(sample_fraction_indices(7, 0.001, &mut rng).len(), 1);
    }

    #[test]
    fn test_estimator_dispatch_round_trip() {
        let x = ndarray::array![[0.0], [1.0], [2.0], [3.0]];
        let y = ndarray::array![0.0, 2.0, 4.0, 6.0];

        let mut est = Estimator::LinearRegression(LinearRegression::new(
            LinearRegressionConfig::default(),
        ));
        est.fit(&x, &y).unwrap();
        let pred = est.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-8);
        }
    }
}
