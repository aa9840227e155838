//! K-nearest-neighbors regression
//!
//! Fitting stores the training data; prediction averages the targets of the
//! k closest rows by Euclidean distance.

use crate::error::{RegforgeError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

impl KNNConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }
}

/// Max-heap entry keeping the k smallest distances seen so far
#[derive(PartialEq)]
struct Neighbor(f64, f64);

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Collect the k nearest training targets with a bounded max-heap,
/// O(n log k) per query row. Returns fewer than k when the training
/// set is smaller than k.
fn k_nearest_targets(
    point: &ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<f64> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (i, row) in x_train.rows().into_iter().enumerate() {
        let dist = euclidean_distance(point, &row);
        if heap.len() < k {
            heap.push(Neighbor(dist, y_train[i]));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(Neighbor(dist, y_train[i]));
            }
        }
    }

    heap.into_iter().map(|n| n.1).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNRegressor {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KNNRegressor {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig { n_neighbors: k })
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.config.n_neighbors == 0 {
            return Err(RegforgeError::InvalidInput(
                "n_neighbors must be at least 1".to_string(),
            ));
        }
        if x.nrows() == 0 {
            return Err(RegforgeError::TrainingError("empty dataset".to_string()));
        }
        if x.nrows() != y.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(RegforgeError::ModelNotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(RegforgeError::ModelNotFitted)?;
        if x.ncols() != x_train.ncols() {
            return Err(RegforgeError::ShapeError {
                expected: format!("{} feature columns", x_train.ncols()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        let k = self.config.n_neighbors;
        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let targets = k_nearest_targets(&x.row(i), x_train, y_train, k);
                targets.iter().sum::<f64>() / targets.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
