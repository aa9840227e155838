//! Ordinary least squares linear regression

use crate::error::{RegforgeError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for linear regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionConfig {
    /// Whether to fit an intercept term
    pub fit_intercept: bool,
    /// L2 regularization strength (0.0 = plain OLS)
    pub alpha: f64,
}

impl Default for LinearRegressionConfig {
    fn default() -> Self {
        Self {
            fit_intercept: true,
            alpha: 0.0,
        }
    }
}

impl LinearRegressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Linear regression fitted by solving the normal equations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    config: LinearRegressionConfig,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new(config: LinearRegressionConfig) -> Self {
        Self {
            config,
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Fitted weights, one per feature column
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Fit on training data by solving (X^T X + alpha*I) w = X^T y
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(RegforgeError::TrainingError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }

        // Center data when fitting an intercept; the intercept is recovered
        // from the means afterwards.
        let (x_work, y_work, means) = if self.config.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).ok_or_else(|| {
                RegforgeError::ComputationError("feature means unavailable".to_string())
            })?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            (x_centered, y_centered, Some((x_mean, y_mean)))
        } else {
            (x.clone(), y.clone(), None)
        };

        let coefficients = if self.config.alpha > 0.0 {
            let mut xtx = x_work.t().dot(&x_work);
            for i in 0..n_features {
                xtx[[i, i]] += self.config.alpha;
            }
            let xty = x_work.t().dot(&y_work);

            solve_spd(&xtx, &xty).ok_or_else(|| {
                RegforgeError::ComputationError(
                    "singular system in regularized least squares".to_string(),
                )
            })?
        } else {
            solve_least_squares(&x_work, &y_work).ok_or_else(|| {
                RegforgeError::ComputationError(
                    "singular system, cannot solve least squares".to_string(),
                )
            })?
        };

        self.intercept = match &means {
            Some((x_mean, y_mean)) => y_mean - coefficients.dot(x_mean),
            None => 0.0,
        };
        self.coefficients = Some(coefficients);

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(RegforgeError::ModelNotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(RegforgeError::ShapeError {
                expected: format!("{} feature columns", coefficients.len()),
                actual: format!("{} feature columns", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Solve least squares via the normal equations: (X^T X) w = X^T y.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    solve_spd(&xtx, &xty)
}

/// Solve a symmetric system, preferring Cholesky (O(n³/3)). A matrix that is
/// not positive definite gets one retry with a small ridge on the diagonal;
/// after that the solve falls back to Gauss-Jordan inversion.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if let Some(solution) = cholesky_solve(a, b) {
        return Some(solution);
    }
    matrix_inverse(a).map(|inv| inv.dot(b))
}

fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    // Not positive definite. Retry once with a ridge scaled
                    // to the diagonal magnitude.
                    let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
                    let mut a_reg = a.clone();
                    for k in 0..n {
                        a_reg[[k, k]] += ridge;
                    }
                    return cholesky_solve_inner(&a_reg, b);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(cholesky_substitute(&l, b))
}

/// One-shot Cholesky on the regularized matrix, no further retry.
fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(cholesky_substitute(&l, b))
}

/// Forward substitution L*z = b, then backward substitution L^T*x = z.
fn cholesky_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    let mut z = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    x
}

/// Gauss-Jordan inversion with partial pivoting, for small matrices.
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // Augmented matrix [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }

    Some(inv)
}
