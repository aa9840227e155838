//! Candidate fitting and scoring
//!
//! Every candidate is fit on the training split and scored on the held-out
//! split. Evaluations come back in roster order, and the argmax keeps the
//! earliest candidate on ties.

use crate::error::Result;
use crate::metrics::RegressionMetrics;
use crate::models::Estimator;
use crate::registry::Candidate;
use ndarray::{Array1, Array2};

/// One fitted candidate together with its held-out metrics
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub name: String,
    pub model: Estimator,
    pub metrics: RegressionMetrics,
}

impl Evaluation {
    /// Held-out R², the score selection ranks by.
    pub fn score(&self) -> f64 {
        self.metrics.r2
    }
}

/// Fit and score every candidate, preserving roster order.
///
/// A candidate that fails to fit or predict aborts the whole evaluation;
/// the caller decides whether that is recoverable.
pub fn evaluate_models(
    candidates: &[Candidate],
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<Vec<Evaluation>> {
    let mut evaluations = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let mut model = candidate.spec.build();
        model.fit(x_train, y_train)?;
        let predictions = model.predict(x_test)?;
        let metrics = RegressionMetrics::compute(y_test, &predictions);

        tracing::debug!(
            model = %candidate.name,
            r2 = metrics.r2,
            rmse = metrics.rmse,
            "evaluated candidate"
        );

        evaluations.push(Evaluation {
            name: candidate.name.clone(),
            model,
            metrics,
        });
    }

    Ok(evaluations)
}

/// Pick the best evaluation by R². Later entries must score strictly
/// higher to displace an earlier one, and NaN ranks below every number.
pub fn best_evaluation(evaluations: &[Evaluation]) -> Option<&Evaluation> {
    fn rank(score: f64) -> f64 {
        if score.is_nan() {
            f64::NEG_INFINITY
        } else {
            score
        }
    }

    let mut best: Option<&Evaluation> = None;
    for evaluation in evaluations {
        match best {
            None => best = Some(evaluation),
            Some(current) if rank(evaluation.score()) > rank(current.score()) => {
                best = Some(evaluation)
            }
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionTreeConfig, Estimator, LinearRegression, LinearRegressionConfig};
    use crate::registry::EstimatorSpec;
    use ndarray::array;

    fn linear_split() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x_train = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y_train = array![2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let x_test = array![[7.0], [8.0]];
        let y_test = array![14.0, 16.0];
        (x_train, y_train, x_test, y_test)
    }

    fn dummy_evaluation(name: &str, r2: f64) -> Evaluation {
        Evaluation {
            name: name.to_string(),
            model: Estimator::LinearRegression(LinearRegression::new(
                LinearRegressionConfig::default(),
            )),
            metrics: RegressionMetrics {
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                r2,
                n_samples: 2,
            },
        }
    }

    #[test]
    fn test_evaluations_preserve_roster_order() {
        let (x_train, y_train, x_test, y_test) = linear_split();
        let roster = vec![
            Candidate::new(
                "Decision Tree",
                EstimatorSpec::DecisionTree(DecisionTreeConfig::default()),
            ),
            Candidate::new(
                "Linear Regression",
                EstimatorSpec::LinearRegression(LinearRegressionConfig::default()),
            ),
        ];

        let evals = evaluate_models(&roster, &x_train, &y_train, &x_test, &y_test).unwrap();
        assert_eq!(evals.len(), 2);
        assert_eq!(evals[0].name, "Decision Tree");
        assert_eq!(evals[1].name, "Linear Regression");
    }

    #[test]
    fn test_linear_candidate_scores_near_one() {
        let (x_train, y_train, x_test, y_test) = linear_split();
        let roster = vec![Candidate::new(
            "Linear Regression",
            EstimatorSpec::LinearRegression(LinearRegressionConfig::default()),
        )];

        let evals = evaluate_models(&roster, &x_train, &y_train, &x_test, &y_test).unwrap();
        assert!((evals[0].score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_best_keeps_first_on_tie() {
        let evals = vec![
            dummy_evaluation("first", 0.9),
            dummy_evaluation("second", 0.9),
        ];
        let best = best_evaluation(&evals).unwrap();
        assert_eq!(best.name, "first");
    }

    #[test]
    fn test_best_ranks_nan_below_everything() {
        let evals = vec![
            dummy_evaluation("broken", f64::NAN),
            dummy_evaluation("modest", -0.5),
        ];
        let best = best_evaluation(&evals).unwrap();
        assert_eq!(best.name, "modest");

        let only_nan = vec![
            dummy_evaluation("first-nan", f64::NAN),
            dummy_evaluation("second-nan", f64::NAN),
        ];
        assert_eq!(best_evaluation(&only_nan).unwrap().name, "first-nan");
    }

    #[test]
    fn test_best_of_empty_is_none() {
        assert!(best_evaluation(&[]).is_none());
    }
}
