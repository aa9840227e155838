//! Model selection driver
//!
//! `ModelTrainer` takes a train/test matrix pair whose last column is the
//! target, fits every roster candidate, keeps the best scorer, enforces the
//! acceptance threshold, and persists the winner. The returned score comes
//! from the persisted bytes: the artifact is reloaded and re-scored, so the
//! number the caller sees is the number the artifact will reproduce.

use crate::data::{split_features_target, validate_matrix_pair};
use crate::error::{RegforgeError, Result};
use crate::evaluate::{best_evaluation, evaluate_models};
use crate::metrics::r2_score;
use crate::observe::{TracingObserver, TrainingObserver};
use crate::persist::{load_artifact, save_artifact, ModelArtifact};
use crate::registry::{default_roster, Candidate};
use ndarray::Array2;
use std::path::PathBuf;

/// Trainer configuration
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Where the winning model artifact is written
    pub artifact_path: PathBuf,
    /// Minimum acceptable held-out R²
    pub score_threshold: f64,
    /// Candidates, in tie-break order
    pub roster: Vec<Candidate>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("artifact/model.bin"),
            score_threshold: 0.6,
            roster: default_roster(),
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_roster(mut self, roster: Vec<Candidate>) -> Self {
        self.roster = roster;
        self
    }
}

/// Fits every candidate and persists the best one
pub struct ModelTrainer {
    config: TrainerConfig,
    observer: Box<dyn TrainingObserver>,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            observer: Box::new(TracingObserver),
        }
    }

    /// Replace the default tracing-backed observer.
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run selection over the roster.
    ///
    /// `train` and `test` are 2-D arrays whose last column is the target and
    /// whose remaining columns are features. On success the winning model has
    /// been written to the artifact path and the returned value is its R² on
    /// the test features, recomputed from the reloaded artifact. If no
    /// candidate reaches the threshold, nothing is written and
    /// [`RegforgeError::NoAdequateModel`] is returned.
    pub fn train(&self, train: &Array2<f64>, test: &Array2<f64>) -> Result<f64> {
        self.observer
            .record("Splitting train and test matrices into features and target");

        validate_matrix_pair(train, test)?;
        let (x_train, y_train) = split_features_target(train);
        let (x_test, y_test) = split_features_target(test);

        let evaluations = evaluate_models(
            &self.config.roster,
            &x_train,
            &y_train,
            &x_test,
            &y_test,
        )?;

        let best = best_evaluation(&evaluations).ok_or_else(|| {
            RegforgeError::InvalidInput("candidate roster is empty".to_string())
        })?;

        // NaN never clears the threshold
        let best_score = best.score();
        if !(best_score >= self.config.score_threshold) {
            return Err(RegforgeError::NoAdequateModel {
                best_name: best.name.clone(),
                best_score,
                threshold: self.config.score_threshold,
            });
        }

        self.observer.record(&format!(
            "Selected model {} (test R2 = {:.4})",
            best.name, best_score
        ));

        let artifact = ModelArtifact::new(best.name.clone(), best_score, best.model.clone());
        save_artifact(&artifact, &self.config.artifact_path)?;

        let reloaded = load_artifact(&self.config.artifact_path)?;
        let predictions = reloaded.model.predict(&x_test)?;
        Ok(r2_score(&y_test, &predictions))
    }
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinearRegressionConfig;
    use crate::observe::BufferingObserver;
    use crate::registry::EstimatorSpec;
    use ndarray::array;
    use std::sync::Arc;

    fn linear_only_roster() -> Vec<Candidate> {
        vec![Candidate::new(
            "Linear Regression",
            EstimatorSpec::LinearRegression(LinearRegressionConfig::default()),
        )]
    }

    #[test]
    fn test_config_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.artifact_path, PathBuf::from("artifact/model.bin"));
        assert!((config.score_threshold - 0.6).abs() < 1e-12);
        assert_eq!(config.roster.len(), 8);
    }

    #[test]
    fn test_config_builders() {
        let config = TrainerConfig::new()
            .with_artifact_path("out/winner.bin")
            .with_score_threshold(0.8)
            .with_roster(linear_only_roster());

        assert_eq!(config.artifact_path, PathBuf::from("out/winner.bin"));
        assert!((config.score_threshold - 0.8).abs() < 1e-12);
        assert_eq!(config.roster.len(), 1);
    }

    #[test]
    fn test_empty_roster_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(
            TrainerConfig::new()
                .with_artifact_path(dir.path().join("model.bin"))
                .with_roster(Vec::new()),
        );

        let train = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let test = array![[4.0, 8.0]];
        assert!(matches!(
            trainer.train(&train, &test),
            Err(RegforgeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_success_records_two_messages() {
        let dir = tempfile::tempdir().unwrap();
        let observer = Arc::new(BufferingObserver::new());
        let trainer = ModelTrainer::new(
            TrainerConfig::new()
                .with_artifact_path(dir.path().join("model.bin"))
                .with_roster(linear_only_roster()),
        )
        .with_observer(Box::new(Arc::clone(&observer)));

        let train = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let test = array![[5.0, 10.0], [6.0, 12.0]];
        let score = trainer.train(&train, &test).unwrap();
        assert!(score > 0.99);

        let messages = observer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("Splitting"));
        assert!(messages[1].contains("Linear Regression"));
    }

    #[test]
    fn test_below_threshold_fails_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let observer = Arc::new(BufferingObserver::new());
        let trainer = ModelTrainer::new(
            TrainerConfig::new()
                .with_artifact_path(path.clone())
                .with_roster(linear_only_roster()),
        )
        .with_observer(Box::new(Arc::clone(&observer)));

        // Alternating targets leave OLS with nothing to extrapolate from
        let train = array![
            [1.0, 1.0],
            [2.0, -1.0],
            [3.0, 1.0],
            [4.0, -1.0],
            [5.0, 1.0],
            [6.0, -1.0]
        ];
        let test = array![[7.0, 10.0], [8.0, -10.0]];

        let result = trainer.train(&train, &test);
        match result {
            Err(RegforgeError::NoAdequateModel {
                best_name,
                best_score,
                threshold,
            }) => {
                assert_eq!(best_name, "Linear Regression");
                assert!(best_score < 0.6);
                assert!((threshold - 0.6).abs() < 1e-12);
            }
            other => panic!("expected NoAdequateModel, got {:?}", other),
        }

        assert!(!path.exists());
        // Only the splitting message; the selection message never fires
        assert_eq!(observer.messages().len(), 1);
    }

    #[test]
    fn test_malformed_input_rejected_before_fitting() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(
            TrainerConfig::new()
                .with_artifact_path(dir.path().join("model.bin"))
                .with_roster(linear_only_roster()),
        );

        // Width mismatch
        let train = array![[1.0, 2.0, 3.0]];
        let test = array![[1.0, 2.0]];
        assert!(matches!(
            trainer.train(&train, &test),
            Err(RegforgeError::InvalidInput(_))
        ));
    }
}
