//! regforge - regression model selection over native estimators
//!
//! Fits a roster of regression models on a training split, scores each on a
//! held-out split, persists the best scorer, and reports its held-out R².
//! The roster, acceptance threshold, artifact path, and logging sink are all
//! injectable; the defaults give a fixed eight-model lineup with seeded
//! stochastic estimators.
//!
//! # Modules
//!
//! - [`trainer`] - Selection loop: split, fit, score, threshold, persist
//! - [`registry`] - Candidate roster and buildable estimator descriptions
//! - [`models`] - Native regression estimators (trees, forests, boosters, OLS, k-NN)
//! - [`evaluate`] - Candidate fitting and scoring
//! - [`persist`] - Winner artifact serialization
//! - [`observe`] - Injected logging capability
//! - [`metrics`] - Regression metrics
//! - [`data`] - Feature/target splitting and validation

// Core error handling
pub mod error;

// Selection pipeline
pub mod data;
pub mod evaluate;
pub mod registry;
pub mod trainer;

// Estimators and scoring
pub mod metrics;
pub mod models;

// Ambient capabilities
pub mod observe;
pub mod persist;

pub use error::{RegforgeError, Result};
pub use trainer::{ModelTrainer, TrainerConfig};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{RegforgeError, Result};
    pub use crate::evaluate::{best_evaluation, evaluate_models, Evaluation};
    pub use crate::metrics::{r2_score, RegressionMetrics};
    pub use crate::models::Estimator;
    pub use crate::observe::{BufferingObserver, TracingObserver, TrainingObserver};
    pub use crate::persist::{load_artifact, save_artifact, ModelArtifact};
    pub use crate::registry::{default_roster, Candidate, EstimatorSpec};
    pub use crate::trainer::{ModelTrainer, TrainerConfig};
}
