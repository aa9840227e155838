//! Candidate roster for model selection
//!
//! A roster entry pairs a display name with the configuration needed to
//! build a fresh estimator of that kind. Selection walks the roster in
//! order, so the default roster's ordering is part of its contract: a
//! score tie resolves toward the earlier entry.

use crate::models::{
    AdaBoostConfig, AdaBoostRegressor, CatBoostConfig, CatBoostRegressor, DecisionTree,
    DecisionTreeConfig, Estimator, GradientBoostingConfig, GradientBoostingRegressor, KNNConfig,
    KNNRegressor, LinearRegression, LinearRegressionConfig, RandomForest, RandomForestConfig,
    XGBoostConfig, XGBoostRegressor,
};
use serde::{Deserialize, Serialize};

/// Buildable description of one estimator kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EstimatorSpec {
    RandomForest(RandomForestConfig),
    DecisionTree(DecisionTreeConfig),
    GradientBoosting(GradientBoostingConfig),
    LinearRegression(LinearRegressionConfig),
    KNeighbors(KNNConfig),
    XGBoost(XGBoostConfig),
    CatBoost(CatBoostConfig),
    AdaBoost(AdaBoostConfig),
}

impl EstimatorSpec {
    /// Build a fresh, unfitted estimator from this description.
    pub fn build(&self) -> Estimator {
        match self {
            EstimatorSpec::RandomForest(c) => {
                Estimator::RandomForest(RandomForest::new(c.clone()))
            }
            EstimatorSpec::DecisionTree(c) => {
                Estimator::DecisionTree(DecisionTree::new(c.clone()))
            }
            EstimatorSpec::GradientBoosting(c) => {
                Estimator::GradientBoosting(GradientBoostingRegressor::new(c.clone()))
            }
            EstimatorSpec::LinearRegression(c) => {
                Estimator::LinearRegression(LinearRegression::new(c.clone()))
            }
            EstimatorSpec::KNeighbors(c) => Estimator::KNeighbors(KNNRegressor::new(c.clone())),
            EstimatorSpec::XGBoost(c) => Estimator::XGBoost(XGBoostRegressor::new(c.clone())),
            EstimatorSpec::CatBoost(c) => Estimator::CatBoost(CatBoostRegressor::new(c.clone())),
            EstimatorSpec::AdaBoost(c) => Estimator::AdaBoost(AdaBoostRegressor::new(c.clone())),
        }
    }
}

/// Named candidate in the selection roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub spec: EstimatorSpec,
}

impl Candidate {
    pub fn new(name: impl Into<String>, spec: EstimatorSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// The default roster, in selection order.
pub fn default_roster() -> Vec<Candidate> {
    vec![
        Candidate::new(
            "Random Forest",
            EstimatorSpec::RandomForest(RandomForestConfig::default()),
        ),
        Candidate::new(
            "Decision Tree",
            EstimatorSpec::DecisionTree(DecisionTreeConfig::default()),
        ),
        Candidate::new(
            "Gradient Boosting",
            EstimatorSpec::GradientBoosting(GradientBoostingConfig::default()),
        ),
        Candidate::new(
            "Linear Regression",
            EstimatorSpec::LinearRegression(LinearRegressionConfig::default()),
        ),
        Candidate::new(
            "K-Neighbors Regressor",
            EstimatorSpec::KNeighbors(KNNConfig::default()),
        ),
        Candidate::new("XGBoost", EstimatorSpec::XGBoost(XGBoostConfig::default())),
        Candidate::new("CatBoost", EstimatorSpec::CatBoost(CatBoostConfig::default())),
        Candidate::new("AdaBoost", EstimatorSpec::AdaBoost(AdaBoostConfig::default())),
    ]
}
