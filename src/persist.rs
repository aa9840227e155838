//! Winner persistence
//!
//! The selected model is wrapped in an artifact carrying its name, score
//! and training timestamp, then written with bincode. Parent directories
//! are created on demand, and an existing artifact is overwritten.

use crate::error::Result;
use crate::models::Estimator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// On-disk form of a selection winner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_name: String,
    pub trained_at: DateTime<Utc>,
    /// Held-out R² at selection time
    pub test_score: f64,
    pub model: Estimator,
}

impl ModelArtifact {
    pub fn new(model_name: impl Into<String>, test_score: f64, model: Estimator) -> Self {
        Self {
            model_name: model_name.into(),
            trained_at: Utc::now(),
            test_score,
            model,
        }
    }
}

/// Write an artifact to `path`, creating parent directories as needed.
pub fn save_artifact(artifact: &ModelArtifact, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = bincode::serialize(artifact)?;
    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Read an artifact back from disk.
pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bincode::deserialize(&bytes)?)
}
