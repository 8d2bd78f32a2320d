//! Model artifact persistence.
//!
//! One JSON file holds the fitted scaler and forest plus metadata. Writes go
//! through a temp file and an atomic rename, so a concurrent reader observes
//! either the previous artifact or the new one, never a torn file. Parallel
//! training runs race wholesale: last writer wins.

use crate::forest::RandomForest;
use crate::models::{FlexionError, Result};
use crate::pipeline::StandardScaler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Artifact file name inside the model directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

/// The serialized result of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact format version
    pub format_version: u32,
    /// When training finished
    pub trained_at: DateTime<Utc>,
    /// Fitted feature scaler
    pub scaler: StandardScaler,
    /// Fitted ensemble
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Bundle a freshly fitted scaler and forest.
    pub fn new(scaler: StandardScaler, forest: RandomForest) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            trained_at: Utc::now(),
            scaler,
            forest,
        }
    }
}

/// Reads and writes the model artifact under a directory.
pub struct ArtifactStore {
    dir: PathBuf,
    model_path: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`. Nothing touches the filesystem until
    /// the first save.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            model_path: dir.join(MODEL_FILE_NAME),
        }
    }

    /// Path the artifact lives at.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Whether an artifact exists.
    pub fn exists(&self) -> bool {
        self.model_path.exists()
    }

    /// Save the artifact (atomic write), returning the final path.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| FlexionError::io("creating model dir", e))?;

        let temp_path = self.dir.join("model.tmp.json");
        let file =
            File::create(&temp_path).map_err(|e| FlexionError::io("creating temp artifact", e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, artifact)
            .map_err(|e| FlexionError::Internal(format!("Serializing artifact: {e}")))?;

        fs::rename(&temp_path, &self.model_path)
            .map_err(|e| FlexionError::io("renaming artifact", e))?;

        debug!(path = %self.model_path.display(), "Artifact saved");
        Ok(self.model_path.clone())
    }

    /// Load the artifact, checking the format version.
    pub fn load(&self) -> Result<ModelArtifact> {
        let file =
            File::open(&self.model_path).map_err(|e| FlexionError::io("opening artifact", e))?;
        let reader = BufReader::new(file);
        let artifact: ModelArtifact = serde_json::from_reader(reader)
            .map_err(|e| FlexionError::ParseError(format!("Invalid artifact: {e}")))?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(FlexionError::ParseError(format!(
                "Unsupported artifact format version {} (expected {FORMAT_VERSION})",
                artifact.format_version
            )));
        }
        Ok(artifact)
    }
}
