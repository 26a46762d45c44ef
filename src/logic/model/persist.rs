//! Model Persistence
//!
//! A saved model is a JSON envelope:
//!
//! ```text
//! { format_version, classifier, layout, classes, trained_at, checksum, payload }
//! ```
//!
//! `payload` is the classifier's own JSON carried as a string, and `checksum`
//! is the SHA256 (hex) of exactly that string. Loading verifies the checksum,
//! the format version and that the payload agrees with the layout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::ClassifierKind;
use crate::logic::features::{ClassTable, FeatureLayout};
use super::classifier::TrainedModel;

/// Bump when the envelope shape changes
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    classifier: ClassifierKind,
    layout: FeatureLayout,
    classes: ClassTable,
    trained_at: DateTime<Utc>,
    checksum: String,
    payload: String,
}

/// A fitted classifier with everything needed to use it on new files
#[derive(Debug, Clone)]
pub struct SavedModel {
    pub model: TrainedModel,
    pub layout: FeatureLayout,
    pub classes: ClassTable,
    pub trained_at: DateTime<Utc>,
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

impl SavedModel {
    pub fn new(model: TrainedModel, layout: FeatureLayout, classes: ClassTable) -> Self {
        Self { model, layout, classes, trained_at: Utc::now() }
    }

    /// Write to `path`, replacing any previous model. Returns the file size.
    pub fn save(&self, path: &Path) -> SamplerResult<u64> {
        let payload = serde_json::to_string(&self.model)?;
        let envelope = ModelEnvelope {
            format_version: MODEL_FORMAT_VERSION,
            classifier: self.model.kind(),
            layout: self.layout,
            classes: self.classes.clone(),
            trained_at: self.trained_at,
            checksum: checksum(&payload),
            payload,
        };
        let bytes = serde_json::to_vec(&envelope)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
        }

        // Write then rename so a crash never leaves a half-written model
        let tmp = tmp_path(path);
        {
            let mut file = fs::File::create(&tmp).map_err(|e| SamplerError::io(&tmp, e))?;
            file.write_all(&bytes).map_err(|e| SamplerError::io(&tmp, e))?;
            file.sync_all().map_err(|e| SamplerError::io(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| SamplerError::io(path, e))?;

        log::debug!("Saved {} model to {} ({} bytes)", self.model.kind(), path.display(), bytes.len());
        Ok(bytes.len() as u64)
    }

    /// Read and verify a model. Every failure is a `ModelLoad` error.
    pub fn load(path: &Path) -> SamplerResult<Self> {
        let bytes = fs::read(path).map_err(|e| SamplerError::model_load(path, e.to_string()))?;
        let envelope: ModelEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| SamplerError::model_load(path, format!("not a model file: {}", e)))?;

        if envelope.format_version != MODEL_FORMAT_VERSION {
            return Err(SamplerError::model_load(
                path,
                format!(
                    "unsupported format version {} (expected {})",
                    envelope.format_version, MODEL_FORMAT_VERSION
                ),
            ));
        }
        if checksum(&envelope.payload) != envelope.checksum {
            return Err(SamplerError::model_load(path, "checksum mismatch"));
        }

        let model: TrainedModel = serde_json::from_str(&envelope.payload)
            .map_err(|e| SamplerError::model_load(path, format!("bad payload: {}", e)))?;
        if model.kind() != envelope.classifier {
            return Err(SamplerError::model_load(
                path,
                format!("payload is {} but envelope says {}", model.kind(), envelope.classifier),
            ));
        }
        if model.n_features() != envelope.layout.nfeatures() {
            return Err(SamplerError::model_load(
                path,
                format!(
                    "model has {} features but layout {} has {}",
                    model.n_features(),
                    envelope.layout,
                    envelope.layout.nfeatures()
                ),
            ));
        }

        let mut classes = envelope.classes;
        classes.freeze();
        Ok(Self { model, layout: envelope.layout, classes, trained_at: envelope.trained_at })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
