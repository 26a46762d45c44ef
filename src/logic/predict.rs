//! Prediction Engine
//!
//! Loads a saved model, checks the requested feature layout against the one
//! it was trained with, and labels a single file or every file under a
//! directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::Serialize;

use crate::error::{SamplerError, SamplerResult};
use crate::logic::crawler::crawl;
use crate::logic::features::{build_extractor, FeatureExtractor, FeatureLayout};
use crate::logic::model::{Classifier, SavedModel};

/// Labels for a directory; files that could not be read are counted
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryPrediction {
    pub labels: BTreeMap<String, String>,
    pub failed: Vec<PathBuf>,
}

pub struct Predictor {
    saved: SavedModel,
    extractor: Box<dyn FeatureExtractor>,
}

impl Predictor {
    /// Load `model_path`; a missing or corrupt model is fatal
    pub fn load(model_path: &Path, layout: FeatureLayout, seed: Option<u64>) -> SamplerResult<Self> {
        let saved = SavedModel::load(model_path)?;
        saved.layout.check_compatible(&layout)?;
        log::info!(
            "Loaded {} model {} (trained {}, layout {}, {} classes)",
            saved.model.kind(),
            model_path.display(),
            saved.trained_at.format("%Y-%m-%d %H:%M:%S"),
            saved.layout,
            saved.classes.len()
        );
        Ok(Self { saved, extractor: build_extractor(&layout, seed) })
    }

    /// Label for one file
    pub fn predict_path(&self, path: &Path) -> SamplerResult<String> {
        let features = self.extractor.extract(path).map_err(|e| SamplerError::io(path, e))?;
        let n = features.len();
        let x = Array2::from_shape_vec((1, n), features.values)
            .map_err(|e| SamplerError::Training(format!("feature matrix: {}", e)))?;

        let ids = self.saved.model.predict(x.view())?;
        let id = ids
            .first()
            .copied()
            .ok_or_else(|| SamplerError::Training("model returned no prediction".into()))?;
        self.label_for(id)
    }

    /// Labels for every crawled file; unreadable files are skipped and counted
    pub fn predict_dir(&self, dir: &Path) -> SamplerResult<DirectoryPrediction> {
        let paths = crawl(dir)?;
        let mut result = DirectoryPrediction::default();
        if paths.is_empty() {
            log::info!("No files under {}", dir.display());
            return Ok(result);
        }

        let n = self.extractor.nfeatures();
        let mut rows = Vec::with_capacity(paths.len());
        let mut flat = Vec::with_capacity(paths.len() * n);
        for path in paths {
            match self.extractor.extract(&path) {
                Ok(features) => {
                    flat.extend_from_slice(features.as_slice());
                    rows.push(path);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    result.failed.push(path);
                }
            }
        }

        if !rows.is_empty() {
            let x = Array2::from_shape_vec((rows.len(), n), flat)
                .map_err(|e| SamplerError::Training(format!("feature matrix: {}", e)))?;
            let ids = self.saved.model.predict(x.view())?;
            for (path, id) in rows.into_iter().zip(ids) {
                result.labels.insert(path.display().to_string(), self.label_for(id)?);
            }
        }

        log::info!(
            "Predicted {} files under {} ({} skipped)",
            result.labels.len(),
            dir.display(),
            result.failed.len()
        );
        Ok(result)
    }

    fn label_for(&self, id: usize) -> SamplerResult<String> {
        self.saved
            .classes
            .label(id)
            .map(str::to_string)
            .ok_or_else(|| SamplerError::ClassTable(format!("class id {} has no label", id)))
    }
}

/// Predict the label of one file
pub fn predict_single_file(
    path: &Path,
    model_path: &Path,
    layout: FeatureLayout,
    seed: Option<u64>,
) -> SamplerResult<String> {
    Predictor::load(model_path, layout, seed)?.predict_path(path)
}

/// Predict a label for every file under `dir`
pub fn predict_directory(
    dir: &Path,
    model_path: &Path,
    layout: FeatureLayout,
    seed: Option<u64>,
) -> SamplerResult<DirectoryPrediction> {
    Predictor::load(model_path, layout, seed)?.predict_dir(dir)
}
