//! Feature Vector - Core data structure for ML input
//!
//! A fixed-length vector of byte values (0-255 as f32). Length is set by the
//! extractor's layout; short files are zero-padded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use crate::logic::labeling::WeakLabel;
use super::class_table::ClassTable;
use super::layout::FeatureLayout;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
}

impl FeatureVector {
    /// Bytes as features, zero-padded (or truncated) to `len`
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let mut values: Vec<f32> = bytes.iter().take(len).map(|&b| b as f32).collect();
        values.resize(len, 0.0);
        Self { values }
    }

    /// Concatenate two vectors
    pub fn concat(mut self, other: FeatureVector) -> Self {
        self.values.extend(other.values);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// A feature vector with its class id
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    pub class_id: usize,
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for byte-sampling feature extractors
pub trait FeatureExtractor: Send + Sync {
    fn layout(&self) -> FeatureLayout;

    /// Declared vector length
    fn nfeatures(&self) -> usize {
        self.layout().nfeatures()
    }

    /// Sample a file into a vector of exactly `nfeatures()` values
    fn extract(&self, path: &Path) -> std::io::Result<FeatureVector>;

    /// Turn a weak label into a training example. The class id is resolved
    /// only after the file was read, so unreadable rows never add a class.
    fn translate(&self, row: &WeakLabel, classes: &mut ClassTable) -> SamplerResult<LabeledExample> {
        let features = self
            .extract(&row.path)
            .map_err(|e| SamplerError::io(&row.path, e))?;
        let class_id = classes.resolve(row.label.as_str())?;
        Ok(LabeledExample { features, class_id })
    }
}
