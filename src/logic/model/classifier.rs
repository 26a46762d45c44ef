//! Classifier Capability
//!
//! fit / predict / score over byte-feature matrices. Inputs are raw byte
//! values (0-255); every classifier rescales to [0, 1] internally.

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::ClassifierKind;
use super::forest::RandomForest;
use super::logit::LogisticRegression;
use super::svc::LinearSvc;

/// Byte value -> [0, 1]
pub(crate) const BYTE_SCALE: f32 = 1.0 / 255.0;

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

pub trait Classifier {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<usize>, n_classes: usize) -> SamplerResult<()>;

    fn predict(&self, x: ArrayView2<f32>) -> SamplerResult<Vec<usize>>;

    /// Accuracy on (x, y)
    fn score(&self, x: &Array2<f32>, y: &Array1<usize>) -> SamplerResult<f64> {
        if y.is_empty() {
            return Err(SamplerError::Training("cannot score on an empty test partition".into()));
        }
        let predicted = self.predict(x.view())?;
        let correct = predicted.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }
}

/// Shared input checks for `fit`
pub(crate) fn check_fit_input(
    x: &Array2<f32>,
    y: &Array1<usize>,
    n_classes: usize,
) -> SamplerResult<()> {
    if x.nrows() == 0 {
        return Err(SamplerError::Training("empty training partition".into()));
    }
    if x.nrows() != y.len() {
        return Err(SamplerError::Training(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|&&c| c >= n_classes) {
        return Err(SamplerError::Training(format!(
            "class id {} out of range for {} classes",
            bad, n_classes
        )));
    }
    Ok(())
}

/// Shared input checks for `predict`
pub(crate) fn check_predict_input(x: &ArrayView2<f32>, n_features: usize) -> SamplerResult<()> {
    if n_features == 0 {
        return Err(SamplerError::Training("model has not been fitted".into()));
    }
    if x.ncols() != n_features {
        return Err(SamplerError::FeatureMismatch { expected: n_features, actual: x.ncols() });
    }
    Ok(())
}

/// Index of the largest score; ties go to the lowest index
pub(crate) fn argmax(scores: impl IntoIterator<Item = f32>) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, s) in scores.into_iter().enumerate() {
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

// ============================================================================
// TRAINED MODEL
// ============================================================================

/// One of the fixed-hyperparameter classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrainedModel {
    Svc(LinearSvc),
    Logit(LogisticRegression),
    Rf(RandomForest),
}

impl TrainedModel {
    /// Unfitted classifier of `kind`
    pub fn new(kind: ClassifierKind, seed: Option<u64>) -> Self {
        match kind {
            ClassifierKind::Svc => TrainedModel::Svc(LinearSvc::new(seed)),
            ClassifierKind::Logit => TrainedModel::Logit(LogisticRegression::new()),
            ClassifierKind::Rf => TrainedModel::Rf(RandomForest::new(seed)),
        }
    }

    pub fn kind(&self) -> ClassifierKind {
        match self {
            TrainedModel::Svc(_) => ClassifierKind::Svc,
            TrainedModel::Logit(_) => ClassifierKind::Logit,
            TrainedModel::Rf(_) => ClassifierKind::Rf,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            TrainedModel::Svc(m) => m.n_features(),
            TrainedModel::Logit(m) => m.n_features(),
            TrainedModel::Rf(m) => m.n_features(),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedModel::Svc(m) => m,
            TrainedModel::Logit(m) => m,
            TrainedModel::Rf(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedModel::Svc(m) => m,
            TrainedModel::Logit(m) => m,
            TrainedModel::Rf(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<usize>, n_classes: usize) -> SamplerResult<()> {
        self.inner_mut().fit(x, y, n_classes)
    }

    fn predict(&self, x: ArrayView2<f32>) -> SamplerResult<Vec<usize>> {
        self.inner().predict(x)
    }
}
