//! Model Trainer
//!
//! Owns the shuffled train/test partition of one dataset, the frozen class
//! table and the most recently fitted classifier.

use std::path::Path;

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::ClassifierKind;
use crate::logic::dataset::{Dataset, TrainTestSplit};
use crate::logic::features::{ClassTable, FeatureLayout};
use crate::logic::model::{Classifier, SavedModel, TrainedModel};

#[derive(Debug)]
pub struct ModelTrainer {
    kind: ClassifierKind,
    layout: FeatureLayout,
    classes: ClassTable,
    data: TrainTestSplit,
    model: Option<TrainedModel>,
    seed: Option<u64>,
    fits: u64,
}

impl ModelTrainer {
    /// Shuffle and partition `dataset`, then persist its class table.
    /// An empty dataset is an `EmptyDataset` error.
    pub fn new(
        dataset: Dataset,
        kind: ClassifierKind,
        split: f64,
        class_table_path: &Path,
        seed: Option<u64>,
    ) -> SamplerResult<Self> {
        if dataset.is_empty() {
            return Err(SamplerError::EmptyDataset { skipped: dataset.skipped_count() });
        }

        let data = TrainTestSplit::new(&dataset.examples, dataset.layout.nfeatures(), split, seed)?;
        log::info!(
            "Partitioned {} examples at split {}: {} train, {} test",
            data.len(),
            data.split(),
            data.train_len(),
            data.test_len()
        );

        let mut classes = dataset.classes;
        classes.freeze();
        classes.save(class_table_path)?;

        Ok(Self {
            kind,
            layout: dataset.layout,
            classes,
            data,
            model: None,
            seed,
            fits: 0,
        })
    }

    /// Fit a fresh classifier on the training partition
    pub fn train(&mut self) -> SamplerResult<()> {
        // Each fit gets its own seed so trials differ but stay reproducible
        let seed = self.seed.map(|s| s.wrapping_add(self.fits));
        self.fits += 1;

        let mut model = TrainedModel::new(self.kind, seed);
        model.fit(&self.data.x_train, &self.data.y_train, self.classes.len())?;
        self.model = Some(model);
        Ok(())
    }

    /// Accuracy of the fitted model on the test partition
    pub fn score(&self) -> SamplerResult<f64> {
        let model = self.fitted()?;
        model.score(&self.data.x_test, &self.data.y_test)
    }

    /// Recombine and repartition; `None` reuses the construction ratio
    pub fn shuffle(&mut self, split: Option<f64>) -> SamplerResult<()> {
        self.data.shuffle(split)
    }

    /// Persist the fitted model with its layout and class table.
    /// Returns the file size in bytes.
    pub fn save_model(&self, path: &Path) -> SamplerResult<u64> {
        let model = self.fitted()?.clone();
        SavedModel::new(model, self.layout, self.classes.clone()).save(path)
    }

    fn fitted(&self) -> SamplerResult<&TrainedModel> {
        self.model
            .as_ref()
            .ok_or_else(|| SamplerError::Training("model has not been trained".into()))
    }

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn partition(&self) -> &TrainTestSplit {
        &self.data
    }
}
