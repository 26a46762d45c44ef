//! Experiment Loop
//!
//! Read the label table once, then for each trial: train, score, save the
//! model (same path every trial), append a record, reshuffle. Any fit or
//! score error aborts the remaining trials; records already written stay.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::SamplerResult;
use crate::logic::config::{info_path_for, SamplerConfig};
use crate::logic::dataset::NaiveTruthReader;
use crate::logic::features::{build_extractor, FeatureLayout};
use super::record::{TrialLog, TrialRecord};
use super::trainer::ModelTrainer;

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub run_id: Uuid,
    pub model_path: PathBuf,
    pub info_path: PathBuf,
    pub class_table_path: PathBuf,
    pub examples: usize,
    pub skipped_rows: usize,
    pub classes: Vec<String>,
    pub trials: Vec<TrialRecord>,
}

impl ExperimentSummary {
    pub fn mean_accuracy(&self) -> f64 {
        if self.trials.is_empty() {
            return 0.0;
        }
        self.trials.iter().map(|t| t.accuracy).sum::<f64>() / self.trials.len() as f64
    }
}

/// Full training run as configured
pub fn run_experiment(config: &SamplerConfig) -> SamplerResult<ExperimentSummary> {
    config.validate()?;

    let layout = FeatureLayout::new(config.feature, config.head_bytes, config.rand_bytes);
    let extractor = build_extractor(&layout, config.seed);

    let read_start = Instant::now();
    let dataset = NaiveTruthReader::new(extractor.as_ref(), &config.label_csv).run()?;
    let read_time = read_start.elapsed().as_secs_f64();

    let examples = dataset.len();
    let skipped_rows = dataset.skipped_count();

    let mut trainer = ModelTrainer::new(
        dataset,
        config.classifier,
        config.split,
        &config.class_table_path,
        config.seed,
    )?;

    let model_path = config.resolved_model_path();
    let log = TrialLog::new(info_path_for(&model_path));
    let run_id = Uuid::new_v4();

    let trials = run_trials(&mut trainer, config.trials, &model_path, &log, read_time, run_id)?;

    Ok(ExperimentSummary {
        run_id,
        model_path,
        info_path: log.path().to_path_buf(),
        class_table_path: config.class_table_path.clone(),
        examples,
        skipped_rows,
        classes: trainer.classes().labels().to_vec(),
        trials,
    })
}

/// Run `trials` train/score/save rounds on an existing trainer
pub fn run_trials(
    trainer: &mut ModelTrainer,
    trials: usize,
    model_path: &Path,
    log: &TrialLog,
    read_time: f64,
    run_id: Uuid,
) -> SamplerResult<Vec<TrialRecord>> {
    let mut records = Vec::with_capacity(trials);

    for trial in 0..trials {
        log::info!(
            "Starting trial {} out of {} for {} {}",
            trial + 1,
            trials,
            trainer.kind(),
            trainer.layout().kind
        );

        let start = Instant::now();
        trainer.train()?;
        let accuracy = trainer.score()?;
        let train_test_time = start.elapsed().as_secs_f64();

        let model_size = trainer.save_model(model_path)?;
        log::info!(
            "Trial {}: accuracy {:.4}, {:.2}s, model {} ({} bytes)",
            trial,
            accuracy,
            train_test_time,
            model_path.display(),
            model_size
        );

        let record = TrialRecord {
            classifier: trainer.kind(),
            feature: trainer.layout().kind,
            trial,
            read_time,
            train_test_time,
            accuracy,
            model_size,
            run_id,
            timestamp: Utc::now(),
        };
        log.append(&record)?;
        records.push(record);

        if trial + 1 < trials {
            trainer.shuffle(None)?;
        }
    }

    Ok(records)
}
