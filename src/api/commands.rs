//! Commands - mode entry points used by `main`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::SamplerConfig;
use crate::logic::crawler::SystemReader;
use crate::logic::features::FeatureLayout;
use crate::logic::labeling::{write_label_table, WeakLabelOracle};
use crate::logic::predict::{predict_directory, predict_single_file, DirectoryPrediction};
use crate::logic::training::{run_experiment, ExperimentSummary};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Outcome of a labeling run
#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub root: PathBuf,
    pub output: PathBuf,
    pub files: usize,
    /// Rows left out of the table because the path is not UTF-8
    pub rejected_paths: usize,
    /// label -> file count
    pub distribution: BTreeMap<String, usize>,
    pub probes: Vec<&'static str>,
    pub elapsed_secs: f64,
}

/// Outcome of a single-file prediction
#[derive(Debug, Clone, Serialize)]
pub struct FilePrediction {
    pub path: PathBuf,
    pub label: String,
    pub results_file: PathBuf,
}

/// Outcome of a directory prediction
#[derive(Debug, Clone, Serialize)]
pub struct DirPrediction {
    pub dir: PathBuf,
    pub predicted: usize,
    pub skipped: usize,
    pub results_file: PathBuf,
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Crawl `root`, run the weak-label cascade over every file and write the
/// label table to `output`
pub fn label_corpus(root: &Path, output: &Path, config: &SamplerConfig) -> SamplerResult<LabelSummary> {
    let start = Instant::now();
    let entries = SystemReader::new(root)?.run()?;
    log::info!("There are {} files to be processed", entries.len());

    let oracle = WeakLabelOracle::with_default_probes().with_timeout(config.probe_timeout);
    let rows = oracle.label_corpus(&entries, config.parallel);
    let rejected_paths = write_label_table(output, &rows)?;

    let mut distribution = BTreeMap::new();
    for row in rows.iter().filter(|r| r.path.to_str().is_some()) {
        *distribution.entry(row.label.to_string()).or_insert(0) += 1;
    }
    let files = rows.len() - rejected_paths;

    let elapsed_secs = start.elapsed().as_secs_f64();
    log::info!(
        "Labeled {} files in {:.2}s, table written to {}",
        files,
        elapsed_secs,
        output.display()
    );

    Ok(LabelSummary {
        root: root.to_path_buf(),
        output: output.to_path_buf(),
        files,
        rejected_paths,
        distribution,
        probes: oracle.probe_names(),
        elapsed_secs,
    })
}

/// Train and evaluate `config.trials` models
pub fn train(config: &SamplerConfig) -> SamplerResult<ExperimentSummary> {
    let summary = run_experiment(config)?;
    log::info!(
        "Finished {} trial(s), mean accuracy {:.4}, model at {}",
        summary.trials.len(),
        summary.mean_accuracy(),
        summary.model_path.display()
    );
    Ok(summary)
}

/// Predict one file with `config.trained_model`, writing the label to the
/// results file as a JSON string
pub fn predict_file(config: &SamplerConfig, path: &Path) -> SamplerResult<FilePrediction> {
    config.validate()?;
    let label = predict_single_file(path, &config.trained_model, layout_of(config), config.seed)?;
    write_results(&config.results_file, &label)?;
    log::info!("{} -> {}", path.display(), label);

    Ok(FilePrediction {
        path: path.to_path_buf(),
        label,
        results_file: config.results_file.clone(),
    })
}

/// Predict every file under `dir`, writing a path -> label object to the
/// results file
pub fn predict_dir(config: &SamplerConfig, dir: &Path) -> SamplerResult<DirPrediction> {
    config.validate()?;
    let DirectoryPrediction { labels, failed } =
        predict_directory(dir, &config.trained_model, layout_of(config), config.seed)?;
    write_results(&config.results_file, &labels)?;

    Ok(DirPrediction {
        dir: dir.to_path_buf(),
        predicted: labels.len(),
        skipped: failed.len(),
        results_file: config.results_file.clone(),
    })
}

// ============================================================================
// HELPERS
// ============================================================================

fn layout_of(config: &SamplerConfig) -> FeatureLayout {
    FeatureLayout::new(config.feature, config.head_bytes, config.rand_bytes)
}

fn write_results<T: Serialize + ?Sized>(path: &Path, value: &T) -> SamplerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json).map_err(|e| SamplerError::io(path, e))
}

