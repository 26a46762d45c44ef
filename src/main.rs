//! File Sampler - Main Entry Point
//!
//! Modes (exactly one per invocation):
//! - `file-sampler label <ROOT>` - crawl and weak-label a corpus
//! - `file-sampler --classifier rf --feature head` - train
//! - `file-sampler --predict_file <FILE>` - label one file
//! - `file-sampler --dirname <DIR>` - label every file under a directory

mod api;
mod constants;
mod error;
mod logic;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use error::{SamplerError, SamplerResult};
use logic::config::{ClassifierKind, FeatureKind, SamplerConfig};

#[derive(Parser)]
#[command(name = "file-sampler")]
#[command(about = "Byte-sampling file type classifier")]
#[command(version)]
struct Cli {
    /// Classifier to train: svc, logit, rf
    #[arg(long)]
    classifier: Option<String>,

    /// Feature to sample: head, rand, randhead
    #[arg(long)]
    feature: Option<String>,

    /// Number of trials
    #[arg(long)]
    n: Option<usize>,

    /// Fraction of examples used for training
    #[arg(long)]
    split: Option<f64>,

    /// Size of the file head in bytes
    #[arg(long = "head_bytes")]
    head_bytes: Option<usize>,

    /// Number of random bytes
    #[arg(long = "rand_bytes")]
    rand_bytes: Option<usize>,

    /// File to predict with a trained model
    #[arg(long = "predict_file", conflicts_with = "dirname")]
    predict_file: Option<PathBuf>,

    /// Directory of files to predict
    #[arg(long)]
    dirname: Option<PathBuf>,

    /// Trained model used for prediction
    #[arg(long = "trained_classifier")]
    trained_classifier: Option<PathBuf>,

    /// Where prediction results are written
    #[arg(long = "results_file")]
    results_file: Option<PathBuf>,

    /// Label table produced by `label`
    #[arg(long = "label_csv")]
    label_csv: Option<PathBuf>,

    /// Output path for the trained model
    #[arg(long = "model_name")]
    model_name: Option<PathBuf>,

    /// Class table output path
    #[arg(long = "class_table")]
    class_table: Option<PathBuf>,

    /// Seed for shuffling, random-byte sampling and classifiers
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl a directory and write a weak-label table
    Label {
        /// Root of the corpus
        root: PathBuf,

        /// Label table path (default: --label_csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Label files one at a time
        #[arg(long)]
        sequential: bool,

        /// Per-probe timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    log::debug!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<SamplerError>()
                .map(|s| s.category().exit_code())
                .unwrap_or(1);
            let category = e
                .downcast_ref::<SamplerError>()
                .map(|s| s.category().as_str())
                .unwrap_or("internal");
            eprintln!("error [{}]: {:#}", category, e);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = build_config(&cli)?;

    match cli.command {
        Some(Command::Label { root, output, .. }) => {
            let output = output.unwrap_or_else(|| config.label_csv.clone());
            let summary = api::label_corpus(&root, &output, &config)
                .with_context(|| format!("labeling {}", root.display()))?;
            print_json(&summary)
        }
        None => match (&cli.predict_file, &cli.dirname) {
            (Some(path), _) => print_json(&api::predict_file(&config, path)?),
            (None, Some(dir)) => print_json(&api::predict_dir(&config, dir)?),
            (None, None) => {
                if cli.classifier.is_none() {
                    return Err(SamplerError::Configuration(
                        "--classifier is required for training (svc, logit or rf)".into(),
                    )
                    .into());
                }
                print_json(&api::train(&config)?)
            }
        },
    }
}

/// `label` runs on its own; prediction flags next to it are a usage error
fn check_mode(cli: &Cli) -> SamplerResult<()> {
    if cli.command.is_some() && (cli.predict_file.is_some() || cli.dirname.is_some()) {
        return Err(SamplerError::Configuration(
            "label cannot be combined with --predict_file or --dirname".into(),
        ));
    }
    Ok(())
}

/// Environment first, then CLI flags on top
fn build_config(cli: &Cli) -> SamplerResult<SamplerConfig> {
    check_mode(cli)?;
    let mut config = SamplerConfig::from_env();

    if let Some(classifier) = &cli.classifier {
        config.classifier = classifier.parse::<ClassifierKind>()?;
    }
    if let Some(feature) = &cli.feature {
        config.feature = feature.parse::<FeatureKind>()?;
    }
    if let Some(n) = cli.n {
        config.trials = n;
    }
    if let Some(split) = cli.split {
        config.split = split;
    }
    if let Some(head_bytes) = cli.head_bytes {
        config.head_bytes = head_bytes;
    }
    if let Some(rand_bytes) = cli.rand_bytes {
        config.rand_bytes = rand_bytes;
    }
    if let Some(path) = &cli.trained_classifier {
        config.trained_model = path.clone();
    }
    if let Some(path) = &cli.results_file {
        config.results_file = path.clone();
    }
    if let Some(path) = &cli.label_csv {
        config.label_csv = path.clone();
    }
    if let Some(path) = &cli.model_name {
        config.model_path = Some(path.clone());
    }
    if let Some(path) = &cli.class_table {
        config.class_table_path = path.clone();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(Command::Label { sequential, timeout, .. }) = &cli.command {
        if *sequential {
            config.parallel = false;
        }
        if let Some(secs) = timeout {
            config.probe_timeout = (*secs > 0).then(|| std::time::Duration::from_secs(*secs));
        }
    }

    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing summary")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_rejects_prediction_flags() {
        for flag in ["--predict_file", "--dirname"] {
            let cli = Cli::try_parse_from(["file-sampler", flag, "/tmp/x", "label", "/data"]).unwrap();
            let err = check_mode(&cli).unwrap_err();
            assert!(matches!(err, SamplerError::Configuration(_)));
            assert!(build_config(&cli).is_err());
        }
    }

    #[test]
    fn test_modes_on_their_own_are_accepted() {
        let label = Cli::try_parse_from(["file-sampler", "label", "/data", "--sequential"]).unwrap();
        assert!(check_mode(&label).is_ok());

        let predict = Cli::try_parse_from(["file-sampler", "--predict_file", "/tmp/x"]).unwrap();
        assert!(check_mode(&predict).is_ok());

        assert!(Cli::try_parse_from(["file-sampler", "--predict_file", "a", "--dirname", "b"]).is_err());
    }
}
