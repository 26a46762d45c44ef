//! Training Module - Trainer & Experiment Loop
//!
//! - `trainer`: owns the train/test partition and the fitted model
//! - `experiment`: repeated trials with reshuffling in between
//! - `record`: one JSON line per trial in `<model stem>-info.json`

pub mod experiment;
pub mod record;
pub mod trainer;


pub use experiment::{run_experiment, ExperimentSummary};
