//! API Module
//!
//! One function per mode of the command surface:
//! - `label_corpus`: crawl + weak-label a corpus, write the label table
//! - `train`: multi-trial training run
//! - `predict_file` / `predict_dir`: label new files with a saved model
//!
//! Every command returns a serializable summary so `main` can print it.

pub mod commands;

pub use commands::*;
