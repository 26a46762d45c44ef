//! Logic Module - Engines
//!
//! ## Pipeline
//! - `crawler` - Breadth-first corpus discovery
//! - `labeling/` - Weak-label cascade and label table
//! - `features/` - Byte sampling, feature layout, class table
//! - `dataset/` - Label table -> labeled examples -> train/test split
//! - `model/` - Classifiers and model persistence
//! - `training/` - Trainer and multi-trial experiment loop
//! - `predict` - Single-file and directory prediction

pub mod config;
pub mod crawler;
pub mod dataset;
pub mod features;
pub mod labeling;
pub mod model;
pub mod predict;
pub mod training;
