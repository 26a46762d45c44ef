//! Model Module - Classifier Capability
//!
//! Three fixed-hyperparameter classifiers behind one `Classifier` trait,
//! plus a checksummed on-disk format that keeps the feature layout and
//! class table next to the fitted parameters.

pub mod classifier;
pub mod forest;
pub mod logit;
pub mod persist;
pub mod svc;

#[cfg(test)]
mod tests;

// Re-export common types
pub use classifier::{Classifier, TrainedModel};
pub use persist::SavedModel;
