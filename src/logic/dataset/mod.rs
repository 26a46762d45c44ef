//! Dataset Module - Labeled Feature Matrix Assembly
//!
//! Reads a weak-label table, samples every listed file through a feature
//! extractor and partitions the result into train/test matrices.
//!
//! Rows that cannot be materialized (file deleted since labeling, malformed
//! CSV line) are skipped and counted, never dropped silently.

pub mod reader;
pub mod split;

#[cfg(test)]
mod tests;

pub use reader::{Dataset, NaiveTruthReader, RowSkip};
pub use split::TrainTestSplit;
