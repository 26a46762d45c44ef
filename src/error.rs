//! Error handling
//!
//! Fatal conditions only. Locally recovered conditions (a probe that does not
//! apply, a dataset row that cannot be materialized) have their own types in
//! `logic::labeling` and `logic::dataset` and never become a `SamplerError`.

use std::path::PathBuf;
use thiserror::Error;

pub type SamplerResult<T> = Result<T, SamplerError>;

/// Coarse classification of a fatal error, used for exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad flags or settings, reported before any work begins
    Configuration,
    /// Missing/unreadable files and directories
    Environment,
    /// The corpus or label table cannot produce a usable dataset
    DataQuality,
    /// The classifier failed during fit/score
    Training,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Environment => "environment",
            ErrorCategory::DataQuality => "data quality",
            ErrorCategory::Training => "training",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Environment => 3,
            ErrorCategory::DataQuality => 4,
            ErrorCategory::Training => 5,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SamplerError {
    // Configuration errors
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // Environment errors
    #[error("{} is not a valid directory: {reason}", path.display())]
    Directory { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    // Data quality errors
    #[error("label table {}: {reason}", path.display())]
    LabelTable { path: PathBuf, reason: String },

    #[error("no usable examples in dataset ({skipped} rows skipped)")]
    EmptyDataset { skipped: usize },

    #[error("class table: {0}")]
    ClassTable(String),

    #[error("feature mismatch: model expects {expected} features, extractor produces {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    // Training errors
    #[error("training failed: {0}")]
    Training(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SamplerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SamplerError::Io { path: path.into(), source }
    }

    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SamplerError::ModelLoad { path: path.into(), reason: reason.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SamplerError::Configuration(_) | SamplerError::FeatureMismatch { .. } => {
                ErrorCategory::Configuration
            }
            SamplerError::Directory { .. }
            | SamplerError::Io { .. }
            | SamplerError::ModelLoad { .. }
            | SamplerError::Serialization(_) => ErrorCategory::Environment,
            SamplerError::LabelTable { .. }
            | SamplerError::EmptyDataset { .. }
            | SamplerError::ClassTable(_) => ErrorCategory::DataQuality,
            SamplerError::Training(_) => ErrorCategory::Training,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinct() {
        let config = SamplerError::Configuration("bad kind".into());
        let missing = SamplerError::model_load("m.json", "not found");
        let empty = SamplerError::EmptyDataset { skipped: 3 };
        let train = SamplerError::Training("boom".into());

        assert_eq!(config.category(), ErrorCategory::Configuration);
        assert_eq!(missing.category(), ErrorCategory::Environment);
        assert_eq!(empty.category(), ErrorCategory::DataQuality);
        assert_eq!(train.category(), ErrorCategory::Training);

        let codes = [config, missing, empty, train]
            .iter()
            .map(|e| e.category().exit_code())
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_display_mentions_path() {
        let err = SamplerError::Directory {
            path: PathBuf::from("/nope"),
            reason: "not a directory".into(),
        };
        assert!(err.to_string().contains("/nope"));
    }
}
