//! Sampler Configuration
//!
//! Every tunable of a run. Built from `constants` + environment first, then
//! overridden by CLI flags, then validated before any work begins.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{SamplerError, SamplerResult};

// ============================================================================
// CLOSED KINDS
// ============================================================================

/// Classifier kinds with fixed hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Support vector classifier
    Svc,
    /// Logistic regression
    Logit,
    /// Random forest
    Rf,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Svc => "svc",
            ClassifierKind::Logit => "logit",
            ClassifierKind::Rf => "rf",
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svc" => Ok(ClassifierKind::Svc),
            "logit" => Ok(ClassifierKind::Logit),
            "rf" => Ok(ClassifierKind::Rf),
            other => Err(SamplerError::Configuration(format!(
                "invalid classifier option {} (expected svc, logit or rf)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Byte-sampling feature kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// First N bytes
    Head,
    /// N bytes at random offsets
    Rand,
    /// Head bytes followed by random bytes
    RandHead,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Head => "head",
            FeatureKind::Rand => "rand",
            FeatureKind::RandHead => "randhead",
        }
    }
}

impl FromStr for FeatureKind {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "head" => Ok(FeatureKind::Head),
            "rand" => Ok(FeatureKind::Rand),
            "randhead" => Ok(FeatureKind::RandHead),
            other => Err(SamplerError::Configuration(format!(
                "invalid feature option {} (expected head, rand or randhead)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Run configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub classifier: ClassifierKind,
    pub feature: FeatureKind,
    pub head_bytes: usize,
    pub rand_bytes: usize,
    /// Fraction of examples used for training
    pub split: f64,
    pub trials: usize,
    /// None disables the per-probe timeout
    pub probe_timeout: Option<Duration>,
    pub parallel: bool,
    pub seed: Option<u64>,

    pub label_csv: PathBuf,
    /// None = derive `<classifier>-<feature>-<date>.json`
    pub model_path: Option<PathBuf>,
    pub class_table_path: PathBuf,
    pub trained_model: PathBuf,
    pub results_file: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::Rf,
            feature: FeatureKind::Head,
            head_bytes: constants::DEFAULT_HEAD_BYTES,
            rand_bytes: constants::DEFAULT_RAND_BYTES,
            split: constants::DEFAULT_SPLIT,
            trials: constants::DEFAULT_TRIALS,
            probe_timeout: timeout_from_secs(constants::DEFAULT_PROBE_TIMEOUT_SECS),
            parallel: true,
            seed: None,
            label_csv: PathBuf::from(constants::DEFAULT_LABEL_CSV),
            model_path: None,
            class_table_path: PathBuf::from(constants::DEFAULT_CLASS_TABLE),
            trained_model: PathBuf::from(constants::DEFAULT_TRAINED_MODEL),
            results_file: PathBuf::from(constants::DEFAULT_RESULTS_FILE),
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl SamplerConfig {
    /// Load configuration from environment variables (falls back to defaults)
    pub fn from_env() -> Self {
        Self {
            head_bytes: constants::get_head_bytes(),
            rand_bytes: constants::get_rand_bytes(),
            split: constants::get_split(),
            trials: constants::get_trials(),
            probe_timeout: timeout_from_secs(constants::get_probe_timeout_secs()),
            parallel: constants::is_parallel_labeling(),
            seed: constants::get_seed(),
            label_csv: PathBuf::from(constants::get_label_csv()),
            class_table_path: PathBuf::from(constants::get_class_table_path()),
            ..Default::default()
        }
    }

    /// Reject values that would make the run meaningless
    pub fn validate(&self) -> SamplerResult<()> {
        if !(self.split > 0.0 && self.split <= 1.0) {
            return Err(SamplerError::Configuration(format!(
                "split must be in (0, 1], got {}",
                self.split
            )));
        }
        if self.trials == 0 {
            return Err(SamplerError::Configuration("trials must be at least 1".into()));
        }
        let uses_head = matches!(self.feature, FeatureKind::Head | FeatureKind::RandHead);
        let uses_rand = matches!(self.feature, FeatureKind::Rand | FeatureKind::RandHead);
        if uses_head && self.head_bytes == 0 {
            return Err(SamplerError::Configuration("head_bytes must be positive".into()));
        }
        if uses_rand && self.rand_bytes == 0 {
            return Err(SamplerError::Configuration("rand_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Model output path, derived from kinds and today's date when unset
    pub fn resolved_model_path(&self) -> PathBuf {
        match &self.model_path {
            Some(path) => path.clone(),
            None => default_model_name(self.classifier, self.feature),
        }
    }
}

/// `<classifier>-<feature>-<YYYY-MM-DD>.json`
pub fn default_model_name(classifier: ClassifierKind, feature: FeatureKind) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    PathBuf::from(format!("{}-{}-{}.json", classifier, feature, today))
}

/// Metadata log path next to a model: `<stem>-info.json`
pub fn info_path_for(model_path: &Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    model_path.with_file_name(format!("{}-info.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("rf".parse::<ClassifierKind>().unwrap(), ClassifierKind::Rf);
        assert_eq!("LOGIT".parse::<ClassifierKind>().unwrap(), ClassifierKind::Logit);
        assert_eq!("randhead".parse::<FeatureKind>().unwrap(), FeatureKind::RandHead);
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let err = "knn".parse::<ClassifierKind>().unwrap_err();
        assert!(matches!(err, SamplerError::Configuration(_)));

        let err = "ngram".parse::<FeatureKind>().unwrap_err();
        assert!(matches!(err, SamplerError::Configuration(_)));
    }

    #[test]
    fn test_validate_split() {
        let mut config = SamplerConfig::default();
        assert!(config.validate().is_ok());

        config.split = 0.0;
        assert!(config.validate().is_err());
        config.split = 1.5;
        assert!(config.validate().is_err());
        config.split = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_sizes() {
        let mut config = SamplerConfig::default();
        config.feature = FeatureKind::Rand;
        config.head_bytes = 0;
        assert!(config.validate().is_ok());

        config.rand_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_info_path() {
        let path = info_path_for(Path::new("out/rf-head.json"));
        assert_eq!(path, PathBuf::from("out/rf-head-info.json"));
    }

    #[test]
    fn test_default_model_name() {
        let name = default_model_name(ClassifierKind::Svc, FeatureKind::Rand);
        let name = name.to_string_lossy();
        assert!(name.starts_with("svc-rand-"));
        assert!(name.ends_with(".json"));
    }
}
