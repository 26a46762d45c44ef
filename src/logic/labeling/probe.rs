//! Probe Capability
//!
//! A probe is a specialized extractor consulted only for whether its format
//! applies. "Does not apply" is an ordinary `Err(ProbeMismatch)`, never a panic.

use std::path::Path;

use super::label::FileLabel;

/// What a probe found when its format applies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Amount of extracted signal (columns, keywords, variables...)
    pub signal: usize,
    pub detail: String,
}

impl ProbeReport {
    pub fn new(signal: usize, detail: impl Into<String>) -> Self {
        Self { signal, detail: detail.into() }
    }
}

/// The probe's format does not apply to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeMismatch(pub String);

impl ProbeMismatch {
    pub fn new(reason: impl Into<String>) -> Self {
        ProbeMismatch(reason.into())
    }
}

impl std::fmt::Display for ProbeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProbeMismatch {}

impl From<std::io::Error> for ProbeMismatch {
    fn from(err: std::io::Error) -> Self {
        ProbeMismatch(format!("io: {}", err))
    }
}

/// Trait for format probes (netcdf, json/xml, tabular, keyword, ...)
pub trait Probe: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Label assigned when this probe applies
    fn label(&self) -> FileLabel;

    fn attempt(&self, path: &Path) -> Result<ProbeReport, ProbeMismatch>;

    /// If true, a success with zero signal is treated as "does not apply"
    fn requires_signal(&self) -> bool {
        false
    }
}
