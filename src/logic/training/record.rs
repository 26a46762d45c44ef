use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SamplerError, SamplerResult};
use crate::logic::config::{ClassifierKind, FeatureKind};

/// One trial's outcome
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrialRecord {
    #[serde(rename = "Classifier")]
    pub classifier: ClassifierKind,
    #[serde(rename = "Feature")]
    pub feature: FeatureKind,
    /// 0-based
    #[serde(rename = "Trial")]
    pub trial: usize,
    /// Seconds spent reading the label table and sampling files
    #[serde(rename = "Read time")]
    pub read_time: f64,
    #[serde(rename = "Train and test time")]
    pub train_test_time: f64,
    #[serde(rename = "Model accuracy")]
    pub accuracy: f64,
    /// Bytes on disk
    #[serde(rename = "Model size")]
    pub model_size: u64,

    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Append-mode JSON Lines log
pub struct TrialLog {
    file: Mutex<Option<File>>,
    path: PathBuf,
}

impl TrialLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Mutex::new(None),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, opening the file on first use
    pub fn append(&self, record: &TrialRecord) -> SamplerResult<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| SamplerError::io(&self.path, e))?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json).map_err(|e| SamplerError::io(&self.path, e))?;
        }
        Ok(())
    }

    /// Every record in the log, oldest first
    pub fn read_all(&self) -> SamplerResult<Vec<TrialRecord>> {
        let file = File::open(&self.path).map_err(|e| SamplerError::io(&self.path, e))?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| SamplerError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}
