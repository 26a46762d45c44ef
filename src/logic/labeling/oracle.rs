//! Weak-Label Oracle
//!
//! Precedence: image (by extension) > netcdf > json/xml > tabular > freetext > unknown.
//! Only the first probe that applies counts, so ties cannot happen.
//! Probes are injected at construction; the oracle holds no mutable state and
//! can be shared across worker threads.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::constants::IMAGE_EXTENSIONS;
use crate::logic::crawler::CorpusEntry;
use super::label::FileLabel;
use super::probe::{Probe, ProbeMismatch, ProbeReport};
use super::probes::{JsonXmlProbe, KeywordProbe, NetcdfProbe, TabularProbe};
use super::table::WeakLabel;

pub struct WeakLabelOracle {
    probes: Vec<Arc<dyn Probe>>,
    image_extensions: HashSet<String>,
    probe_timeout: Option<Duration>,
}

impl WeakLabelOracle {
    /// Cascade over `probes` in the given order
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self {
            probes,
            image_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            probe_timeout: None,
        }
    }

    /// netcdf -> json/xml -> tabular -> keyword
    pub fn with_default_probes() -> Self {
        Self::new(vec![
            Arc::new(NetcdfProbe),
            Arc::new(JsonXmlProbe),
            Arc::new(TabularProbe),
            Arc::new(KeywordProbe),
        ])
    }

    /// Bound each probe's run time. A probe that overruns is treated as not
    /// applying; its helper thread is detached.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .map_or(false, |ext| self.image_extensions.contains(&ext))
    }

    /// Run the cascade on one file
    pub fn infer_type(&self, path: &Path) -> FileLabel {
        if self.is_image(path) {
            return FileLabel::Image;
        }

        for probe in &self.probes {
            match self.run_probe(probe, path) {
                Ok(report) if probe.requires_signal() && report.signal == 0 => {
                    log::debug!(" {}: no signal in {}", probe.name(), path.display());
                }
                Ok(report) => {
                    log::trace!(" {}: {} ({})", probe.name(), path.display(), report.detail);
                    return probe.label();
                }
                Err(mismatch) => {
                    log::debug!(" {}: {} ({})", probe.name(), mismatch, path.display());
                }
            }
        }
        FileLabel::Unknown
    }

    fn run_probe(&self, probe: &Arc<dyn Probe>, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
        let timeout = match self.probe_timeout {
            Some(t) => t,
            None => return attempt_contained(probe.as_ref(), path),
        };

        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(probe);
        let owned_path = path.to_path_buf();
        let spawned = std::thread::Builder::new()
            .name(format!("probe-{}", probe.name()))
            .spawn(move || {
                let _ = tx.send(attempt_contained(worker.as_ref(), &owned_path));
            });

        if let Err(e) = spawned {
            log::warn!("Cannot spawn probe thread ({}), running inline", e);
            return attempt_contained(probe.as_ref(), path);
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Probe {} timed out after {:?} on {}",
                    probe.name(),
                    timeout,
                    path.display()
                );
                Err(ProbeMismatch::new("timed out"))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ProbeMismatch::new("probe panicked")),
        }
    }

    /// Label one crawled file and record the cascade latency
    pub fn create_row(&self, entry: &CorpusEntry) -> WeakLabel {
        let start = Instant::now();
        let label = self.infer_type(&entry.path);
        WeakLabel {
            path: entry.path.clone(),
            size: entry.size,
            label,
            infer_time: start.elapsed().as_secs_f64(),
        }
    }

    /// Label a whole corpus. Each result carries its originating path, so
    /// the output never depends on worker completion order.
    pub fn label_corpus(&self, entries: &[CorpusEntry], parallel: bool) -> Vec<WeakLabel> {
        if parallel {
            let mut rows: Vec<(usize, WeakLabel)> = entries
                .par_iter()
                .enumerate()
                .map(|(i, entry)| (i, self.create_row(entry)))
                .collect();
            rows.sort_by_key(|(i, _)| *i);
            rows.into_iter().map(|(_, row)| row).collect()
        } else {
            entries.iter().map(|entry| self.create_row(entry)).collect()
        }
    }
}

impl Default for WeakLabelOracle {
    fn default() -> Self {
        Self::with_default_probes()
    }
}

/// Run one probe, turning a panic into a mismatch
fn attempt_contained(probe: &dyn Probe, path: &Path) -> Result<ProbeReport, ProbeMismatch> {
    panic::catch_unwind(AssertUnwindSafe(|| probe.attempt(path))).unwrap_or_else(|_| {
        log::warn!("Probe {} panicked on {}", probe.name(), path.display());
        Err(ProbeMismatch::new("probe panicked"))
    })
}
