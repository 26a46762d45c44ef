//! Class Table
//!
//! Bidirectional label <-> class id mapping. Append-only while a dataset is
//! built, then frozen. Persisted as a JSON object `{"label": id, ...}`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct ClassTable {
    /// id -> label (id == index)
    labels: Vec<String>,
    ids: HashMap<String, usize>,
    frozen: bool,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Make the table read-only
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Existing id for `label`, or the next id if the table is still open
    pub fn resolve(&mut self, label: &str) -> SamplerResult<usize> {
        if let Some(&id) = self.ids.get(label) {
            return Ok(id);
        }
        if self.frozen {
            return Err(SamplerError::ClassTable(format!(
                "label {:?} is not in the frozen class table",
                label
            )));
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.ids.insert(label.to_string(), id);
        Ok(id)
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Labels in id order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn save(&self, path: &Path) -> SamplerResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SamplerError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|e| SamplerError::io(path, e))?;
        log::info!("Class table ({} classes) written to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a persisted table; loaded tables are always frozen
    pub fn load(path: &Path) -> SamplerResult<Self> {
        let data = fs::read(path).map_err(|e| SamplerError::io(path, e))?;
        let table: ClassTable = serde_json::from_slice(&data)?;
        Ok(table)
    }
}

impl TryFrom<BTreeMap<String, usize>> for ClassTable {
    type Error = String;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self, Self::Error> {
        let mut labels = vec![None; map.len()];
        for (label, &id) in &map {
            let slot = labels
                .get_mut(id)
                .ok_or_else(|| format!("class id {} out of range for {} classes", id, map.len()))?;
            if let Some(other) = slot {
                return Err(format!("class id {} used by {:?} and {:?}", id, other, label));
            }
            *slot = Some(label.clone());
        }
        let labels: Vec<String> = labels.into_iter().flatten().collect();
        let ids = map.into_iter().collect();
        Ok(Self { labels, ids, frozen: true })
    }
}

impl From<ClassTable> for BTreeMap<String, usize> {
    fn from(table: ClassTable) -> Self {
        table.ids.into_iter().collect()
    }
}
