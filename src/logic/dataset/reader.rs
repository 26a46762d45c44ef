use std::path::{Path, PathBuf};

use crate::error::{SamplerError, SamplerResult};
use crate::logic::features::{ClassTable, FeatureExtractor, FeatureLayout, LabeledExample};
use crate::logic::labeling::{read_label_table, WeakLabel};

/// A row that could not be turned into an example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkip {
    /// Line in the label table, when the row came from one
    pub line: Option<usize>,
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl std::fmt::Display for RowSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {}: ", line)?;
        }
        if let Some(path) = &self.path {
            write!(f, "{}: ", path.display())?;
        }
        write!(f, "{}", self.reason)
    }
}

/// Labeled examples plus the class table that gives their ids meaning
#[derive(Debug)]
pub struct Dataset {
    pub examples: Vec<LabeledExample>,
    /// Frozen once the dataset is built
    pub classes: ClassTable,
    pub layout: FeatureLayout,
    pub skipped: Vec<RowSkip>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Turns a weak-label table into a dataset
pub struct NaiveTruthReader<'a> {
    extractor: &'a dyn FeatureExtractor,
    label_file: PathBuf,
}

impl<'a> NaiveTruthReader<'a> {
    pub fn new(extractor: &'a dyn FeatureExtractor, label_file: impl AsRef<Path>) -> Self {
        Self {
            extractor,
            label_file: label_file.as_ref().to_path_buf(),
        }
    }

    /// Read the table and translate every row
    pub fn run(&self) -> SamplerResult<Dataset> {
        let table = read_label_table(&self.label_file)?;
        let malformed = table.malformed.into_iter().map(|(line, reason)| RowSkip {
            line: Some(line),
            path: None,
            reason,
        });
        let dataset = build_dataset(self.extractor, &table.rows, malformed.collect())?;

        log::info!(
            "Read {} examples from {} ({} rows skipped, {} classes)",
            dataset.len(),
            self.label_file.display(),
            dataset.skipped_count(),
            dataset.classes.len()
        );
        Ok(dataset)
    }
}

/// Translate in-memory rows. `skipped` seeds the skip list (e.g. malformed lines).
pub fn build_dataset(
    extractor: &dyn FeatureExtractor,
    rows: &[WeakLabel],
    mut skipped: Vec<RowSkip>,
) -> SamplerResult<Dataset> {
    let mut classes = ClassTable::new();
    let mut examples = Vec::with_capacity(rows.len());

    for row in rows {
        match extractor.translate(row, &mut classes) {
            Ok(example) => examples.push(example),
            Err(SamplerError::Io { path, source }) => {
                let skip = RowSkip { line: None, path: Some(path), reason: source.to_string() };
                log::warn!("Skipping row: {}", skip);
                skipped.push(skip);
            }
            Err(e) => return Err(e),
        }
    }

    classes.freeze();
    Ok(Dataset {
        examples,
        classes,
        layout: extractor.layout(),
        skipped,
    })
}
