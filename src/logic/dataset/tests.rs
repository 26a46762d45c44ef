use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::reader::{build_dataset, NaiveTruthReader};
use super::split::TrainTestSplit;
use crate::error::SamplerError;
use crate::logic::features::{FeatureVector, HeadBytes, LabeledExample};
use crate::logic::labeling::{write_label_table, FileLabel, WeakLabel};

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn row(path: PathBuf, label: FileLabel) -> WeakLabel {
    WeakLabel { path, size: 0, label, infer_time: 0.01 }
}

fn examples(n: usize) -> Vec<LabeledExample> {
    (0..n)
        .map(|i| LabeledExample {
            features: FeatureVector { values: vec![i as f32, (i * 2) as f32, 1.0] },
            class_id: i % 3,
        })
        .collect()
}

/// Rows of (first feature, class) so examples can be compared as a multiset
fn multiset(split: &TrainTestSplit) -> Vec<(u32, usize)> {
    let mut rows: Vec<(u32, usize)> = split
        .x_train
        .rows()
        .into_iter()
        .zip(split.y_train.iter())
        .chain(split.x_test.rows().into_iter().zip(split.y_test.iter()))
        .map(|(x, y)| (x[0] as u32, *y))
        .collect();
    rows.sort();
    rows
}

#[test]
fn test_reader_counts_skipped_rows() {
    let dir = tempdir().unwrap();
    let csv = write(dir.path(), "a.csv", b"x,y\n1,2\n");
    let json = write(dir.path(), "b.json", b"{\"k\": 1}");
    let gone = dir.path().join("deleted.txt");

    let table = dir.path().join("labels.csv");
    write_label_table(
        &table,
        &[
            row(csv, FileLabel::Tabular),
            row(gone, FileLabel::FreeText),
            row(json, FileLabel::JsonXml),
        ],
    )
    .unwrap();
    // Append a malformed line
    let mut text = fs::read_to_string(&table).unwrap();
    text.push_str("/x,notanumber,tabular,0.1\n");
    fs::write(&table, text).unwrap();

    let extractor = HeadBytes::new(16);
    let dataset = NaiveTruthReader::new(&extractor, &table).run().unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.skipped_count(), 2);
    assert!(dataset.skipped.iter().any(|s| s.line == Some(5)));
    assert!(dataset.skipped.iter().any(|s| s.path.as_deref().map_or(false, |p| p.ends_with("deleted.txt"))));

    // The vanished freetext row contributed no class
    assert_eq!(dataset.classes.len(), 2);
    assert_eq!(dataset.classes.id("freetext"), None);
    assert!(dataset.classes.is_frozen());
    assert!(dataset.examples.iter().all(|e| e.features.len() == 16));
}

#[test]
fn test_reader_missing_table() {
    let extractor = HeadBytes::new(16);
    let err = NaiveTruthReader::new(&extractor, "/no/labels.csv").run().unwrap_err();
    assert!(matches!(err, SamplerError::Io { .. }));
}

#[test]
fn test_build_dataset_from_rows() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"aaaa");
    let b = write(dir.path(), "b", b"bbbb");

    let extractor = HeadBytes::new(2);
    let dataset = build_dataset(
        &extractor,
        &[row(a, FileLabel::Unknown), row(b, FileLabel::Image)],
        Vec::new(),
    )
    .unwrap();

    assert_eq!(dataset.examples[0].class_id, 0);
    assert_eq!(dataset.examples[1].class_id, 1);
    assert_eq!(dataset.classes.label(1), Some("image"));
    assert_eq!(dataset.layout.nfeatures(), 2);
}

#[test]
fn test_partition_sizes() {
    for (n, split) in [(10, 0.8), (7, 0.5), (3, 1.0), (1, 0.8), (101, 0.33)] {
        let split_set = TrainTestSplit::new(&examples(n), 3, split, Some(1)).unwrap();
        assert_eq!(split_set.train_len() + split_set.test_len(), n);

        let ratio_rows = split * n as f64;
        assert!((split_set.train_len() as f64 - ratio_rows).abs() <= 1.0, "n={} split={}", n, split);
    }
}

#[test]
fn test_shuffle_preserves_examples() {
    let mut split_set = TrainTestSplit::new(&examples(25), 3, 0.8, Some(3)).unwrap();
    let before = multiset(&split_set);

    split_set.shuffle(None).unwrap();
    assert_eq!(split_set.len(), 25);
    assert_eq!(split_set.train_len(), 20);
    assert_eq!(multiset(&split_set), before);

    split_set.shuffle(Some(0.4)).unwrap();
    assert_eq!(split_set.train_len(), 10);
    assert_eq!(split_set.test_len(), 15);
    assert_eq!(multiset(&split_set), before);
    assert!((split_set.split() - 0.8).abs() < f64::EPSILON);

    // Rows stay paired with their labels
    for (x, y) in split_set.x_train.rows().into_iter().zip(split_set.y_train.iter()) {
        assert_eq!(x[0] as usize % 3, *y);
        assert_eq!(x[1], x[0] * 2.0);
    }
}

#[test]
fn test_explicit_ratio_applies_once() {
    let mut split_set = TrainTestSplit::new(&examples(25), 3, 0.8, Some(5)).unwrap();
    split_set.shuffle(Some(0.4)).unwrap();
    assert_eq!(split_set.train_len(), 10);

    split_set.shuffle(None).unwrap();
    assert_eq!(split_set.train_len(), 20);
    assert_eq!(split_set.test_len(), 5);
}

#[test]
fn test_invalid_split() {
    assert!(matches!(
        TrainTestSplit::new(&examples(4), 3, 0.0, None),
        Err(SamplerError::Configuration(_))
    ));
    let mut ok = TrainTestSplit::new(&examples(4), 3, 0.5, None).unwrap();
    assert!(ok.shuffle(Some(1.2)).is_err());
    assert_eq!(ok.len(), 4);
}

#[test]
fn test_ragged_features_rejected() {
    let mut data = examples(3);
    data[1].features.values.push(9.0);
    let err = TrainTestSplit::new(&data, 3, 0.8, None).unwrap_err();
    assert!(matches!(err, SamplerError::FeatureMismatch { expected: 3, actual: 4 }));
}
