use std::fs;

use ndarray::{Array1, Array2};
use tempfile::tempdir;

use super::{Classifier, SavedModel, TrainedModel};
use crate::error::SamplerError;
use crate::logic::config::{ClassifierKind, FeatureKind};
use crate::logic::features::{ClassTable, FeatureLayout};

const ALL_KINDS: [ClassifierKind; 3] = [ClassifierKind::Svc, ClassifierKind::Logit, ClassifierKind::Rf];

/// Class c has byte c set high and the rest low, with a little jitter
fn separable(n_per_class: usize, n_classes: usize, d: usize) -> (Array2<f32>, Array1<usize>) {
    let n = n_per_class * n_classes;
    let mut x = Array2::<f32>::zeros((n, d));
    let mut y = Array1::<usize>::zeros(n);
    for i in 0..n {
        let class = i % n_classes;
        y[i] = class;
        for j in 0..d {
            let jitter = ((i * 7 + j * 13) % 11) as f32;
            x[[i, j]] = if j == class { 200.0 + jitter } else { 10.0 + jitter };
        }
    }
    (x, y)
}

fn class_table(labels: &[&str]) -> ClassTable {
    let mut table = ClassTable::new();
    for label in labels {
        table.resolve(label).unwrap();
    }
    table.freeze();
    table
}

#[test]
fn test_each_classifier_learns_separable_data() {
    let (x, y) = separable(12, 3, 6);
    for kind in ALL_KINDS {
        let mut model = TrainedModel::new(kind, Some(7));
        model.fit(&x, &y, 3).unwrap();
        assert_eq!(model.kind(), kind);
        assert_eq!(model.n_features(), 6);

        let accuracy = model.score(&x, &y).unwrap();
        assert!(accuracy >= 0.9, "{} accuracy {}", kind, accuracy);
    }
}

#[test]
fn test_predictions_are_valid_class_ids() {
    let (x, y) = separable(5, 4, 8);
    for kind in ALL_KINDS {
        let mut model = TrainedModel::new(kind, Some(1));
        model.fit(&x, &y, 4).unwrap();
        let predicted = model.predict(x.view()).unwrap();
        assert_eq!(predicted.len(), x.nrows());
        assert!(predicted.iter().all(|&c| c < 4));
    }
}

#[test]
fn test_seeded_forest_is_reproducible() {
    let (x, y) = separable(10, 3, 9);
    let mut a = TrainedModel::new(ClassifierKind::Rf, Some(42));
    let mut b = TrainedModel::new(ClassifierKind::Rf, Some(42));
    a.fit(&x, &y, 3).unwrap();
    b.fit(&x, &y, 3).unwrap();
    assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_forest_grows_deep_trees() {
    // One feature, alternating classes: every value needs its own leaf
    let n = 400;
    let x = Array2::from_shape_fn((n, 1), |(i, _)| (i % 200) as f32);
    let y = Array1::from_shape_fn(n, |i| (i % 200) % 2);

    let mut forest = super::forest::RandomForest::new(Some(3));
    forest.fit(&x, &y, 2).unwrap();
    assert_eq!(forest.trees().len(), super::forest::N_ESTIMATORS);
    assert!(forest.trees().iter().all(|t| t.node_count() > 50));
}

#[test]
fn test_fit_rejects_bad_input() {
    let (x, y) = separable(2, 2, 3);
    for kind in ALL_KINDS {
        let empty = Array2::<f32>::zeros((0, 3));
        let err = TrainedModel::new(kind, None).fit(&empty, &Array1::zeros(0), 2).unwrap_err();
        assert!(matches!(err, SamplerError::Training(_)));

        let err = TrainedModel::new(kind, None).fit(&x, &y, 1).unwrap_err();
        assert!(matches!(err, SamplerError::Training(_)));

        let short = Array1::from_vec(vec![0usize, 1]);
        let err = TrainedModel::new(kind, None).fit(&x, &short, 2).unwrap_err();
        assert!(matches!(err, SamplerError::Training(_)));
    }
}

#[test]
fn test_predict_checks_width_and_fit_state() {
    let (x, y) = separable(3, 2, 4);
    for kind in ALL_KINDS {
        let unfitted = TrainedModel::new(kind, None);
        assert!(matches!(unfitted.predict(x.view()), Err(SamplerError::Training(_))));

        let mut model = TrainedModel::new(kind, Some(2));
        model.fit(&x, &y, 2).unwrap();
        let narrow = Array2::<f32>::zeros((1, 3));
        let err = model.predict(narrow.view()).unwrap_err();
        assert!(matches!(err, SamplerError::FeatureMismatch { expected: 4, actual: 3 }));
    }
}

#[test]
fn test_score_on_empty_test_set() {
    let (x, y) = separable(3, 2, 4);
    let mut model = TrainedModel::new(ClassifierKind::Logit, None);
    model.fit(&x, &y, 2).unwrap();
    let err = model.score(&Array2::zeros((0, 4)), &Array1::zeros(0)).unwrap_err();
    assert!(matches!(err, SamplerError::Training(_)));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

fn saved_model(kind: ClassifierKind) -> (SavedModel, Array2<f32>) {
    let (x, y) = separable(6, 2, 4);
    let mut model = TrainedModel::new(kind, Some(5));
    model.fit(&x, &y, 2).unwrap();
    let layout = FeatureLayout::new(FeatureKind::Head, 4, 0);
    (SavedModel::new(model, layout, class_table(&["tabular", "image"])), x)
}

#[test]
fn test_save_load_preserves_predictions() {
    let dir = tempdir().unwrap();
    for kind in ALL_KINDS {
        let (saved, x) = saved_model(kind);
        let path = dir.path().join("nested").join(format!("{}.json", kind));

        let size = saved.save(&path).unwrap();
        assert_eq!(size, fs::metadata(&path).unwrap().len());
        assert!(!dir.path().join("nested").join(format!("{}.json.tmp", kind)).exists());

        let loaded = SavedModel::load(&path).unwrap();
        assert_eq!(loaded.model.kind(), kind);
        assert_eq!(loaded.layout, saved.layout);
        assert_eq!(loaded.classes.label(1), Some("image"));
        assert!(loaded.classes.is_frozen());
        assert_eq!(
            loaded.model.predict(x.view()).unwrap(),
            saved.model.predict(x.view()).unwrap()
        );
    }
}

#[test]
fn test_save_overwrites_previous_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let (first, _) = saved_model(ClassifierKind::Rf);
    let (second, _) = saved_model(ClassifierKind::Logit);
    first.save(&path).unwrap();
    second.save(&path).unwrap();
    assert_eq!(SavedModel::load(&path).unwrap().model.kind(), ClassifierKind::Logit);
}

fn tamper(path: &std::path::Path, edit: impl FnOnce(&mut serde_json::Value)) {
    let mut value: serde_json::Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    edit(&mut value);
    fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
}

fn assert_model_load(path: &std::path::Path) {
    match SavedModel::load(path) {
        Err(SamplerError::ModelLoad { .. }) => {}
        other => panic!("expected ModelLoad, got {:?}", other.map(|m| m.model.kind())),
    }
}

#[test]
fn test_load_rejects_tampered_payload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");
    saved_model(ClassifierKind::Svc).0.save(&path).unwrap();

    tamper(&path, |v| {
        let payload = v["payload"].as_str().unwrap().to_string();
        v["payload"] = serde_json::Value::String(format!("{} ", payload));
    });
    assert_model_load(&path);
}

#[test]
fn test_load_rejects_bad_envelopes() {
    let dir = tempdir().unwrap();
    assert_model_load(&dir.path().join("missing.json"));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, b"not json at all").unwrap();
    assert_model_load(&garbage);

    let version = dir.path().join("version.json");
    saved_model(ClassifierKind::Logit).0.save(&version).unwrap();
    tamper(&version, |v| v["format_version"] = serde_json::json!(99));
    assert_model_load(&version);

    let layout = dir.path().join("layout.json");
    saved_model(ClassifierKind::Logit).0.save(&layout).unwrap();
    tamper(&layout, |v| v["layout"]["head_size"] = serde_json::json!(7));
    assert_model_load(&layout);

    let kind = dir.path().join("kind.json");
    saved_model(ClassifierKind::Logit).0.save(&kind).unwrap();
    tamper(&kind, |v| v["classifier"] = serde_json::json!("rf"));
    assert_model_load(&kind);
}
