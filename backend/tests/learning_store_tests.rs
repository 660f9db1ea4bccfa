//! Continual learning store and retrain tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{example, seed_examples, Harness};
use crop_advisory::ml::{ArtifactError, SplitError, TrainingError};
use crop_advisory::services::pipeline::local_predict;
use crop_advisory::services::{load_dataset, IngestOutcome, LearningStore, RetrainError};
use proptest::prelude::*;
use shared::FeatureRecord;

#[tokio::test]
async fn duplicate_observation_is_not_stored_twice() {
    let harness = Harness::new(0.5);
    let store = harness.store();

    let first = example("maize", "delta", "sunny", "loamy", 28.0, 60.0, 12.0, "healthy");
    let second = example("maize", "delta", "rainy", "clay", 28.0, 60.0, 12.0, "stress");

    let outcome = store.record_and_maybe_retrain(first).await;
    assert!(matches!(outcome, IngestOutcome::Appended { retrained: Some(_) }));
    assert_eq!(store.record_and_maybe_retrain(second).await, IngestOutcome::Duplicate);

    let rows = load_dataset(&harness.config.data.dataset_path).unwrap();
    let matching: Vec<_> = rows
        .iter()
        .filter(|r| r.crop_name == "maize" && r.location == "delta")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].label, "healthy");
    assert_eq!(matching[0].weather, "sunny");
    // Only the first insert retrained
    assert_eq!(harness.registry.version(), 2);
}

#[tokio::test]
async fn unreadable_dataset_is_absorbed() {
    let harness = Harness::new(0.5);
    // A directory where the dataset file should be
    let path = harness.dir.path().join("dataset_dir");
    std::fs::create_dir(&path).unwrap();
    let store = LearningStore::new(&path, harness.retrainer());

    let outcome = store
        .record_and_maybe_retrain(example("rice", "delta", "sunny", "clay", 1.0, 2.0, 3.0, "healthy"))
        .await;

    assert_eq!(outcome, IngestOutcome::Failed);
    assert_eq!(harness.registry.version(), 1);
}

#[tokio::test]
async fn concurrent_ingests_are_serialized() {
    let harness = Harness::new(0.5);
    let store = Arc::new(harness.store());

    let mut tasks = Vec::new();
    for i in 0..4 {
        let store = Arc::clone(&store);
        let row = example("barley", "delta", "sunny", "loamy", 20.0, 50.0, 200.0 + i as f64, "moderate");
        tasks.push(tokio::spawn(async move { store.record_and_maybe_retrain(row).await }));
    }
    for task in tasks {
        assert!(matches!(task.await.unwrap(), IngestOutcome::Appended { .. }));
    }

    let rows = load_dataset(&harness.config.data.dataset_path).unwrap();
    assert_eq!(rows.len(), seed_examples().len() + 4);
    assert_eq!(harness.registry.version(), 5);
}

#[tokio::test]
async fn abandoned_ingest_still_finishes_before_the_next() {
    let harness = Harness::new(0.5);
    let store = harness.store();
    let first = example("sorghum", "delta", "sunny", "loamy", 33.0, 45.0, 15.0, "stress");
    let second = example("millet", "plains", "dry", "sandy", 36.0, 35.0, 8.0, "stress");

    // The caller stops waiting right after the update has started
    let _ = tokio::time::timeout(Duration::ZERO, store.record_and_maybe_retrain(first)).await;
    let outcome = store.record_and_maybe_retrain(second).await;
    assert!(matches!(outcome, IngestOutcome::Appended { retrained: Some(_) }));

    let rows = load_dataset(&harness.config.data.dataset_path).unwrap();
    assert_eq!(rows.len(), seed_examples().len() + 2);
    assert!(rows.iter().any(|r| r.crop_name == "sorghum"));
    assert!(rows.iter().any(|r| r.crop_name == "millet"));
    assert_eq!(harness.registry.version(), 3);
}

#[test]
fn unpublishable_encoder_keeps_previous_artifacts() {
    let mut rows = seed_examples();
    rows.push(example("jute", "coast", "humid", "silt", 31.0, 90.0, 70.0, "healthy"));
    let harness = Harness::with_examples(0.5, &rows);

    // A non-empty directory where the encoder file belongs
    let encoder_path = &harness.config.data.encoder_path;
    std::fs::remove_file(encoder_path).unwrap();
    std::fs::create_dir(encoder_path).unwrap();
    std::fs::write(encoder_path.join("keep"), b"x").unwrap();
    let model_bytes = std::fs::read(&harness.config.data.model_path).unwrap();

    let result = harness.retrainer().retrain();
    assert!(matches!(
        result,
        Err(RetrainError::Artifacts(ArtifactError::Write { .. }))
    ));
    assert_eq!(std::fs::read(&harness.config.data.model_path).unwrap(), model_bytes);
    assert_eq!(harness.registry.version(), 1);
}

#[test]
fn failed_retrain_keeps_previous_model() {
    // Live model trained on the seed rows; the dataset on disk has a singleton class
    let mut rows = seed_examples();
    rows.push(example("jute", "coast", "humid", "silt", 31.0, 90.0, 70.0, "fertilizer"));
    let harness = Harness::with_examples(0.5, &rows);

    let before = harness.registry.current();
    let model_bytes = std::fs::read(&harness.config.data.model_path).unwrap();
    let record = FeatureRecord::new("wheat", "plains", "sandy");
    let prediction_before = local_predict(&before, &record).unwrap();

    let result = harness.retrainer().retrain();
    assert!(matches!(
        result,
        Err(RetrainError::Training(TrainingError::Split(SplitError::ClassTooSmall { .. })))
    ));

    let after = harness.registry.current();
    assert_eq!(after.version, 1);
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(local_predict(&after, &record).unwrap(), prediction_before);
    assert_eq!(std::fs::read(&harness.config.data.model_path).unwrap(), model_bytes);
}

#[test]
fn successful_retrain_persists_and_swaps() {
    let mut rows = seed_examples();
    rows.push(example("jute", "coast", "humid", "silt", 31.0, 90.0, 70.0, "healthy"));
    let harness = Harness::with_examples(0.5, &rows);

    let summary = harness.retrainer().retrain().unwrap();
    assert_eq!(summary.version, 2);
    assert_eq!(summary.rows, 25);

    let live = harness.registry.current();
    assert!(live.encoder.columns()[0].categories.contains(&"jute".to_string()));

    let (classifier, encoder) = harness.config.data.artifact_paths().load().unwrap();
    assert_eq!(encoder, live.encoder);
    assert_eq!(classifier.report.rows, 25);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any observation tuple already present is rejected, whatever its label or weather
    #[test]
    fn prop_existing_tuple_is_duplicate(index in 0usize..24, weather in "[a-z]{3,8}", label in "[a-z]{3,8}") {
        let harness = Harness::new(0.5);
        let store = harness.store();
        let mut row = seed_examples()[index].clone();
        row.weather = weather;
        row.label = label;

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let outcome = runtime.block_on(store.record_and_maybe_retrain(row));
        prop_assert_eq!(outcome, IngestOutcome::Duplicate);
        prop_assert_eq!(
            load_dataset(&harness.config.data.dataset_path).unwrap().len(),
            seed_examples().len()
        );
    }
}
