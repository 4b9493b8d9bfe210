// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the model lifecycle: train, persist, load, serve

use std::{fmt::Write as _, path::Path};

use age_model::{
    ArtifactStore, InferenceService, ModelError, ModelStatus, TestFraction, Trainer,
    TrainingConfig, build_transform_spec, data, run_training,
};
use shared_types::{AbaloneFeatures, FeatureContract, FeatureRow, Sex};
use tempfile::TempDir;

const HEADER: &str =
    "Sex,Length,Diameter,Height,Whole weight,Shucked weight,Viscera weight,Shell weight,Rings";

const TOY_ROWS: [(&str, [f64; 7], f64); 4] = [
    ("M", [0.455, 0.365, 0.095, 0.514, 0.2245, 0.101, 0.15], 5.0),
    ("F", [0.53, 0.42, 0.135, 0.677, 0.2565, 0.1415, 0.21], 7.0),
    ("I", [0.33, 0.255, 0.08, 0.205, 0.0895, 0.0395, 0.055], 9.0),
    ("M", [0.44, 0.365, 0.125, 0.516, 0.2155, 0.114, 0.155], 11.0),
];

fn write_toy_csv(dir: &Path) -> std::path::PathBuf {
    let mut body = String::from(HEADER);
    for (sex, m, rings) in TOY_ROWS {
        write!(
            body,
            "\n{sex},{},{},{},{},{},{},{},{rings}",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6]
        )
        .expect("formats");
    }
    let path = dir.join("toy.csv");
    std::fs::write(&path, body).expect("writes csv");
    path
}

/// Deterministic synthetic dataset whose ring counts follow the measurements closely
fn write_synthetic_csv(dir: &Path, rows: usize) -> std::path::PathBuf {
    let frac = |x: f64| x - x.floor();
    let mut body = format!("{HEADER},Age");

    for i in 0..rows {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64;
        let sex = ["M", "F", "I"][i % 3];
        let length = 0.2 + 0.6 * frac(t * 0.137);
        let diameter = 0.15 + 0.5 * frac(t * 0.371);
        let height = 0.05 + 0.2 * frac(t * 0.613);
        let whole = 0.1 + 1.5 * frac(t * 0.291);
        let shucked = 0.05 + 0.6 * frac(t * 0.457);
        let viscera = 0.02 + 0.3 * frac(t * 0.719);
        let shell = 0.03 + 0.5 * frac(t * 0.883);
        let sex_effect = match sex {
            "M" => 2.0,
            "F" => 3.0,
            _ => 0.0,
        };
        let rings = (3.0 + 12.0 * length + 20.0 * shell + 4.0 * whole + sex_effect).round();

        write!(
            body,
            "\n{sex},{length},{diameter},{height},{whole},{shucked},{viscera},{shell},{rings},999"
        )
        .expect("formats");
    }

    let path = dir.join("synthetic.csv");
    std::fs::write(&path, body).expect("writes csv");
    path
}

fn toy_request(index: usize) -> FeatureRow {
    let (sex, m, _) = TOY_ROWS[index];
    FeatureRow::from(&AbaloneFeatures {
        sex: sex.parse::<Sex>().expect("valid sex code"),
        length: m[0],
        diameter: m[1],
        height: m[2],
        whole_weight: m[3],
        shucked_weight: m[4],
        viscera_weight: m[5],
        shell_weight: m[6],
    })
}

#[tokio::test]
async fn toy_dataset_reproduces_least_squares_fit_through_service() {
    let dir = TempDir::new().expect("temp dir");
    let contract = FeatureContract::abalone();
    let csv = write_toy_csv(dir.path());

    let rows = data::load(&csv, &contract).expect("loads");
    let labeled = data::derive_target_and_drop_leakage(rows, &contract).expect("valid rows");
    let pipeline = Trainer::new(build_transform_spec(&contract))
        .fit(&labeled.features, &labeled.rings)
        .expect("fits");

    // Four rows cannot pin nine coefficients; the minimum-norm least-squares
    // solution interpolates every training row exactly.
    let artifact_path = dir.path().join("model.json");
    ArtifactStore::new(contract.clone())
        .save(&pipeline, &artifact_path)
        .await
        .expect("saves");

    let service = InferenceService::new(contract, &artifact_path);
    for (index, (_, _, rings)) in TOY_ROWS.iter().enumerate() {
        let response = service.predict(&toy_request(index)).await.expect("predicts");
        assert!(
            (response.predicted_rings - rings).abs() < 1e-6,
            "row {index}: expected {rings}, got {}",
            response.predicted_rings
        );
        assert_eq!(response.predicted_age, response.predicted_rings + 1.5);
    }
}

#[tokio::test]
async fn training_run_is_deterministic_and_persists_servable_artifact() {
    let dir = TempDir::new().expect("temp dir");
    let contract = FeatureContract::abalone();
    let dataset_path = write_synthetic_csv(dir.path(), 120);

    let config = |name: &str| TrainingConfig {
        dataset_path: dataset_path.clone(),
        artifact_path: dir.path().join(name),
        test_fraction: TestFraction::new(0.2).expect("valid fraction"),
        seed: 42,
    };

    let first = run_training(&config("first/model.json"), &contract)
        .await
        .expect("first run");
    let second = run_training(&config("second/model.json"), &contract)
        .await
        .expect("second run");

    assert_eq!(first.rows, 120);
    assert_eq!(first.test_rows, 24);
    assert_eq!(first.train_rows, 96);
    assert_eq!(first.metrics, second.metrics);
    assert!(first.metrics.r2 > 0.8, "r2 = {}", first.metrics.r2);
    assert!(first.metrics.mae < 1.0, "mae = {}", first.metrics.mae);

    let store = ArtifactStore::new(contract.clone());
    let a = store.load(&first.artifact_path).await.expect("loads");
    let b = store.load(&second.artifact_path).await.expect("loads");
    assert_eq!(a.pipeline, b.pipeline);

    let features = data::load_features(&dataset_path, &contract).expect("loads features");
    let from_disk = a.pipeline.predict_batch(&features).expect("predicts");
    assert_eq!(from_disk.len(), 120);
    assert!(from_disk.iter().all(|p| p.is_finite()));
}

#[tokio::test]
async fn failed_training_leaves_previous_artifact_intact() {
    let dir = TempDir::new().expect("temp dir");
    let contract = FeatureContract::abalone();
    let dataset_path = write_synthetic_csv(dir.path(), 30);
    let artifact_path = dir.path().join("model.json");

    let mut config = TrainingConfig {
        dataset_path,
        artifact_path: artifact_path.clone(),
        ..TrainingConfig::default()
    };
    run_training(&config, &contract).await.expect("trains");
    let good = std::fs::read(&artifact_path).expect("reads");

    let broken = dir.path().join("broken.csv");
    std::fs::write(&broken, "Sex,Length,Rings\nM,0.5,9\n").expect("writes");
    config.dataset_path = broken;

    let error = run_training(&config, &contract)
        .await
        .expect_err("missing columns");
    assert!(error.is_data_error());
    assert_eq!(std::fs::read(&artifact_path).expect("reads"), good);
}

#[tokio::test]
async fn service_refuses_to_serve_without_artifact() {
    let dir = TempDir::new().expect("temp dir");
    let service = InferenceService::new(FeatureContract::abalone(), dir.path().join("absent.json"));

    let error = service.predict(&toy_request(0)).await.expect_err("no model");
    assert!(matches!(error, ModelError::ModelNotLoaded { .. }));
    assert_eq!(service.status(), ModelStatus::FailedToLoad);
    assert!(service.info().error.is_some());
}
