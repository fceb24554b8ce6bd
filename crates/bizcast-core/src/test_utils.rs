//! Test utilities for bizcast-core
//!
//! Fixture models, normalization stores and on-disk workspaces (record
//! directory plus artifacts) for unit, integration and CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ndarray::{array, Array1, Array2};
use serde_json::json;
use tempfile::TempDir;

use crate::model::{sha256_hex, Activation, DenseLayer, RegressionModel};
use crate::models::TransactionRecord;
use crate::normalize::{AffineTransform, NormalizationStore};

/// 3 → 3 identity network
pub fn identity_model() -> RegressionModel {
    let layer = DenseLayer::new(Array2::eye(3), Array1::zeros(3), Activation::Identity)
        .expect("identity layer");
    RegressionModel::from_layers(vec![layer]).expect("identity model")
}

/// Small 3 → 4 → 3 ReLU network with hand-picked weights
///
/// Outputs (normalized): capital = income + expense, profit = income - expense
/// when positive, loss = expense - income when positive.
pub fn fixture_model() -> RegressionModel {
    let hidden = DenseLayer::new(
        array![
            [1.0, -1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0]
        ],
        Array1::zeros(4),
        Activation::Relu,
    )
    .expect("hidden layer");
    let output = DenseLayer::new(
        array![
            [0.0, 0.0, 1.0, 1.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0]
        ],
        Array1::zeros(3),
        Activation::Identity,
    )
    .expect("output layer");
    RegressionModel::from_layers(vec![hidden, output]).expect("fixture model")
}

/// Transforms that leave values unchanged
pub fn identity_normalization() -> NormalizationStore {
    NormalizationStore::new(AffineTransform::identity(), AffineTransform::identity())
}

pub fn record(timestamp: NaiveDateTime, income: f64, expense: f64) -> TransactionRecord {
    TransactionRecord::new(timestamp, income, expense)
}

/// Write records as a JSON array in the on-disk record format
pub fn write_records_json(path: &Path, records: &[TransactionRecord]) {
    let items: Vec<_> = records
        .iter()
        .map(|r| {
            json!({
                "timestamp": r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "total_income": r.total_income,
                "total_expense": r.total_expense,
            })
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&items).expect("serialize"))
        .expect("write records");
}

/// JSON artifact for the 3 → 3 identity network
pub const IDENTITY_MODEL_JSON: &str = r#"{
  "version": "test-v1",
  "layers": [
    {"weights": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "bias": [0, 0, 0], "activation": "identity"}
  ]
}"#;

/// A temporary directory laid out like a deployment
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Records dir plus identity artifacts, pinned to each other
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("records")).expect("records dir");
        fs::create_dir_all(dir.path().join("model")).expect("model dir");

        let ws = Self { dir };
        fs::write(ws.model_path(), IDENTITY_MODEL_JSON).expect("write model");
        let normalization = json!({
            "version": "test-v1",
            "model_sha256": sha256_hex(IDENTITY_MODEL_JSON.as_bytes()),
            "input": {"kind": "affine", "offset": [0, 0, 0], "scale": [1, 1, 1]},
            "output": {"kind": "affine", "offset": [0, 0, 0], "scale": [1, 1, 1]},
        });
        fs::write(ws.normalization_path(), normalization.to_string()).expect("write norm");
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root().join("records")
    }

    pub fn model_path(&self) -> PathBuf {
        self.root().join("model").join("assistant.json")
    }

    pub fn normalization_path(&self) -> PathBuf {
        self.root().join("model").join("normalization.json")
    }

    /// Add a JSON record file under the records dir
    pub fn add_records(&self, file_name: &str, records: &[TransactionRecord]) {
        write_records_json(&self.records_dir().join(file_name), records);
    }

    /// Add a raw file under the records dir
    pub fn add_raw(&self, file_name: &str, content: &str) {
        fs::write(self.records_dir().join(file_name), content).expect("write raw records");
    }

    /// Config TOML pointing at this workspace
    pub fn config_toml(&self) -> String {
        format!(
            "[paths]\nrecords_dir = {:?}\nmodel = {:?}\nnormalization = {:?}\n\n[output]\ncurrency_symbol = \"Rp\"\n",
            self.records_dir().display().to_string(),
            self.model_path().display().to_string(),
            self.normalization_path().display().to_string(),
        )
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
