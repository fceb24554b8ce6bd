//! Normalize → infer → denormalize
//!
//! Turns raw aggregated features into predictions in currency units. The
//! normalization parameters and the model are injected at construction and are
//! never mutated afterwards.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{RegressionModel, Regressor};
use crate::models::{FeatureVector, PredictionResult};
use crate::normalize::NormalizationStore;

pub struct InferencePipeline<M = RegressionModel> {
    normalization: NormalizationStore,
    model: M,
}

impl<M: Regressor> InferencePipeline<M> {
    pub fn new(normalization: NormalizationStore, model: M) -> Self {
        Self {
            normalization,
            model,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        let scaled = self.normalization.normalize_input(&features.to_array());
        let raw = self.model.forward(&scaled)?;
        Ok(PredictionResult::from(
            self.normalization.denormalize_output(&raw),
        ))
    }

    pub fn normalization(&self) -> &NormalizationStore {
        &self.normalization
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl InferencePipeline<RegressionModel> {
    /// Load both artifacts and check that they belong together
    pub fn load(model_path: &Path, normalization_path: &Path) -> Result<Self> {
        let model = RegressionModel::load(model_path)?;
        let normalization = NormalizationStore::load(normalization_path)?;
        check_pinning(&model, &normalization)?;

        info!(
            "Loaded model {} (topology {:?})",
            model.version().unwrap_or("unversioned"),
            model.topology()
        );
        Ok(Self::new(normalization, model))
    }
}

/// Reject normalization parameters fit for a different set of weights
pub fn check_pinning(model: &RegressionModel, normalization: &NormalizationStore) -> Result<()> {
    if let (Some(expected), Some(actual)) = (&normalization.model_sha256, model.fingerprint()) {
        if expected != actual {
            return Err(Error::ArtifactMismatch(format!(
                "normalization parameters were fit for model {} but loaded weights are {}",
                expected, actual
            )));
        }
    }
    if let (Some(a), Some(b)) = (&normalization.version, model.version()) {
        if a != b {
            return Err(Error::ArtifactMismatch(format!(
                "normalization version {} does not match model version {}",
                a, b
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::AffineTransform;
    use crate::test_utils::{fixture_model, identity_model, identity_normalization};
    use std::fs;
    use std::path::PathBuf;

    /// Swaps capital and loss, leaves profit alone
    struct SwapModel;

    impl Regressor for SwapModel {
        fn forward(&self, input: &[f64; 3]) -> Result<[f64; 3]> {
            Ok([input[2], input[1], input[0]])
        }
    }

    struct BrokenModel;

    impl Regressor for BrokenModel {
        fn forward(&self, _input: &[f64; 3]) -> Result<[f64; 3]> {
            Err(Error::ModelShape("fixture".into()))
        }
    }

    fn store() -> NormalizationStore {
        NormalizationStore::new(
            AffineTransform::new([1000.0, 500.0, 0.5], [0.001, 0.002, 2.0]).unwrap(),
            AffineTransform::new([100.0, 200.0, 300.0], [0.1, 0.1, 0.1]).unwrap(),
        )
    }

    #[test]
    fn test_predict_applies_transforms_in_order() {
        let pipeline = InferencePipeline::new(store(), SwapModel);
        // scaled input = [1.0, -0.2, -1.0]; swapped = [-1.0, -0.2, 1.0]
        // denormalized = [-1/0.1 + 100, -0.2/0.1 + 200, 1/0.1 + 300]
        let result = pipeline
            .predict(&FeatureVector::new(2000.0, 400.0, 0.0))
            .unwrap();
        assert!((result.capital - 90.0).abs() < 1e-9);
        assert!((result.profit - 198.0).abs() < 1e-9);
        assert!((result.loss - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_identity_model_round_trips_through_matching_transforms() {
        let t = AffineTransform::new([1500.0, 700.0, 0.5], [1.0 / 900.0, 1.0 / 350.0, 3.0])
            .unwrap();
        let pipeline =
            InferencePipeline::new(NormalizationStore::new(t.clone(), t), identity_model());

        let result = pipeline
            .predict(&FeatureVector::new(1000.0, 400.0, 0.375))
            .unwrap();
        assert!((result.capital - 1000.0).abs() < 1e-6);
        assert!((result.profit - 400.0).abs() < 1e-6);
        assert!((result.loss - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_layer_network_with_identity_transforms() {
        let pipeline = InferencePipeline::new(identity_normalization(), fixture_model());

        let result = pipeline
            .predict(&FeatureVector::new(3.0, 1.0, 0.5))
            .unwrap();
        assert_eq!(result, PredictionResult::from([4.0, 2.0, 0.0]));

        let result = pipeline
            .predict(&FeatureVector::new(1.0, 4.0, 0.5))
            .unwrap();
        assert_eq!(result, PredictionResult::from([5.0, 0.0, 3.0]));
    }

    #[test]
    fn test_model_errors_propagate() {
        let pipeline = InferencePipeline::new(store(), BrokenModel);
        assert!(matches!(
            pipeline.predict(&FeatureVector::new(1.0, 1.0, 0.0)),
            Err(Error::ModelShape(_))
        ));
    }

    fn write_artifacts(
        dir: &Path,
        model_sha: Option<&str>,
        norm_version: &str,
    ) -> (PathBuf, PathBuf) {
        let model_path = dir.join("model.json");
        fs::write(
            &model_path,
            r#"{"version": "v1", "layers": [{"weights": [[1,0,0],[0,1,0],[0,0,1]], "bias": [0,0,0]}]}"#,
        )
        .unwrap();
        let sha = model_sha
            .map(|s| format!(r#""model_sha256": "{}","#, s))
            .unwrap_or_default();
        let norm_path = dir.join("norm.json");
        fs::write(
            &norm_path,
            format!(
                r#"{{"version": "{}", {} "input": {{"kind": "affine", "offset": [0,0,0], "scale": [1,1,1]}},
                    "output": {{"kind": "affine", "offset": [0,0,0], "scale": [1,1,1]}}}}"#,
                norm_version, sha
            ),
        )
        .unwrap();
        (model_path, norm_path)
    }

    #[test]
    fn test_load_with_matching_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, _) = write_artifacts(dir.path(), None, "v1");
        let sha = crate::model::sha256_hex(&fs::read(&model_path).unwrap());
        let (model_path, norm_path) = write_artifacts(dir.path(), Some(&sha), "v1");

        let pipeline = InferencePipeline::load(&model_path, &norm_path).unwrap();
        let result = pipeline
            .predict(&FeatureVector::new(5.0, 6.0, 0.5))
            .unwrap();
        assert_eq!(result, PredictionResult::from([5.0, 6.0, 0.5]));
    }

    #[test]
    fn test_load_rejects_fingerprint_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, norm_path) = write_artifacts(dir.path(), Some("deadbeef"), "v1");
        assert!(matches!(
            InferencePipeline::load(&model_path, &norm_path),
            Err(Error::ArtifactMismatch(_))
        ));
    }

    #[test]
    fn test_load_rejects_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (model_path, norm_path) = write_artifacts(dir.path(), None, "v2");
        assert!(matches!(
            InferencePipeline::load(&model_path, &norm_path),
            Err(Error::ArtifactMismatch(_))
        ));
    }
}
