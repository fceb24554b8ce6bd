//! Feed-forward regression model
//!
//! A stack of dense layers mapping the 3 input features to 3 outputs
//! (capital, profit, loss), all in normalized space. Weights are loaded once
//! from a JSON artifact and never change; the forward pass is deterministic.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::normalize::FEATURE_COUNT;

/// Anything that maps a normalized 3-vector to a normalized 3-vector
pub trait Regressor {
    fn forward(&self, input: &[f64; FEATURE_COUNT]) -> Result<[f64; FEATURE_COUNT]>;
}

/// Element-wise activation applied after a layer's affine step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
        }
    }

    fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// `activation(W·x + b)` with W shaped (outputs, inputs)
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Array2<f64>, bias: Array1<f64>, activation: Activation) -> Result<Self> {
        if weights.nrows() == 0 || weights.ncols() == 0 {
            return Err(Error::ModelShape("layer has no weights".into()));
        }
        if bias.len() != weights.nrows() {
            return Err(Error::ModelShape(format!(
                "bias has {} entries but layer has {} outputs",
                bias.len(),
                weights.nrows()
            )));
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    /// Build from row-major nested vectors (one row per output unit)
    pub fn from_rows(rows: Vec<Vec<f64>>, bias: Vec<f64>, activation: Activation) -> Result<Self> {
        let n_out = rows.len();
        let n_in = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = rows.iter().position(|r| r.len() != n_in) {
            return Err(Error::ModelShape(format!(
                "weight row {} has {} columns, expected {}",
                row,
                rows[row].len(),
                n_in
            )));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((n_out, n_in), flat)
            .map_err(|e| Error::ModelShape(e.to_string()))?;
        Self::new(weights, Array1::from(bias), activation)
    }

    pub fn inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        let activation = self.activation;
        (self.weights.dot(x) + &self.bias).mapv(|v| activation.apply(v))
    }
}

#[derive(Debug, Deserialize)]
struct LayerSpec {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    #[serde(default)]
    activation: Activation,
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    version: Option<String>,
    layers: Vec<LayerSpec>,
}

/// Trained network with a validated 3 → … → 3 topology
#[derive(Debug, Clone)]
pub struct RegressionModel {
    layers: Vec<DenseLayer>,
    version: Option<String>,
    fingerprint: Option<String>,
}

impl RegressionModel {
    /// Validate that layers chain together and honour the 3-in/3-out contract
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        let first = layers
            .first()
            .ok_or_else(|| Error::ModelShape("model has no layers".into()))?;
        if first.inputs() != FEATURE_COUNT {
            return Err(Error::ModelShape(format!(
                "first layer takes {} inputs, expected {}",
                first.inputs(),
                FEATURE_COUNT
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(Error::ModelShape(format!(
                    "layer {} emits {} values but layer {} takes {}",
                    i,
                    pair[0].outputs(),
                    i + 1,
                    pair[1].inputs()
                )));
            }
        }
        let last = layers.last().map(DenseLayer::outputs).unwrap_or(0);
        if last != FEATURE_COUNT {
            return Err(Error::ModelShape(format!(
                "last layer emits {} values, expected {}",
                last, FEATURE_COUNT
            )));
        }

        Ok(Self {
            layers,
            version: None,
            fingerprint: None,
        })
    }

    /// Load a JSON weight artifact and fingerprint its bytes
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::artifact(path.display(), e))?;
        let file: ModelFile =
            serde_json::from_slice(&bytes).map_err(|e| Error::artifact(path.display(), e))?;

        let layers = file
            .layers
            .into_iter()
            .map(|l| DenseLayer::from_rows(l.weights, l.bias, l.activation))
            .collect::<Result<Vec<_>>>()?;
        let mut model = Self::from_layers(layers)?;
        model.version = file.version;
        model.fingerprint = Some(sha256_hex(&bytes));

        debug!(
            "Loaded model from {} with topology {:?}",
            path.display(),
            model.topology()
        );
        Ok(model)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// SHA-256 of the artifact this model was loaded from
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Unit counts from input to output, e.g. `[3, 16, 3]`
    pub fn topology(&self) -> Vec<usize> {
        std::iter::once(FEATURE_COUNT)
            .chain(self.layers.iter().map(DenseLayer::outputs))
            .collect()
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }
}

impl Regressor for RegressionModel {
    fn forward(&self, input: &[f64; FEATURE_COUNT]) -> Result<[f64; FEATURE_COUNT]> {
        let mut x = Array1::from(input.to_vec());
        for layer in &self.layers {
            if x.len() != layer.inputs() {
                return Err(Error::ModelShape(format!(
                    "layer expects {} inputs, got {}",
                    layer.inputs(),
                    x.len()
                )));
            }
            x = layer.forward(&x);
        }
        match x.as_slice() {
            Some(&[a, b, c]) => Ok([a, b, c]),
            _ => Err(Error::ModelShape(format!(
                "model produced {} outputs, expected {}",
                x.len(),
                FEATURE_COUNT
            ))),
        }
    }
}

/// Lowercase hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn identity_layer(n: usize, activation: Activation) -> DenseLayer {
        DenseLayer::new(Array2::eye(n), Array1::zeros(n), activation).unwrap()
    }

    #[test]
    fn test_identity_network() {
        let model = RegressionModel::from_layers(vec![identity_layer(3, Activation::Identity)])
            .unwrap();
        assert_eq!(model.forward(&[1.0, -2.0, 3.0]).unwrap(), [1.0, -2.0, 3.0]);
        assert_eq!(model.topology(), vec![3, 3]);
    }

    #[test]
    fn test_hidden_layer_with_relu() {
        // Hidden: [x0 + x1, x0 - x1]; relu; output: [h0, h1, h0 + h1]
        let hidden = DenseLayer::new(
            array![[1.0, 1.0, 0.0], [1.0, -1.0, 0.0]],
            array![0.0, 0.0],
            Activation::Relu,
        )
        .unwrap();
        let output = DenseLayer::new(
            array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            array![0.5, 0.0, -1.0],
            Activation::Identity,
        )
        .unwrap();
        let model = RegressionModel::from_layers(vec![hidden, output]).unwrap();

        assert_eq!(model.topology(), vec![3, 2, 3]);
        // h = relu([1, -3]) = [1, 0]
        assert_eq!(model.forward(&[-1.0, 2.0, 9.0]).unwrap(), [1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_activations() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
        assert_eq!(Activation::Tanh.apply(0.0), 0.0);
        assert_eq!(Activation::Identity.apply(-2.0), -2.0);
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let err = RegressionModel::from_layers(vec![identity_layer(4, Activation::Identity)])
            .unwrap_err();
        assert!(matches!(err, Error::ModelShape(_)));
    }

    #[test]
    fn test_rejects_wrong_output_width() {
        let layer = DenseLayer::new(Array2::zeros((2, 3)), Array1::zeros(2), Activation::Relu)
            .unwrap();
        assert!(matches!(
            RegressionModel::from_layers(vec![layer]),
            Err(Error::ModelShape(_))
        ));
    }

    #[test]
    fn test_rejects_unchained_layers() {
        let a = DenseLayer::new(Array2::zeros((8, 3)), Array1::zeros(8), Activation::Relu)
            .unwrap();
        let b = DenseLayer::new(Array2::zeros((3, 4)), Array1::zeros(3), Activation::Identity)
            .unwrap();
        assert!(matches!(
            RegressionModel::from_layers(vec![a, b]),
            Err(Error::ModelShape(_))
        ));
        assert!(RegressionModel::from_layers(Vec::new()).is_err());
    }

    #[test]
    fn test_layer_bias_mismatch() {
        assert!(matches!(
            DenseLayer::new(Array2::zeros((3, 3)), Array1::zeros(2), Activation::Identity),
            Err(Error::ModelShape(_))
        ));
        assert!(matches!(
            DenseLayer::from_rows(
                vec![vec![1.0, 2.0, 3.0], vec![1.0]],
                vec![0.0, 0.0],
                Activation::Identity
            ),
            Err(Error::ModelShape(_))
        ));
    }

    #[test]
    fn test_load_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let content = r#"{
            "version": "v1",
            "layers": [
                {"weights": [[1,0,0],[0,1,0],[0,0,1],[1,1,1]], "bias": [0,0,0,0], "activation": "relu"},
                {"weights": [[1,0,0,0],[0,1,0,0],[0,0,0,1]], "bias": [0,0,0]}
            ]
        }"#;
        fs::write(&path, content).unwrap();

        let model = RegressionModel::load(&path).unwrap();
        assert_eq!(model.version(), Some("v1"));
        assert_eq!(model.topology(), vec![3, 4, 3]);
        assert_eq!(model.layers()[1].activation(), Activation::Identity);
        assert_eq!(model.fingerprint(), Some(sha256_hex(content.as_bytes()).as_str()));
        assert_eq!(model.forward(&[1.0, 2.0, -3.0]).unwrap(), [1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_load_shape_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"layers": [{"weights": [[1,0],[0,1],[1,1]], "bias": [0,0,0]}]}"#,
        )
        .unwrap();
        assert!(matches!(RegressionModel::load(&path), Err(Error::ModelShape(_))));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            RegressionModel::load(&path),
            Err(Error::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
