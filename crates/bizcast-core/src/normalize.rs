//! Affine feature normalization
//!
//! The model was trained on scaled inputs and scaled targets, so inference must
//! apply exactly the same per-feature transforms: `forward` on the features and
//! `inverse` on the network output. A mismatch produces wrong numbers without
//! any error, which is why the artifact can be pinned to a weight file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Number of features on each side of the model
pub const FEATURE_COUNT: usize = 3;

/// Per-feature `(x - offset) * scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub offset: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl AffineTransform {
    /// Build a transform, rejecting scales that cannot be inverted
    pub fn new(offset: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Result<Self> {
        for (i, s) in scale.iter().enumerate() {
            if !s.is_finite() || *s == 0.0 {
                return Err(Error::InvalidParams(format!(
                    "scale[{}] must be finite and non-zero, got {}",
                    i, s
                )));
            }
        }
        if offset.iter().any(|o| !o.is_finite()) {
            return Err(Error::InvalidParams("offset must be finite".into()));
        }
        Ok(Self { offset, scale })
    }

    pub fn identity() -> Self {
        Self {
            offset: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }

    pub fn forward(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        std::array::from_fn(|i| (x[i] - self.offset[i]) * self.scale[i])
    }

    pub fn inverse(&self, y: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        std::array::from_fn(|i| y[i] / self.scale[i] + self.offset[i])
    }
}

/// Serialized scaler parameters, converted to an `AffineTransform` on load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    /// Raw offset/scale pairs
    Affine {
        offset: [f64; FEATURE_COUNT],
        scale: [f64; FEATURE_COUNT],
    },
    /// Standardization: `(x - mean) / std`
    Standard {
        mean: [f64; FEATURE_COUNT],
        std: [f64; FEATURE_COUNT],
    },
    /// Min-max scaling into [0, 1]
    MinMax {
        min: [f64; FEATURE_COUNT],
        max: [f64; FEATURE_COUNT],
    },
}

impl ScalerParams {
    pub fn to_transform(&self) -> Result<AffineTransform> {
        match self {
            Self::Affine { offset, scale } => AffineTransform::new(*offset, *scale),
            Self::Standard { mean, std } => {
                if let Some(i) = std.iter().position(|s| *s == 0.0) {
                    return Err(Error::InvalidParams(format!("std[{}] is zero", i)));
                }
                AffineTransform::new(*mean, std::array::from_fn(|i| 1.0 / std[i]))
            }
            Self::MinMax { min, max } => {
                if let Some(i) = (0..FEATURE_COUNT).position(|i| max[i] == min[i]) {
                    return Err(Error::InvalidParams(format!(
                        "feature {} has an empty range",
                        i
                    )));
                }
                AffineTransform::new(*min, std::array::from_fn(|i| 1.0 / (max[i] - min[i])))
            }
        }
    }
}

/// On-disk layout of the normalization artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationFile {
    #[serde(default)]
    pub version: Option<String>,
    /// SHA-256 of the weight file these parameters were fit alongside
    #[serde(default)]
    pub model_sha256: Option<String>,
    pub input: ScalerParams,
    pub output: ScalerParams,
}

/// Input and output transforms for one trained model
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationStore {
    pub input: AffineTransform,
    pub output: AffineTransform,
    pub version: Option<String>,
    pub model_sha256: Option<String>,
}

impl NormalizationStore {
    pub fn new(input: AffineTransform, output: AffineTransform) -> Self {
        Self {
            input,
            output,
            version: None,
            model_sha256: None,
        }
    }

    pub fn from_file_contents(file: NormalizationFile) -> Result<Self> {
        Ok(Self {
            input: file.input.to_transform()?,
            output: file.output.to_transform()?,
            version: file.version,
            model_sha256: file.model_sha256.map(|h| h.to_lowercase()),
        })
    }

    /// Load from a JSON artifact
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::artifact(path.display(), e))?;
        let file: NormalizationFile =
            serde_json::from_str(&content).map_err(|e| Error::artifact(path.display(), e))?;
        let store = Self::from_file_contents(file).map_err(|e| match e {
            Error::InvalidParams(reason) => Error::artifact(path.display(), reason),
            other => other,
        })?;
        debug!(
            "Loaded normalization parameters from {} (version {:?})",
            path.display(),
            store.version
        );
        Ok(store)
    }

    pub fn normalize_input(&self, x: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        self.input.forward(x)
    }

    pub fn denormalize_output(&self, y: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        self.output.inverse(y)
    }
}
