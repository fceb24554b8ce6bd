//! Assistant configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/bizcast/config/assistant.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::extract::EntityExtractor;
use crate::models::{TargetMetric, TimeWindow};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/assistant.toml");

/// Resolved assistant configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Directory of transaction record files
    pub records_dir: PathBuf,
    /// Model weight artifact
    pub model_path: PathBuf,
    /// Normalization parameter artifact
    pub normalization_path: PathBuf,
    pub currency_symbol: String,
    /// Decimal places shown for predicted amounts
    pub decimals: usize,
    /// Extra time phrases appended after the built-in rules
    pub time_phrases: Vec<(String, TimeWindow)>,
    /// Extra metric phrases appended after the built-in rules
    pub metric_phrases: Vec<(String, TargetMetric)>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from("data/records"),
            model_path: PathBuf::from("model/assistant.json"),
            normalization_path: PathBuf::from("model/normalization.json"),
            currency_symbol: "Rp".to_string(),
            decimals: 0,
            time_phrases: Vec::new(),
            metric_phrases: Vec::new(),
        }
    }
}

impl AssistantConfig {
    /// Load configuration (override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                None
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        let content = match path {
            Some(ref path) => {
                debug!("Reading config from {}", path.display());
                fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
            }
            None => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }

    /// Entity extractor with the configured extra phrases
    pub fn extractor(&self) -> EntityExtractor {
        EntityExtractor::new().with_extra_phrases(
            self.time_phrases.iter().map(|(p, w)| (p.as_str(), *w)),
            self.metric_phrases.iter().map(|(p, m)| (p.as_str(), *m)),
        )
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bizcast").join("config").join("assistant.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    paths: Option<RawPaths>,
    output: Option<RawOutput>,
    phrases: Option<RawPhrases>,
}

#[derive(Debug, Deserialize)]
struct RawPaths {
    records_dir: Option<PathBuf>,
    model: Option<PathBuf>,
    normalization: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    currency_symbol: Option<String>,
    decimals: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawPhrases {
    #[serde(default)]
    time: Vec<RawPhrase>,
    #[serde(default)]
    metric: Vec<RawPhrase>,
}

#[derive(Debug, Deserialize)]
struct RawPhrase {
    phrase: String,
    value: String,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<AssistantConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AssistantConfig::default();

    if let Some(paths) = raw.paths {
        if let Some(dir) = paths.records_dir {
            config.records_dir = dir;
        }
        if let Some(model) = paths.model {
            config.model_path = model;
        }
        if let Some(normalization) = paths.normalization {
            config.normalization_path = normalization;
        }
    }

    if let Some(output) = raw.output {
        if let Some(symbol) = output.currency_symbol {
            config.currency_symbol = symbol;
        }
        if let Some(decimals) = output.decimals {
            config.decimals = decimals;
        }
    }

    if let Some(phrases) = raw.phrases {
        for p in phrases.time {
            let window = p.value.parse::<TimeWindow>().map_err(Error::Config)?;
            config.time_phrases.push((p.phrase, window));
        }
        for p in phrases.metric {
            let metric = p.value.parse::<TargetMetric>().map_err(Error::Config)?;
            config.metric_phrases.push((p.phrase, metric));
        }
    }

    Ok(config)
}
