//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration plus CLI path overrides
//! - `open_assistant` - Load artifacts once and wire up the assistant
//! - Output formatting for answers and amounts

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bizcast_core::{
    Answer, Assistant, AssistantConfig, DirectoryRecordStore, InferencePipeline, TargetMetric,
};
use tracing::debug;

/// Paths given on the command line, taking precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct PathOverrides {
    pub records: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub normalization: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>, overrides: PathOverrides) -> Result<AssistantConfig> {
    let mut config = AssistantConfig::load(path).context("Failed to load configuration")?;

    if let Some(records) = overrides.records {
        config.records_dir = records;
    }
    if let Some(model) = overrides.model {
        config.model_path = model;
    }
    if let Some(normalization) = overrides.normalization {
        config.normalization_path = normalization;
    }

    debug!("Using config: {:?}", config);
    Ok(config)
}

/// Load the model and normalization artifacts and build the assistant
pub fn open_assistant(config: &AssistantConfig) -> Result<Assistant<DirectoryRecordStore>> {
    let pipeline = InferencePipeline::load(&config.model_path, &config.normalization_path)
        .context("Failed to load model artifacts")?;
    Ok(Assistant::new(
        config.extractor(),
        DirectoryRecordStore::new(&config.records_dir),
        pipeline,
    ))
}

/// Format an amount with thousands separators, e.g. `1,234,567`
pub fn format_amount(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Avoid "-0" when a small negative rounds away
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

fn metric_title(metric: TargetMetric) -> &'static str {
    match metric {
        TargetMetric::Capital => "Capital",
        TargetMetric::Profit => "Profit",
        TargetMetric::Loss => "Loss",
    }
}

/// Two-line human answer
pub fn format_answer(answer: &Answer, config: &AssistantConfig) -> String {
    format!(
        "📊 Prediction for {}:\n→ {} is estimated at {} {}",
        answer.window.label(),
        metric_title(answer.metric),
        config.currency_symbol,
        format_amount(answer.value, config.decimals)
    )
}
