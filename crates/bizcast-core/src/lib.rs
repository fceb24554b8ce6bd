//! bizcast Core Library
//!
//! Answers free-text questions about a small business's finances:
//! - Rule-based extraction of a time window and target metric
//! - Calendar-windowed aggregation of transaction records into model features
//! - Normalize → feed-forward regression → denormalize inference
//! - Layered TOML configuration

pub mod aggregate;
pub mod assistant;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod records;

/// Fixture models, artifacts and record workspaces
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{TemporalAggregator, WindowSummary};
pub use assistant::{Answer, Assistant};
pub use config::AssistantConfig;
pub use error::{Error, RecordParseError, Result};
pub use extract::{EntityExtractor, KeywordTable};
pub use model::{Activation, DenseLayer, RegressionModel, Regressor};
pub use models::{FeatureVector, PredictionResult, TargetMetric, TimeWindow, TransactionRecord};
pub use normalize::{AffineTransform, NormalizationStore, ScalerParams};
pub use pipeline::InferencePipeline;
pub use records::{DirectoryRecordStore, MemoryRecordStore, RecordScan, RecordSource};
