//! Question answering: extract → aggregate → predict → select

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::aggregate::{TemporalAggregator, WindowSummary};
use crate::error::Result;
use crate::extract::EntityExtractor;
use crate::model::{RegressionModel, Regressor};
use crate::models::{PredictionResult, TargetMetric, TimeWindow};
use crate::pipeline::InferencePipeline;
use crate::records::RecordSource;

/// Answer to one question
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub window: TimeWindow,
    pub metric: TargetMetric,
    /// The prediction for `metric`
    pub value: f64,
    pub prediction: PredictionResult,
    pub summary: WindowSummary,
}

pub struct Assistant<S, M = RegressionModel> {
    extractor: EntityExtractor,
    aggregator: TemporalAggregator<S>,
    pipeline: InferencePipeline<M>,
}

impl<S: RecordSource, M: Regressor> Assistant<S, M> {
    pub fn new(extractor: EntityExtractor, source: S, pipeline: InferencePipeline<M>) -> Self {
        Self {
            extractor,
            aggregator: TemporalAggregator::new(source),
            pipeline,
        }
    }

    pub fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_at(question, Local::now().naive_local())
    }

    /// Answer relative to an explicit "now"
    pub fn answer_at(&self, question: &str, now: NaiveDateTime) -> Result<Answer> {
        let (window, metric) = self.extractor.extract(question);
        let summary = self.aggregator.summarize_at(window, now)?;
        let prediction = self.pipeline.predict(&summary.features)?;

        Ok(Answer {
            window,
            metric,
            value: prediction.get(metric),
            prediction,
            summary,
        })
    }
}
