//! Domain models for bizcast

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// A single logged business event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub timestamp: NaiveDateTime,
    pub total_income: f64,
    pub total_expense: f64,
}

impl TransactionRecord {
    pub fn new(timestamp: NaiveDateTime, total_income: f64, total_expense: f64) -> Self {
        Self {
            timestamp,
            total_income,
            total_expense,
        }
    }

    /// Hour of day scaled into [0, 1)
    pub fn hour_fraction(&self) -> f64 {
        self.timestamp.hour() as f64 / 24.0
    }
}

/// Calendar-relative window a question refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    ThisYear,
    All,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
            Self::All => "all",
        }
    }

    /// Human-readable label for output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this week",
            Self::ThisMonth => "this month",
            Self::ThisYear => "this year",
            Self::All => "all time",
        }
    }

    pub fn all() -> &'static [TimeWindow] {
        &[
            Self::Today,
            Self::Yesterday,
            Self::ThisWeek,
            Self::ThisMonth,
            Self::ThisYear,
            Self::All,
        ]
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "this_week" | "week" => Ok(Self::ThisWeek),
            "this_month" | "month" => Ok(Self::ThisMonth),
            "this_year" | "year" => Ok(Self::ThisYear),
            "all" => Ok(Self::All),
            _ => Err(format!(
                "Unknown window: {}. Available: today, yesterday, this-week, this-month, this-year, all",
                s
            )),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which predicted quantity the user asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMetric {
    Capital,
    Profit,
    Loss,
}

impl TargetMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capital => "capital",
            Self::Profit => "profit",
            Self::Loss => "loss",
        }
    }
}

impl std::str::FromStr for TargetMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "capital" => Ok(Self::Capital),
            "profit" => Ok(Self::Profit),
            "loss" => Ok(Self::Loss),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

impl std::fmt::Display for TargetMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model input features, in training column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub mean_income: f64,
    pub mean_expense: f64,
    /// Mean of `hour / 24` over the matched records, in [0, 1)
    pub mean_normalized_hour: f64,
}

impl FeatureVector {
    pub fn new(mean_income: f64, mean_expense: f64, mean_normalized_hour: f64) -> Self {
        Self {
            mean_income,
            mean_expense,
            mean_normalized_hour,
        }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.mean_income, self.mean_expense, self.mean_normalized_hour]
    }
}

impl From<[f64; 3]> for FeatureVector {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Model output in original currency units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub capital: f64,
    pub profit: f64,
    pub loss: f64,
}

impl PredictionResult {
    pub fn get(&self, metric: TargetMetric) -> f64 {
        match metric {
            TargetMetric::Capital => self.capital,
            TargetMetric::Profit => self.profit,
            TargetMetric::Loss => self.loss,
        }
    }
}

impl From<[f64; 3]> for PredictionResult {
    fn from(v: [f64; 3]) -> Self {
        Self {
            capital: v[0],
            profit: v[1],
            loss: v[2],
        }
    }
}
