//! Time-windowed feature aggregation
//!
//! Window predicates are calendar-relative to "now" taken at call time, so the
//! same question can select different records on either side of a day, week,
//! month or year boundary.

use chrono::{Datelike, Duration, Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{FeatureVector, TimeWindow, TransactionRecord};
use crate::records::RecordSource;

/// Whether `ts` falls inside `window` relative to `now`
pub fn window_contains(window: TimeWindow, ts: &NaiveDateTime, now: &NaiveDateTime) -> bool {
    let date = ts.date();
    let today = now.date();
    match window {
        TimeWindow::Today => date == today,
        TimeWindow::Yesterday => Some(date) == today.checked_sub_signed(Duration::days(1)),
        TimeWindow::ThisWeek => {
            let (a, b) = (date.iso_week(), today.iso_week());
            a.year() == b.year() && a.week() == b.week()
        }
        TimeWindow::ThisMonth => date.year() == today.year() && date.month() == today.month(),
        TimeWindow::ThisYear => date.year() == today.year(),
        TimeWindow::All => true,
    }
}

/// Features for a window plus how the scan went
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub window: TimeWindow,
    pub features: FeatureVector,
    /// Records inside the window
    pub matched: usize,
    /// Records rejected while parsing
    pub skipped: usize,
    /// Files rejected as a whole
    pub skipped_files: usize,
}

/// Reduces records in a window to the three model features
pub struct TemporalAggregator<S> {
    source: S,
}

impl<S: RecordSource> TemporalAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Mean income, mean expense and mean hour fraction for `window`
    pub fn aggregate(&self, window: TimeWindow) -> Result<FeatureVector> {
        self.summarize(window).map(|s| s.features)
    }

    pub fn aggregate_at(&self, window: TimeWindow, now: NaiveDateTime) -> Result<FeatureVector> {
        self.summarize_at(window, now).map(|s| s.features)
    }

    pub fn summarize(&self, window: TimeWindow) -> Result<WindowSummary> {
        self.summarize_at(window, Local::now().naive_local())
    }

    pub fn summarize_at(&self, window: TimeWindow, now: NaiveDateTime) -> Result<WindowSummary> {
        let scan = self.source.scan()?;

        let mut skipped = 0;
        let mut matched: Vec<&TransactionRecord> = Vec::new();
        for outcome in &scan.outcomes {
            match outcome {
                Ok(record) if window_contains(window, &record.timestamp, &now) => {
                    matched.push(record)
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Skipping record: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 || !scan.skipped_files.is_empty() {
            warn!(
                "Skipped {} malformed records and {} unreadable files",
                skipped,
                scan.skipped_files.len()
            );
        }

        let features = mean_features(&matched).ok_or(Error::NoMatchingData { window })?;
        debug!(
            "Aggregated {} records for {}: {:?}",
            matched.len(),
            window,
            features
        );

        Ok(WindowSummary {
            window,
            features,
            matched: matched.len(),
            skipped,
            skipped_files: scan.skipped_files.len(),
        })
    }
}

/// Arithmetic means over the records, or None when there are none
fn mean_features(records: &[&TransactionRecord]) -> Option<FeatureVector> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    let (income, expense, hour) = records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (
            acc.0 + r.total_income,
            acc.1 + r.total_expense,
            acc.2 + r.hour_fraction(),
        )
    });
    Some(FeatureVector::new(income / n, expense / n, hour / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordParseError;
    use crate::records::MemoryRecordStore;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record(ts: NaiveDateTime, income: f64, expense: f64) -> TransactionRecord {
        TransactionRecord::new(ts, income, expense)
    }

    // Wednesday of ISO week 20, 2024
    fn now() -> NaiveDateTime {
        at(2024, 5, 15, 16)
    }

    #[test]
    fn test_window_predicates() {
        let now = now();
        assert!(window_contains(TimeWindow::Today, &at(2024, 5, 15, 0), &now));
        assert!(!window_contains(TimeWindow::Today, &at(2024, 5, 14, 23), &now));

        assert!(window_contains(TimeWindow::Yesterday, &at(2024, 5, 14, 23), &now));
        assert!(!window_contains(TimeWindow::Yesterday, &at(2024, 5, 15, 1), &now));

        // Monday through Sunday of the same ISO week
        assert!(window_contains(TimeWindow::ThisWeek, &at(2024, 5, 13, 8), &now));
        assert!(window_contains(TimeWindow::ThisWeek, &at(2024, 5, 19, 8), &now));
        assert!(!window_contains(TimeWindow::ThisWeek, &at(2024, 5, 12, 8), &now));
        // Same week number, different year
        assert!(!window_contains(TimeWindow::ThisWeek, &at(2023, 5, 17, 8), &now));

        assert!(window_contains(TimeWindow::ThisMonth, &at(2024, 5, 1, 0), &now));
        assert!(!window_contains(TimeWindow::ThisMonth, &at(2023, 5, 15, 0), &now));

        assert!(window_contains(TimeWindow::ThisYear, &at(2024, 1, 1, 0), &now));
        assert!(!window_contains(TimeWindow::ThisYear, &at(2023, 12, 31, 23), &now));

        assert!(window_contains(TimeWindow::All, &at(1999, 1, 1, 0), &now));
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let now = at(2024, 3, 1, 9);
        assert!(window_contains(TimeWindow::Yesterday, &at(2024, 2, 29, 20), &now));
    }

    #[test]
    fn test_this_week_across_year_boundary() {
        // 2024-12-30 belongs to ISO week 1 of 2025
        let now = at(2025, 1, 2, 12);
        assert!(window_contains(TimeWindow::ThisWeek, &at(2024, 12, 30, 12), &now));
        assert!(!window_contains(TimeWindow::ThisYear, &at(2024, 12, 30, 12), &now));
    }

    #[test]
    fn test_aggregate_exact_means() {
        let store = MemoryRecordStore::new(vec![
            record(at(2024, 5, 15, 6), 1000.0, 400.0),
            record(at(2024, 5, 15, 18), 500.0, 100.0),
            record(at(2024, 4, 1, 12), 99999.0, 99999.0),
        ]);
        let aggregator = TemporalAggregator::new(store);

        let features = aggregator.aggregate_at(TimeWindow::Today, now()).unwrap();
        assert_eq!(features.mean_income, 750.0);
        assert_eq!(features.mean_expense, 250.0);
        assert_eq!(features.mean_normalized_hour, (0.25 + 0.75) / 2.0);
    }

    #[test]
    fn test_aggregate_no_match_is_error() {
        let store = MemoryRecordStore::new(vec![record(at(2024, 4, 1, 12), 1.0, 1.0)]);
        let aggregator = TemporalAggregator::new(store);

        let err = aggregator
            .aggregate_at(TimeWindow::ThisWeek, now())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NoMatchingData {
                window: TimeWindow::ThisWeek
            }
        ));
    }

    #[test]
    fn test_aggregate_empty_store_all_window() {
        let aggregator = TemporalAggregator::new(MemoryRecordStore::default());
        assert!(matches!(
            aggregator.aggregate_at(TimeWindow::All, now()),
            Err(Error::NoMatchingData {
                window: TimeWindow::All
            })
        ));
    }

    #[test]
    fn test_malformed_records_are_skipped_not_fatal() {
        let mut store = MemoryRecordStore::new(vec![record(at(2024, 5, 15, 12), 300.0, 100.0)]);
        store.push_invalid(RecordParseError::InvalidTimestamp("garbage".into()));
        store.push_invalid(RecordParseError::MissingField("total_income"));
        store.push(record(at(2024, 5, 15, 0), 100.0, 300.0));
        let aggregator = TemporalAggregator::new(store);

        let summary = aggregator.summarize_at(TimeWindow::Today, now()).unwrap();
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.features.mean_income, 200.0);
        assert_eq!(summary.features.mean_expense, 200.0);
        assert_eq!(summary.features.mean_normalized_hour, 0.25);
    }

    #[test]
    fn test_all_window_uses_every_valid_record() {
        let mut store = MemoryRecordStore::new(vec![
            record(at(2020, 1, 1, 0), 10.0, 0.0),
            record(at(2024, 5, 15, 12), 20.0, 0.0),
            record(at(2030, 6, 1, 12), 30.0, 0.0),
        ]);
        store.push_invalid(RecordParseError::NotAnObject);
        let aggregator = TemporalAggregator::new(store);

        let summary = aggregator.summarize_at(TimeWindow::All, now()).unwrap();
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.features.mean_income, 20.0);
    }

    #[test]
    fn test_mean_hour_stays_below_one() {
        let store = MemoryRecordStore::new(vec![record(at(2024, 5, 15, 23), 1.0, 1.0)]);
        let aggregator = TemporalAggregator::new(store);
        let features = aggregator.aggregate_at(TimeWindow::Today, now()).unwrap();
        assert!(features.mean_normalized_hour < 1.0);
        assert_eq!(features.mean_normalized_hour, 23.0 / 24.0);
    }
}
