//! Transaction record storage
//!
//! Records live in a directory of `.json` and `.csv` files. Every scan reads the
//! directory from scratch so answers always reflect what is on disk. Parsing is
//! per record: a bad record becomes a `RecordParseError` outcome instead of
//! aborting the scan, and a file that cannot be parsed at all is skipped whole.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, RecordParseError, Result};
use crate::models::TransactionRecord;

/// Parameter dump written next to the records by the training tooling
const STATS_FILE_NAME: &str = "normalization_stats.json";

const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "waktu"];
const INCOME_FIELDS: &[&str] = &["total_income", "total_pemasukan"];
const EXPENSE_FIELDS: &[&str] = &["total_expense", "total_pengeluaran"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Outcome of parsing a single record
pub type RecordOutcome = std::result::Result<TransactionRecord, RecordParseError>;

/// Result of reading every record from a source once
#[derive(Debug, Default, Clone)]
pub struct RecordScan {
    pub outcomes: Vec<RecordOutcome>,
    /// Files that could not be read or parsed as a whole
    pub skipped_files: Vec<PathBuf>,
}

impl RecordScan {
    pub fn valid(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn invalid_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_err()).count()
    }
}

/// Read-only access to transaction records
pub trait RecordSource {
    /// Read every record. Each call is an independent snapshot.
    fn scan(&self) -> Result<RecordScan>;
}

/// Records stored as files in a directory
#[derive(Debug, Clone)]
pub struct DirectoryRecordStore {
    dir: PathBuf,
}

impl DirectoryRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Record files in a stable order
    fn record_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            Error::RecordSource(format!("Cannot read {}: {}", self.dir.display(), e))
        })?;
        Ok(self.select_record_files(entries.map(|entry| entry.map(|e| e.path()))))
    }

    /// Keep record files, skipping entries that cannot be read
    fn select_record_files<I>(&self, entries: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = io::Result<PathBuf>>,
    {
        let mut files = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.dir.display(), e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some(STATS_FILE_NAME) {
                continue;
            }
            if RecordFileKind::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        files
    }
}

impl RecordSource for DirectoryRecordStore {
    fn scan(&self) -> Result<RecordScan> {
        let mut scan = RecordScan::default();

        for path in self.record_files()? {
            let Some(kind) = RecordFileKind::from_path(&path) else {
                continue;
            };
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| match kind {
                    RecordFileKind::Json => parse_json_records(&content),
                    RecordFileKind::Csv => parse_csv_records(content.as_bytes()),
                });

            match parsed {
                Ok(outcomes) => {
                    debug!("Read {} records from {}", outcomes.len(), path.display());
                    scan.outcomes.extend(outcomes);
                }
                Err(e) => {
                    warn!("Skipping unreadable record file {}: {}", path.display(), e);
                    scan.skipped_files.push(path);
                }
            }
        }

        Ok(scan)
    }
}

/// In-memory records, mainly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryRecordStore {
    outcomes: Vec<RecordOutcome>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self {
            outcomes: records.into_iter().map(Ok).collect(),
        }
    }

    pub fn push(&mut self, record: TransactionRecord) {
        self.outcomes.push(Ok(record));
    }

    /// Add a record that failed to parse
    pub fn push_invalid(&mut self, error: RecordParseError) {
        self.outcomes.push(Err(error));
    }
}

impl RecordSource for MemoryRecordStore {
    fn scan(&self) -> Result<RecordScan> {
        Ok(RecordScan {
            outcomes: self.outcomes.clone(),
            skipped_files: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFileKind {
    Json,
    Csv,
}

impl RecordFileKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Parse a JSON array of record objects
pub fn parse_json_records(content: &str) -> std::result::Result<Vec<RecordOutcome>, String> {
    let items: Vec<Value> = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(items.iter().map(parse_json_record).collect())
}

fn parse_json_record(item: &Value) -> RecordOutcome {
    let obj = item.as_object().ok_or(RecordParseError::NotAnObject)?;
    let field = |names: &'static [&'static str]| {
        names
            .iter()
            .find_map(|name| obj.get(*name))
            .filter(|v| !v.is_null())
            .ok_or(RecordParseError::MissingField(names[0]))
    };

    let timestamp = match field(TIMESTAMP_FIELDS)? {
        Value::String(s) => parse_timestamp(s)?,
        other => return Err(RecordParseError::InvalidTimestamp(other.to_string())),
    };
    let total_income = json_number(field(INCOME_FIELDS)?, INCOME_FIELDS[0])?;
    let total_expense = json_number(field(EXPENSE_FIELDS)?, EXPENSE_FIELDS[0])?;

    Ok(TransactionRecord::new(timestamp, total_income, total_expense))
}

fn json_number(value: &Value, field: &'static str) -> std::result::Result<f64, RecordParseError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| RecordParseError::InvalidNumber {
            field,
            value: n.to_string(),
        }),
        Value::String(s) => parse_number(s, field),
        other => Err(RecordParseError::InvalidNumber {
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_number(s: &str, field: &'static str) -> std::result::Result<f64, RecordParseError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| RecordParseError::InvalidNumber {
            field,
            value: s.to_string(),
        })
}

/// Parse CSV records with a header row naming the record fields
pub fn parse_csv_records<R: std::io::Read>(
    reader: R,
) -> std::result::Result<Vec<RecordOutcome>, String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let columns = CsvColumns {
        timestamp: column(TIMESTAMP_FIELDS),
        income: column(INCOME_FIELDS),
        expense: column(EXPENSE_FIELDS),
    };

    let outcomes = rdr
        .records()
        .map(|result| match result {
            Ok(row) => parse_csv_row(&row, &columns),
            Err(e) => Err(RecordParseError::Malformed(e.to_string())),
        })
        .collect();

    Ok(outcomes)
}

/// Header positions of the record fields
struct CsvColumns {
    timestamp: Option<usize>,
    income: Option<usize>,
    expense: Option<usize>,
}

fn parse_csv_row(row: &StringRecord, columns: &CsvColumns) -> RecordOutcome {
    let cell = |col: Option<usize>, name: &'static str| {
        col.and_then(|i| row.get(i))
            .filter(|s| !s.is_empty())
            .ok_or(RecordParseError::MissingField(name))
    };

    let timestamp = parse_timestamp(cell(columns.timestamp, TIMESTAMP_FIELDS[0])?)?;
    let income = parse_number(cell(columns.income, INCOME_FIELDS[0])?, INCOME_FIELDS[0])?;
    let expense = parse_number(cell(columns.expense, EXPENSE_FIELDS[0])?, EXPENSE_FIELDS[0])?;

    Ok(TransactionRecord::new(timestamp, income, expense))
}

/// Parse an ISO-8601 timestamp into wall-clock time
///
/// Offset-bearing timestamps keep their own local time; bare dates map to midnight.
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, RecordParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(RecordParseError::InvalidTimestamp(s.to_string()))
}
