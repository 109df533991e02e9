//! Decodes snapshot text into validated rows.
//!
//! A snapshot is CSV with a header row. Every data row is decoded on its own:
//! a bad row becomes a [`ParseError`] and is left out, and the remaining rows
//! are still returned. Rows come back in input order without deduplication,
//! which is left to the series store.

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::{
    config::ColumnMapping,
    models::{BucketKey, Row},
};

/// Why a single record (or the header) could not be turned into a row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The header does not contain a required column.
    #[error("header is missing required column '{0}'")]
    MissingColumn(String),

    /// The key field is absent or empty.
    #[error("missing bucket key")]
    MissingKey,

    /// The count field is absent, negative or not an integer.
    #[error("invalid count '{0}'")]
    InvalidCount(String),

    /// The anomaly field is not a recognised boolean token.
    #[error("invalid anomaly flag '{0}'")]
    InvalidFlag(String),

    /// The record could not be read at all.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A parse failure tied to its 1-based line in the snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// Line the offending record starts on.
    pub line: u64,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// The rows decoded from one snapshot, plus the records that were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Valid rows, in input order.
    pub rows: Vec<Row>,
    /// One entry per rejected record.
    pub errors: Vec<ParseError>,
}

/// Column positions resolved from the header.
struct Layout {
    key: usize,
    count: usize,
    anomaly: Option<usize>,
}

impl Layout {
    fn resolve(headers: &StringRecord, columns: &ColumnMapping) -> Result<Self, ParseErrorKind> {
        let find = |name: &str| headers.iter().position(|h| h == name.trim());
        let missing = |name: &String| ParseErrorKind::MissingColumn(name.clone());
        let key = find(&columns.key).ok_or_else(|| missing(&columns.key))?;
        let count = find(&columns.count).ok_or_else(|| missing(&columns.count))?;
        Ok(Self { key, count, anomaly: find(&columns.anomaly) })
    }

    fn decode(&self, record: &StringRecord) -> Result<Row, ParseErrorKind> {
        let key =
            record.get(self.key).and_then(BucketKey::parse).ok_or(ParseErrorKind::MissingKey)?;
        let count = parse_count(record.get(self.count).unwrap_or_default())?;
        let is_anomaly = match self.anomaly.and_then(|i| record.get(i)) {
            None | Some("") => false,
            Some(token) => parse_flag(token)?,
        };
        Ok(Row { key, count, is_anomaly })
    }
}

/// Parses a snapshot using the given column mapping.
///
/// Never fails as a whole. Blank lines are skipped. A header without the key
/// or count column yields no rows and a single
/// [`ParseErrorKind::MissingColumn`] error on line 1. An empty payload yields
/// an empty outcome. A missing anomaly column means no row is anomalous.
pub fn parse(raw: &str, columns: &ColumnMapping) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    if raw.trim().is_empty() {
        return outcome;
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let layout = match reader.headers() {
        Ok(headers) => Layout::resolve(headers, columns),
        Err(e) => Err(ParseErrorKind::Malformed(e.to_string())),
    };
    let layout = match layout {
        Ok(layout) => layout,
        Err(kind) => {
            outcome.errors.push(ParseError { line: 1, kind });
            return outcome;
        }
    };

    for result in reader.records() {
        match result {
            Ok(record) if record.iter().all(str::is_empty) => continue,
            Ok(record) => {
                let line = record.position().map_or(0, |p| p.line());
                match layout.decode(&record) {
                    Ok(row) => outcome.rows.push(row),
                    Err(kind) => outcome.errors.push(ParseError { line, kind }),
                }
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                let kind = ParseErrorKind::Malformed(e.to_string());
                outcome.errors.push(ParseError { line, kind });
            }
        }
    }

    outcome
}

/// Parses a non-negative integer count.
///
/// Renderings with an all-zero fraction (`"12.0"`) are accepted because
/// dataframe writers emit them for integer columns containing gaps.
fn parse_count(token: &str) -> Result<u64, ParseErrorKind> {
    let whole = match token.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => {
            whole
        }
        Some(_) => return Err(ParseErrorKind::InvalidCount(token.to_string())),
        None => token,
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseErrorKind::InvalidCount(token.to_string()));
    }
    whole.parse::<u64>().map_err(|_| ParseErrorKind::InvalidCount(token.to_string()))
}

/// Parses a boolean-like token, case-insensitively.
fn parse_flag(token: &str) -> Result<bool, ParseErrorKind> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => Err(ParseErrorKind::InvalidFlag(token.to_string())),
    }
}
