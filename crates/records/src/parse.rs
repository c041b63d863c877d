//! Reading logs back with the published schemas

use std::collections::BTreeMap;

use contracts::{SensorKind, COMMENT_PREFIX, FIELD_SEPARATOR};
use thiserror::Error;
use tracing::debug;

use crate::schema::{identify_kind, schema_for, Column, FieldType, FIXED_COLUMNS};

/// Errors raised while parsing a data line
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("column '{column}': cannot parse '{value}'")]
    InvalidValue { column: String, value: String },

    #[error("no header seen for tag '{tag}'")]
    UnknownTag { tag: String },
}

/// Typed field value recovered from a line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    FloatList(Vec<f64>),
    Empty,
}

impl ParsedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// One parsed data line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub tag: String,
    pub utc_millis: i64,
    pub elapsed_realtime_nanos: i64,
    pub fields: Vec<ParsedValue>,
}

/// Split on separators that are not inside brackets
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if c == FIELD_SEPARATOR && depth == 0 => {
                fields.push(&line[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

fn invalid(column: &str, value: &str) -> RecordParseError {
    RecordParseError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_list<T: std::str::FromStr>(column: &str, raw: &str) -> Result<Vec<T>, RecordParseError> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| invalid(column, raw))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|item| item.trim().parse::<T>().map_err(|_| invalid(column, raw)))
        .collect()
}

fn parse_value(column: &Column, raw: &str) -> Result<ParsedValue, RecordParseError> {
    if raw.is_empty() && !matches!(column.ty, FieldType::Text) {
        return Ok(ParsedValue::Empty);
    }
    match column.ty {
        FieldType::Int => raw
            .parse()
            .map(ParsedValue::Int)
            .map_err(|_| invalid(column.name, raw)),
        FieldType::Float | FieldType::Fixed(_) => raw
            .parse()
            .map(ParsedValue::Float)
            .map_err(|_| invalid(column.name, raw)),
        FieldType::Text => Ok(ParsedValue::Text(raw.to_string())),
        FieldType::ByteList => parse_list(column.name, raw).map(ParsedValue::Bytes),
        FieldType::FloatList => parse_list(column.name, raw).map(ParsedValue::FloatList),
    }
}

/// Parse one data line against the schema of `kind`
///
/// # Errors
/// Field count mismatch or a value that does not parse as its column type.
pub fn parse_line(line: &str, kind: &SensorKind) -> Result<ParsedRecord, RecordParseError> {
    let schema = schema_for(kind);
    let parts = split_fields(line.trim_end_matches(['\r', '\n']));
    let expected = 1 + FIXED_COLUMNS.len() + schema.len();
    if parts.len() != expected {
        return Err(RecordParseError::FieldCount {
            expected,
            found: parts.len(),
        });
    }

    let utc_millis = parts[1]
        .parse()
        .map_err(|_| invalid(FIXED_COLUMNS[0], parts[1]))?;
    let elapsed_realtime_nanos = parts[2]
        .parse()
        .map_err(|_| invalid(FIXED_COLUMNS[1], parts[2]))?;
    let fields = schema
        .iter()
        .zip(&parts[3..])
        .map(|(column, raw)| parse_value(column, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedRecord {
        tag: parts[0].to_string(),
        utc_millis,
        elapsed_realtime_nanos,
        fields,
    })
}

/// Per-tag totals of one log file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub kind: Option<SensorKind>,
    pub enabled: bool,
    pub records: u64,
    pub malformed: u64,
}

/// Result of scanning a whole log
#[derive(Debug, Clone, Default)]
pub struct LogSummary {
    pub comment_lines: u64,
    pub tags: BTreeMap<String, TagSummary>,
    /// First few malformed lines as (line number, error)
    pub errors: Vec<(usize, RecordParseError)>,
}

impl LogSummary {
    const MAX_ERRORS: usize = 20;

    pub fn total_records(&self) -> u64 {
        self.tags.values().map(|t| t.records).sum()
    }

    pub fn total_malformed(&self) -> u64 {
        self.tags.values().map(|t| t.malformed).sum()
    }
}

/// Scan a log: learn each tag's kind from its column header, then check
/// every data line against it
pub fn summarize_log<'a>(lines: impl IntoIterator<Item = &'a str>) -> LogSummary {
    let mut summary = LogSummary::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line_no = index + 1;
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix(COMMENT_PREFIX) {
            summary.comment_lines += 1;
            observe_comment(&mut summary, comment.trim());
            continue;
        }

        let tag = split_fields(line)[0].to_string();
        let entry = summary.tags.entry(tag.clone()).or_default();
        let result = match &entry.kind {
            Some(kind) => parse_line(line, kind).map(|_| ()),
            None => Err(RecordParseError::UnknownTag { tag }),
        };
        match result {
            Ok(()) => entry.records += 1,
            Err(err) => {
                entry.malformed += 1;
                debug!(line = line_no, error = %err, "malformed log line");
                if summary.errors.len() < LogSummary::MAX_ERRORS {
                    summary.errors.push((line_no, err));
                }
            }
        }
    }

    summary
}

fn observe_comment(summary: &mut LogSummary, comment: &str) {
    if let Some(rest) = comment.strip_prefix("Sensor ") {
        if let Some(tag) = rest.strip_suffix(" disabled") {
            summary.tags.entry(tag.to_string()).or_default();
        } else if let Some((tag, _)) = rest.split_once(" enabled") {
            summary.tags.entry(tag.to_string()).or_default().enabled = true;
        }
        return;
    }

    let parts: Vec<&str> = comment.split(FIELD_SEPARATOR).collect();
    if parts.len() > FIXED_COLUMNS.len() && parts[1..=FIXED_COLUMNS.len()] == FIXED_COLUMNS {
        if let Some(kind) = identify_kind(&parts[1 + FIXED_COLUMNS.len()..]) {
            summary.tags.entry(parts[0].to_string()).or_default().kind = Some(kind);
        }
    }
}
