//! Record - one formatted data line
//!
//! Field values are already rendered to their canonical text when the record
//! is built, so the sink only concatenates.

use crate::Tag;

/// Field separator of every output line
pub const FIELD_SEPARATOR: char = ',';

/// Prefix of comment / header lines
pub const COMMENT_PREFIX: char = '#';

/// Immutable formatted data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Adapter tag (first column)
    pub tag: Tag,

    /// Wall clock at arrival (second column)
    pub utc_millis: i64,

    /// Boot-relative event time (third column)
    pub elapsed_realtime_nanos: i64,

    /// Kind specific fields, in schema order
    pub fields: Vec<String>,

    /// Monotonic arrival time, used for ordering diagnostics only
    pub arrival_nanos: i64,
}

impl Record {
    /// Render the record as one line without the trailing newline
    pub fn to_line(&self) -> String {
        let capacity = self.tag.len() + 40 + self.fields.iter().map(|f| f.len() + 1).sum::<usize>();
        let mut line = String::with_capacity(capacity);
        line.push_str(&self.tag);
        line.push(FIELD_SEPARATOR);
        line.push_str(&self.utc_millis.to_string());
        line.push(FIELD_SEPARATOR);
        line.push_str(&self.elapsed_realtime_nanos.to_string());
        for field in &self.fields {
            line.push(FIELD_SEPARATOR);
            line.push_str(field);
        }
        line
    }
}

/// Anything the sink can append: a comment line or a data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Comment line, stored without the leading `#`
    Comment(String),
    Record(Record),
}

impl LogEntry {
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Line text without the trailing newline
    pub fn render(&self) -> String {
        match self {
            Self::Comment(text) if text.is_empty() => COMMENT_PREFIX.to_string(),
            Self::Comment(text) => format!("{COMMENT_PREFIX} {text}"),
            Self::Record(record) => record.to_line(),
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Self::Comment(_) => None,
            Self::Record(record) => Some(&record.tag),
        }
    }
}

impl From<Record> for LogEntry {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_line_has_no_trailing_separator() {
        let record = Record {
            tag: "PSR".into(),
            utc_millis: 1_700_000_000_000,
            elapsed_realtime_nanos: 42,
            fields: vec!["1013.25".into(), "3".into()],
            arrival_nanos: 42,
        };
        assert_eq!(record.to_line(), "PSR,1700000000000,42,1013.25,3");
    }

    #[test]
    fn empty_fields_keep_their_columns() {
        let record = Record {
            tag: "Raw".into(),
            utc_millis: 1,
            elapsed_realtime_nanos: 2,
            fields: vec!["".into(), "7".into(), "".into()],
            arrival_nanos: 2,
        };
        assert_eq!(record.to_line(), "Raw,1,2,,7,");
    }

    #[test]
    fn comment_rendering() {
        assert_eq!(LogEntry::comment("").render(), "#");
        assert_eq!(LogEntry::comment("Sensor ACC disabled").render(), "# Sensor ACC disabled");
    }
}
