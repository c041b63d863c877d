//! # Records
//!
//! Record formatter: per-kind schemas, canonical field rendering, header
//! blocks, and a schema-driven reader for produced logs.
//!
//! Header and data lines are generated from the same column list, so for
//! every kind the header column count equals the record field count.

pub mod format;
pub mod header;
pub mod parse;
pub mod schema;
pub mod value;

pub use format::{format_event, ArrivalStamp, FormatError};
pub use header::{column_line, disabled_header, enabled_header, preamble};
pub use parse::{
    parse_line, split_fields, summarize_log, LogSummary, ParsedRecord, ParsedValue,
    RecordParseError, TagSummary,
};
pub use schema::{column_names, identify_kind, schema_for, Column, FieldType, FIXED_COLUMNS};
pub use value::FieldValue;
