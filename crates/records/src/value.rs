//! Canonical field rendering

use bytes::Bytes;
use std::fmt::{self, Write};

/// One rendered-to-be field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    /// Double precision, shortest round-trip rendering
    Float(f64),
    /// Single precision, shortest round-trip rendering at f32 precision
    Float32(f32),
    /// Fixed number of decimals
    Fixed(f64, u8),
    Text(String),
    Bytes(Bytes),
    FloatList(Vec<f32>),
    /// Value the source marked as not present
    Absent,
}

impl FieldValue {
    pub fn text(s: &str) -> Self {
        Self::Text(sanitize(s))
    }

    pub fn opt_int<T: Into<i64>>(value: Option<T>) -> Self {
        value.map_or(Self::Absent, |v| Self::Int(v.into()))
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Float)
    }

    pub fn opt_float32(value: Option<f32>) -> Self {
        value.map_or(Self::Absent, Self::Float32)
    }

    pub fn opt_fixed<T: Into<f64>>(value: Option<T>, decimals: u8) -> Self {
        value.map_or(Self::Absent, |v| Self::Fixed(v.into(), decimals))
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            // non-finite floats are treated as not present
            Self::Float(v) if !v.is_finite() => Ok(()),
            Self::Float(v) => write!(f, "{v}"),
            Self::Float32(v) if !v.is_finite() => Ok(()),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Fixed(v, _) if !v.is_finite() => Ok(()),
            Self::Fixed(v, decimals) => write!(f, "{v:.prec$}", prec = usize::from(*decimals)),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(bytes) => write_list(f, bytes.iter()),
            Self::FloatList(values) => write_list(f, values.iter()),
            Self::Absent => Ok(()),
        }
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_char('[')?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        write!(f, "{item}")?;
    }
    f.write_char(']')
}

/// Replace characters that would break the line structure
///
/// Brackets delimit list columns, so text never carries them.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ',' => ';',
            '[' => '(',
            ']' => ')',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}
