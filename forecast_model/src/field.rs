//! Field declarations and runtime field values.
//!
//! A stream is described by an ordered list of [`FieldSpec`]s. Raw CSV
//! columns are translated positionally into [`FieldValue`]s and collected
//! into a [`Record`], which preserves the declared field order end to end.

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Timestamp rendering used when field values are written to a file sink.
pub const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The declared type of one stream field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A timestamp, parsed with the run's date format string.
    Datetime,
    /// A scalar sensor reading.
    Float,
}

/// One declared field of the input stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Column name, also the key in the translated [`Record`].
    pub field_name: String,
    /// How raw column text is translated.
    pub field_type: FieldKind,
}

impl FieldSpec {
    /// Convenience constructor used throughout the tests.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field_name: name.into(),
            field_type: kind,
        }
    }
}

/// A translated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Parsed timestamp. Input rows carry no zone, so the value is naive.
    Datetime(NaiveDateTime),
    /// Parsed numeric reading.
    Float(f64),
}

impl FieldValue {
    /// Uniform numeric encoding for chart axes.
    ///
    /// Timestamps map to epoch seconds so both axes of the live chart can
    /// work in plain `f64`.
    pub fn to_axis_f64(&self) -> f64 {
        match self {
            FieldValue::Datetime(ts) => ts.and_utc().timestamp() as f64,
            FieldValue::Float(v) => *v,
        }
    }

    /// The timestamp payload, if this value is one.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Datetime(ts) => Some(*ts),
            FieldValue::Float(_) => None,
        }
    }

    /// The numeric payload, if this value is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Datetime(_) => None,
            FieldValue::Float(v) => Some(*v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Datetime(ts) => write!(f, "{}", ts.format(DATETIME_OUTPUT_FORMAT)),
            FieldValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A fully translated input record, in declared field order.
pub type Record = IndexMap<String, FieldValue>;
