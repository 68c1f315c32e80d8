//! Raw row to typed record translation.
//!
//! Columns map to declared fields positionally: column `i` of a data row
//! is translated per the type of field `i`. Datetimes parse with the
//! run's date format string; anything that fails to parse aborts the run
//! with a typed error rather than flowing downstream as garbage.

use chrono::NaiveDateTime;
use thiserror::Error;

use forecast_model::field::{FieldKind, FieldSpec, FieldValue, Record};

/// Date format of the stock hourly-gym data; overridable per run.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%y %H:%M";

/// Errors raised while translating raw column text.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// A datetime column did not match the run's date format.
    #[error("Cannot parse '{raw}' as a timestamp with format '{format}'")]
    BadTimestamp {
        /// The raw column text.
        raw: String,
        /// The format string in effect.
        format: String,
        /// The underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A float column did not parse as a number.
    #[error("Cannot parse '{raw}' as a number")]
    BadNumber {
        /// The raw column text.
        raw: String,
        /// The underlying parse failure.
        #[source]
        source: std::num::ParseFloatError,
    },

    /// A data row is shorter than the declared field list.
    #[error("Row is missing column {column} for field '{field}'")]
    MissingColumn {
        /// Zero-based column index.
        column: usize,
        /// The field declared at that column.
        field: String,
    },
}

/// Translates one raw column per its declared kind.
pub fn translate_field(
    kind: FieldKind,
    raw: &str,
    date_format: &str,
) -> Result<FieldValue, TranslateError> {
    match kind {
        FieldKind::Datetime => NaiveDateTime::parse_from_str(raw.trim(), date_format)
            .map(FieldValue::Datetime)
            .map_err(|source| TranslateError::BadTimestamp {
                raw: raw.to_string(),
                format: date_format.to_string(),
                source,
            }),
        FieldKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|source| TranslateError::BadNumber {
                raw: raw.to_string(),
                source,
            }),
    }
}

/// Translates a whole data row into a [`Record`], preserving declared
/// field order.
pub fn translate_record(
    fields: &[FieldSpec],
    row: &csv::StringRecord,
    date_format: &str,
) -> Result<Record, TranslateError> {
    let mut record = Record::with_capacity(fields.len());
    for (column, field) in fields.iter().enumerate() {
        let raw = row.get(column).ok_or_else(|| TranslateError::MissingColumn {
            column,
            field: field.field_name.clone(),
        })?;
        let value = translate_field(field.field_type, raw, date_format)?;
        record.insert(field.field_name.clone(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn datetime_parses_with_the_gym_format() {
        let value = translate_field(FieldKind::Datetime, "7/2/10 0:00", DEFAULT_DATE_FORMAT).unwrap();
        let expected = NaiveDate::from_ymd_opt(2010, 7, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(value, FieldValue::Datetime(expected));
    }

    #[test]
    fn datetime_honors_a_custom_format() {
        let value =
            translate_field(FieldKind::Datetime, "2010-07-02 09:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(
            value.as_datetime().unwrap().format("%H:%M").to_string(),
            "09:30"
        );
    }

    #[test]
    fn malformed_datetime_is_a_format_error() {
        let err =
            translate_field(FieldKind::Datetime, "yesterday", DEFAULT_DATE_FORMAT).unwrap_err();
        match err {
            TranslateError::BadTimestamp { raw, format, .. } => {
                assert_eq!(raw, "yesterday");
                assert_eq!(format, DEFAULT_DATE_FORMAT);
            }
            other => panic!("expected BadTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn floats_parse_and_reject_garbage() {
        assert_eq!(
            translate_field(FieldKind::Float, " 21.2 ", DEFAULT_DATE_FORMAT).unwrap(),
            FieldValue::Float(21.2)
        );
        let err = translate_field(FieldKind::Float, "n/a", DEFAULT_DATE_FORMAT).unwrap_err();
        assert!(matches!(err, TranslateError::BadNumber { raw, .. } if raw == "n/a"));
    }

    #[test]
    fn rows_translate_positionally_in_declared_order() {
        let fields = vec![
            FieldSpec::new("timestamp", FieldKind::Datetime),
            FieldSpec::new("kw_energy_consumption", FieldKind::Float),
        ];
        let row = csv::StringRecord::from(vec!["7/2/10 0:00", "21.2"]);

        let record = translate_record(&fields, &row, DEFAULT_DATE_FORMAT).unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["timestamp", "kw_energy_consumption"]);
        assert_eq!(
            record["kw_energy_consumption"],
            FieldValue::Float(21.2)
        );
    }

    #[test]
    fn short_rows_name_the_missing_field() {
        let fields = vec![
            FieldSpec::new("timestamp", FieldKind::Datetime),
            FieldSpec::new("kw_energy_consumption", FieldKind::Float),
        ];
        let row = csv::StringRecord::from(vec!["7/2/10 0:00"]);

        let err = translate_record(&fields, &row, DEFAULT_DATE_FORMAT).unwrap_err();
        match err {
            TranslateError::MissingColumn { column, field } => {
                assert_eq!(column, 1);
                assert_eq!(field, "kw_energy_consumption");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }
}
