//! Durable CSV sink: `<name>_out.csv`, one row per record, unbounded.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::info;

use forecast_model::field::FieldValue;

use super::{ClosedSnafu, IoSnafu, OutputSink, SinkError, SinkSummary, WriteRowSnafu};

/// Header column holding the prediction, appended after the selected
/// fields. Part of the output contract; downstream consumers match on it.
pub const PREDICTED_VALUE_COLUMN: &str = "predicted value";

/// Appends every record and its prediction to `<dir>/<name>_out.csv`.
///
/// The header row is written at creation: the selected field names in
/// order, then [`PREDICTED_VALUE_COLUMN`]. The open writer doubles as the
/// open/closed state; `close` drops it, and later writes fail with
/// [`SinkError::Closed`].
pub struct FileSink {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    line_count: u64,
}

impl FileSink {
    /// Creates the output file and writes the header row.
    pub fn create(dir: &Path, name: &str, field_names: &[String]) -> Result<Self, SinkError> {
        let path = dir.join(format!("{name}_out.csv"));
        info!(path = %path.display(), "preparing to output data");

        let file = File::create(&path).context(IoSnafu)?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header: Vec<&str> = field_names.iter().map(String::as_str).collect();
        header.push(PREDICTED_VALUE_COLUMN);
        writer.write_record(&header).context(WriteRowSnafu)?;

        Ok(Self {
            path,
            writer: Some(writer),
            line_count: 0,
        })
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far.
    pub fn line_count(&self) -> u64 {
        self.line_count
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, values: &[FieldValue], predicted: f64) -> Result<(), SinkError> {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return ClosedSnafu.fail(),
        };

        let mut row: Vec<String> = values.iter().map(ToString::to_string).collect();
        row.push(predicted.to_string());
        writer.write_record(&row).context(WriteRowSnafu)?;
        self.line_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<SinkSummary, SinkError> {
        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => return ClosedSnafu.fail(),
        };
        writer.flush().context(IoSnafu)?;
        // Dropping the writer releases the file handle.
        drop(writer);

        Ok(SinkSummary {
            rows_written: self.line_count,
        })
    }
}
