//! Output sinks for the prediction stream.
//!
//! A sink receives, once per input record and in input order, the selected
//! field values plus the one-step prediction paired with that record. Two
//! implementations ship here: an unbounded CSV [`file`] sink and a
//! bounded-window live [`chart`] sink. Anything else (a socket, a message
//! queue, a test recorder) just implements [`OutputSink`].

pub mod chart;
pub mod file;
pub mod window;

use snafu::{Backtrace, Snafu};

use forecast_model::field::FieldValue;

/// Errors raised by output sinks.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The sink was already closed when a write or close arrived.
    #[snafu(display("Sink is closed"))]
    Closed { backtrace: Backtrace },

    /// An error occurred while appending a row to the destination.
    #[snafu(display("Failed to write row: {source}"))]
    WriteRow {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// An error occurred while rendering the live chart.
    #[snafu(display("Failed to render chart: {source}"))]
    Render {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// What a sink reports when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSummary {
    /// Data rows written over the sink's lifetime (header excluded).
    pub rows_written: u64,
}

/// A destination for the prediction stream.
///
/// Contract: `write` is called exactly once per input record, in input
/// order, with timestamps monotonically non-decreasing; `close` flushes
/// and releases the destination exactly once. Both fail with
/// [`SinkError::Closed`] after the sink is closed.
pub trait OutputSink {
    /// Appends one record's selected values and its paired prediction.
    fn write(&mut self, values: &[FieldValue], predicted: f64) -> Result<(), SinkError>;

    /// Flushes and releases the destination, reporting the rows written.
    fn close(&mut self) -> Result<SinkSummary, SinkError>;
}
