use thiserror::Error;

use forecast_model::model::ModelError;

use crate::{sinks::SinkError, source::SourceError, translate::TranslateError};

/// The unified error type for the `forecast_runner` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error in the run configuration (field selection, description).
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error originating from the record source.
    #[error("Source error")]
    Source(#[from] SourceError),

    /// A record that could not be translated to its declared field types.
    #[error("Translation error")]
    Translate(#[from] TranslateError),

    /// An error originating from the model boundary.
    #[error("Model error")]
    Model(#[from] ModelError),

    /// An error originating from the output sink.
    #[error("Sink error")]
    Sink(#[from] SinkError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
