//! Streaming prediction pipeline.
//!
//! Pulls timestamped records out of a CSV stream, translates them into
//! typed [`Record`](forecast_model::field::Record)s, runs them through a
//! [`PredictiveModel`](forecast_model::model::PredictiveModel), and routes
//! each record plus its one-step prediction into an
//! [`OutputSink`](sinks::OutputSink): either a durable CSV file or a live
//! terminal chart holding a bounded window of recent history.

pub mod errors;
pub mod logging;
pub mod runner;
pub mod sinks;
pub mod source;
pub mod translate;
