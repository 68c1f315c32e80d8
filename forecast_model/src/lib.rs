//! Modeling boundary for the streaming prediction pipeline.
//!
//! This crate holds everything the pipeline needs to talk to a predictive
//! model without knowing how it learns: stream descriptions and field
//! declarations, the translated [`Record`](field::Record) shape, the
//! [`PredictiveModel`](model::PredictiveModel) trait with its runtime
//! factory, rolling error metrics, prediction re-alignment, and the
//! persistence of tuned model parameters.

pub mod description;
pub mod field;
pub mod metrics;
pub mod model;
pub mod params;
pub mod result;
pub mod seasonal;
pub mod shift;
