//! Hyperparameter search for the streaming prediction models.
//!
//! Mirrors the run CLI's view of a stream: load the same description,
//! replay the same translated records, and persist the winning
//! [`ModelParams`](forecast_model::params::ModelParams) where
//! [`load_model_params`](forecast_model::params::load_model_params) will
//! look for them.

pub mod grid;
pub mod search;
