//! Predictive-model abstraction.
//!
//! [`PredictiveModel`] is the narrow interface between the pipeline and a
//! model implementation. Concrete models are selected at runtime through
//! [`create_model`], keyed by [`ModelParams::model_type`], and driven
//! through `Box<dyn PredictiveModel>` so the pipeline never names one.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    field::{FieldSpec, Record},
    params::ModelParams,
    result::InferenceResult,
    seasonal::SeasonalLevelModel,
};

/// Errors raised by models and their construction.
#[derive(Debug, Error)]
pub enum ModelError {
    /// `model_type` does not name a registered implementation.
    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    /// `run` was called before `enable_inference`.
    #[error("Inference is not enabled; call enable_inference first")]
    InferenceDisabled,

    /// The requested predicted field is not declared by the model.
    #[error("Predicted field '{0}' is not declared in the model's fields")]
    UnknownPredictedField(String),

    /// A metric was configured against an undeclared field.
    #[error("Metric field '{0}' is not declared in the model's fields")]
    UnknownMetricField(String),

    /// An input record lacks a field the model needs.
    #[error("Record is missing field '{0}'")]
    MissingField(String),

    /// The predicted field translated to something non-numeric.
    #[error("Field '{0}' does not hold a numeric value")]
    NonNumericField(String),
}

/// The style of inference a model performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum InferenceType {
    /// Predicts the modeled field several steps ahead.
    #[default]
    TemporalMultiStep,
    /// Multi-step prediction plus an anomaly signal.
    TemporalAnomaly,
}

impl fmt::Display for InferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceType::TemporalMultiStep => "TemporalMultiStep",
            InferenceType::TemporalAnomaly => "TemporalAnomaly",
        };
        f.write_str(name)
    }
}

impl FromStr for InferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TemporalMultiStep" => Ok(InferenceType::TemporalMultiStep),
            "TemporalAnomaly" => Ok(InferenceType::TemporalAnomaly),
            other => Err(format!(
                "invalid inference type '{other}'; expected TemporalMultiStep or TemporalAnomaly"
            )),
        }
    }
}

/// Options passed when turning on inference.
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// The field whose future values the model predicts.
    pub predicted_field: String,
}

/// A model the pipeline can stream records through.
///
/// Implementations learn online: each `run` call both updates the model
/// with the record and returns predictions for the configured steps ahead.
pub trait PredictiveModel {
    /// Enables inference for `opts.predicted_field`. Must be called once
    /// before the first [`run`](PredictiveModel::run).
    fn enable_inference(&mut self, opts: InferenceOptions) -> Result<(), ModelError>;

    /// Feeds one record and returns the step predictions made from it.
    fn run(&mut self, record: &Record) -> Result<InferenceResult, ModelError>;

    /// The fields the model was configured with.
    fn field_info(&self) -> &[FieldSpec];

    /// The inference style this model performs.
    fn inference_type(&self) -> InferenceType;
}

impl fmt::Debug for dyn PredictiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictiveModel")
            .field("inference_type", &self.inference_type())
            .finish_non_exhaustive()
    }
}

/// Builds the model implementation selected by `params.model_type`.
pub fn create_model(params: &ModelParams) -> Result<Box<dyn PredictiveModel>, ModelError> {
    debug!(model_type = %params.model_type, "creating model");
    match params.model_type.as_str() {
        SeasonalLevelModel::MODEL_TYPE => Ok(Box::new(SeasonalLevelModel::new(params.clone()))),
        other => Err(ModelError::UnknownModelType(other.to_string())),
    }
}
