//! Rolling error metrics over the prediction stream.
//!
//! The accumulator tracks a declarative set of [`MetricSpec`]s. Each spec
//! pairs an inference element (where the prediction comes from) with an
//! error statistic computed over a sliding window of comparisons. Metric
//! values are published under the label format the wider tooling already
//! understands, e.g.
//! `multiStepBestPredictions:multiStep:errorMetric='altMAPE':steps=1:window=1000:field=kw_energy_consumption`.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::{
    field::FieldSpec,
    model::{InferenceType, ModelError},
    result::InferenceResult,
};

/// Window length used by the standard metric set.
pub const METRIC_WINDOW: usize = 1000;

/// Where a metric reads its prediction from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceElement {
    /// The model's best multi-step predictions.
    MultiStepBestPredictions,
    /// A synthesized prediction stream (used by baseline metrics).
    Prediction,
}

impl InferenceElement {
    fn label(self) -> &'static str {
        match self {
            InferenceElement::MultiStepBestPredictions => "multiStepBestPredictions",
            InferenceElement::Prediction => "prediction",
        }
    }
}

/// How the compared prediction is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Score the model's own step predictions.
    MultiStep,
    /// Score a previous-value baseline, for contrast.
    Trivial,
}

impl MetricKind {
    fn label(self) -> &'static str {
        match self {
            MetricKind::MultiStep => "multiStep",
            MetricKind::Trivial => "trivial",
        }
    }
}

/// The error statistic accumulated over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMetric {
    /// Average absolute error.
    Aae,
    /// 100 * sum(|error|) / sum(|actual|), a scale-free error percentage.
    AltMape,
}

impl ErrorMetric {
    fn label(self) -> &'static str {
        match self {
            ErrorMetric::Aae => "aae",
            ErrorMetric::AltMape => "altMAPE",
        }
    }
}

/// Declarative description of one rolling metric.
#[derive(Debug, Clone)]
pub struct MetricSpec {
    /// Prediction source being scored.
    pub inference_element: InferenceElement,
    /// How that prediction is produced.
    pub metric: MetricKind,
    /// Statistic computed over the window.
    pub error_metric: ErrorMetric,
    /// Steps ahead the scored prediction targets.
    pub steps: u32,
    /// Number of comparisons the statistic covers.
    pub window: usize,
    /// Field the predictions are compared against.
    pub field: String,
}

impl MetricSpec {
    /// The lookup key this metric is published under.
    pub fn label(&self) -> String {
        format!(
            "{}:{}:errorMetric='{}':steps={}:window={}:field={}",
            self.inference_element.label(),
            self.metric.label(),
            self.error_metric.label(),
            self.steps,
            self.window,
            self.field
        )
    }
}

/// The standard metric set for a predicted field: AAE and altMAPE over the
/// model's one-step predictions, plus the same pair over a previous-value
/// baseline.
pub fn standard_metric_specs(predicted_field: &str) -> Vec<MetricSpec> {
    let spec = |element, metric, error_metric| MetricSpec {
        inference_element: element,
        metric,
        error_metric,
        steps: 1,
        window: METRIC_WINDOW,
        field: predicted_field.to_string(),
    };
    vec![
        spec(
            InferenceElement::MultiStepBestPredictions,
            MetricKind::MultiStep,
            ErrorMetric::Aae,
        ),
        spec(InferenceElement::Prediction, MetricKind::Trivial, ErrorMetric::Aae),
        spec(
            InferenceElement::MultiStepBestPredictions,
            MetricKind::MultiStep,
            ErrorMetric::AltMape,
        ),
        spec(InferenceElement::Prediction, MetricKind::Trivial, ErrorMetric::AltMape),
    ]
}

#[derive(Debug)]
struct MetricState {
    spec: MetricSpec,
    label: String,
    /// Predictions waiting for the record they target, oldest first.
    pending: VecDeque<f64>,
    /// (|error|, |actual|) pairs for the most recent comparisons.
    window: VecDeque<(f64, f64)>,
    value: Option<f64>,
}

impl MetricState {
    fn new(spec: MetricSpec) -> Self {
        let label = spec.label();
        Self {
            spec,
            label,
            pending: VecDeque::new(),
            window: VecDeque::new(),
            value: None,
        }
    }

    fn update(&mut self, actual: f64, result: &InferenceResult) {
        // The prediction this record contributes for `steps` ahead.
        let produced = match self.spec.metric {
            MetricKind::MultiStep => result.prediction(self.spec.steps),
            MetricKind::Trivial => Some(actual),
        };
        if let Some(produced) = produced {
            self.pending.push_back(produced);
        }

        // Once the pending queue is deeper than `steps`, its front entry
        // was made for the record being processed now.
        if self.pending.len() > self.spec.steps as usize {
            if let Some(target) = self.pending.pop_front() {
                self.window.push_back(((actual - target).abs(), actual.abs()));
                if self.window.len() > self.spec.window {
                    self.window.pop_front();
                }
                self.value = Some(self.compute());
            }
        }
    }

    fn compute(&self) -> f64 {
        match self.spec.error_metric {
            ErrorMetric::Aae => {
                let sum: f64 = self.window.iter().map(|(err, _)| err).sum();
                sum / self.window.len() as f64
            }
            ErrorMetric::AltMape => {
                let err_sum: f64 = self.window.iter().map(|(err, _)| err).sum();
                let actual_sum: f64 = self.window.iter().map(|(_, actual)| actual).sum();
                if actual_sum == 0.0 {
                    0.0
                } else {
                    100.0 * err_sum / actual_sum
                }
            }
        }
    }
}

/// Accumulates the configured metrics as inference results stream through.
#[derive(Debug)]
pub struct MetricsManager {
    states: Vec<MetricState>,
    inference_type: InferenceType,
}

impl MetricsManager {
    /// Builds the accumulator, checking every spec against the model's
    /// declared fields.
    pub fn new(
        specs: Vec<MetricSpec>,
        field_info: &[FieldSpec],
        inference_type: InferenceType,
    ) -> Result<Self, ModelError> {
        for spec in &specs {
            if !field_info.iter().any(|f| f.field_name == spec.field) {
                return Err(ModelError::UnknownMetricField(spec.field.clone()));
            }
        }
        Ok(Self {
            states: specs.into_iter().map(MetricState::new).collect(),
            inference_type,
        })
    }

    /// The inference style the manager was built against.
    pub fn inference_type(&self) -> InferenceType {
        self.inference_type
    }

    /// Folds one result in and returns the current value of every metric
    /// that has at least one comparison behind it.
    pub fn update(&mut self, result: &InferenceResult) -> Result<IndexMap<String, f64>, ModelError> {
        let mut values = IndexMap::new();
        for state in &mut self.states {
            let actual = result
                .input
                .get(&state.spec.field)
                .ok_or_else(|| ModelError::MissingField(state.spec.field.clone()))?
                .as_float()
                .ok_or_else(|| ModelError::NonNumericField(state.spec.field.clone()))?;

            state.update(actual, result);
            if let Some(value) = state.value {
                values.insert(state.label.clone(), value);
            }
        }
        Ok(values)
    }
}
