//! Model output flowing down the pipeline.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::field::Record;

/// What a model produced for a single input record.
///
/// Carries the translated input alongside the predictions so downstream
/// consumers (metrics accumulation, alignment) need nothing but the result
/// itself.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// The record this result was computed from.
    pub input: Record,
    /// Predicted value per step ahead. Step 1 targets the next record.
    pub predictions: BTreeMap<u32, f64>,
    /// Rolling metric values keyed by metric label, assigned by the
    /// metrics accumulator after the model ran. Empty until then.
    pub metrics: IndexMap<String, f64>,
}

impl InferenceResult {
    /// An empty result for `input`, to be filled with predictions.
    pub fn new(input: Record) -> Self {
        Self {
            input,
            predictions: BTreeMap::new(),
            metrics: IndexMap::new(),
        }
    }

    /// The prediction targeting `step` records ahead, if one exists.
    ///
    /// After alignment this answers "the prediction made for the current
    /// record"; steps without enough history yet return `None`.
    pub fn prediction(&self, step: u32) -> Option<f64> {
        self.predictions.get(&step).copied()
    }
}
