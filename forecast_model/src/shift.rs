//! Re-aligns multi-step predictions with the records they target.
//!
//! A model running on record `i` predicts values for records `i+1`,
//! `i+2`, ... For presentation the interesting pairing is the other way
//! around: when record `i` arrives, show the prediction that was made
//! *for* it. [`InferenceShifter`] delays each step-`s` prediction by `s`
//! records to produce that pairing.

use std::collections::{BTreeMap, VecDeque};

use crate::result::InferenceResult;

/// Per-step delay buffers over a stream of [`InferenceResult`]s.
#[derive(Debug, Default)]
pub struct InferenceShifter {
    buffers: BTreeMap<u32, VecDeque<f64>>,
}

impl InferenceShifter {
    /// A shifter with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shifts `result.predictions` in time.
    ///
    /// Steps that have not accumulated `s` records of history yet are
    /// absent from the shifted map; callers surface that as a
    /// missing-prediction marker.
    pub fn shift(&mut self, mut result: InferenceResult) -> InferenceResult {
        let mut shifted = BTreeMap::new();
        for (&step, &value) in &result.predictions {
            let buffer = self.buffers.entry(step).or_default();
            buffer.push_back(value);
            // The buffer holds predictions made over the last `step`
            // records; once it exceeds that depth the front one targets
            // the record being processed right now.
            if buffer.len() > step as usize {
                if let Some(aligned) = buffer.pop_front() {
                    shifted.insert(step, aligned);
                }
            }
        }
        result.predictions = shifted;
        result
    }
}
