//! Reference model: an exponentially smoothed level blended with a
//! per-slot seasonal profile.
//!
//! The model is deliberately simple but honest: it learns online, one
//! record per call, in constant time and memory. The level tracks the
//! recent magnitude of the predicted field; the seasonal profile keeps a
//! running mean per slot of the configured period (for hourly energy data
//! a period of 168 captures the weekly shape). Predictions for `step`
//! records ahead blend the seasonal mean of the target slot with the
//! current level.

use crate::{
    field::{FieldSpec, Record},
    model::{InferenceOptions, InferenceType, ModelError, PredictiveModel},
    params::ModelParams,
    result::InferenceResult,
};

/// Online level + seasonal-profile model.
pub struct SeasonalLevelModel {
    params: ModelParams,
    predicted_field: Option<String>,
    level: Option<f64>,
    season_sum: Vec<f64>,
    season_count: Vec<u64>,
    /// Records consumed so far; also the slot cursor.
    index: u64,
}

impl SeasonalLevelModel {
    /// Registry key used by the model factory.
    pub const MODEL_TYPE: &'static str = "seasonal_level";

    /// A fresh model for `params`. No learning happens until records run.
    pub fn new(params: ModelParams) -> Self {
        let period = params.seasonal_period;
        Self {
            params,
            predicted_field: None,
            level: None,
            season_sum: vec![0.0; period],
            season_count: vec![0; period],
            index: 0,
        }
    }

    /// Prediction for `step` records ahead, given the just-updated level.
    fn predict_ahead(&self, level: f64, step: u32) -> f64 {
        let period = self.params.seasonal_period;
        if period == 0 {
            return level;
        }
        let slot = ((self.index + u64::from(step)) % period as u64) as usize;
        if self.season_count[slot] == 0 {
            // Slot not seen yet; fall back to the level alone.
            return level;
        }
        let seasonal = self.season_sum[slot] / self.season_count[slot] as f64;
        self.params.season_blend * seasonal + (1.0 - self.params.season_blend) * level
    }
}

impl PredictiveModel for SeasonalLevelModel {
    fn enable_inference(&mut self, opts: InferenceOptions) -> Result<(), ModelError> {
        let declared = self
            .params
            .fields
            .iter()
            .any(|f| f.field_name == opts.predicted_field);
        if !declared {
            return Err(ModelError::UnknownPredictedField(opts.predicted_field));
        }
        self.predicted_field = Some(opts.predicted_field);
        Ok(())
    }

    fn run(&mut self, record: &Record) -> Result<InferenceResult, ModelError> {
        let field = self
            .predicted_field
            .as_ref()
            .ok_or(ModelError::InferenceDisabled)?;
        let value = record
            .get(field)
            .ok_or_else(|| ModelError::MissingField(field.clone()))?;
        let actual = value
            .as_float()
            .ok_or_else(|| ModelError::NonNumericField(field.clone()))?;

        // Learn: fold the observation into the level and its season slot.
        let level = match self.level {
            Some(prev) => self.params.alpha * actual + (1.0 - self.params.alpha) * prev,
            None => actual,
        };
        self.level = Some(level);

        let period = self.params.seasonal_period;
        if period > 0 {
            let slot = (self.index % period as u64) as usize;
            self.season_sum[slot] += actual;
            self.season_count[slot] += 1;
        }

        // Predict each configured step from the updated state.
        let mut result = InferenceResult::new(record.clone());
        for &step in &self.params.steps {
            result.predictions.insert(step, self.predict_ahead(level, step));
        }
        self.index += 1;
        Ok(result)
    }

    fn field_info(&self) -> &[FieldSpec] {
        &self.params.fields
    }

    fn inference_type(&self) -> InferenceType {
        InferenceType::TemporalMultiStep
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::field::{FieldKind, FieldValue};

    use super::*;

    const FIELD: &str = "kw_energy_consumption";

    fn model(alpha: f64, period: usize, blend: f64) -> SeasonalLevelModel {
        let params = ModelParams {
            model_type: SeasonalLevelModel::MODEL_TYPE.to_string(),
            steps: vec![1],
            alpha,
            seasonal_period: period,
            season_blend: blend,
            fields: vec![
                FieldSpec::new("timestamp", FieldKind::Datetime),
                FieldSpec::new(FIELD, FieldKind::Float),
            ],
        };
        let mut m = SeasonalLevelModel::new(params);
        m.enable_inference(InferenceOptions {
            predicted_field: FIELD.to_string(),
        })
        .unwrap();
        m
    }

    fn record(value: f64) -> Record {
        let mut r = Record::new();
        r.insert(FIELD.to_string(), FieldValue::Float(value));
        r
    }

    #[test]
    fn constant_series_is_predicted_exactly() {
        let mut m = model(0.5, 0, 0.5);
        for _ in 0..5 {
            let result = m.run(&record(21.5)).unwrap();
            assert_eq!(result.prediction(1), Some(21.5));
        }
    }

    #[test]
    fn level_converges_toward_recent_values() {
        let mut m = model(0.5, 0, 0.5);
        m.run(&record(10.0)).unwrap();
        // level = 0.5 * 20 + 0.5 * 10 = 15
        let result = m.run(&record(20.0)).unwrap();
        assert_eq!(result.prediction(1), Some(15.0));
    }

    #[test]
    fn seasonal_profile_shapes_the_prediction() {
        // Alternating series with period 2: slots learn 10 and 20.
        let mut m = model(0.1, 2, 1.0);
        for _ in 0..10 {
            m.run(&record(10.0)).unwrap();
            m.run(&record(20.0)).unwrap();
        }
        // Next record lands on the 10-slot; with blend 1.0 the prediction
        // is the slot mean alone.
        let result = m.run(&record(10.0)).unwrap();
        assert_eq!(result.prediction(1), Some(20.0));
    }

    #[test]
    fn emits_every_configured_step() {
        let params = ModelParams {
            model_type: SeasonalLevelModel::MODEL_TYPE.to_string(),
            steps: vec![1, 3],
            alpha: 0.5,
            seasonal_period: 0,
            season_blend: 0.5,
            fields: vec![FieldSpec::new(FIELD, FieldKind::Float)],
        };
        let mut m = SeasonalLevelModel::new(params);
        m.enable_inference(InferenceOptions {
            predicted_field: FIELD.to_string(),
        })
        .unwrap();

        let result = m.run(&record(7.0)).unwrap();
        assert_eq!(result.predictions.len(), 2);
        assert_eq!(result.prediction(1), Some(7.0));
        assert_eq!(result.prediction(3), Some(7.0));
    }

    #[test]
    fn run_requires_enabled_inference() {
        let params = ModelParams {
            model_type: SeasonalLevelModel::MODEL_TYPE.to_string(),
            steps: vec![1],
            alpha: 0.5,
            seasonal_period: 0,
            season_blend: 0.5,
            fields: vec![FieldSpec::new(FIELD, FieldKind::Float)],
        };
        let mut m = SeasonalLevelModel::new(params);
        let err = m.run(&record(1.0)).unwrap_err();
        assert!(matches!(err, ModelError::InferenceDisabled));
    }

    #[test]
    fn rejects_undeclared_or_non_numeric_predicted_field() {
        let mut m = model(0.5, 0, 0.5);

        let err = m
            .enable_inference(InferenceOptions {
                predicted_field: "humidity".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownPredictedField(f) if f == "humidity"));

        // A record where the predicted field translated to a timestamp.
        let mut r = Record::new();
        let ts = NaiveDate::from_ymd_opt(2010, 7, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        r.insert(FIELD.to_string(), FieldValue::Datetime(ts));
        let err = m.run(&r).unwrap_err();
        assert!(matches!(err, ModelError::NonNumericField(_)));

        let err = m.run(&Record::new()).unwrap_err();
        assert!(matches!(err, ModelError::MissingField(_)));
    }
}
