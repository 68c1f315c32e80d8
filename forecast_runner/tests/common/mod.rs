#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use forecast_model::{
    description::{StreamDescription, load_description_str},
    field::FieldValue,
    model::{InferenceOptions, PredictiveModel, create_model},
    params::load_params_str,
};
use forecast_runner::sinks::{OutputSink, SinkError, SinkSummary};

/// Captures everything the run loop hands to its sink.
#[derive(Default)]
pub struct RecordingSink {
    pub rows: Vec<(Vec<FieldValue>, f64)>,
    pub closed: bool,
}

impl OutputSink for RecordingSink {
    fn write(&mut self, values: &[FieldValue], predicted: f64) -> Result<(), SinkError> {
        self.rows.push((values.to_vec(), predicted));
        Ok(())
    }

    fn close(&mut self) -> Result<SinkSummary, SinkError> {
        self.closed = true;
        Ok(SinkSummary {
            rows_written: self.rows.len() as u64,
        })
    }
}

/// Writes a gym-style input file: three header rows, then the given
/// (timestamp, kwh) data rows.
pub fn write_input_csv(dir: &TempDir, rows: &[(&str, f64)]) -> PathBuf {
    let mut contents = String::from("timestamp,kw_energy_consumption\ndatetime,float\nT,\n");
    for (ts, kwh) in rows {
        contents.push_str(&format!("{ts},{kwh}\n"));
    }
    let path = dir.path().join("rec-center-hourly.csv");
    fs::write(&path, contents).expect("write input csv");
    path
}

pub fn gym_description(source: &Path) -> StreamDescription {
    let toml = format!(
        r#"
info = "rec-center-hourly"

[[included_fields]]
field_name = "timestamp"
field_type = "datetime"

[[included_fields]]
field_name = "kw_energy_consumption"
field_type = "float"

[inference_args]
predicted_field = "kw_energy_consumption"

[stream]
source = "{}"
"#,
        source.display()
    );
    load_description_str(&toml).expect("parse description")
}

/// A small seasonal-level model over the gym fields, inference enabled.
pub fn gym_model() -> Box<dyn PredictiveModel> {
    let params = r#"
model_type = "seasonal_level"
steps = [1]
alpha = 0.5

[[fields]]
field_name = "timestamp"
field_type = "datetime"

[[fields]]
field_name = "kw_energy_consumption"
field_type = "float"
"#;
    let params = load_params_str(params).expect("parse model params");
    let mut model = create_model(&params).expect("create model");
    model
        .enable_inference(InferenceOptions {
            predicted_field: "kw_energy_consumption".to_string(),
        })
        .expect("enable inference");
    model
}
