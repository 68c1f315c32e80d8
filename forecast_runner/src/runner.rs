//! The record-to-prediction loop shared by the CLI entrypoints.
//!
//! One pass over the input stream: translate each raw row, feed it to the
//! model, fold the rolling metrics in, and hand the selected field values
//! plus the one-step prediction to an output sink. The loop itself is
//! sink-agnostic; [`run_stream`] picks a CSV file or a live chart and
//! handles their differing alignment needs.

use std::path::PathBuf;

use tracing::{debug, info};

use forecast_model::{
    description::StreamDescription,
    field::FieldValue,
    metrics::{ErrorMetric, MetricKind, MetricSpec, MetricsManager, standard_metric_specs},
    model::PredictiveModel,
    shift::InferenceShifter,
};

use crate::{
    errors::Error,
    sinks::{OutputSink, chart::ChartSink, file::FileSink},
    source::RecordSource,
    translate::{DEFAULT_DATE_FORMAT, translate_record},
};

/// How often the loop reports progress, in records.
pub const PROGRESS_INTERVAL: u64 = 100;

/// Whether predictions are re-aligned with the records they targeted
/// before reaching the sink.
///
/// File output keeps each prediction on the row that produced it, so the
/// stored rows can be scored offline against the rows that follow. Chart
/// output delays predictions instead, so both plotted lines describe the
/// same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    /// Predictions stay on the record that produced them.
    Raw,
    /// Predictions are delayed onto the record they targeted.
    Aligned,
}

/// Knobs for one run, beyond what the stream description carries.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Chart the run instead of writing a CSV: `[x field, charted field]`.
    pub plot_fields: Option<[String; 2]>,
    /// strftime-style format of raw datetime columns.
    pub date_format: String,
    /// Print progress lines to stdout while streaming.
    pub verbose: bool,
    /// Directory the output CSV is written into.
    pub output_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            plot_fields: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            verbose: true,
            output_dir: PathBuf::from("."),
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records read from the source.
    pub records: u64,
    /// Rows the sink accepted.
    pub rows_written: u64,
    /// The output CSV, when one was written.
    pub output_path: Option<PathBuf>,
}

/// Resolves which declared fields a run forwards to its sink.
///
/// File runs forward every declared field in declaration order. Chart runs
/// forward exactly the requested pair, which must both be declared.
pub fn selected_fields(
    description: &StreamDescription,
    plot_fields: Option<&[String; 2]>,
) -> Result<Vec<String>, Error> {
    let declared = description.field_names();
    match plot_fields {
        None => Ok(declared),
        Some(pair) => {
            for name in pair {
                if !declared.iter().any(|d| d == name) {
                    return Err(Error::Config(format!(
                        "plot field '{name}' is not declared in the stream description"
                    )));
                }
            }
            Ok(pair.to_vec())
        }
    }
}

fn progress_metric_label(specs: &[MetricSpec]) -> Option<String> {
    specs
        .iter()
        .find(|s| s.metric == MetricKind::MultiStep && s.error_metric == ErrorMetric::AltMape)
        .map(MetricSpec::label)
}

/// Streams every source record through the model into `sink`.
///
/// The sink is left open; callers close it after this returns, which puts
/// sink shutdown after the source handle is already dropped. Returns the
/// number of records processed.
///
/// Any source, translation, model, or sink error aborts the run. Progress
/// reporting is best effort: a metric that has no value yet prints as NaN
/// rather than failing the loop.
pub fn run_with_sink(
    description: &StreamDescription,
    model: &mut dyn PredictiveModel,
    source: RecordSource,
    sink: &mut dyn OutputSink,
    selected: &[String],
    shift_mode: ShiftMode,
    options: &RunOptions,
) -> Result<u64, Error> {
    let specs = standard_metric_specs(&description.inference_args.predicted_field);
    let progress_label = progress_metric_label(&specs);
    let mut metrics = MetricsManager::new(specs, model.field_info(), model.inference_type())?;
    let mut shifter = InferenceShifter::new();

    debug!(
        source = %source.path().display(),
        fields = selected.len(),
        ?shift_mode,
        "starting run loop"
    );

    let mut records: u64 = 0;
    for row in source {
        let row = row?;
        let record = translate_record(&description.included_fields, &row, &options.date_format)?;
        let mut result = model.run(&record)?;
        result.metrics = metrics.update(&result)?;

        records += 1;
        if options.verbose && records % PROGRESS_INTERVAL == 0 {
            let alt_mape = progress_label
                .as_deref()
                .and_then(|label| result.metrics.get(label))
                .copied()
                .unwrap_or(f64::NAN);
            println!("Read {records} lines...");
            println!("After {records} records, 1-step altMAPE={alt_mape:.6}");
        }

        if shift_mode == ShiftMode::Aligned {
            result = shifter.shift(result);
        }

        let predicted = result.prediction(1).unwrap_or(f64::NAN);
        // Selected fields are validated against the declaration and the
        // translator inserts every declared field, so lookups cannot miss.
        let values: Vec<FieldValue> = selected
            .iter()
            .map(|name| result.input[name.as_str()].clone())
            .collect();
        sink.write(&values, predicted)?;
    }

    Ok(records)
}

/// Runs one stream end to end, choosing the sink from `options`.
///
/// Without plot fields, predictions go to `<output_dir>/<info>_out.csv`
/// unshifted. With plot fields, they go to a live terminal chart with
/// shift alignment, and progress printing is suppressed because stdout
/// belongs to the chart for the duration.
pub fn run_stream(
    description: &StreamDescription,
    model: &mut dyn PredictiveModel,
    options: &RunOptions,
) -> Result<RunSummary, Error> {
    let source = RecordSource::open(&description.stream.source)?;
    let selected = selected_fields(description, options.plot_fields.as_ref())?;

    match &options.plot_fields {
        None => {
            let mut sink = FileSink::create(&options.output_dir, &description.info, &selected)?;
            let output_path = sink.path().to_path_buf();
            info!(output = %output_path.display(), "writing predictions to CSV");
            let records = run_with_sink(
                description,
                model,
                source,
                &mut sink,
                &selected,
                ShiftMode::Raw,
                options,
            )?;
            let summary = sink.close()?;
            Ok(RunSummary {
                records,
                rows_written: summary.rows_written,
                output_path: Some(output_path),
            })
        }
        Some([x_field, y_field]) => {
            let quiet = RunOptions {
                verbose: false,
                ..options.clone()
            };
            let mut sink = ChartSink::stdout(&description.info, x_field, y_field)?;
            let records = run_with_sink(
                description,
                model,
                source,
                &mut sink,
                &selected,
                ShiftMode::Aligned,
                &quiet,
            )?;
            let summary = sink.close()?;
            Ok(RunSummary {
                records,
                rows_written: summary.rows_written,
                output_path: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use forecast_model::description::load_description_str;

    use super::*;

    const DESCRIPTION: &str = r#"
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
        source = "data/rec-center-hourly.csv"
    "#;

    #[test]
    fn file_runs_forward_every_declared_field() {
        let desc = load_description_str(DESCRIPTION).unwrap();
        let selected = selected_fields(&desc, None).unwrap();
        assert_eq!(selected, vec!["timestamp", "kw_energy_consumption"]);
    }

    #[test]
    fn chart_runs_forward_the_requested_pair() {
        let desc = load_description_str(DESCRIPTION).unwrap();
        let pair = [
            "timestamp".to_string(),
            "kw_energy_consumption".to_string(),
        ];
        let selected = selected_fields(&desc, Some(&pair)).unwrap();
        assert_eq!(selected, pair.to_vec());
    }

    #[test]
    fn undeclared_plot_fields_are_rejected() {
        let desc = load_description_str(DESCRIPTION).unwrap();
        let pair = ["timestamp".to_string(), "humidity".to_string()];
        let err = selected_fields(&desc, Some(&pair)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("humidity")));
    }

    #[test]
    fn progress_reads_the_model_alt_mape_label() {
        let label = progress_metric_label(&standard_metric_specs("kw_energy_consumption")).unwrap();
        assert_eq!(
            label,
            "multiStepBestPredictions:multiStep:errorMetric='altMAPE':steps=1:window=1000:\
             field=kw_energy_consumption"
        );
    }
}
