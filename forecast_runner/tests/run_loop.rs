mod common;

use common::{RecordingSink, gym_description, gym_model, write_input_csv};
use tempfile::TempDir;

use forecast_model::field::FieldValue;
use forecast_runner::{
    errors::Error,
    runner::{RunOptions, ShiftMode, run_stream, run_with_sink, selected_fields},
    source::RecordSource,
};

const ROWS: [(&str, f64); 5] = [
    ("7/2/10 0:00", 21.2),
    ("7/2/10 1:00", 16.4),
    ("7/2/10 2:00", 4.7),
    ("7/2/10 3:00", 4.7),
    ("7/2/10 4:00", 4.6),
];

fn quiet() -> RunOptions {
    RunOptions {
        verbose: false,
        ..RunOptions::default()
    }
}

#[test]
fn every_record_reaches_the_sink() {
    let dir = TempDir::new().unwrap();
    let input = write_input_csv(&dir, &ROWS);
    let desc = gym_description(&input);
    let mut model = gym_model();
    let mut sink = RecordingSink::default();
    let selected = selected_fields(&desc, None).unwrap();

    let records = run_with_sink(
        &desc,
        model.as_mut(),
        RecordSource::open(&input).unwrap(),
        &mut sink,
        &selected,
        ShiftMode::Raw,
        &quiet(),
    )
    .unwrap();

    assert_eq!(records, 5);
    assert_eq!(sink.rows.len(), 5);

    // Values arrive in declared order: timestamp, then the measurement.
    let (values, predicted) = &sink.rows[0];
    assert!(matches!(values[0], FieldValue::Datetime(_)));
    assert_eq!(values[1], FieldValue::Float(21.2));
    // Raw mode: every record carries the forecast it just produced.
    assert!(predicted.is_finite());
    assert!(sink.rows.iter().all(|(_, p)| p.is_finite()));
}

#[test]
fn sink_values_follow_the_selected_order() {
    let dir = TempDir::new().unwrap();
    let input = write_input_csv(&dir, &ROWS);
    let desc = gym_description(&input);
    let mut model = gym_model();
    let mut sink = RecordingSink::default();

    // Chart runs pick their own pair order; the sink sees that order.
    let selected = vec![
        "kw_energy_consumption".to_string(),
        "timestamp".to_string(),
    ];
    run_with_sink(
        &desc,
        model.as_mut(),
        RecordSource::open(&input).unwrap(),
        &mut sink,
        &selected,
        ShiftMode::Aligned,
        &quiet(),
    )
    .unwrap();

    let (values, _) = &sink.rows[0];
    assert!(matches!(values[0], FieldValue::Float(_)));
    assert!(matches!(values[1], FieldValue::Datetime(_)));
}

#[test]
fn chart_alignment_delays_predictions_one_record() {
    let dir = TempDir::new().unwrap();
    let input = write_input_csv(&dir, &ROWS);
    let desc = gym_description(&input);
    let selected = selected_fields(&desc, None).unwrap();

    let mut raw_sink = RecordingSink::default();
    let mut model = gym_model();
    run_with_sink(
        &desc,
        model.as_mut(),
        RecordSource::open(&input).unwrap(),
        &mut raw_sink,
        &selected,
        ShiftMode::Raw,
        &quiet(),
    )
    .unwrap();

    let mut aligned_sink = RecordingSink::default();
    let mut model = gym_model();
    run_with_sink(
        &desc,
        model.as_mut(),
        RecordSource::open(&input).unwrap(),
        &mut aligned_sink,
        &selected,
        ShiftMode::Aligned,
        &quiet(),
    )
    .unwrap();

    // The first aligned row has no earlier forecast to show yet.
    assert!(aligned_sink.rows[0].1.is_nan());
    // Every later aligned row carries the forecast made one record earlier.
    for i in 1..aligned_sink.rows.len() {
        assert_eq!(aligned_sink.rows[i].1, raw_sink.rows[i - 1].1);
    }
}

#[test]
fn file_run_round_trips_records_to_csv() {
    let dir = TempDir::new().unwrap();
    let input = write_input_csv(&dir, &ROWS);
    let desc = gym_description(&input);
    let mut model = gym_model();

    let options = RunOptions {
        verbose: false,
        output_dir: dir.path().to_path_buf(),
        ..RunOptions::default()
    };
    let summary = run_stream(&desc, model.as_mut(), &options).unwrap();

    assert_eq!(summary.records, 5);
    assert_eq!(summary.rows_written, 5);
    let path = summary.output_path.expect("file runs name their output");
    assert_eq!(path, dir.path().join("rec-center-hourly_out.csv"));

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "timestamp,kw_energy_consumption,predicted value");
    assert!(lines[1].starts_with("2010-07-02 00:00:00,21.2,"));
}

#[test]
fn a_malformed_row_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rec-center-hourly.csv");
    std::fs::write(
        &path,
        "timestamp,kw_energy_consumption\ndatetime,float\nT,\n\
         7/2/10 0:00,21.2\n7/2/10 1:00,unplugged\n7/2/10 2:00,4.7\n",
    )
    .unwrap();
    let desc = gym_description(&path);
    let mut model = gym_model();
    let mut sink = RecordingSink::default();
    let selected = selected_fields(&desc, None).unwrap();

    let err = run_with_sink(
        &desc,
        model.as_mut(),
        RecordSource::open(&path).unwrap(),
        &mut sink,
        &selected,
        ShiftMode::Raw,
        &quiet(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Translate(_)));
    // The valid row before the bad one was already delivered.
    assert_eq!(sink.rows.len(), 1);
}
