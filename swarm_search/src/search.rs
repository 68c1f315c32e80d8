//! Replay-and-score hyperparameter search.
//!
//! Walks a fixed candidate grid, replays the recorded stream through a
//! model built from each candidate, and keeps the one with the lowest
//! final 1-step altMAPE. Candidates score in parallel; the grid order
//! breaks score ties so repeated searches pick the same winner.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use tracing::{debug, info};

use forecast_model::{
    description::StreamDescription,
    field::Record,
    metrics::{ErrorMetric, MetricKind, MetricsManager, standard_metric_specs},
    model::{InferenceOptions, create_model},
    params::{ModelParams, clean_name, save_model_params},
};
use forecast_runner::{
    source::RecordSource,
    translate::{DEFAULT_DATE_FORMAT, translate_record},
};

use crate::grid::{Candidate, candidate_grid};

/// Knobs for one search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Worker threads scoring candidates; 0 means one per CPU.
    pub max_workers: usize,
    /// Directory for search artifacts (the per-candidate score log).
    pub work_dir: PathBuf,
    /// Directory the winning params are saved into.
    pub params_dir: PathBuf,
    /// strftime-style format of raw datetime columns.
    pub date_format: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            work_dir: PathBuf::from("swarm"),
            params_dir: PathBuf::from("model_params"),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// What a finished search produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The winning configuration.
    pub params: ModelParams,
    /// Its final 1-step altMAPE over the replayed records.
    pub score: f64,
    /// Where the winning params were saved.
    pub params_path: PathBuf,
    /// Where the per-candidate scores were logged.
    pub log_path: PathBuf,
    /// Candidates scored.
    pub candidates: usize,
    /// Records replayed per candidate.
    pub records: u64,
}

/// Reads and translates the stream once, capped at the description's
/// iteration count. Every candidate replays this same in-memory slice.
pub fn load_records(description: &StreamDescription, date_format: &str) -> Result<Vec<Record>> {
    let limit = usize::try_from(description.iteration_count).unwrap_or(usize::MAX);
    let source = RecordSource::open(&description.stream.source)
        .with_context(|| format!("open stream {}", description.stream.source.display()))?;

    let mut records = Vec::new();
    for row in source {
        if records.len() >= limit {
            break;
        }
        let row = row?;
        records.push(translate_record(
            &description.included_fields,
            &row,
            date_format,
        )?);
    }
    if records.len() < 2 {
        bail!(
            "stream has {} usable records; need at least 2 to score candidates",
            records.len()
        );
    }
    Ok(records)
}

/// Replays `records` through a model built from `candidate` and returns
/// the final 1-step altMAPE. Lower is better; a stream too short to
/// produce the metric scores as infinity.
fn score_candidate(
    candidate: &Candidate,
    description: &StreamDescription,
    records: &[Record],
) -> Result<f64> {
    let params = candidate.to_params(&description.included_fields);
    let mut model = create_model(&params)?;
    model.enable_inference(InferenceOptions {
        predicted_field: description.inference_args.predicted_field.clone(),
    })?;

    let specs = standard_metric_specs(&description.inference_args.predicted_field);
    let label = specs
        .iter()
        .find(|s| s.metric == MetricKind::MultiStep && s.error_metric == ErrorMetric::AltMape)
        .map(|s| s.label());
    let mut metrics = MetricsManager::new(specs, model.field_info(), model.inference_type())?;

    let mut score = f64::INFINITY;
    for record in records {
        let result = model.run(record)?;
        let values = metrics.update(&result)?;
        if let Some(label) = label.as_deref() {
            if let Some(value) = values.get(label) {
                score = *value;
            }
        }
    }
    Ok(score)
}

/// Logs every candidate's score as CSV under the work directory.
fn write_search_log(
    description: &StreamDescription,
    grid: &[Candidate],
    scores: &[f64],
    work_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(work_dir)
        .with_context(|| format!("create work directory {}", work_dir.display()))?;
    let path = work_dir.join(format!("{}_search_log.csv", clean_name(&description.info)));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("create search log {}", path.display()))?;
    writer.write_record(["candidate", "alpha", "seasonal_period", "season_blend", "altMAPE"])?;
    for (i, (candidate, score)) in grid.iter().zip(scores).enumerate() {
        writer.write_record([
            i.to_string(),
            candidate.alpha.to_string(),
            candidate.seasonal_period.to_string(),
            candidate.season_blend.to_string(),
            score.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Scores the full grid for this description and saves the winner's
/// params under the stream's run name.
pub fn swarm_for_best_params(
    description: &StreamDescription,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let records = load_records(description, &options.date_format)?;
    let grid = candidate_grid(description.swarm_size);
    info!(
        candidates = grid.len(),
        records = records.len(),
        workers = options.max_workers,
        "starting swarm search"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_workers)
        .build()
        .context("build search worker pool")?;
    let scored: Vec<Result<f64>> = pool.install(|| {
        grid.par_iter()
            .map(|candidate| score_candidate(candidate, description, &records))
            .collect()
    });

    let mut scores = Vec::with_capacity(scored.len());
    for (i, result) in scored.into_iter().enumerate() {
        let score = result.with_context(|| format!("score candidate {i}"))?;
        debug!(candidate = i, score, "candidate scored");
        scores.push(score);
    }

    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if *score < scores[best] {
            best = i;
        }
    }
    if !scores[best].is_finite() {
        bail!("no candidate produced a finite score");
    }

    let log_path = write_search_log(description, &grid, &scores, &options.work_dir)?;
    let params = grid[best].to_params(&description.included_fields);
    let params_path = save_model_params(&params, &description.info, &options.params_dir)?;
    info!(
        candidate = best,
        score = scores[best],
        path = %params_path.display(),
        "search finished"
    );

    Ok(SearchOutcome {
        params,
        score: scores[best],
        params_path,
        log_path,
        candidates: grid.len(),
        records: records.len() as u64,
    })
}
