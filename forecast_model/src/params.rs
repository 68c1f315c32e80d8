//! Tuned model parameters and their on-disk form.
//!
//! The swarm search persists its winning configuration as
//! `<params_dir>/<clean_name>_model_params.toml`, where `clean_name` is the
//! run name with spaces and hyphens mapped to underscores. The run CLI
//! loads the file back by run name; a missing file is reported as "run the
//! search first" rather than a bare not-found.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::FieldSpec;

/// Configuration of one model instance, as chosen by the swarm search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelParams {
    /// Registry key selecting the model implementation.
    pub model_type: String,
    /// Steps ahead the model predicts; 1 means the next record.
    #[serde(default = "default_steps")]
    pub steps: Vec<u32>,
    /// Smoothing factor for the running level, in (0, 1].
    pub alpha: f64,
    /// Season length in records; 0 disables the seasonal profile.
    #[serde(default)]
    pub seasonal_period: usize,
    /// Weight of the seasonal profile against the level, in [0, 1].
    #[serde(default = "default_season_blend")]
    pub season_blend: f64,
    /// The fields the model was tuned against, in column order.
    pub fields: Vec<FieldSpec>,
}

fn default_steps() -> Vec<u32> {
    vec![1]
}

fn default_season_blend() -> f64 {
    0.5
}

/// Maps a run name to the form used in params file names.
pub fn clean_name(name: &str) -> String {
    name.replace(' ', "_").replace('-', "_")
}

/// Where the params for `name` live under `dir`.
pub fn params_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_model_params.toml", clean_name(name)))
}

/// Range and shape checks for a parsed [`ModelParams`].
pub fn validate_params(params: &ModelParams) -> anyhow::Result<()> {
    if params.model_type.trim().is_empty() {
        bail!("model_type cannot be empty");
    }
    if params.steps.is_empty() {
        bail!("steps cannot be empty");
    }
    if params.steps.iter().any(|&s| s == 0) {
        bail!("steps must be >= 1");
    }
    if !(params.alpha > 0.0 && params.alpha <= 1.0) {
        bail!("alpha must be in (0, 1], got {}", params.alpha);
    }
    if !(0.0..=1.0).contains(&params.season_blend) {
        bail!("season_blend must be in [0, 1], got {}", params.season_blend);
    }
    if params.fields.is_empty() {
        bail!("model params declare no fields");
    }
    Ok(())
}

/// Parse and validate model params from a TOML string.
pub fn load_params_str(toml_str: &str) -> anyhow::Result<ModelParams> {
    let params: ModelParams =
        toml::from_str(toml_str).context("failed to parse model params TOML")?;
    validate_params(&params)?;
    Ok(params)
}

/// Loads the params previously tuned for `name` from `dir`.
pub fn load_model_params(name: &str, dir: &Path) -> anyhow::Result<ModelParams> {
    let path = params_path(dir, name);
    if !path.exists() {
        bail!(
            "No model params exist for '{name}'. Run the swarm search first (expected {})",
            path.display()
        );
    }
    debug!(path = %path.display(), "loading model params");
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read model params {}", path.display()))?;
    load_params_str(&text).with_context(|| format!("in {}", path.display()))
}

/// Writes `params` for `name` under `dir`, creating the directory if
/// needed, and returns the file path.
pub fn save_model_params(params: &ModelParams, name: &str, dir: &Path) -> anyhow::Result<PathBuf> {
    validate_params(params)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create params directory {}", dir.display()))?;
    let path = params_path(dir, name);
    let text = toml::to_string_pretty(params).context("serialize model params")?;
    std::fs::write(&path, text).with_context(|| format!("write model params {}", path.display()))?;
    debug!(path = %path.display(), "saved model params");
    Ok(path)
}
