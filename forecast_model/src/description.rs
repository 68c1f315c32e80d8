//! Stream description: parsing, validation, and loading.
//!
//! A TOML-backed description of one prediction stream:
//! - A run name (`info`) that keys the persisted model params and the
//!   output file name
//! - The ordered field declarations (`included_fields`)
//! - Which field is predicted (`inference_args.predicted_field`)
//! - Where the raw records come from (`stream.source`)
//! - Search knobs consumed by the swarm CLI (`swarm_size`,
//!   `iteration_count`, `inference_type`)
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_description_str`]
//! - Parse + validate from a file path: [`load_description_path`]

use std::{collections::HashSet, fmt, path::PathBuf, str::FromStr};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::{field::FieldSpec, model::InferenceType};

/// How hard the hyperparameter search should try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwarmSize {
    /// Quick exploratory pass, not meant to produce good params.
    Small,
    /// The everyday setting.
    #[default]
    Medium,
    /// Exhaustive pass for a final tune.
    Large,
}

impl fmt::Display for SwarmSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwarmSize::Small => "small",
            SwarmSize::Medium => "medium",
            SwarmSize::Large => "large",
        };
        f.write_str(name)
    }
}

impl FromStr for SwarmSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(SwarmSize::Small),
            "medium" => Ok(SwarmSize::Medium),
            "large" => Ok(SwarmSize::Large),
            other => Err(format!(
                "invalid swarm size '{other}'; expected small, medium, or large"
            )),
        }
    }
}

/// Arguments handed to the model when inference is enabled.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceArgs {
    /// The field whose future values are predicted.
    pub predicted_field: String,
}

/// Where the raw records come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSource {
    /// Path to the input CSV, relative to the working directory.
    pub source: PathBuf,
}

/// Top-level description of one prediction stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamDescription {
    /// Run name; keys the persisted params and the output file.
    pub info: String,
    /// Search effort for the swarm CLI.
    #[serde(default)]
    pub swarm_size: SwarmSize,
    /// Records to process; -1 means the whole stream.
    #[serde(default = "default_iteration_count")]
    pub iteration_count: i64,
    /// Inference style requested from the model.
    #[serde(default)]
    pub inference_type: InferenceType,
    /// Ordered field declarations; column i of the stream is field i.
    pub included_fields: Vec<FieldSpec>,
    /// Arguments handed to the model when inference is enabled.
    pub inference_args: InferenceArgs,
    /// Where the raw records come from.
    pub stream: StreamSource,
}

fn default_iteration_count() -> i64 {
    -1
}

impl StreamDescription {
    /// The declared field names, in column order.
    pub fn field_names(&self) -> Vec<String> {
        self.included_fields
            .iter()
            .map(|f| f.field_name.clone())
            .collect()
    }
}

/// Checks the cross-field rules a bare parse cannot express.
///
/// Errors:
/// - Empty run name or empty field list
/// - Duplicate field names
/// - A predicted field that is not declared
/// - An iteration count other than -1 or a positive number
pub fn validate_description(desc: &StreamDescription) -> anyhow::Result<()> {
    if desc.info.trim().is_empty() {
        bail!("stream description needs a non-empty run name (info)");
    }
    if desc.included_fields.is_empty() {
        bail!("stream description declares no fields");
    }

    let mut seen = HashSet::new();
    for field in &desc.included_fields {
        if field.field_name.trim().is_empty() {
            bail!("field names cannot be empty");
        }
        if !seen.insert(field.field_name.as_str()) {
            bail!("duplicate field name: {}", field.field_name);
        }
    }

    if !seen.contains(desc.inference_args.predicted_field.as_str()) {
        bail!(
            "predicted field '{}' is not declared in included_fields",
            desc.inference_args.predicted_field
        );
    }

    if desc.iteration_count < -1 || desc.iteration_count == 0 {
        bail!(
            "iteration_count must be -1 (whole stream) or positive, got {}",
            desc.iteration_count
        );
    }

    Ok(())
}

/// Parse and validate a stream description from a TOML string.
pub fn load_description_str(toml_str: &str) -> anyhow::Result<StreamDescription> {
    let desc: StreamDescription =
        from_str(toml_str).context("failed to parse stream description TOML")?;
    validate_description(&desc)?;
    Ok(desc)
}

/// Read a stream description TOML file from disk, parse, and validate it.
///
/// See [`load_description_str`] for the validation rules.
pub fn load_description_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<StreamDescription> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read stream description {}", path.as_ref().display()))?;
    load_description_str(&text)
}
