use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use forecast_model::{
    description::{SwarmSize, load_description_path, validate_description},
    model::InferenceType,
};
use forecast_runner::{logging::init_logging, translate::DEFAULT_DATE_FORMAT};
use swarm_search::search::{SearchOptions, swarm_for_best_params};

/// Search model hyperparameters for a recorded stream.
///
/// Replays the stream through every candidate configuration and saves the
/// best-scoring params where the run CLI expects them.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the stream description TOML
    #[arg(default_value = "stream.toml", value_name = "DESCRIPTION")]
    description: PathBuf,

    /// How many rows of input data to search over; -1 means the whole stream
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    iteration_count: Option<i64>,

    /// How many worker threads score candidates
    #[arg(short = 'w', long, default_value_t = 4)]
    max_workers: usize,

    /// Override the description's predicted field
    #[arg(short, long, value_name = "FIELD")]
    predicted_field: Option<String>,

    /// Override the search size: small, medium, or large
    #[arg(short, long, value_name = "SIZE")]
    swarm_size: Option<SwarmSize>,

    /// Override the inference type: TemporalMultiStep or TemporalAnomaly
    #[arg(short = 't', long, value_name = "TYPE")]
    inference_type: Option<InferenceType>,

    /// Format used to read the input's timestamps
    #[arg(short, long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Directory the winning model params are saved into
    #[arg(long, default_value = "model_params", value_name = "DIR")]
    model_params_dir: PathBuf,

    /// Directory for search artifacts
    #[arg(long, default_value = "swarm", value_name = "DIR")]
    work_dir: PathBuf,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn print_size_warning(size: SwarmSize) {
    match size {
        SwarmSize::Small => {
            println!("= This is a debug-sized search; don't expect good params.");
        }
        SwarmSize::Medium => println!("= Medium search. This can take a while."),
        SwarmSize::Large => println!("= Large search. This will take a long time."),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut description = load_description_path(&cli.description)?;
    if let Some(count) = cli.iteration_count {
        description.iteration_count = count;
    }
    if let Some(size) = cli.swarm_size {
        description.swarm_size = size;
    }
    if let Some(inference_type) = cli.inference_type {
        description.inference_type = inference_type;
    }
    if let Some(field) = cli.predicted_field {
        description.inference_args.predicted_field = field;
    }
    // Overrides can invalidate a description that parsed cleanly.
    validate_description(&description)?;

    let input_name = description
        .stream
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| description.info.clone());

    println!("=================================================");
    println!("= Swarming on {input_name} data...");
    print_size_warning(description.swarm_size);
    println!("=================================================");

    let options = SearchOptions {
        max_workers: cli.max_workers,
        work_dir: cli.work_dir,
        params_dir: cli.model_params_dir,
        date_format: cli.date_format,
    };
    let outcome = swarm_for_best_params(&description, &options)?;

    println!(
        "Scored {} candidates over {} records; best 1-step altMAPE={:.6}",
        outcome.candidates, outcome.records, outcome.score
    );
    println!("Wrote the following model params file:");
    println!("\t{}", outcome.params_path.display());
    Ok(())
}
