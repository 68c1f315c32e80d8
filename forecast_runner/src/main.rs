use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use forecast_model::{
    description::load_description_path,
    model::{InferenceOptions, create_model},
    params::load_model_params,
};
use forecast_runner::{
    logging::init_logging,
    runner::{RunOptions, run_stream},
    translate::DEFAULT_DATE_FORMAT,
};

/// Run a trained model over a recorded stream.
///
/// Reads the stream description, loads the persisted model params keyed
/// by its run name, and pushes every input line through the model.
/// Predictions go to `<info>_out.csv` by default, or to a live terminal
/// chart with `--plot`. The swarm search must have produced model params
/// for this stream first.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the stream description TOML
    #[arg(default_value = "stream.toml", value_name = "DESCRIPTION")]
    description: PathBuf,

    /// Chart two declared fields live instead of writing a CSV
    /// (e.g. --plot timestamp kw_energy_consumption)
    #[arg(short, long, num_args = 2, value_names = ["X_FIELD", "Y_FIELD"])]
    plot: Option<Vec<String>>,

    /// Format used to read the input's timestamps
    #[arg(short, long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Suppress the per-100-record progress lines
    #[arg(short, long)]
    quiet: bool,

    /// Directory holding the persisted model params
    #[arg(long, default_value = "model_params", value_name = "DIR")]
    model_params_dir: PathBuf,

    /// Directory the output CSV is written into
    #[arg(long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let description = load_description_path(&cli.description)?;

    println!("Creating model from {}...", description.info);
    let params = load_model_params(&description.info, &cli.model_params_dir)?;
    let mut model = create_model(&params)?;
    model.enable_inference(InferenceOptions {
        predicted_field: description.inference_args.predicted_field.clone(),
    })?;

    let plot_fields = match cli.plot {
        Some(pair) => Some(
            <[String; 2]>::try_from(pair)
                .map_err(|_| anyhow!("--plot takes exactly two field names"))?,
        ),
        None => None,
    };

    let options = RunOptions {
        plot_fields,
        date_format: cli.date_format,
        verbose: !cli.quiet,
        output_dir: cli.output_dir,
    };
    let summary = run_stream(&description, model.as_mut(), &options)?;

    if let Some(path) = &summary.output_path {
        println!(
            "Done. Wrote {} data lines to {}.",
            summary.rows_written,
            path.display()
        );
    }
    Ok(())
}
