use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use qsar_predict::config::RunConfig;
use qsar_predict::predictor::{run, PredictError};

#[derive(Parser)]
#[command(name = "qsar-predict")]
#[command(about = "Predict activity from SMILES with a pretrained regression model", long_about = None)]
struct Cli {
    /// Path to the model document
    #[arg(short, long)]
    model: PathBuf,

    /// CSV with a SMILES column
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// If --output is not given, write test_output.csv into this directory
    #[arg(long = "output_dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn execute(cli: Cli) -> Result<(), PredictError> {
    let config = RunConfig::resolve(cli.model, cli.input, cli.output, cli.output_dir)?;
    let summary = run(&config)?;
    log::info!(
        "{} rows ({} invalid) predicted via {} -> {}",
        summary.rows,
        summary.invalid_rows,
        summary.strategy,
        summary.output_path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
