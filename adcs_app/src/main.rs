use std::{fs::File, path::PathBuf};

use adcs::{AdcsConfig, Supervisor};
use adcs_app::{AppErrors, replay};
use adcs_result::ResultManager;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Replay recorded sensor samples through the ADCS core", long_about = None)]
struct Cli {
    /// CSV file with one sensor sample per row
    #[arg(short, long)]
    samples: PathBuf,
    /// RON configuration file, flight defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Folder for supervisor.csv and control.csv
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Raw mode request applied before the first sample (0 safe, 1 detumble, 2 point, 3 science)
    #[arg(short, long, allow_negative_numbers = true)]
    mode: Option<i32>,
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppErrors> {
    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            AdcsConfig::from_file(path)?
        }
        None => AdcsConfig::default(),
    };

    let mut supervisor = Supervisor::new(&config);
    if let Some(mode) = cli.mode {
        supervisor.set_control_mode(mode);
    }

    let mut results = cli
        .output
        .as_ref()
        .map(|path| ResultManager::new(path.clone()));

    let file = File::open(&cli.samples)?;
    replay(file, &mut supervisor, results.as_mut())?;
    Ok(())
}
