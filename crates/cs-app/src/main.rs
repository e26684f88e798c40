use anyhow::Result;
use clap::Parser;
use cs_audio::trial::TrialProcessor;
use cs_core::config::{Config, load_config};

pub mod cli;
pub mod experiment;
pub mod results;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    // Single-file mode: one trial summary, no CSV row.
    if let Some(path) = &cli.analyze {
        let mut processor = TrialProcessor::new(&config.analyzer)?;
        let rho = processor.process_file(path)?;
        println!("{}: mean |ρ| = {rho:.4}", path.display());
        return Ok(());
    }

    experiment::run(&config, &cli.output, cli.seed)
}
