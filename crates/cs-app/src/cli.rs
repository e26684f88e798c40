use std::path::PathBuf;

use clap::Parser;

/// chirpscope — spectral peak tracking and chirp-correlation analysis.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CSV results file. Created with a header if absent, appended to
    /// otherwise.
    #[arg(short, long, default_value = "results.csv")]
    pub output: PathBuf,

    /// Analyze a single audio file and print its ρ summary instead of
    /// running the experiment sweep.
    #[arg(long)]
    pub analyze: Option<PathBuf>,

    /// Seed for stimulus generation and task shuffling. Random when
    /// omitted; set it to reproduce a full experiment bit-for-bit.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
