use std::path::PathBuf;

use clap::Parser;
use engine_logging::LogDestination;
use log::LevelFilter;

/// Checks candidate pages for subtitle languages.
#[derive(Debug, Parser)]
#[command(name = "subscout")]
#[command(about = "Resolve which subtitle languages candidate pages mention", long_about = None)]
pub struct Cli {
    /// RON configuration file. Missing fields use their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where log output goes: terminal, file or both.
    #[arg(long, default_value = "terminal")]
    pub log: LogDestination,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Candidate page addresses. Read from stdin, one per line, when none are given.
    pub addresses: Vec<String>,
}
