mod cli;
mod config_file;
mod session;

use std::io::{self, BufRead};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use engine_logging::engine_info;
use scout_core::ScoutConfig;
use scout_engine::EngineHandle;

use crate::cli::Cli;

fn main() {
    if let Err(err) = run() {
        eprintln!("subscout error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log, cli.log_level);

    let config = config_file::load_config(cli.config.as_deref())?;
    let addresses = if cli.addresses.is_empty() {
        read_addresses(io::stdin().lock())?
    } else {
        cli.addresses
    };
    if addresses.is_empty() {
        bail!("no addresses given");
    }

    let engine = EngineHandle::new(&config).context("failed to start the engine")?;
    engine_info!("Resolving {} addresses", addresses.len());
    let table = session::run_session(&engine, &addresses, quiet_limit(&config));

    for line in session::render_rows(&table) {
        println!("{line}");
    }
    Ok(())
}

fn read_addresses(input: impl BufRead) -> Result<Vec<String>> {
    let mut addresses = Vec::new();
    for line in input.lines() {
        let line = line.context("failed to read addresses from stdin")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            addresses.push(trimmed.to_string());
        }
    }
    Ok(addresses)
}

/// Longest a single task can legitimately stay silent, plus slack.
fn quiet_limit(config: &ScoutConfig) -> Duration {
    Duration::from_millis(
        config.fetch_timeout_ms
            + config.page_load_timeout_ms
            + 2 * config.inter_attempt_delay_ms
            + 5_000,
    )
}
