use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use scout_core::ScoutConfig;

/// Reads the RON configuration at `path`, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ScoutConfig> {
    let Some(path) = path else {
        engine_info!("No configuration file given, using defaults");
        return Ok(ScoutConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    let config: ScoutConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse configuration in {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    engine_info!("Loaded configuration from {:?}", path);
    Ok(config)
}
