//! Configuration module
//!
//! Layers command-line flags over the engine configuration read from the
//! environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use jobdeck_engine::Config;

/// Build and validate the engine configuration
///
/// # Arguments
/// * `api_url` - Job API URL given on the command line, if any
/// * `state_dir` - State directory given on the command line, if any
pub fn load(api_url: Option<String>, state_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid JOBDECK_* environment")?;

    if let Some(api_url) = api_url {
        config.api_url = api_url;
    }
    if let Some(state_dir) = state_dir {
        config.state_dir = state_dir;
    }

    config.validate()?;
    Ok(config)
}
