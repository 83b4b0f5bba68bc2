use crate::cli_args::Cli;
use anyhow::{Context, Result};
use econ_core::EconomyConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfiguration {
    pub catalog_path: PathBuf,
    pub universe_path: PathBuf,
    pub save_dir: PathBuf,
    pub economy: EconomyConfig,
}

impl AppConfiguration {
    pub fn new(cli: &Cli, economy: EconomyConfig) -> Self {
        Self {
            catalog_path: cli.catalog.clone(),
            universe_path: cli.universe.clone(),
            save_dir: cli.save_dir.clone(),
            economy,
        }
    }

    /// Paths from the command line, tuning constants from `ECONOMY_*` variables.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let economy = EconomyConfig::from_env().context("reading ECONOMY_* environment variables")?;
        Ok(Self::new(cli, economy))
    }
}
