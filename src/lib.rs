pub mod cli_args;
pub mod configuration;
pub mod report;
pub mod simulation;

use anyhow::{Context, Result};
use configuration::AppConfiguration;
use econ_core::WorldState;
use econ_domain::{CommodityCatalog, Universe};

/// Loads the commodity catalog and the universe named in `cfg`.
pub fn load_world_state(cfg: &AppConfiguration) -> Result<WorldState> {
    let catalog = CommodityCatalog::from_file(&cfg.catalog_path).with_context(|| format!("loading catalog {}", cfg.catalog_path.display()))?;
    let universe = Universe::from_file(&cfg.universe_path, &catalog).with_context(|| format!("loading universe {}", cfg.universe_path.display()))?;
    Ok(WorldState::new(catalog, universe, &cfg.economy))
}
