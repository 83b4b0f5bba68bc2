use crate::config::EconomyConfig;
use crate::gatherable::GatherableField;
use econ_domain::{CommodityCatalog, SimTime, Universe};
use rand::Rng;

/// Everything the economy reads and mutates, owned in one place.
#[derive(Debug, Clone)]
pub struct WorldState {
    pub catalog: CommodityCatalog,
    pub universe: Universe,
    pub clock: SimTime,
    pub gatherables: GatherableField,
}

impl WorldState {
    pub fn new(catalog: CommodityCatalog, universe: Universe, cfg: &EconomyConfig) -> Self {
        Self::with_seed(catalog, universe, cfg, rand::thread_rng().gen())
    }

    pub fn with_seed(catalog: CommodityCatalog, universe: Universe, cfg: &EconomyConfig, seed: u64) -> Self {
        Self {
            catalog,
            universe,
            clock: SimTime::ZERO,
            gatherables: GatherableField::new(cfg, seed),
        }
    }

    pub fn advance_clock(&mut self, dt: SimTime) {
        self.clock += dt;
    }
}
