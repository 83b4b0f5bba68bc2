use crate::admittance::{AdmittanceSolver, ProductionIntensity, SolverError, ZeroIntensity};
use crate::config::EconomyConfig;
use crate::observation::{self, PriceStats};
use crate::pricing;
use crate::world::WorldState;
use econ_domain::{CommodityId, CommodityPrice, CommoditySymbol, Credits, PlanetId, PlanetSymbol, SimTime, SystemId, SystemSymbol};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EconomyError {
    #[error("price for commodity '{0}' not known")]
    CommodityNotKnown(CommoditySymbol),
    #[error("price for commodity '{commodity}' not known on planet '{planet}'")]
    NotSoldOnPlanet { commodity: CommoditySymbol, planet: PlanetSymbol },
    #[error("planet '{planet}' is not in system '{system}'")]
    PlanetNotInSystem { planet: PlanetSymbol, system: SystemSymbol },
    #[error("economy is not initialised")]
    NotInitialized,
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Entry point for the rest of the simulation.
///
/// Owns the admittance solver and the lifecycle flags, all game data lives in the [`WorldState`]
/// passed to each call.
pub struct Economy {
    cfg: EconomyConfig,
    solver: AdmittanceSolver,
    intensity: Box<dyn ProductionIntensity>,
    initialized: bool,
    prices_initialised: bool,
    queued: u32,
}

impl std::fmt::Debug for Economy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Economy")
            .field("initialized", &self.initialized)
            .field("prices_initialised", &self.prices_initialised)
            .field("queued", &self.queued)
            .field("solver", &self.solver)
            .finish()
    }
}

impl Economy {
    pub fn new(cfg: EconomyConfig) -> Self {
        Self::with_intensity(cfg, Box::new(ZeroIntensity))
    }

    pub fn with_intensity(cfg: EconomyConfig, intensity: Box<dyn ProductionIntensity>) -> Self {
        Self {
            cfg,
            solver: AdmittanceSolver::default(),
            intensity,
            initialized: false,
            prices_initialised: false,
            queued: 0,
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.cfg
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn queued_updates(&self) -> u32 {
        self.queued
    }

    /// Computes the static planet prices on first use, then assembles and solves the admittance
    /// matrix. Calling it again on an initialised economy does nothing.
    pub fn init(&mut self, world: &mut WorldState) -> Result<(), EconomyError> {
        if self.initialized {
            return Ok(());
        }

        if !self.prices_initialised {
            pricing::initialise_commodity_prices(&mut world.universe, &mut world.catalog, &self.cfg);
            self.prices_initialised = true;
        }

        self.initialized = true;
        info!("Economy initialised with {} priced commodities", world.catalog.priced().len());

        self.refresh(world)
    }

    /// Reassembles the admittance matrix after a permanent change of the universe and re-solves.
    pub fn refresh(&mut self, world: &WorldState) -> Result<(), EconomyError> {
        if !self.initialized {
            return Ok(());
        }

        if let Err(e) = self.solver.assemble(&world.universe, &self.cfg) {
            warn!("Unable to create economy G matrix: {}", e);
            self.queued = 0;
            return Err(e.into());
        }

        self.update(world, SimTime::ZERO)
    }

    /// Advances production by `dt` and re-solves the per-system modulation.
    ///
    /// A failed solve keeps the previous modulation. Queued updates are consumed either way.
    pub fn update(&mut self, world: &WorldState, dt: SimTime) -> Result<(), EconomyError> {
        if !self.initialized {
            return Ok(());
        }

        let result = self.solver.update(dt, &world.universe, &world.catalog, self.intensity.as_mut());
        self.queued = 0;

        match result {
            Ok(()) => {
                debug!("Economy updated by {}", dt);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to solve the economy system: {}", e);
                Err(e.into())
            }
        }
    }

    pub fn add_queued_update(&mut self) {
        self.queued += 1;
    }

    /// Runs a single refresh if any update was queued since the last one.
    pub fn exec_queued(&mut self, world: &WorldState) -> Result<(), EconomyError> {
        if self.queued > 0 {
            return self.refresh(world);
        }
        Ok(())
    }

    pub fn destroy(&mut self) {
        if !self.initialized {
            return;
        }
        self.solver.clear();
        self.queued = 0;
        self.initialized = false;
        info!("Economy destroyed");
    }

    pub fn system_modulation(&self, system: SystemId) -> Result<&[f64], EconomyError> {
        if !self.initialized {
            return Err(EconomyError::NotInitialized);
        }
        self.solver.system_modulation(system.0).ok_or(EconomyError::NotInitialized)
    }

    fn price_record<'a>(&self, world: &'a WorldState, commodity: CommodityId, system: SystemId, planet: PlanetId) -> Result<&'a CommodityPrice, EconomyError> {
        let c = world.catalog.commodity(commodity);
        if world.catalog.price_index(commodity).is_none() {
            warn!("Price for commodity '{}' not known.", c.name);
            return Err(EconomyError::CommodityNotKnown(c.name.clone()));
        }

        let p = world.universe.planet(planet);
        if p.system != system {
            let system = world.universe.system(system);
            warn!("Planet '{}' is not in system '{}'.", p.name, system.name);
            return Err(EconomyError::PlanetNotInSystem {
                planet: p.name.clone(),
                system: system.name.clone(),
            });
        }

        p.commodity_price(commodity).ok_or_else(|| {
            warn!("Price for commodity '{}' not known on this planet.", c.name);
            EconomyError::NotSoldOnPlanet {
                commodity: c.name.clone(),
                planet: p.name.clone(),
            }
        })
    }

    /// Current price of a commodity on a planet.
    pub fn price(&self, world: &WorldState, commodity: CommodityId, system: SystemId, planet: PlanetId) -> Result<Credits, EconomyError> {
        self.price_at_time(world, commodity, system, planet, world.clock)
    }

    pub fn price_at_time(
        &self,
        world: &WorldState,
        commodity: CommodityId,
        system: SystemId,
        planet: PlanetId,
        time: SimTime,
    ) -> Result<Credits, EconomyError> {
        let cp = self.price_record(world, commodity, system, planet)?;
        Ok(observation::price_at_time(cp, time, &self.cfg.time_scale()))
    }

    /// Like [`Economy::price`], but `Credits(0)` when the price is not known. Zero means "no data".
    pub fn price_or_zero(&self, world: &WorldState, commodity: CommodityId, system: SystemId, planet: PlanetId) -> Credits {
        self.price(world, commodity, system, planet).unwrap_or_default()
    }

    pub fn price_at_time_or_zero(&self, world: &WorldState, commodity: CommodityId, system: SystemId, planet: PlanetId, time: SimTime) -> Credits {
        self.price_at_time(world, commodity, system, planet, time).unwrap_or_default()
    }

    /// Records the prices a player sees when landing on `planet` now.
    pub fn average_seen_prices(&self, world: &mut WorldState, planet: PlanetId) -> usize {
        let now = world.clock;
        self.average_seen_prices_at_time(world, planet, now)
    }

    /// Records prices sampled at `price_time`, stamped with the current clock.
    pub fn average_seen_prices_at_time(&self, world: &mut WorldState, planet: PlanetId, price_time: SimTime) -> usize {
        let now = world.clock;
        observation::observe_planet(&mut world.universe, planet, now, price_time, &self.cfg.time_scale())
    }

    /// Mean and deviation of what the player saw of a commodity on a planet.
    ///
    /// `Ok(None)` means the planet sells it but nothing was observed yet.
    pub fn average_planet_price(&self, world: &WorldState, commodity: CommodityId, planet: PlanetId) -> Result<Option<PriceStats>, EconomyError> {
        let c = world.catalog.commodity(commodity);
        if world.catalog.price_index(commodity).is_none() {
            warn!("Average price for commodity '{}' not known.", c.name);
            return Err(EconomyError::CommodityNotKnown(c.name.clone()));
        }
        let p = world.universe.planet(planet);
        let cp = p.commodity_price(commodity).ok_or_else(|| {
            warn!("Price for commodity '{}' not known on this planet.", c.name);
            EconomyError::NotSoldOnPlanet {
                commodity: c.name.clone(),
                planet: p.name.clone(),
            }
        })?;
        Ok(observation::planet_stats(cp))
    }

    pub fn average_planet_price_or_zero(&self, world: &WorldState, commodity: CommodityId, planet: PlanetId) -> PriceStats {
        self.average_planet_price(world, commodity, planet).ok().flatten().unwrap_or(PriceStats::ZERO)
    }

    /// Galaxy-wide mean of the per-planet observed means.
    pub fn average_price(&self, world: &WorldState, commodity: CommodityId) -> Result<Option<PriceStats>, EconomyError> {
        if world.catalog.price_index(commodity).is_none() {
            let name = world.catalog.commodity(commodity).name.clone();
            warn!("Average price for commodity '{}' not known.", name);
            return Err(EconomyError::CommodityNotKnown(name));
        }
        Ok(observation::average_price(&world.universe, commodity))
    }

    pub fn average_price_or_zero(&self, world: &WorldState, commodity: CommodityId) -> PriceStats {
        self.average_price(world, commodity).ok().flatten().unwrap_or(PriceStats::ZERO)
    }

    pub fn record_purchase(&self, world: &mut WorldState, commodity: CommodityId, price: Credits) {
        world.catalog.record_purchase(commodity, price);
    }

    /// Forgets everything the player has seen, e.g. for a new game.
    pub fn clear_known(&self, world: &mut WorldState) {
        observation::clear_known(&mut world.universe, &mut world.catalog);
    }
}
