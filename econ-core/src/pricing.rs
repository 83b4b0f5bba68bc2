//! Static sinusoidal price model.
//!
//! Prices are derived once from planet and commodity attributes, perturbed by system conditions,
//! and then smoothed in three sweeps: across the planets of a system, across neighbouring systems,
//! and back onto every planet.

use crate::config::EconomyConfig;
use econ_domain::{Commodity, CommodityCatalog, CommodityId, CommodityPrice, Planet, SystemId, Universe};
use tracing::{debug, info};

/// Weight of the system average when a planet price is blended towards it.
const PLANET_TO_SYSTEM_BLEND: f64 = 0.75;
/// Weight of the neighbour mean when a system average is blended towards it.
const NEIGHBOUR_BLEND: f64 = 0.5;
const SYSTEM_VARIATION_SHARE: f64 = 0.2;
const VARIATION_DAMPING: f64 = 0.1;

/// Population term in `[-1, 1]`. Uninhabited planets sit at the lower bound.
pub fn population_factor(population: u64, cfg: &EconomyConfig) -> f64 {
    if population == 0 {
        return -1.0;
    }
    (((population as f64).ln() - cfg.reference_population.ln()) / cfg.population_spread).tanh()
}

/// Stretches the planet period by the length of the exterior graphic name, for some variety.
pub fn exterior_period_scale(gfx_exterior: &str, cfg: &EconomyConfig) -> f64 {
    let name_len = gfx_exterior.chars().count() as f64 - cfg.planet_exterior_gfx_path.chars().count() as f64;
    (1.0 + (name_len - 19.0) / 100.0).max(cfg.min_damping)
}

/// Derives the planet-level price record of one commodity from planet attributes alone.
pub fn calc_price(planet: &Planet, faction_name: Option<&str>, commodity: &Commodity, cfg: &EconomyConfig) -> CommodityPrice {
    let mut cp = CommodityPrice::new(commodity.price as f64);

    let (class_scale, faction_scale) = match commodity.modifiers.as_ref() {
        Some(m) => (m.planet_class_scale(&planet.class), m.faction_scale(faction_name)),
        None => (1.0, 1.0),
    };

    cp.price *= class_scale;
    cp.planet_variation = cfg.planet_variation_base;
    cp.sys_variation = 0.0;

    cp.planet_period = (commodity.period + cfg.planet_period_base) * exterior_period_scale(&planet.gfx_exterior, cfg);

    let factor = population_factor(planet.population, cfg);
    cp.price *= 1.0 + factor * commodity.population_modifier;
    cp.planet_variation *= 0.5 - factor * 0.25;
    cp.planet_period *= 1.0 + factor * 0.5;

    cp.price *= faction_scale;

    // Wider presence means safer space: cheaper and more stable.
    let presence = cfg.damped(planet.presence_range, cfg.presence_range_scale);
    cp.price *= presence;
    cp.planet_period /= presence;

    cp
}

/// Running mean of one commodity over the planets of a system.
#[derive(Debug, Clone, PartialEq)]
struct SystemAverage {
    commodity: CommodityId,
    count: usize,
    price: f64,
    planet_period: f64,
    sys_period: f64,
    planet_variation: f64,
    sys_variation: f64,
    neighbour_mean: f64,
}

impl SystemAverage {
    fn first(commodity: CommodityId, cp: &CommodityPrice) -> Self {
        Self {
            commodity,
            count: 1,
            price: cp.price,
            planet_period: cp.planet_period,
            sys_period: cp.sys_period,
            planet_variation: cp.planet_variation,
            sys_variation: cp.sys_variation,
            neighbour_mean: 0.0,
        }
    }

    fn accumulate(&mut self, cp: &CommodityPrice) {
        self.count += 1;
        self.price += cp.price;
        self.planet_period += cp.planet_period;
        self.sys_period += cp.sys_period;
        self.planet_variation += cp.planet_variation;
        self.sys_variation += cp.sys_variation;
    }

    fn finish(&mut self) {
        let n = self.count as f64;
        self.price /= n;
        self.planet_period /= n;
        self.sys_period /= n;
        self.planet_variation /= n;
        self.sys_variation /= n;
    }
}

fn find_average(averages: &[SystemAverage], commodity: CommodityId) -> Option<&SystemAverage> {
    averages.iter().find(|a| a.commodity == commodity)
}

/// Applies system conditions to every planet price and blends planets towards the system average.
fn modify_system_prices(universe: &mut Universe, system: SystemId, cfg: &EconomyConfig) -> Vec<SystemAverage> {
    let sys = universe.system(system);
    let env = sys.environment;
    let sys_period = cfg.system_period_base / (sys.jumps.len() + 1) as f64;
    let radius_period = cfg.damped(env.radius, cfg.radius_price_scale);
    let radius_variation = cfg.damped(env.radius, cfg.radius_variation_scale);
    let planets = sys.planets.clone();

    let mut averages: Vec<SystemAverage> = Vec::new();

    for pid in planets.iter() {
        for (commodity, cp) in universe.planet_mut(*pid).market_mut() {
            cp.price *= 1.0 + env.radius / cfg.radius_price_scale;
            cp.planet_period /= radius_period;
            cp.planet_variation /= radius_variation;

            cp.price *= 1.0 + env.nebula_volatility / cfg.volatility_price_scale;
            cp.price *= 1.0 + env.interference / cfg.interference_price_scale;

            cp.sys_period = sys_period;

            match averages.iter_mut().find(|a| a.commodity == commodity) {
                Some(avg) => avg.accumulate(cp),
                None => averages.push(SystemAverage::first(commodity, cp)),
            }
        }
    }

    averages.iter_mut().for_each(SystemAverage::finish);

    for pid in planets.iter() {
        for (commodity, cp) in universe.planet_mut(*pid).market_mut() {
            if let Some(avg) = find_average(&averages, commodity) {
                cp.price = (1.0 - PLANET_TO_SYSTEM_BLEND) * cp.price + PLANET_TO_SYSTEM_BLEND * avg.price;
                cp.sys_variation = SYSTEM_VARIATION_SHARE * avg.planet_variation;
            }
        }
    }

    averages
}

/// Mean of each commodity's average over the directly connected systems that sell it.
///
/// Reads pass-one averages only, so it has to run for every system before any is blended.
fn neighbour_means(universe: &Universe, averages: &[Vec<SystemAverage>]) -> Vec<Vec<f64>> {
    universe
        .systems()
        .iter()
        .map(|sys| {
            averages[sys.id.0]
                .iter()
                .map(|avg| {
                    let neighbour_prices: Vec<f64> =
                        sys.jumps.iter().filter_map(|n| find_average(&averages[n.0], avg.commodity)).map(|a| a.price).collect();
                    if neighbour_prices.is_empty() {
                        avg.price
                    } else {
                        neighbour_prices.iter().sum::<f64>() / neighbour_prices.len() as f64
                    }
                })
                .collect()
        })
        .collect()
}

/// Blends the system average with its neighbours and pushes the result back onto the planets.
fn apply_neighbour_smoothing(universe: &mut Universe, system: SystemId, averages: &mut [SystemAverage]) {
    for avg in averages.iter_mut() {
        avg.price = (1.0 - NEIGHBOUR_BLEND) * avg.price + NEIGHBOUR_BLEND * avg.neighbour_mean;
    }

    let planets = universe.system(system).planets.clone();
    for pid in planets {
        for (commodity, cp) in universe.planet_mut(pid).market_mut() {
            if let Some(avg) = find_average(averages, commodity) {
                cp.price = (1.0 - PLANET_TO_SYSTEM_BLEND) * cp.price + PLANET_TO_SYSTEM_BLEND * avg.price;
                cp.planet_variation = VARIATION_DAMPING * (0.5 * avg.planet_variation + 0.5 * cp.planet_variation);
                cp.planet_variation *= cp.price;
                cp.sys_variation *= cp.price;
            }
        }
    }
}

/// One-time initialisation of every planet price record.
///
/// The catalog's modifier tables are consumed and discarded afterwards.
pub fn initialise_commodity_prices(universe: &mut Universe, catalog: &mut CommodityCatalog, cfg: &EconomyConfig) {
    let planet_ids: Vec<_> = universe.planets().iter().map(|p| p.id).collect();
    let mut records = 0usize;

    for pid in planet_ids {
        let planet = universe.planet(pid);
        let faction_name = planet.faction.map(|f| universe.factions.name(f).0.clone());
        let computed: Vec<CommodityPrice> = planet
            .commodities()
            .iter()
            .map(|c| calc_price(planet, faction_name.as_deref(), catalog.commodity(*c), cfg))
            .collect();
        records += computed.len();
        universe.planet_mut(pid).commodity_prices_mut().copy_from_slice(&computed);
    }

    let system_ids: Vec<SystemId> = universe.systems().iter().map(|s| s.id).collect();

    let mut averages: Vec<Vec<SystemAverage>> = system_ids.iter().map(|id| modify_system_prices(universe, *id, cfg)).collect();

    let means = neighbour_means(universe, &averages);
    for (system_averages, system_means) in averages.iter_mut().zip(means) {
        for (avg, mean) in system_averages.iter_mut().zip(system_means) {
            avg.neighbour_mean = mean;
        }
    }

    for (id, system_averages) in system_ids.iter().zip(averages.iter_mut()) {
        apply_neighbour_smoothing(universe, *id, system_averages);
    }

    catalog.discard_modifiers();

    debug!("Smoothed prices over {} systems", system_ids.len());
    info!("Initialised {} commodity prices", records);
}
