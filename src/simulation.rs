use anyhow::Result;
use econ_core::{Economy, WorldState};
use econ_domain::SimTime;
use itertools::Itertools;
use tracing::{debug, info};

/// Advances the clock `ticks` times by `dt`, updating the economy and landing on every planet each
/// tick. Returns the number of observations recorded.
pub fn run_ticks(world: &mut WorldState, economy: &mut Economy, ticks: u32, dt: SimTime) -> Result<usize> {
    let planets = world.universe.planets().iter().map(|p| p.id).collect_vec();
    let mut observed = 0;

    for tick in 0..ticks {
        world.advance_clock(dt);
        if let Err(e) = economy.update(world, dt) {
            debug!("Tick {} keeps the previous modulation: {}", tick + 1, e);
        }
        for planet in planets.iter() {
            observed += economy.average_seen_prices(world, *planet);
        }
        debug!("Tick {} at {}: {} observations so far", tick + 1, world.clock, observed);
    }

    info!("Simulated {} ticks up to {}, recorded {} observations", ticks, world.clock, observed);
    Ok(observed)
}
