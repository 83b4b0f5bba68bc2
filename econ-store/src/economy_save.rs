use econ_core::{observation, WorldState};
use econ_domain::{Credits, SimTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What the player knows about the economy: last purchase prices and observed price statistics.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EconomySave {
    /// Simulation clock at capture time, in ntime.
    #[serde(default)]
    pub clock: u64,
    #[serde(default)]
    pub last_purchase: Vec<LastPurchaseEntry>,
    #[serde(default)]
    pub systems: Vec<SystemSaveEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastPurchaseEntry {
    pub name: String,
    pub price: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemSaveEntry {
    pub name: String,
    pub planets: Vec<PlanetSaveEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanetSaveEntry {
    pub name: String,
    pub commodities: Vec<CommoditySaveEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CommoditySaveEntry {
    pub name: String,
    pub sum: f64,
    pub sum2: f64,
    pub cnt: u32,
    pub time: u64,
}

impl EconomySave {
    /// Snapshot of the player's knowledge. Only observed pairs and positive purchase prices are kept.
    pub fn capture(world: &WorldState) -> Self {
        let last_purchase = world
            .catalog
            .iter()
            .filter(|(_, c)| c.last_purchase_price.is_positive())
            .map(|(_, c)| LastPurchaseEntry {
                name: c.name.0.clone(),
                price: c.last_purchase_price.amount(),
            })
            .collect();

        let systems = world
            .universe
            .systems()
            .iter()
            .filter_map(|sys| {
                let planets: Vec<PlanetSaveEntry> = world
                    .universe
                    .planets_of(sys.id)
                    .filter_map(|planet| {
                        let commodities: Vec<CommoditySaveEntry> = planet
                            .market()
                            .filter(|(_, cp)| cp.has_observations())
                            .map(|(commodity, cp)| CommoditySaveEntry {
                                name: world.catalog.commodity(commodity).name.0.clone(),
                                sum: cp.sum,
                                sum2: cp.sum2,
                                cnt: cp.cnt,
                                time: cp.update_time.0,
                            })
                            .collect();
                        (!commodities.is_empty()).then(|| PlanetSaveEntry {
                            name: planet.name.0.clone(),
                            commodities,
                        })
                    })
                    .collect();
                (!planets.is_empty()).then(|| SystemSaveEntry {
                    name: sys.name.0.clone(),
                    planets,
                })
            })
            .collect();

        Self {
            clock: world.clock.0,
            last_purchase,
            systems,
        }
    }

    /// Replaces the player's knowledge in `world` with this snapshot.
    ///
    /// Everything is cleared first. Entries naming systems, planets or commodities the world does not
    /// know are skipped with a warning. The clock resumes at the saved time, or later if a restored
    /// record is stamped after it. Returns the number of restored price records.
    pub fn restore(&self, world: &mut WorldState) -> usize {
        observation::clear_known(&mut world.universe, &mut world.catalog);
        let mut clock = SimTime(self.clock);

        for entry in self.last_purchase.iter() {
            match world.catalog.get_quiet(&entry.name) {
                Some(id) => world.catalog.record_purchase(id, Credits(entry.price)),
                None => warn!("Skipping last purchase of unknown commodity '{}'", entry.name),
            }
        }

        let mut restored = 0;
        for sys_entry in self.systems.iter() {
            let Some(system) = world.universe.system_by_name(&sys_entry.name) else {
                warn!("Skipping saved economy of unknown system '{}'", sys_entry.name);
                continue;
            };
            for planet_entry in sys_entry.planets.iter() {
                let planet = match world.universe.planet_by_name(&planet_entry.name) {
                    Some(pid) if world.universe.planet(pid).system == system => pid,
                    _ => {
                        warn!("Skipping saved economy of unknown planet '{}' in system '{}'", planet_entry.name, sys_entry.name);
                        continue;
                    }
                };
                for entry in planet_entry.commodities.iter() {
                    let record = world
                        .catalog
                        .get_quiet(&entry.name)
                        .and_then(|id| world.universe.planet_mut(planet).commodity_price_mut(id));
                    match record {
                        Some(cp) => {
                            cp.sum = entry.sum;
                            cp.sum2 = entry.sum2;
                            cp.cnt = entry.cnt;
                            cp.update_time = SimTime(entry.time);
                            clock = clock.max(cp.update_time);
                            restored += 1;
                        }
                        None => warn!("Skipping saved price of '{}' on planet '{}'", entry.name, planet_entry.name),
                    }
                }
            }
        }

        world.clock = world.clock.max(clock);
        debug!("Restored {} observed prices, clock at {}", restored, world.clock);
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use econ_core::{Economy, EconomyConfig};
    use econ_domain::{CommodityCatalog, Universe};
    use tracing_test::traced_test;

    const CATALOG: &str = r#"{ "commodities": [
        { "name": "Food", "price": 100 },
        { "name": "Medicine", "price": 350 },
        { "name": "Debris", "price": 0 }
    ] }"#;

    const UNIVERSE: &str = r#"{
        "systems": [
            { "name": "Sol", "jumps": ["Alpha Centauri"], "planets": ["Earth", "Mars"] },
            { "name": "Alpha Centauri", "planets": ["Proxima b"] }
        ],
        "planets": [
            { "name": "Earth", "population": 8000000000, "commodities": ["Food", "Medicine"] },
            { "name": "Mars", "population": 1000000, "commodities": ["Food"] },
            { "name": "Proxima b", "population": 20000, "commodities": ["Medicine", "Debris"] }
        ]
    }"#;

    fn fixture() -> Result<(WorldState, Economy)> {
        let cfg = EconomyConfig::default();
        let catalog = CommodityCatalog::from_json_str(CATALOG)?;
        let universe = Universe::from_json_str(UNIVERSE, &catalog)?;
        let mut world = WorldState::with_seed(catalog, universe, &cfg, 3);
        let mut economy = Economy::new(cfg);
        economy.init(&mut world)?;
        Ok((world, economy))
    }

    #[test]
    fn save_then_load_reproduces_observations() -> Result<()> {
        let (mut world, economy) = fixture()?;
        let earth = world.universe.planet_by_name("Earth").unwrap();
        let proxima = world.universe.planet_by_name("Proxima b").unwrap();
        let food = world.catalog.get("Food").unwrap();

        for tick in 1..=3 {
            world.advance_clock(econ_domain::SimTime(tick * 25_000_000));
            economy.average_seen_prices(&mut world, earth);
        }
        economy.average_seen_prices(&mut world, proxima);
        economy.record_purchase(&mut world, food, Credits(97));

        let save = EconomySave::capture(&world);
        let json = serde_json::to_string(&save)?;

        let (mut fresh, _) = fixture()?;
        let restored = serde_json::from_str::<EconomySave>(&json)?.restore(&mut fresh);

        assert_eq!(restored, 3);
        for (saved, loaded) in world.universe.planets().iter().zip(fresh.universe.planets()) {
            assert_eq!(saved.commodity_prices(), loaded.commodity_prices());
        }
        assert_eq!(fresh.catalog.commodity(food).last_purchase_price, Credits(97));
        Ok(())
    }

    #[test]
    fn restored_world_resumes_the_clock_and_keeps_observing() -> Result<()> {
        let (mut world, economy) = fixture()?;
        let earth = world.universe.planet_by_name("Earth").unwrap();
        for _ in 0..5 {
            world.advance_clock(econ_domain::SimTime(10_000_000));
            economy.average_seen_prices(&mut world, earth);
        }
        let json = serde_json::to_string(&EconomySave::capture(&world))?;

        let (mut fresh, economy) = fixture()?;
        serde_json::from_str::<EconomySave>(&json)?.restore(&mut fresh);
        assert_eq!(fresh.clock, world.clock);

        let mut observed = 0;
        for _ in 0..5 {
            fresh.advance_clock(econ_domain::SimTime(10_000_000));
            observed += economy.average_seen_prices(&mut fresh, earth);
        }
        assert_eq!(observed, 10);
        assert!(fresh.universe.planet(earth).commodity_prices().iter().all(|cp| cp.cnt == 10));
        Ok(())
    }

    #[test]
    fn clock_is_taken_from_the_latest_record_of_an_older_save() -> Result<()> {
        let (mut world, _) = fixture()?;
        let save: EconomySave = serde_json::from_str(
            r#"{ "systems": [ { "name": "Sol", "planets": [
                   { "name": "Mars", "commodities": [ { "name": "Food", "sum": 100, "sum2": 10000, "cnt": 1, "time": 70 } ] }
               ] } ] }"#,
        )?;

        save.restore(&mut world);

        assert_eq!(world.clock, econ_domain::SimTime(70));
        Ok(())
    }

    #[test]
    fn only_observed_pairs_are_saved() -> Result<()> {
        let (mut world, economy) = fixture()?;
        let mars = world.universe.planet_by_name("Mars").unwrap();
        world.advance_clock(econ_domain::SimTime(1));
        economy.average_seen_prices(&mut world, mars);

        let save = EconomySave::capture(&world);

        assert!(save.last_purchase.is_empty());
        assert_eq!(save.systems.len(), 1);
        assert_eq!(save.systems[0].name, "Sol");
        assert_eq!(save.systems[0].planets.len(), 1);
        assert_eq!(save.systems[0].planets[0].commodities.len(), 1);
        assert_eq!(save.systems[0].planets[0].commodities[0].cnt, 1);
        Ok(())
    }

    #[test]
    fn restoring_clears_previous_knowledge() -> Result<()> {
        let (mut world, economy) = fixture()?;
        let earth = world.universe.planet_by_name("Earth").unwrap();
        world.advance_clock(econ_domain::SimTime(1));
        economy.average_seen_prices(&mut world, earth);

        EconomySave::default().restore(&mut world);

        assert!(world.universe.planets().iter().flat_map(|p| p.commodity_prices()).all(|cp| cp.cnt == 0));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn unknown_names_are_skipped() -> Result<()> {
        let (mut world, _) = fixture()?;
        let save: EconomySave = serde_json::from_str(
            r#"{
                "last_purchase": [ { "name": "Spice", "price": 10 } ],
                "systems": [
                    { "name": "Nowhere", "planets": [] },
                    { "name": "Sol", "planets": [
                        { "name": "Proxima b", "commodities": [ { "name": "Medicine", "sum": 1, "sum2": 1, "cnt": 1, "time": 1 } ] },
                        { "name": "Mars", "commodities": [
                            { "name": "Medicine", "sum": 1, "sum2": 1, "cnt": 1, "time": 1 },
                            { "name": "Food", "sum": 200, "sum2": 20000, "cnt": 2, "time": 9 }
                        ] }
                    ] }
                ]
            }"#,
        )?;

        assert_eq!(save.restore(&mut world), 1);
        assert!(logs_contain("unknown commodity 'Spice'"));
        assert!(logs_contain("unknown system 'Nowhere'"));
        assert!(logs_contain("unknown planet 'Proxima b' in system 'Sol'"));
        assert!(logs_contain("Skipping saved price of 'Medicine' on planet 'Mars'"));
        Ok(())
    }
}
