use econ_domain::{CommodityCatalog, CommodityId, CommodityPrice, Credits, Planet, PlanetId, SimTime, TimeScale, Universe};
use serde::Serialize;
use tracing::debug;

/// Mean and population standard deviation of observed prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: Credits,
    pub std_dev: f64,
}

impl PriceStats {
    pub const ZERO: PriceStats = PriceStats {
        mean: Credits(0),
        std_dev: 0.0,
    };
}

/// Instantaneous price of a record, rounded to whole credits.
pub fn price_at_time(cp: &CommodityPrice, time: SimTime, scale: &TimeScale) -> Credits {
    Credits::from_price(cp.price_at(time.to_stp(scale)))
}

/// Records one observation of every commodity sold at `planet`.
///
/// The price is sampled at `price_time`, the record is stamped with `now`. Records already stamped at
/// `now` are left alone. Returns the number of records that took the observation.
pub fn observe_planet(universe: &mut Universe, planet: PlanetId, now: SimTime, price_time: SimTime, scale: &TimeScale) -> usize {
    let planet = universe.planet_mut(planet);
    let mut observed = 0;
    for cp in planet.commodity_prices_mut() {
        let price = price_at_time(cp, price_time, scale);
        if cp.record_observation(price, now) {
            observed += 1;
        }
    }
    debug!("Observed {} prices at {} ({})", observed, planet.name, now);
    observed
}

/// Statistics of one planet's record, `None` while nothing was observed there.
pub fn planet_stats(cp: &CommodityPrice) -> Option<PriceStats> {
    let mean = cp.mean()?;
    let std_dev = cp.std_dev()?;
    Some(PriceStats {
        mean: Credits::from_price(mean),
        std_dev,
    })
}

pub fn average_planet_price(planet: &Planet, commodity: CommodityId) -> Option<PriceStats> {
    planet.commodity_price(commodity).and_then(planet_stats)
}

/// Galaxy-wide average over the per-planet means of every planet with observations.
///
/// The spread is the deviation of the planet means around their mean, i.e. `sqrt(mean(m²) - mean(m)²)`.
/// It ignores the spread within each planet, so it reads as a hint rather than a statistic.
pub fn average_price(universe: &Universe, commodity: CommodityId) -> Option<PriceStats> {
    let means: Vec<f64> = universe
        .planets()
        .iter()
        .filter_map(|p| p.commodity_price(commodity))
        .filter_map(|cp| cp.mean())
        .collect();

    if means.is_empty() {
        return None;
    }

    let n = means.len() as f64;
    let av = means.iter().sum::<f64>() / n;
    let av2 = means.iter().map(|m| m * m).sum::<f64>() / n;

    Some(PriceStats {
        mean: Credits::from_price(av),
        std_dev: (av2 - av * av).max(0.0).sqrt(),
    })
}

/// Forgets every observation and every last purchase price.
pub fn clear_known(universe: &mut Universe, catalog: &mut CommodityCatalog) {
    let planet_ids: Vec<PlanetId> = universe.planets().iter().map(|p| p.id).collect();
    for pid in planet_ids {
        universe.planet_mut(pid).commodity_prices_mut().iter_mut().for_each(CommodityPrice::clear_observations);
    }
    catalog.clear_last_purchases();
}

#[cfg(test)]
mod tests {
    use super::*;
    use econ_domain::{NewPlanet, SystemEnvironment};

    struct Fixture {
        universe: Universe,
        catalog: CommodityCatalog,
        food: CommodityId,
        planets: Vec<PlanetId>,
    }

    fn fixture() -> Fixture {
        let catalog = CommodityCatalog::from_json_str(r#"{ "commodities": [ { "name": "Food", "price": 100 }, { "name": "Ore", "price": 40 } ] }"#).unwrap();
        let food = catalog.get("Food").unwrap();
        let ore = catalog.get("Ore").unwrap();
        let mut universe = Universe::default();
        let system = universe.add_system("Sol", SystemEnvironment::default(), None);
        let planets: Vec<PlanetId> = ["Earth", "Mars"]
            .iter()
            .map(|name| {
                let id = universe.add_planet(
                    system,
                    NewPlanet {
                        name: name.to_string(),
                        ..Default::default()
                    },
                );
                universe.add_planet_commodity(id, food, &catalog);
                universe.add_planet_commodity(id, ore, &catalog);
                id
            })
            .collect();
        Fixture {
            universe,
            catalog,
            food,
            planets,
        }
    }

    fn set_price(universe: &mut Universe, planet: PlanetId, commodity: CommodityId, price: f64) {
        universe.planet_mut(planet).commodity_price_mut(commodity).unwrap().price = price;
    }

    #[test]
    fn observing_twice_in_one_tick_counts_once() {
        let mut f = fixture();
        let scale = TimeScale::default();
        let earth = f.planets[0];

        assert_eq!(observe_planet(&mut f.universe, earth, SimTime(10), SimTime(10), &scale), 2);
        assert_eq!(observe_planet(&mut f.universe, earth, SimTime(10), SimTime(10), &scale), 0);

        let cp = f.universe.planet(earth).commodity_price(f.food).unwrap();
        assert_eq!(cp.cnt, 1);
        assert_eq!(cp.sum, 100.0);
        assert_eq!(cp.sum2, 10_000.0);
    }

    #[test]
    fn planet_average_rounds_the_mean() {
        let mut f = fixture();
        let scale = TimeScale::default();
        let earth = f.planets[0];

        for (tick, price) in [(1, 100.0), (2, 101.0)] {
            set_price(&mut f.universe, earth, f.food, price);
            observe_planet(&mut f.universe, earth, SimTime(tick), SimTime(tick), &scale);
        }

        let stats = average_planet_price(f.universe.planet(earth), f.food).unwrap();
        assert_eq!(stats.mean, Credits(101));
        assert!((stats.std_dev - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_statistics_before_the_first_visit() {
        let f = fixture();
        assert_eq!(average_planet_price(f.universe.planet(f.planets[0]), f.food), None);
        assert_eq!(average_price(&f.universe, f.food), None);
    }

    #[test]
    fn galaxy_average_is_a_mean_of_planet_means() {
        let mut f = fixture();
        let scale = TimeScale::default();
        let (earth, mars) = (f.planets[0], f.planets[1]);

        set_price(&mut f.universe, earth, f.food, 80.0);
        observe_planet(&mut f.universe, earth, SimTime(1), SimTime(1), &scale);
        observe_planet(&mut f.universe, earth, SimTime(2), SimTime(2), &scale);
        set_price(&mut f.universe, mars, f.food, 120.0);
        observe_planet(&mut f.universe, mars, SimTime(3), SimTime(3), &scale);

        let stats = average_price(&f.universe, f.food).unwrap();
        assert_eq!(stats.mean, Credits(100));
        assert!((stats.std_dev - 20.0).abs() < 1e-9);
    }

    #[test]
    fn observation_samples_the_requested_price_time() {
        let mut f = fixture();
        let scale = TimeScale::default();
        let earth = f.planets[0];
        {
            let cp = f.universe.planet_mut(earth).commodity_price_mut(f.food).unwrap();
            cp.planet_variation = 10.0;
            cp.planet_period = 4.0;
        }

        let one_stp = SimTime::from_stp(1.0, &scale);
        observe_planet(&mut f.universe, earth, SimTime(5), one_stp, &scale);

        let cp = f.universe.planet(earth).commodity_price(f.food).unwrap();
        assert_eq!(cp.sum, 110.0);
        assert_eq!(cp.update_time, SimTime(5));
    }

    #[test]
    fn clearing_knowledge_is_idempotent() {
        let mut f = fixture();
        let scale = TimeScale::default();
        observe_planet(&mut f.universe, f.planets[0], SimTime(1), SimTime(1), &scale);
        f.catalog.record_purchase(f.food, Credits(97));

        clear_known(&mut f.universe, &mut f.catalog);
        let once = f.universe.clone();
        clear_known(&mut f.universe, &mut f.catalog);

        assert_eq!(f.universe, once);
        assert!(f.universe.planets().iter().flat_map(|p| p.commodity_prices()).all(|cp| cp.cnt == 0 && cp.sum == 0.0));
        assert_eq!(f.catalog.commodity(f.food).last_purchase_price, Credits(0));
    }
}
