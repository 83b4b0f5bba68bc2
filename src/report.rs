use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use econ_core::{Economy, PriceStats, WorldState};
use econ_domain::{Credits, SystemId};
use itertools::Itertools;
use thousands::Separable;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .force_no_tty()
        .enforce_styling()
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn credits(c: Credits) -> String {
    format!("{}c", c.0.separate_with_commas())
}

/// Current price of every commodity on every planet, optionally restricted to one system.
pub fn price_table(world: &WorldState, economy: &Economy, only_system: Option<SystemId>) -> String {
    let mut table = new_table(vec!["System", "Planet", "Commodity", "Price", "Base", "Planet Period", "System Period"]);

    let systems = world.universe.systems().iter().filter(|s| only_system.map_or(true, |id| id == s.id));
    for system in systems {
        for planet in world.universe.planets_of(system.id) {
            for (commodity, cp) in planet.market().sorted_by_key(|(c, _)| world.catalog.commodity(*c).name.0.clone()) {
                let price = economy
                    .price(world, commodity, system.id, planet.id)
                    .map(credits)
                    .unwrap_or_else(|_| "-".to_string());
                table.add_row(vec![
                    system.name.0.clone(),
                    planet.name.0.clone(),
                    world.catalog.commodity(commodity).name.0.clone(),
                    price,
                    format!("{:.1}", cp.price),
                    format!("{:.1}", cp.planet_period),
                    format!("{:.1}", cp.sys_period),
                ]);
            }
        }
    }

    table.to_string()
}

/// Galaxy-wide averages of what the player has seen, most valuable commodity first.
pub fn averages_table(world: &WorldState, economy: &Economy) -> String {
    let mut table = new_table(vec!["Commodity", "Last Purchase", "Seen Mean", "Seen Std Dev", "Planets Observed"]);

    for commodity in world.catalog.sorted_by_value() {
        let c = world.catalog.commodity(commodity);
        if !c.is_tradable() {
            continue;
        }
        let PriceStats { mean, std_dev } = economy.average_price_or_zero(world, commodity);
        let observed = world
            .universe
            .planets()
            .iter()
            .filter(|p| p.commodity_price(commodity).is_some_and(|cp| cp.has_observations()))
            .count();
        let last_purchase = if c.last_purchase_price.is_positive() { credits(c.last_purchase_price) } else { "-".to_string() };

        table.add_row(vec![c.name.0.clone(), last_purchase, credits(mean), format!("{:.1}", std_dev), observed.to_string()]);
    }

    table.to_string()
}
