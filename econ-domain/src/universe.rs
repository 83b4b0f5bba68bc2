use crate::{CommodityCatalog, CommodityId, CommodityPrice, FactionId, FactionSymbol, PlanetId, PlanetSymbol, SystemId, SystemSymbol};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum UniverseError {
    #[error("unknown system '{0}'")]
    UnknownSystem(String),
    #[error("unknown planet '{0}'")]
    UnknownPlanet(String),
    #[error("unknown faction '{0}'")]
    UnknownFaction(String),
    #[error("duplicate system '{0}'")]
    DuplicateSystem(String),
    #[error("planet '{0}' is not part of any system")]
    PlanetWithoutSystem(String),
    #[error("planet '{planet}' is listed by both '{first}' and '{second}'")]
    PlanetInTwoSystems { planet: String, first: String, second: String },
    #[error("universe snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to read universe snapshot: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub name: FactionSymbol,
    pub allies: BTreeSet<FactionId>,
    pub enemies: BTreeSet<FactionId>,
}

/// Faction standings, symmetric in both directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionTable {
    factions: Vec<Faction>,
}

impl FactionTable {
    pub fn add(&mut self, name: &str) -> FactionId {
        if let Some(existing) = self.find(name) {
            return existing;
        }
        self.factions.push(Faction {
            name: FactionSymbol(name.to_string()),
            allies: BTreeSet::new(),
            enemies: BTreeSet::new(),
        });
        FactionId(self.factions.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<FactionId> {
        self.factions.iter().position(|f| f.name.0 == name).map(FactionId)
    }

    pub fn name(&self, id: FactionId) -> &FactionSymbol {
        &self.factions[id.0].name
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }

    pub fn set_allies(&mut self, a: FactionId, b: FactionId) {
        self.factions[a.0].allies.insert(b);
        self.factions[b.0].allies.insert(a);
    }

    pub fn set_enemies(&mut self, a: FactionId, b: FactionId) {
        self.factions[a.0].enemies.insert(b);
        self.factions[b.0].enemies.insert(a);
    }

    pub fn are_allies(&self, a: FactionId, b: FactionId) -> bool {
        a == b || self.factions[a.0].allies.contains(&b)
    }

    pub fn are_enemies(&self, a: FactionId, b: FactionId) -> bool {
        a != b && self.factions[a.0].enemies.contains(&b)
    }
}

/// Environmental conditions of a system that perturb resistances and prices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemEnvironment {
    pub nebula_density: f64,
    pub nebula_volatility: f64,
    pub interference: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: SystemSymbol,
    pub environment: SystemEnvironment,
    pub faction: Option<FactionId>,
    pub planets: Vec<PlanetId>,
    pub jumps: Vec<SystemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: PlanetId,
    pub name: PlanetSymbol,
    pub system: SystemId,
    pub class: String,
    pub faction: Option<FactionId>,
    pub population: u64,
    pub presence_range: f64,
    pub gfx_space: String,
    pub gfx_exterior: String,
    commodities: Vec<CommodityId>,
    commodity_prices: Vec<CommodityPrice>,
}

impl Planet {
    pub fn commodities(&self) -> &[CommodityId] {
        &self.commodities
    }

    pub fn commodity_prices(&self) -> &[CommodityPrice] {
        &self.commodity_prices
    }

    pub fn commodity_prices_mut(&mut self) -> &mut [CommodityPrice] {
        &mut self.commodity_prices
    }

    pub fn price_index(&self, commodity: CommodityId) -> Option<usize> {
        self.commodities.iter().position(|c| *c == commodity)
    }

    pub fn sells(&self, commodity: CommodityId) -> bool {
        self.price_index(commodity).is_some()
    }

    pub fn commodity_price(&self, commodity: CommodityId) -> Option<&CommodityPrice> {
        self.price_index(commodity).map(|idx| &self.commodity_prices[idx])
    }

    pub fn commodity_price_mut(&mut self, commodity: CommodityId) -> Option<&mut CommodityPrice> {
        self.price_index(commodity).map(move |idx| &mut self.commodity_prices[idx])
    }

    pub fn market(&self) -> impl Iterator<Item = (CommodityId, &CommodityPrice)> {
        self.commodities.iter().copied().zip(self.commodity_prices.iter())
    }

    pub fn market_mut(&mut self) -> impl Iterator<Item = (CommodityId, &mut CommodityPrice)> {
        self.commodities.iter().copied().zip(self.commodity_prices.iter_mut())
    }
}

/// Attributes of a planet that is about to be added to a system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPlanet {
    pub name: String,
    pub class: String,
    pub faction: Option<FactionId>,
    pub population: u64,
    pub presence_range: f64,
    pub gfx_space: String,
    pub gfx_exterior: String,
}

/// The galaxy: systems, the planets inside them, jump routes and faction standings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub factions: FactionTable,
    systems: Vec<StarSystem>,
    planets: Vec<Planet>,
}

impl Universe {
    pub fn new(factions: FactionTable) -> Self {
        Self {
            factions,
            systems: Vec::new(),
            planets: Vec::new(),
        }
    }

    pub fn systems(&self) -> &[StarSystem] {
        &self.systems
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn system(&self, id: SystemId) -> &StarSystem {
        &self.systems[id.0]
    }

    pub fn system_mut(&mut self, id: SystemId) -> &mut StarSystem {
        &mut self.systems[id.0]
    }

    pub fn planet(&self, id: PlanetId) -> &Planet {
        &self.planets[id.0]
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> &mut Planet {
        &mut self.planets[id.0]
    }

    pub fn planets_of(&self, system: SystemId) -> impl Iterator<Item = &Planet> {
        self.systems[system.0].planets.iter().map(|pid| &self.planets[pid.0])
    }

    pub fn system_by_name(&self, name: &str) -> Option<SystemId> {
        self.systems.iter().position(|s| s.name.0 == name).map(SystemId)
    }

    pub fn planet_by_name(&self, name: &str) -> Option<PlanetId> {
        self.planets.iter().position(|p| p.name.0 == name).map(PlanetId)
    }

    pub fn add_system(&mut self, name: &str, environment: SystemEnvironment, faction: Option<FactionId>) -> SystemId {
        let id = SystemId(self.systems.len());
        self.systems.push(StarSystem {
            id,
            name: SystemSymbol(name.to_string()),
            environment,
            faction,
            planets: Vec::new(),
            jumps: Vec::new(),
        });
        id
    }

    pub fn add_planet(&mut self, system: SystemId, planet: NewPlanet) -> PlanetId {
        let id = PlanetId(self.planets.len());
        self.planets.push(Planet {
            id,
            name: PlanetSymbol(planet.name),
            system,
            class: planet.class,
            faction: planet.faction,
            population: planet.population,
            presence_range: planet.presence_range,
            gfx_space: planet.gfx_space,
            gfx_exterior: planet.gfx_exterior,
            commodities: Vec::new(),
            commodity_prices: Vec::new(),
        });
        self.systems[system.0].planets.push(id);
        id
    }

    /// Puts a commodity on sale at a planet, seeded with the commodity's base price.
    ///
    /// Returns false for decorative commodities and for commodities the planet already sells.
    pub fn add_planet_commodity(&mut self, planet: PlanetId, commodity: CommodityId, catalog: &CommodityCatalog) -> bool {
        let base = catalog.commodity(commodity);
        let planet = &mut self.planets[planet.0];
        if !base.is_tradable() || planet.sells(commodity) {
            return false;
        }
        planet.commodities.push(commodity);
        planet.commodity_prices.push(CommodityPrice::new(base.price as f64));
        true
    }

    /// Connects two systems in both directions. Returns false if they already were.
    pub fn add_jump(&mut self, a: SystemId, b: SystemId) -> bool {
        if a == b || self.systems[a.0].jumps.contains(&b) {
            return false;
        }
        self.systems[a.0].jumps.push(b);
        if !self.systems[b.0].jumps.contains(&a) {
            self.systems[b.0].jumps.push(a);
        }
        true
    }

    pub fn remove_jump(&mut self, a: SystemId, b: SystemId) -> bool {
        let before = self.systems[a.0].jumps.len();
        self.systems[a.0].jumps.retain(|j| *j != b);
        self.systems[b.0].jumps.retain(|j| *j != a);
        before != self.systems[a.0].jumps.len()
    }

    pub fn from_snapshot(snapshot: UniverseSnapshot, catalog: &CommodityCatalog) -> Result<Self, UniverseError> {
        let mut factions = FactionTable::default();
        for entry in snapshot.factions.iter() {
            factions.add(&entry.name);
        }
        let faction_id = |factions: &FactionTable, name: &str| factions.find(name).ok_or_else(|| UniverseError::UnknownFaction(name.to_string()));
        for entry in snapshot.factions.iter() {
            let id = faction_id(&factions, &entry.name)?;
            for ally in entry.allies.iter() {
                let ally = faction_id(&factions, ally)?;
                factions.set_allies(id, ally);
            }
            for enemy in entry.enemies.iter() {
                let enemy = faction_id(&factions, enemy)?;
                factions.set_enemies(id, enemy);
            }
        }

        let mut universe = Universe::new(factions);

        for entry in snapshot.systems.iter() {
            if universe.system_by_name(&entry.name).is_some() {
                return Err(UniverseError::DuplicateSystem(entry.name.clone()));
            }
            let faction = entry.faction.as_deref().map(|name| faction_id(&universe.factions, name)).transpose()?;
            universe.add_system(&entry.name, entry.environment, faction);
        }

        let planet_entries: HashMap<&str, &PlanetEntry> = snapshot.planets.iter().map(|p| (p.name.as_str(), p)).collect();
        let mut owner: HashMap<&str, &str> = HashMap::new();

        for entry in snapshot.systems.iter() {
            let system_id = universe.system_by_name(&entry.name).ok_or_else(|| UniverseError::UnknownSystem(entry.name.clone()))?;
            for planet_name in entry.planets.iter() {
                if let Some(first) = owner.insert(planet_name.as_str(), entry.name.as_str()) {
                    return Err(UniverseError::PlanetInTwoSystems {
                        planet: planet_name.clone(),
                        first: first.to_string(),
                        second: entry.name.clone(),
                    });
                }
                let planet = planet_entries.get(planet_name.as_str()).ok_or_else(|| UniverseError::UnknownPlanet(planet_name.clone()))?;
                let faction = planet.faction.as_deref().map(|name| faction_id(&universe.factions, name)).transpose()?;
                let planet_id = universe.add_planet(
                    system_id,
                    NewPlanet {
                        name: planet.name.clone(),
                        class: planet.class.clone(),
                        faction,
                        population: planet.population,
                        presence_range: planet.presence_range,
                        gfx_space: planet.gfx_space.clone(),
                        gfx_exterior: planet.gfx_exterior.clone(),
                    },
                );
                for commodity_name in planet.commodities.iter() {
                    match catalog.get(commodity_name) {
                        Some(commodity) => {
                            if !universe.add_planet_commodity(planet_id, commodity, catalog) {
                                debug!("Planet '{}' does not price commodity '{}'", planet.name, commodity_name);
                            }
                        }
                        None => warn!("Planet '{}' sells unknown commodity '{}'", planet.name, commodity_name),
                    }
                }
            }
        }

        if let Some(orphan) = snapshot.planets.iter().find(|p| !owner.contains_key(p.name.as_str())) {
            return Err(UniverseError::PlanetWithoutSystem(orphan.name.clone()));
        }

        for entry in snapshot.systems.iter() {
            let from = universe.system_by_name(&entry.name).ok_or_else(|| UniverseError::UnknownSystem(entry.name.clone()))?;
            for target in entry.jumps.iter() {
                let to = universe.system_by_name(target).ok_or_else(|| UniverseError::UnknownSystem(target.clone()))?;
                universe.add_jump(from, to);
            }
        }

        debug!(
            "Loaded universe with {} systems, {} planets and {} jumps",
            universe.systems.len(),
            universe.planets.len(),
            universe.systems.iter().map(|s| s.jumps.len()).sum::<usize>() / 2
        );

        Ok(universe)
    }

    pub fn from_json_str(json: &str, catalog: &CommodityCatalog) -> Result<Self, UniverseError> {
        let snapshot: UniverseSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, catalog: &CommodityCatalog) -> Result<Self, UniverseError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: UniverseSnapshot = serde_json::from_reader(reader)?;
        Self::from_snapshot(snapshot, catalog)
    }

    pub fn jump_pairs(&self) -> Vec<(SystemId, SystemId)> {
        self.systems
            .iter()
            .flat_map(|s| s.jumps.iter().map(move |t| (s.id, *t)))
            .filter(|(a, b)| a < b)
            .collect_vec()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionEntry {
    pub name: String,
    #[serde(default)]
    pub allies: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEntry {
    pub name: String,
    #[serde(flatten)]
    pub environment: SystemEnvironment,
    #[serde(default)]
    pub faction: Option<String>,
    #[serde(default)]
    pub jumps: Vec<String>,
    #[serde(default)]
    pub planets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetEntry {
    pub name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub faction: Option<String>,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub presence_range: f64,
    #[serde(default)]
    pub gfx_space: String,
    #[serde(default)]
    pub gfx_exterior: String,
    #[serde(default)]
    pub commodities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    #[serde(default)]
    pub factions: Vec<FactionEntry>,
    pub systems: Vec<SystemEntry>,
    #[serde(default)]
    pub planets: Vec<PlanetEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn catalog() -> CommodityCatalog {
        CommodityCatalog::from_json_str(r#"{ "commodities": [ { "name": "Food", "price": 100 }, { "name": "Debris", "price": 0 } ] }"#).unwrap()
    }

    const UNIVERSE: &str = r#"{
        "factions": [
            { "name": "Empire", "allies": ["Dvaered"], "enemies": ["Pirate"] },
            { "name": "Dvaered" },
            { "name": "Pirate" }
        ],
        "systems": [
            { "name": "Gamma Polaris", "faction": "Empire", "radius": 8000, "jumps": ["Alteris"], "planets": ["Emperor's Fist"] },
            { "name": "Alteris", "nebula_volatility": 120, "planets": ["Brooks"] },
            { "name": "Delta Pavonis", "jumps": ["Alteris"] }
        ],
        "planets": [
            { "name": "Emperor's Fist", "class": "M", "faction": "Empire", "population": 3000000000,
              "commodities": ["Food", "Debris", "Food"] },
            { "name": "Brooks", "class": "K", "population": 0, "commodities": ["Food", "Spice"] }
        ]
    }"#;

    #[test]
    fn snapshot_jumps_are_symmetric() -> Result<()> {
        let universe = Universe::from_json_str(UNIVERSE, &catalog())?;
        let gamma = universe.system_by_name("Gamma Polaris").unwrap();
        let alteris = universe.system_by_name("Alteris").unwrap();
        let delta = universe.system_by_name("Delta Pavonis").unwrap();

        assert_eq!(universe.system(gamma).jumps, vec![alteris]);
        assert_eq!(universe.system(alteris).jumps, vec![gamma, delta]);
        assert_eq!(universe.system(delta).jumps, vec![alteris]);
        assert_eq!(universe.jump_pairs().len(), 2);
        Ok(())
    }

    #[test]
    fn only_tradable_commodities_get_a_price_record() -> Result<()> {
        let catalog = catalog();
        let universe = Universe::from_json_str(UNIVERSE, &catalog)?;
        let fist = universe.planet(universe.planet_by_name("Emperor's Fist").unwrap());
        let food = catalog.get("Food").unwrap();

        assert_eq!(fist.commodities(), &[food]);
        assert_eq!(fist.commodity_prices().len(), 1);
        assert_eq!(fist.commodity_price(food).unwrap().price, 100.0);
        assert!(!fist.sells(catalog.get("Debris").unwrap()));
        Ok(())
    }

    #[test]
    fn faction_standings_are_symmetric() -> Result<()> {
        let universe = Universe::from_json_str(UNIVERSE, &catalog())?;
        let factions = &universe.factions;
        let empire = factions.find("Empire").unwrap();
        let dvaered = factions.find("Dvaered").unwrap();
        let pirate = factions.find("Pirate").unwrap();

        assert!(factions.are_allies(dvaered, empire));
        assert!(factions.are_enemies(pirate, empire));
        assert!(!factions.are_enemies(dvaered, pirate));
        assert!(!factions.are_enemies(empire, empire));
        Ok(())
    }

    #[test]
    fn unknown_jump_target_is_an_error() {
        let json = r#"{ "systems": [ { "name": "A", "jumps": ["B"] } ] }"#;
        assert!(matches!(Universe::from_json_str(json, &catalog()), Err(UniverseError::UnknownSystem(name)) if name == "B"));
    }

    #[test]
    fn orphan_planet_is_an_error() {
        let json = r#"{ "systems": [ { "name": "A" } ], "planets": [ { "name": "Lost" } ] }"#;
        assert!(matches!(Universe::from_json_str(json, &catalog()), Err(UniverseError::PlanetWithoutSystem(_))));
    }

    #[test]
    fn planet_in_two_systems_is_an_error() {
        let json = r#"{ "systems": [ { "name": "A", "planets": ["P"] }, { "name": "B", "planets": ["P"] } ], "planets": [ { "name": "P" } ] }"#;
        assert!(matches!(Universe::from_json_str(json, &catalog()), Err(UniverseError::PlanetInTwoSystems { .. })));
    }

    #[test]
    fn jumps_can_be_added_and_removed() {
        let mut universe = Universe::default();
        let a = universe.add_system("A", SystemEnvironment::default(), None);
        let b = universe.add_system("B", SystemEnvironment::default(), None);

        assert!(universe.add_jump(a, b));
        assert!(!universe.add_jump(b, a));
        assert!(!universe.add_jump(a, a));
        assert_eq!(universe.system(b).jumps, vec![a]);

        assert!(universe.remove_jump(b, a));
        assert!(universe.system(a).jumps.is_empty());
        assert!(!universe.remove_jump(a, b));
    }
}
