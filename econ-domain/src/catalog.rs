use crate::{AssetHandle, CommodityId, CommoditySymbol, Credits};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const CATALOG_ROOT: &str = "commodities";
pub const COMMODITY_GFX_PATH: &str = "gfx/commodities/";
pub const DEFAULT_PERIOD: f64 = 200.0;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed commodity catalog: missing root element 'commodities'")]
    MissingRoot,
    #[error("malformed commodity catalog: does not contain elements")]
    Empty,
    #[error("commodity catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to read commodity catalog: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModifierEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

/// One `commodity` node of the catalog document.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CommodityEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: i64,
    pub gfx_store: Option<String>,
    pub gfx_space: Option<String>,
    pub population_modifier: f64,
    pub period: f64,
    pub planet_modifier: Vec<ModifierEntry>,
    pub faction_modifier: Vec<ModifierEntry>,
}

impl Default for CommodityEntry {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            price: 0,
            gfx_store: None,
            gfx_space: None,
            population_modifier: 0.0,
            period: DEFAULT_PERIOD,
            planet_modifier: Vec::new(),
            faction_modifier: Vec::new(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct CommodityCatalogDocument {
    pub commodities: Vec<CommodityEntry>,
}

/// Price multipliers keyed by planet class and by faction name.
///
/// Only needed while the planetary prices are initialised, dropped afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommodityModifiers {
    pub planet_class: BTreeMap<String, f64>,
    pub faction: BTreeMap<String, f64>,
}

impl CommodityModifiers {
    fn from_entries(planet: &[ModifierEntry], faction: &[ModifierEntry]) -> Self {
        // later entries win, same as a prepend-and-scan list
        Self {
            planet_class: planet.iter().map(|m| (m.kind.clone(), m.value)).collect(),
            faction: faction.iter().map(|m| (m.kind.clone(), m.value)).collect(),
        }
    }

    pub fn planet_class_scale(&self, class: &str) -> f64 {
        self.planet_class.get(class).copied().unwrap_or(1.0)
    }

    pub fn faction_scale(&self, faction: Option<&str>) -> f64 {
        faction.and_then(|name| self.faction.get(name)).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    pub name: CommoditySymbol,
    pub description: Option<String>,
    pub price: i64,
    pub gfx_store: Option<AssetHandle>,
    pub gfx_space: Option<AssetHandle>,
    pub period: f64,
    pub population_modifier: f64,
    pub modifiers: Option<CommodityModifiers>,
    pub last_purchase_price: Credits,
}

impl Commodity {
    fn from_entry(entry: CommodityEntry) -> Self {
        let name = match entry.name {
            Some(name) => name,
            None => {
                warn!("Commodity from catalog has invalid or no name");
                String::new()
            }
        };

        let mut gfx_store = entry.gfx_store.map(|gfx| AssetHandle(format!("{COMMODITY_GFX_PATH}{gfx}.png")));
        let mut gfx_space = entry.gfx_space.map(|gfx| AssetHandle(format!("{COMMODITY_GFX_PATH}space/{gfx}.png")));

        if entry.price > 0 {
            if gfx_store.is_none() {
                warn!("No gfx_store found, using default texture for commodity \"{}\"", name);
                gfx_store = Some(AssetHandle(format!("{COMMODITY_GFX_PATH}_default.png")));
            }
            if gfx_space.is_none() {
                gfx_space = Some(AssetHandle(format!("{COMMODITY_GFX_PATH}space/_default.png")));
            }
        }

        Self {
            name: CommoditySymbol(name),
            description: entry.description,
            price: entry.price,
            gfx_store,
            gfx_space,
            period: entry.period,
            population_modifier: entry.population_modifier,
            modifiers: Some(CommodityModifiers::from_entries(&entry.planet_modifier, &entry.faction_modifier)),
            last_purchase_price: Credits(0),
        }
    }

    /// Commodities with a base price of zero are decorative and never get a market price.
    pub fn is_tradable(&self) -> bool {
        self.price > 0
    }

    /// Orders by value: most expensive first, ties broken by name.
    pub fn cmp_by_value(&self, other: &Commodity) -> Ordering {
        other.price.cmp(&self.price).then_with(|| self.name.cmp(&other.name))
    }
}

/// Registry of every commodity in the game, loaded once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommodityCatalog {
    commodities: Vec<Commodity>,
    priced: Vec<CommodityId>,
}

impl CommodityCatalog {
    pub fn from_document(document: CommodityCatalogDocument) -> Result<Self, CatalogError> {
        if document.commodities.is_empty() {
            return Err(CatalogError::Empty);
        }

        let commodities = document.commodities.into_iter().map(Commodity::from_entry).collect_vec();
        for name in commodities.iter().map(|c| &c.name).filter(|n| !n.0.is_empty()).duplicates() {
            warn!("Commodity '{}' is defined more than once, lookups resolve to the first entry.", name);
        }
        let priced = commodities
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_tradable())
            .map(|(idx, _)| CommodityId(idx))
            .collect_vec();

        debug!("Loaded {} commodities ({} tradable)", commodities.len(), priced.len());

        Ok(Self { commodities, priced })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(mut root) = root else {
            return Err(CatalogError::MissingRoot);
        };
        let entries = root.remove(CATALOG_ROOT).ok_or(CatalogError::MissingRoot)?;
        for unknown in root.keys() {
            warn!("Commodity catalog has unknown node '{}'.", unknown);
        }

        let commodities: Vec<CommodityEntry> = serde_json::from_value(entries)?;
        Self::from_document(CommodityCatalogDocument { commodities })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.commodities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commodities.is_empty()
    }

    /// Looks up a commodity by name, warning when it does not exist.
    pub fn get(&self, name: &str) -> Option<CommodityId> {
        let found = self.get_quiet(name);
        if found.is_none() {
            warn!("Commodity '{}' not found in catalog", name);
        }
        found
    }

    pub fn get_quiet(&self, name: &str) -> Option<CommodityId> {
        self.commodities.iter().position(|c| c.name.0 == name).map(CommodityId)
    }

    pub fn commodity(&self, id: CommodityId) -> &Commodity {
        &self.commodities[id.0]
    }

    pub fn commodity_mut(&mut self, id: CommodityId) -> &mut Commodity {
        &mut self.commodities[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CommodityId, &Commodity)> {
        self.commodities.iter().enumerate().map(|(idx, c)| (CommodityId(idx), c))
    }

    /// Commodities taking part in the price machinery, in catalog order.
    pub fn priced(&self) -> &[CommodityId] {
        &self.priced
    }

    /// Position of a commodity within [`Self::priced`].
    pub fn price_index(&self, id: CommodityId) -> Option<usize> {
        self.priced.iter().position(|p| *p == id)
    }

    pub fn sorted_by_value(&self) -> Vec<CommodityId> {
        self.iter().sorted_by(|(_, a), (_, b)| a.cmp_by_value(b)).map(|(id, _)| id).collect_vec()
    }

    pub fn discard_modifiers(&mut self) {
        for commodity in self.commodities.iter_mut() {
            commodity.modifiers = None;
        }
    }

    pub fn record_purchase(&mut self, id: CommodityId, price: Credits) {
        self.commodities[id.0].last_purchase_price = price;
    }

    pub fn clear_last_purchases(&mut self) {
        for commodity in self.commodities.iter_mut() {
            commodity.last_purchase_price = Credits(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tracing_test::traced_test;

    const CATALOG: &str = r#"{
        "commodities": [
            { "name": "Food", "description": "Stuff to eat.", "price": 100, "gfx_store": "food" },
            { "name": "Luxury Goods", "price": 600, "population_modifier": 0.5, "period": 120,
              "planet_modifier": [ { "type": "M", "value": 1.2 }, { "type": "M", "value": 1.4 } ],
              "faction_modifier": [ { "type": "Empire", "value": 0.8 } ] },
            { "name": "Debris", "price": 0 }
        ]
    }"#;

    #[test]
    fn parses_entries_with_defaults() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(CATALOG)?;
        assert_eq!(catalog.len(), 3);

        let food = catalog.commodity(catalog.get("Food").unwrap());
        assert_eq!(food.period, DEFAULT_PERIOD);
        assert_eq!(food.population_modifier, 0.0);
        assert_eq!(food.gfx_store, Some(AssetHandle("gfx/commodities/food.png".to_string())));
        assert_eq!(food.gfx_space, Some(AssetHandle("gfx/commodities/space/_default.png".to_string())));

        let luxury = catalog.commodity(catalog.get("Luxury Goods").unwrap());
        let modifiers = luxury.modifiers.as_ref().unwrap();
        assert_eq!(luxury.period, 120.0);
        assert_eq!(modifiers.planet_class_scale("M"), 1.4);
        assert_eq!(modifiers.planet_class_scale("K"), 1.0);
        assert_eq!(modifiers.faction_scale(Some("Empire")), 0.8);
        assert_eq!(modifiers.faction_scale(None), 1.0);
        Ok(())
    }

    #[test]
    fn zero_priced_commodities_are_not_priced() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(CATALOG)?;
        let debris = catalog.get("Debris").unwrap();
        assert!(!catalog.commodity(debris).is_tradable());
        assert_eq!(catalog.price_index(debris), None);
        assert_eq!(catalog.priced(), &[CommodityId(0), CommodityId(1)]);
        assert_eq!(catalog.commodity(debris).gfx_store, None);
        Ok(())
    }

    #[test]
    fn missing_root_is_fatal() {
        let result = CommodityCatalog::from_json_str(r#"{ "goods": [] }"#);
        assert!(matches!(result, Err(CatalogError::MissingRoot)));

        let result = CommodityCatalog::from_json_str(r#"[1, 2]"#);
        assert!(matches!(result, Err(CatalogError::MissingRoot)));
    }

    #[test]
    fn empty_catalog_is_fatal() {
        let result = CommodityCatalog::from_json_str(r#"{ "commodities": [] }"#);
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    #[traced_test]
    fn nameless_commodity_is_admitted_with_a_warning() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(r#"{ "commodities": [ { "price": 5 } ], "junk": 1 }"#)?;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.commodity(CommodityId(0)).name.0, "");
        assert!(logs_contain("invalid or no name"));
        assert!(logs_contain("unknown node 'junk'"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn duplicate_names_warn_and_resolve_to_the_first_entry() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(r#"{ "commodities": [ { "name": "Food", "price": 100 }, { "name": "Food", "price": 250 } ] }"#)?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get_quiet("Food"), Some(CommodityId(0)));
        assert!(logs_contain("Commodity 'Food' is defined more than once"));
        Ok(())
    }

    #[test]
    #[traced_test]
    fn lookup_warns_only_when_asked_to() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(CATALOG)?;
        assert_eq!(catalog.get_quiet("Spice"), None);
        assert!(!logs_contain("not found in catalog"));
        assert_eq!(catalog.get("Spice"), None);
        assert!(logs_contain("Commodity 'Spice' not found in catalog"));
        Ok(())
    }

    #[test]
    fn value_ordering_is_price_descending_then_name() -> Result<()> {
        let catalog = CommodityCatalog::from_json_str(CATALOG)?;
        let names = catalog.sorted_by_value().into_iter().map(|id| catalog.commodity(id).name.0.clone()).collect_vec();
        assert_eq!(names, vec!["Luxury Goods", "Food", "Debris"]);
        Ok(())
    }

    #[test]
    fn modifiers_can_be_discarded_and_purchases_cleared() -> Result<()> {
        let mut catalog = CommodityCatalog::from_json_str(CATALOG)?;
        catalog.record_purchase(CommodityId(0), Credits(97));
        assert_eq!(catalog.commodity(CommodityId(0)).last_purchase_price, Credits(97));

        catalog.discard_modifiers();
        catalog.clear_last_purchases();
        assert!(catalog.iter().all(|(_, c)| c.modifiers.is_none() && c.last_purchase_price.is_zero()));
        Ok(())
    }
}
