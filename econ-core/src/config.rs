use econ_domain::TimeScale;
use serde::Deserialize;

/// Tuning constants of the economy.
///
/// Every field has a default, so an empty environment yields the stock economy.
/// Overrides are read from `ECONOMY_<FIELD>` variables, e.g. `ECONOMY_BASE_RESISTANCE=25`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Resistance every jump starts with.
    pub base_resistance: f64,
    /// Resistance of the path from each system to ground, keeps the matrix regular.
    pub self_resistance: f64,
    /// Fraction of the base resistance added for hostile and removed for allied factions.
    pub faction_modifier: f64,
    pub density_resistance_scale: f64,
    pub volatility_resistance_scale: f64,
    pub production_modifier: f64,
    pub production_variability: f64,

    pub reference_population: f64,
    pub population_spread: f64,
    pub planet_period_base: f64,
    pub planet_variation_base: f64,
    pub presence_range_scale: f64,
    pub radius_price_scale: f64,
    pub radius_variation_scale: f64,
    pub volatility_price_scale: f64,
    pub interference_price_scale: f64,
    pub system_period_base: f64,
    /// Lower bound of the `1 - x/scale` denominators used for presence range and radius.
    pub min_damping: f64,
    pub planet_exterior_gfx_path: String,

    pub gather_distance: f64,
    /// Seconds between two "cannot gather" notices.
    pub gather_notice_interval: f64,

    pub stu_div: u64,
    pub stp_stu: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_resistance: 30.0,
            self_resistance: 3.0,
            faction_modifier: 0.1,
            density_resistance_scale: 1_000.0,
            volatility_resistance_scale: 100.0,
            production_modifier: 500_000.0,
            production_variability: 0.01,
            reference_population: 1e8,
            population_spread: 2.0,
            planet_period_base: 100.0,
            planet_variation_base: 0.5,
            presence_range_scale: 30.0,
            radius_price_scale: 200_000.0,
            radius_variation_scale: 300_000.0,
            volatility_price_scale: 6_000.0,
            interference_price_scale: 10_000.0,
            system_period_base: 2_000.0,
            min_damping: 0.05,
            planet_exterior_gfx_path: "gfx/planet/exterior/".to_string(),
            gather_distance: 30.0,
            gather_notice_interval: 2.0,
            stu_div: 1_000,
            stp_stu: 10_000,
        }
    }
}

impl EconomyConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("ECONOMY_").from_env::<EconomyConfig>()
    }

    pub fn time_scale(&self) -> TimeScale {
        TimeScale {
            stu_div: self.stu_div,
            stp_stu: self.stp_stu,
        }
    }

    /// Clamps a `1 - value/scale` style denominator away from zero.
    pub fn damped(&self, value: f64, scale: f64) -> f64 {
        (1.0 - value / scale).max(self.min_damping)
    }
}
