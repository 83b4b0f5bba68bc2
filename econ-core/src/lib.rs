pub mod admittance;
pub mod config;
pub mod economy;
pub mod gatherable;
pub mod graph;
pub mod observation;
pub mod pricing;
pub mod world;

pub use admittance::{AdmittanceMatrix, AdmittanceSolver, PopulationIntensity, ProductionIntensity, SolverError, ZeroIntensity};
pub use config::EconomyConfig;
pub use economy::{Economy, EconomyError};
pub use gatherable::{CargoHold, GatherEvent, Gatherable, GatherableField};
pub use graph::MarketGraph;
pub use observation::PriceStats;
pub use world::WorldState;
