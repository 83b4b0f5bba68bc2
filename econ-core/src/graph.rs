use crate::config::EconomyConfig;
use econ_domain::{StarSystem, SystemId, Universe};
use petgraph::prelude::{EdgeRef, NodeIndex, UnGraph};
use tracing::debug;

/// Resistance of the jump route between two systems.
///
/// Nebulae raise it, density only slightly, volatility more. Hostile factions raise it by a fraction
/// of the base resistance, allied factions lower it by the same amount.
pub fn jump_resistance(a: &StarSystem, b: &StarSystem, universe: &Universe, cfg: &EconomyConfig) -> f64 {
    let mut r = cfg.base_resistance;

    r += (a.environment.nebula_density + b.environment.nebula_density) / cfg.density_resistance_scale;
    r += (a.environment.nebula_volatility + b.environment.nebula_volatility) / cfg.volatility_resistance_scale;

    if let (Some(fa), Some(fb)) = (a.faction, b.faction) {
        if universe.factions.are_enemies(fa, fb) {
            r += cfg.faction_modifier * cfg.base_resistance;
        } else if universe.factions.are_allies(fa, fb) {
            r -= cfg.faction_modifier * cfg.base_resistance;
        }
    }

    r
}

/// Systems as nodes, jump routes as edges weighted with their resistance.
///
/// Node `i` always corresponds to `SystemId(i)`.
#[derive(Debug, Clone)]
pub struct MarketGraph {
    graph: UnGraph<SystemId, f64>,
}

impl MarketGraph {
    pub fn build(universe: &Universe, cfg: &EconomyConfig) -> Self {
        let mut graph = UnGraph::<SystemId, f64>::with_capacity(universe.systems().len(), universe.systems().len() * 2);
        let node_indices: Vec<NodeIndex> = universe.systems().iter().map(|s| graph.add_node(s.id)).collect();

        for (a, b) in universe.jump_pairs() {
            let r = jump_resistance(universe.system(a), universe.system(b), universe, cfg);
            graph.add_edge(node_indices[a.0], node_indices[b.0], r);
        }

        debug!("Built market graph with {} systems and {} jump routes", graph.node_count(), graph.edge_count());

        Self { graph }
    }

    pub fn system_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn route_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every route once, as `(from, to, resistance)`.
    pub fn routes(&self) -> impl Iterator<Item = (SystemId, SystemId, f64)> + '_ {
        self.graph.edge_references().map(|e| (self.graph[e.source()], self.graph[e.target()], *e.weight()))
    }

    pub fn resistance(&self, a: SystemId, b: SystemId) -> Option<f64> {
        self.graph
            .find_edge(NodeIndex::new(a.0), NodeIndex::new(b.0))
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    pub fn neighbours(&self, system: SystemId) -> impl Iterator<Item = SystemId> + '_ {
        self.graph.neighbors(NodeIndex::new(system.0)).map(|n| self.graph[n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use econ_domain::{FactionTable, SystemEnvironment};
    use itertools::Itertools;

    fn environment(density: f64, volatility: f64) -> SystemEnvironment {
        SystemEnvironment {
            nebula_density: density,
            nebula_volatility: volatility,
            ..SystemEnvironment::default()
        }
    }

    #[test]
    fn nebulae_raise_resistance() {
        let mut universe = Universe::default();
        let a = universe.add_system("A", environment(500.0, 50.0), None);
        let b = universe.add_system("B", environment(1500.0, 150.0), None);
        let r = jump_resistance(universe.system(a), universe.system(b), &universe, &EconomyConfig::default());
        assert!((r - (30.0 + 2.0 + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn factions_shift_resistance_by_three() {
        let mut factions = FactionTable::default();
        let empire = factions.add("Empire");
        let dvaered = factions.add("Dvaered");
        let pirate = factions.add("Pirate");
        factions.set_allies(empire, dvaered);
        factions.set_enemies(empire, pirate);

        let mut universe = Universe::new(factions);
        let a = universe.add_system("A", SystemEnvironment::default(), Some(empire));
        let b = universe.add_system("B", SystemEnvironment::default(), Some(dvaered));
        let c = universe.add_system("C", SystemEnvironment::default(), Some(pirate));
        let d = universe.add_system("D", SystemEnvironment::default(), None);
        let cfg = EconomyConfig::default();

        let r = |x: SystemId, y: SystemId| jump_resistance(universe.system(x), universe.system(y), &universe, &cfg);
        assert!((r(a, b) - 27.0).abs() < 1e-12);
        assert!((r(a, c) - 33.0).abs() < 1e-12);
        assert!((r(b, c) - 30.0).abs() < 1e-12);
        assert!((r(a, d) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn one_edge_per_jump_pair() {
        let mut universe = Universe::default();
        let a = universe.add_system("A", SystemEnvironment::default(), None);
        let b = universe.add_system("B", SystemEnvironment::default(), None);
        let c = universe.add_system("C", SystemEnvironment::default(), None);
        universe.add_jump(a, b);
        universe.add_jump(b, a);
        universe.add_jump(b, c);

        let graph = MarketGraph::build(&universe, &EconomyConfig::default());

        assert_eq!(graph.system_count(), 3);
        assert_eq!(graph.route_count(), 2);
        assert_eq!(graph.resistance(b, a), Some(30.0));
        assert_eq!(graph.resistance(a, c), None);
        assert_eq!(graph.neighbours(b).sorted().collect_vec(), vec![a, c]);
    }
}
