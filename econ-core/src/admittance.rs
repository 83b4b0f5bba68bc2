use crate::config::EconomyConfig;
use crate::graph::MarketGraph;
use econ_domain::{CommodityCatalog, PlanetId, SimTime, StarSystem, TimeScale, Universe};
use mockall::automock;
use nalgebra::DMatrix;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::debug;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SolverError {
    #[error("the market graph has no systems")]
    EmptyGraph,
    #[error("admittance matrix has not been assembled")]
    NotAssembled,
    #[error("intensity vector has {actual} entries but the matrix has {expected} rows")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("admittance matrix is singular")]
    Singular,
}

/// Symmetric conductance matrix of the market graph.
///
/// Off-diagonal cells hold `-1/R` of the route between two systems, each diagonal cell the sum of its
/// row's conductances plus the self conductance `1/self_resistance`. The matrix is symmetric positive
/// definite, so it is factored once on assembly and the factor is reused for every right-hand side.
#[derive(Debug, Clone)]
pub struct AdmittanceMatrix {
    g: CscMatrix<f64>,
    cholesky: CscCholesky<f64>,
}

impl AdmittanceMatrix {
    pub fn assemble(graph: &MarketGraph, cfg: &EconomyConfig) -> Result<Self, SolverError> {
        let n = graph.system_count();
        if n == 0 {
            return Err(SolverError::EmptyGraph);
        }

        let mut diagonal = vec![1.0 / cfg.self_resistance; n];
        let mut coo = CooMatrix::new(n, n);

        for (a, b, r) in graph.routes() {
            let conductance = 1.0 / r;
            coo.push(a.0, b.0, -conductance);
            coo.push(b.0, a.0, -conductance);
            diagonal[a.0] += conductance;
            diagonal[b.0] += conductance;
        }
        for (i, d) in diagonal.into_iter().enumerate() {
            coo.push(i, i, d);
        }

        let g = CscMatrix::from(&coo);
        let cholesky = CscCholesky::factor(&g).map_err(|_| SolverError::Singular)?;
        Ok(Self { g, cholesky })
    }

    pub fn dimension(&self) -> usize {
        self.g.nrows()
    }

    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.g.get_entry(row, col).map(|e| e.into_value()).unwrap_or(0.0)
    }

    pub fn nnz(&self) -> usize {
        self.g.nnz()
    }

    /// Solves `G x = intensities` by back substitution through the Cholesky factor.
    pub fn solve(&self, intensities: &[f64]) -> Result<Vec<f64>, SolverError> {
        let n = self.dimension();
        if intensities.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                actual: intensities.len(),
            });
        }

        let rhs = DMatrix::from_column_slice(n, 1, intensities);
        let solution = self.cholesky.solve(&rhs);

        if solution.iter().any(|x| !x.is_finite()) {
            return Err(SolverError::Singular);
        }
        Ok(solution.iter().copied().collect())
    }
}

/// Source term of the nodal analysis: how much of a commodity a system injects into the network.
#[automock]
pub trait ProductionIntensity {
    /// Advances any internal state by `dt`. Called once per economy update, before the solves.
    fn advance(&mut self, dt: SimTime, universe: &Universe);

    fn intensity(&self, system: &StarSystem, universe: &Universe, price_index: usize) -> f64;
}

/// The intensity used by the running economy: nothing is produced anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroIntensity;

impl ProductionIntensity for ZeroIntensity {
    fn advance(&mut self, _dt: SimTime, _universe: &Universe) {}

    fn intensity(&self, _system: &StarSystem, _universe: &Universe, _price_index: usize) -> f64 {
        0.0
    }
}

/// Production driven by the population of inhabited planets.
///
/// Each planet carries a production factor that drifts with Gaussian noise and is pulled back
/// towards its base value. A system's intensity is `Σ factor·sqrt(population) / production_modifier`.
#[derive(Debug, Clone)]
pub struct PopulationIntensity {
    variability: f64,
    production_modifier: f64,
    base_factor: f64,
    time: TimeScale,
    factors: HashMap<PlanetId, f64>,
    rng: StdRng,
}

impl PopulationIntensity {
    pub fn new(cfg: &EconomyConfig, seed: u64) -> Self {
        Self {
            variability: cfg.production_variability,
            production_modifier: cfg.production_modifier,
            base_factor: 1.0,
            time: cfg.time_scale(),
            factors: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn factor(&self, planet: PlanetId) -> f64 {
        self.factors.get(&planet).copied().unwrap_or(self.base_factor)
    }

    fn gaussian(&mut self) -> f64 {
        // Box-Muller
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl ProductionIntensity for PopulationIntensity {
    fn advance(&mut self, dt: SimTime, universe: &Universe) {
        let ddt = dt.to_stu(&self.time);
        for planet in universe.planets().iter().filter(|p| p.population > 0) {
            let current = self.factor(planet.id);
            let drifted = current + self.variability * self.gaussian() * ddt;
            let reverted = drifted - self.variability * (drifted - self.base_factor) * ddt;
            self.factors.insert(planet.id, reverted);
        }
    }

    fn intensity(&self, system: &StarSystem, universe: &Universe, _price_index: usize) -> f64 {
        let production: f64 = universe
            .planets_of(system.id)
            .filter(|p| p.population > 0)
            .map(|p| self.factor(p.id) * (p.population as f64).sqrt())
            .sum();
        production / self.production_modifier
    }
}

/// Per-system price modulation obtained by solving the admittance matrix once per priced commodity.
///
/// The modulation is kept for a production-driven economy and does not feed into displayed prices.
#[derive(Debug, Clone)]
pub struct AdmittanceSolver {
    matrix: Option<AdmittanceMatrix>,
    /// `modulation[system][price_index]`
    modulation: Vec<Vec<f64>>,
    scale: f64,
    offset: f64,
}

impl Default for AdmittanceSolver {
    fn default() -> Self {
        Self {
            matrix: None,
            modulation: Vec::new(),
            scale: 1.0,
            offset: 1.0,
        }
    }
}

impl AdmittanceSolver {
    pub fn matrix(&self) -> Option<&AdmittanceMatrix> {
        self.matrix.as_ref()
    }

    pub fn is_assembled(&self) -> bool {
        self.matrix.is_some()
    }

    pub fn modulation(&self, system: usize, price_index: usize) -> Option<f64> {
        self.modulation.get(system).and_then(|row| row.get(price_index)).copied()
    }

    pub fn system_modulation(&self, system: usize) -> Option<&[f64]> {
        self.modulation.get(system).map(|row| row.as_slice())
    }

    /// Reassembles the matrix from the current topology. The previous matrix survives a failure.
    pub fn assemble(&mut self, universe: &Universe, cfg: &EconomyConfig) -> Result<(), SolverError> {
        let graph = MarketGraph::build(universe, cfg);
        let matrix = AdmittanceMatrix::assemble(&graph, cfg)?;
        debug!("Assembled admittance matrix of dimension {} with {} entries", matrix.dimension(), matrix.nnz());
        self.matrix = Some(matrix);
        Ok(())
    }

    /// Solves every priced commodity and swaps in the new modulation only if all solves succeeded.
    pub fn update(
        &mut self,
        dt: SimTime,
        universe: &Universe,
        catalog: &CommodityCatalog,
        intensity: &mut dyn ProductionIntensity,
    ) -> Result<(), SolverError> {
        let matrix = self.matrix.as_ref().ok_or(SolverError::NotAssembled)?;
        intensity.advance(dt, universe);

        let systems = universe.systems();
        let mut modulation = vec![vec![0.0; catalog.priced().len()]; systems.len()];

        for price_index in 0..catalog.priced().len() {
            let x: Vec<f64> = systems.iter().map(|s| intensity.intensity(s, universe, price_index)).collect();
            let solved = matrix.solve(&x)?;
            for (row, value) in modulation.iter_mut().zip(solved) {
                row[price_index] = value * self.scale + self.offset;
            }
        }

        self.modulation = modulation;
        Ok(())
    }

    pub fn clear(&mut self) {
        if self.matrix.is_none() && self.modulation.is_empty() {
            return;
        }
        debug!("Discarding admittance matrix and modulation");
        self.matrix = None;
        self.modulation.clear();
    }
}
