//! The capability set the driver expects from an evolution-strategy backend,
//! plus selection helpers shared by the bundled backends.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{OptimizationMode, OptimizationSample};

/// An evolution-strategy backend: samples candidate vectors from an internal
/// search distribution and adapts that distribution from scored samples.
///
/// Backends are stateful and single-session: the driver calls `init` once at
/// session start, then alternates `generate_samples` / `update` every
/// iteration on the same buffer.
pub trait EsAlgorithm {
    /// Reset the search distribution for a new session.
    fn init(
        &mut self,
        dimension: usize,
        population_size: usize,
        initial_mean: ArrayView1<f64>,
        initial_step_size: f64,
        mode: OptimizationMode,
    );

    /// Fill each sample's `x` with a fresh candidate. Must not resize the
    /// buffer or touch `objective_value`.
    fn generate_samples(&mut self, samples: &mut [OptimizationSample]);

    /// Consume the fully scored population and adapt the distribution.
    fn update(&mut self, samples: &[OptimizationSample]);

    /// Best score observed so far in this session.
    fn best_objective_value(&self) -> f64;

    /// Parameters of the best-scoring candidate observed so far.
    fn best(&self) -> Array1<f64>;
}

/// Selector for the bundled backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EsVariant {
    /// Matrix-adaptation ES (full n×n transformation matrix).
    Maes,
    /// Limited-memory MA-ES (a few direction vectors instead of a matrix).
    Lmmaes,
}

impl EsVariant {
    /// Instantiate the selected backend, seeded when `seed` is present.
    pub fn create(&self, seed: Option<u64>) -> Box<dyn EsAlgorithm> {
        match self {
            EsVariant::Maes => Box::new(crate::Maes::new(seed)),
            EsVariant::Lmmaes => Box::new(crate::Lmmaes::new(seed)),
        }
    }
}

impl FromStr for EsVariant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maes" | "ma-es" => Ok(EsVariant::Maes),
            "lmmaes" | "lm-maes" | "lm-ma-es" => Ok(EsVariant::Lmmaes),
            _ => Err(format!("unknown algorithm variant: {}", s)),
        }
    }
}

impl fmt::Display for EsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsVariant::Maes => write!(f, "maes"),
            EsVariant::Lmmaes => write!(f, "lmmaes"),
        }
    }
}

/// Rank-based recombination weights shared by the bundled backends.
///
/// Standard log-rank weights over the top half of the population:
/// `w_i ∝ ln(μ + 0.5) − ln(i + 1)`, normalized to sum to one.
#[derive(Debug, Clone)]
pub(crate) struct Recombination {
    /// Number of parents selected for recombination.
    pub mu: usize,
    /// Normalized weights for the top-μ samples, best first.
    pub weights: Vec<f64>,
    /// Variance-effective selection mass: `1 / Σ w_i²`.
    pub mu_eff: f64,
}

impl Recombination {
    pub fn new(population_size: usize) -> Self {
        let mu = (population_size / 2).max(1);
        let raw: Vec<f64> = (0..mu)
            .map(|i| (mu as f64 + 0.5).ln() - ((i + 1) as f64).ln())
            .collect();
        let sum: f64 = raw.iter().sum();
        let weights: Vec<f64> = raw.iter().map(|w| w / sum).collect();
        let mu_eff = 1.0 / weights.iter().map(|w| w * w).sum::<f64>();
        Self {
            mu,
            weights,
            mu_eff,
        }
    }
}

/// Sample indices ordered best-first under `mode`. NaN scores sort last so an
/// unscored sample can never be selected as a parent.
pub(crate) fn rank_samples(samples: &[OptimizationSample], mode: OptimizationMode) -> Vec<usize> {
    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.sort_by(|&a, &b| {
        let (va, vb) = (samples[a].objective_value, samples[b].objective_value);
        match (va.is_nan(), vb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => match mode {
                OptimizationMode::Minimize => {
                    va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
                }
                OptimizationMode::Maximize => {
                    vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
                }
            },
        }
    });
    order
}

/// Expected norm of an n-dimensional standard normal vector,
/// `E[||N(0, I)||] ≈ √n (1 − 1/(4n) + 1/(21n²))`.
pub(crate) fn expected_normal_norm(n: usize) -> f64 {
    let n = n as f64;
    n.sqrt() * (1.0 - 1.0 / (4.0 * n) + 1.0 / (21.0 * n * n))
}
