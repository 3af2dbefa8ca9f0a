//! Evolution-strategy optimization driver
//!
//! A population-based black-box optimizer: each iteration a population of
//! candidate parameter vectors is sampled from an evolution-strategy backend,
//! scored by a user-supplied objective in fixed-size evaluation batches, and
//! fed back so the backend can adapt its search distribution.
//!
//! Two execution protocols are supported:
//! - a non-blocking stepped protocol driven by an external scheduler calling
//!   [`EsDriver::tick`], and
//! - a blocking [`EsDriver::run`] that performs the whole budget in one call.
//!
//! Supported features:
//! - Batched objective evaluation (the objective may parallelize a batch
//!   internally, see [`FnObjective`])
//! - Minimize/maximize symmetry with a user-settable stopping target
//! - Two bundled backends: [`Maes`] and its limited-memory variant [`Lmmaes`]
//! - Cooperative cancellation between ticks via [`EsDriver::stop`]
//! - Per-iteration CSV recording via [`run_recorded_es`]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod algorithm;
pub mod driver;
pub mod lmmaes;
pub mod maes;
pub mod objective;
pub mod recorder;
pub mod run_recorded;
pub mod sample;


pub use algorithm::{EsAlgorithm, EsVariant};
pub use driver::{EsDriver, EsReport, OnReady, TickStatus};
pub use lmmaes::Lmmaes;
pub use maes::Maes;
pub use objective::{EsObjective, FnObjective};
pub use recorder::{IterationRecord, OptimizationRecorder};
pub use run_recorded::run_recorded_es;
pub use sample::OptimizationSample;

/// Errors surfaced by the driver and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum EsError {
    /// The configuration was rejected at session start.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The objective returned the wrong number of scores for a batch.
    /// The session is left in an undefined intermediate state; restart it.
    #[error("evaluation returned {got} scores for a batch of {expected}")]
    BatchLength { expected: usize, got: usize },
    /// The objective itself failed. Same contract as [`EsError::BatchLength`].
    #[error("objective evaluation failed: {0}")]
    Evaluation(#[from] Box<dyn std::error::Error + Send + Sync>),
    /// Writing an optimization record failed.
    #[error("recording failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the objective value is to be minimized or maximized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationMode {
    Minimize,
    Maximize,
}

impl OptimizationMode {
    /// The worst representable score for this mode; the initial "best so far".
    pub fn worst(&self) -> f64 {
        match self {
            OptimizationMode::Minimize => f64::INFINITY,
            OptimizationMode::Maximize => f64::NEG_INFINITY,
        }
    }

    /// True if `a` is a strictly better score than `b` under this mode.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        match self {
            OptimizationMode::Minimize => a < b,
            OptimizationMode::Maximize => a > b,
        }
    }

    /// True if `score` satisfies the stopping threshold `target`.
    pub fn reached(&self, score: f64, target: f64) -> bool {
        match self {
            OptimizationMode::Minimize => score <= target,
            OptimizationMode::Maximize => score >= target,
        }
    }
}

impl FromStr for OptimizationMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimize" | "min" => Ok(OptimizationMode::Minimize),
            "maximize" | "max" => Ok(OptimizationMode::Maximize),
            _ => Err(format!("unknown optimization mode: {}", s)),
        }
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationMode::Minimize => write!(f, "minimize"),
            OptimizationMode::Maximize => write!(f, "maximize"),
        }
    }
}

/// Configuration for an optimization session.
///
/// Validated by [`EsConfig::validate`] when a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsConfig {
    /// Number of candidate vectors sampled per iteration.
    pub population_size: usize,
    /// Iterations performed by each [`EsDriver::tick`] call.
    pub iterations_per_tick: usize,
    /// Candidates handed to the objective per evaluation call.
    /// The final batch of an iteration may be smaller.
    pub evaluation_batch_size: usize,
    /// Initial global step size of the search distribution.
    pub initial_step_size: f64,
    pub mode: OptimizationMode,
    /// Iteration budget. Zero or negative means unbounded for the stepped
    /// protocol; the blocking protocol runs exactly `max(0, max_iteration)`
    /// iterations.
    pub max_iteration: i64,
    /// Stopping threshold on the best score, interpreted per `mode`.
    pub target_value: f64,
    /// Which bundled backend to instantiate.
    pub variant: EsVariant,
    /// Seed for the backend's RNG; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Print the best score after each iteration to stderr.
    pub disp: bool,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            population_size: 16,
            iterations_per_tick: 10,
            evaluation_batch_size: 1,
            initial_step_size: 1.0,
            mode: OptimizationMode::Minimize,
            max_iteration: 100,
            target_value: f64::NEG_INFINITY,
            variant: EsVariant::Maes,
            seed: None,
            disp: false,
        }
    }
}

impl EsConfig {
    /// Check the user-settable surface before a session starts.
    pub fn validate(&self) -> Result<(), EsError> {
        if self.population_size < 1 {
            return Err(EsError::InvalidConfig(
                "population_size must be at least 1".into(),
            ));
        }
        if self.evaluation_batch_size < 1 || self.evaluation_batch_size > self.population_size {
            return Err(EsError::InvalidConfig(format!(
                "evaluation_batch_size must be in 1..={}, got {}",
                self.population_size, self.evaluation_batch_size
            )));
        }
        if self.iterations_per_tick < 1 {
            return Err(EsError::InvalidConfig(
                "iterations_per_tick must be at least 1".into(),
            ));
        }
        if !(self.initial_step_size > 0.0) || !self.initial_step_size.is_finite() {
            return Err(EsError::InvalidConfig(format!(
                "initial_step_size must be positive and finite, got {}",
                self.initial_step_size
            )));
        }
        Ok(())
    }
}

/// Fluent builder for [`EsConfig`].
pub struct EsConfigBuilder {
    cfg: EsConfig,
}

impl Default for EsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EsConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: EsConfig::default(),
        }
    }
    pub fn population_size(mut self, v: usize) -> Self {
        self.cfg.population_size = v;
        self
    }
    pub fn iterations_per_tick(mut self, v: usize) -> Self {
        self.cfg.iterations_per_tick = v;
        self
    }
    pub fn evaluation_batch_size(mut self, v: usize) -> Self {
        self.cfg.evaluation_batch_size = v;
        self
    }
    pub fn initial_step_size(mut self, v: f64) -> Self {
        self.cfg.initial_step_size = v;
        self
    }
    pub fn mode(mut self, v: OptimizationMode) -> Self {
        self.cfg.mode = v;
        self
    }
    pub fn max_iteration(mut self, v: i64) -> Self {
        self.cfg.max_iteration = v;
        self
    }
    pub fn target_value(mut self, v: f64) -> Self {
        self.cfg.target_value = v;
        self
    }
    pub fn variant(mut self, v: EsVariant) -> Self {
        self.cfg.variant = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = Some(v);
        self
    }
    pub fn disp(mut self, v: bool) -> Self {
        self.cfg.disp = v;
        self
    }
    pub fn build(self) -> EsConfig {
        self.cfg
    }
}
