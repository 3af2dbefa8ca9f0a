//! The optimization driver: session lifecycle, the stepped and blocking
//! execution protocols, batched evaluation, and the convergence predicate.

use ndarray::Array1;
use serde::Serialize;

use crate::{EsAlgorithm, EsConfig, EsError, EsObjective, OptimizationSample};

/// Optional completion callback bound at session start, invoked (together
/// with the target's `on_ready`) with the best parameters found.
pub type OnReady = Box<dyn FnMut(&Array1<f64>)>;

/// What a [`EsDriver::tick`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No session is active; the call was a no-op.
    Idle,
    /// The session performed its iterations and is still running.
    Optimizing,
    /// The convergence predicate fired; the session is over.
    Converged,
}

/// Result of a blocking [`EsDriver::run`].
#[derive(Debug, Clone, Serialize)]
pub struct EsReport {
    /// Best parameters found.
    pub x: Array1<f64>,
    /// Score of `x`.
    pub fun: f64,
    /// Iterations performed.
    pub nit: usize,
    /// True if the score condition fired, false if the budget ran out.
    pub converged: bool,
}

struct Session<T> {
    target: T,
    on_ready: Option<OnReady>,
    algorithm: Box<dyn EsAlgorithm>,
    samples: Vec<OptimizationSample>,
}

/// Population-based black-box optimization driver.
///
/// Owns the population buffer, the algorithm backend, and the convergence
/// state; one session may be active at a time. All execution is
/// single-threaded and cooperative: the stepped protocol suspends only at
/// tick boundaries, the blocking protocol runs its whole budget in one call.
///
/// If `tick` or `run` returns an error the session is left in an undefined
/// intermediate state; treat the error as fatal to the session and start a
/// new one.
pub struct EsDriver<T: EsObjective> {
    config: EsConfig,
    session: Option<Session<T>>,
    iteration: usize,
    best_score: f64,
    best_params: Array1<f64>,
    is_optimizing: bool,
}

impl<T: EsObjective> EsDriver<T> {
    pub fn new(config: EsConfig) -> Self {
        let worst = config.mode.worst();
        Self {
            config,
            session: None,
            iteration: 0,
            best_score: worst,
            best_params: Array1::zeros(0),
            is_optimizing: false,
        }
    }

    pub fn config(&self) -> &EsConfig {
        &self.config
    }

    /// Mutable access to the configuration. Changes apply to the next
    /// session; a running session keeps the batch/budget values it started
    /// with only where they were already consumed.
    pub fn config_mut(&mut self) -> &mut EsConfig {
        &mut self.config
    }

    /// Iterations completed in the current session.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Best score seen so far; only updated after a completed backend update.
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn best_params(&self) -> &Array1<f64> {
        &self.best_params
    }

    pub fn is_optimizing(&self) -> bool {
        self.is_optimizing
    }

    /// Start a non-blocking session with the configured algorithm variant.
    ///
    /// Binds the target, an optional completion callback, and an optional
    /// initial mean. Nothing is evaluated here; evaluation happens on
    /// subsequent [`tick`](Self::tick) calls. Starting while a session is
    /// active silently supersedes it and the superseded session's completion
    /// callback never fires.
    pub fn start(
        &mut self,
        target: T,
        on_ready: Option<OnReady>,
        initial_mean: Option<Array1<f64>>,
    ) -> Result<(), EsError> {
        let algorithm = self.config.variant.create(self.config.seed);
        self.start_with(target, algorithm, on_ready, initial_mean)
    }

    /// Start a non-blocking session with a caller-supplied backend.
    pub fn start_with(
        &mut self,
        target: T,
        mut algorithm: Box<dyn EsAlgorithm>,
        on_ready: Option<OnReady>,
        initial_mean: Option<Array1<f64>>,
    ) -> Result<(), EsError> {
        self.config.validate()?;

        let dimension = target.param_dimension();
        let mean = resolve_initial_mean(initial_mean, dimension);
        algorithm.init(
            dimension,
            self.config.population_size,
            mean.view(),
            self.config.initial_step_size,
            self.config.mode,
        );

        let samples = (0..self.config.population_size)
            .map(|_| OptimizationSample::new(dimension))
            .collect();
        self.session = Some(Session {
            target,
            on_ready,
            algorithm,
            samples,
        });
        self.iteration = 0;
        self.best_score = self.config.mode.worst();
        self.best_params = mean;
        self.is_optimizing = true;
        Ok(())
    }

    /// Advance the stepped protocol by up to `iterations_per_tick`
    /// iterations. Must be invoked periodically by an external scheduler
    /// while a session is active; a tick on an idle driver is a no-op.
    pub fn tick(&mut self) -> Result<TickStatus, EsError> {
        if !self.is_optimizing {
            return Ok(TickStatus::Idle);
        }
        let converged = self.drive(self.config.iterations_per_tick, true)?;
        if converged {
            self.finish();
            Ok(TickStatus::Converged)
        } else {
            Ok(TickStatus::Optimizing)
        }
    }

    /// Cancel the active session, optionally firing the completion capability
    /// with whatever best parameters are currently known (the initial mean if
    /// no iteration has completed yet). A no-op when idle.
    pub fn stop(&mut self, call_on_ready: bool) {
        if let Some(mut session) = self.session.take() {
            if call_on_ready {
                session.target.on_ready(&self.best_params);
                if let Some(cb) = session.on_ready.as_mut() {
                    cb(&self.best_params);
                }
            }
        }
        self.is_optimizing = false;
    }

    /// Blocking protocol: identical initialization to [`start`](Self::start),
    /// then exactly `max(0, max_iteration)` iterations inside this call.
    ///
    /// Only the score condition is checked inside the loop; the loop bound
    /// itself enforces the iteration budget, and exhausting it is a normal
    /// termination. The completion capability fires exactly once per run
    /// either way.
    pub fn run(
        &mut self,
        target: T,
        on_ready: Option<OnReady>,
        initial_mean: Option<Array1<f64>>,
    ) -> Result<EsReport, EsError> {
        let algorithm = self.config.variant.create(self.config.seed);
        self.run_with(target, algorithm, on_ready, initial_mean)
    }

    /// Blocking protocol with a caller-supplied backend.
    pub fn run_with(
        &mut self,
        target: T,
        algorithm: Box<dyn EsAlgorithm>,
        on_ready: Option<OnReady>,
        initial_mean: Option<Array1<f64>>,
    ) -> Result<EsReport, EsError> {
        self.start_with(target, algorithm, on_ready, initial_mean)?;
        let budget = self.config.max_iteration.max(0) as usize;
        let converged = self.drive(budget, false)?;
        self.finish();
        Ok(EsReport {
            x: self.best_params.clone(),
            fun: self.best_score,
            nit: self.iteration,
            converged,
        })
    }

    /// Run up to `budget` iterations against the active session. Returns true
    /// as soon as the convergence predicate fires; the iteration-count clause
    /// participates only for the stepped protocol.
    fn drive(&mut self, budget: usize, check_iteration_bound: bool) -> Result<bool, EsError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        for _ in 0..budget {
            session.algorithm.generate_samples(&mut session.samples);

            for chunk in session.samples.chunks_mut(self.config.evaluation_batch_size) {
                let batch: Vec<Array1<f64>> = chunk.iter().map(|s| s.x.clone()).collect();
                let scores = session.target.evaluate(&batch)?;
                if scores.len() != chunk.len() {
                    return Err(EsError::BatchLength {
                        expected: chunk.len(),
                        got: scores.len(),
                    });
                }
                for (sample, score) in chunk.iter_mut().zip(scores) {
                    sample.objective_value = score;
                }
            }

            session.algorithm.update(&session.samples);
            self.best_score = session.algorithm.best_objective_value();
            self.best_params = session.algorithm.best();
            self.iteration += 1;

            if self.config.disp {
                eprintln!(
                    "ES iter {:4}  best_f={:.6e}",
                    self.iteration, self.best_score
                );
            }

            let score_reached = self
                .config
                .mode
                .reached(self.best_score, self.config.target_value);
            let budget_reached = check_iteration_bound
                && self.config.max_iteration > 0
                && self.iteration as i64 >= self.config.max_iteration;
            if score_reached || budget_reached {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Tear down the session, firing the completion capability once.
    fn finish(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.target.on_ready(&self.best_params);
            if let Some(cb) = session.on_ready.as_mut() {
                cb(&self.best_params);
            }
        }
        self.is_optimizing = false;
    }
}

/// Resolve the user-supplied initial mean against the target's dimension.
/// A mismatch is recoverable: diagnose and substitute the zero vector.
fn resolve_initial_mean(initial_mean: Option<Array1<f64>>, dimension: usize) -> Array1<f64> {
    match initial_mean {
        Some(mean) if mean.len() == dimension => mean,
        Some(mean) => {
            log::warn!(
                "initial mean has dimension {} but the target expects {}; using the zero vector",
                mean.len(),
                dimension
            );
            Array1::zeros(dimension)
        }
        None => Array1::zeros(dimension),
    }
}
