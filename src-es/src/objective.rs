//! The target of an optimization session, and an adapter for plain closures.

use ndarray::Array1;
use rayon::prelude::*;

use crate::EsError;

/// An evaluable target: the objective function the driver optimizes.
///
/// Evaluation is batched so the target can amortize per-candidate overhead
/// (vectorize, dispatch to a thread pool, call out to a simulator once per
/// batch). The driver waits synchronously for each batch's full result.
pub trait EsObjective {
    /// Dimensionality of the parameter vectors this target expects.
    fn param_dimension(&self) -> usize;

    /// Score a batch of candidates. The result must contain exactly one score
    /// per candidate, in input order; anything else is fatal to the session.
    fn evaluate(&mut self, batch: &[Array1<f64>]) -> Result<Vec<f64>, EsError>;

    /// Completion callback: invoked at most once per session, exactly once on
    /// normal convergence or blocking-run exhaustion.
    fn on_ready(&mut self, _best: &Array1<f64>) {}
}

/// Wraps a plain `x -> f(x)` closure as an [`EsObjective`].
///
/// With [`parallel`](FnObjective::parallel) enabled the members of each batch
/// are scored concurrently through rayon; the driver itself never spawns
/// workers, so this is where batching pays off for expensive objectives.
pub struct FnObjective<F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    dimension: usize,
    func: F,
    parallel: bool,
}

impl<F> FnObjective<F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    pub fn new(dimension: usize, func: F) -> Self {
        Self {
            dimension,
            func,
            parallel: false,
        }
    }

    /// Score batch members on the rayon thread pool.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}

impl<F> EsObjective for FnObjective<F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    fn param_dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&mut self, batch: &[Array1<f64>]) -> Result<Vec<f64>, EsError> {
        let scores = if self.parallel {
            batch.par_iter().map(|x| (self.func)(x)).collect()
        } else {
            batch.iter().map(|x| (self.func)(x)).collect()
        };
        Ok(scores)
    }
}
