//! Matrix-adaptation evolution strategy (MA-ES).
//!
//! Keeps a full n×n transformation matrix `M` in place of a covariance
//! matrix; candidates are sampled as `x = mean + σ · M z` with `z ~ N(0, I)`,
//! and `M` is adapted directly from the selected `z` draws, so no
//! eigendecomposition is needed. Step size is controlled by cumulative
//! step-size adaptation over the search path `s`.

use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::algorithm::{Recombination, expected_normal_norm, rank_samples};
use crate::{EsAlgorithm, OptimizationMode, OptimizationSample};

pub struct Maes {
    rng: StdRng,
    mode: OptimizationMode,
    dimension: usize,
    recomb: Recombination,
    /// Distribution mean.
    mean: Array1<f64>,
    /// Global step size.
    sigma: f64,
    initial_step_size: f64,
    /// Transformation matrix, identity at init.
    m: Array2<f64>,
    /// Search path for step-size and matrix adaptation.
    s: Array1<f64>,
    /// Per-slot N(0, I) draws from the last `generate_samples` call.
    z: Vec<Array1<f64>>,
    /// Per-slot transformed draws `M z` from the last call.
    d: Vec<Array1<f64>>,
    c_sigma: f64,
    d_sigma: f64,
    c_1: f64,
    c_mu: f64,
    expected_norm: f64,
    best_value: f64,
    best_x: Array1<f64>,
}

impl Maes {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };
        Self {
            rng,
            mode: OptimizationMode::Minimize,
            dimension: 0,
            recomb: Recombination::new(1),
            mean: Array1::zeros(0),
            sigma: 1.0,
            initial_step_size: 1.0,
            m: Array2::eye(0),
            s: Array1::zeros(0),
            z: Vec::new(),
            d: Vec::new(),
            c_sigma: 0.0,
            d_sigma: 1.0,
            c_1: 0.0,
            c_mu: 0.0,
            expected_norm: 1.0,
            best_value: f64::INFINITY,
            best_x: Array1::zeros(0),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn reset_adaptation(&mut self) {
        self.m = Array2::eye(self.dimension);
        self.s = Array1::zeros(self.dimension);
        self.sigma = self.initial_step_size;
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

impl EsAlgorithm for Maes {
    fn init(
        &mut self,
        dimension: usize,
        population_size: usize,
        initial_mean: ArrayView1<f64>,
        initial_step_size: f64,
        mode: OptimizationMode,
    ) {
        let n = dimension as f64;
        self.mode = mode;
        self.dimension = dimension;
        self.recomb = Recombination::new(population_size);
        let mu_eff = self.recomb.mu_eff;

        // Hansen's standard learning rates and damping.
        self.c_sigma = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        self.d_sigma =
            1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + self.c_sigma;
        self.c_1 = 2.0 / ((n + 1.3).powi(2) + mu_eff);
        self.c_mu = (2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff))
            .min(1.0 - self.c_1);
        self.expected_norm = expected_normal_norm(dimension);

        self.mean = initial_mean.to_owned();
        self.initial_step_size = initial_step_size;
        self.reset_adaptation();
        self.z.clear();
        self.d.clear();
        self.best_value = mode.worst();
        self.best_x = self.mean.clone();
    }

    fn generate_samples(&mut self, samples: &mut [OptimizationSample]) {
        self.z.clear();
        self.d.clear();
        for sample in samples.iter_mut() {
            let z = Array1::from_shape_fn(self.dimension, |_| {
                self.rng.sample::<f64, _>(StandardNormal)
            });
            let d = self.m.dot(&z);
            sample.x = &self.mean + &(self.sigma * &d);
            self.z.push(z);
            self.d.push(d);
        }
    }

    fn update(&mut self, samples: &[OptimizationSample]) {
        for sample in samples {
            if self.mode.is_better(sample.objective_value, self.best_value) {
                self.best_value = sample.objective_value;
                self.best_x = sample.x.clone();
            }
        }
        // An update without a matching generate_samples call (or with a
        // resized buffer) has no draws to adapt from.
        if self.z.len() != samples.len() {
            return;
        }

        let order = rank_samples(samples, self.mode);
        let n = self.dimension;
        let mut zw = Array1::<f64>::zeros(n);
        let mut dw = Array1::<f64>::zeros(n);
        let mut zz = Array2::<f64>::zeros((n, n));
        for (rank, &idx) in order.iter().take(self.recomb.mu).enumerate() {
            let w = self.recomb.weights[rank];
            zw = zw + &(w * &self.z[idx]);
            dw = dw + &(w * &self.d[idx]);
            zz = zz + &(w * outer(&self.z[idx], &self.z[idx]));
        }

        self.mean = &self.mean + &(self.sigma * &dw);
        self.s = &((1.0 - self.c_sigma) * &self.s)
            + &((self.recomb.mu_eff * self.c_sigma * (2.0 - self.c_sigma)).sqrt() * &zw);

        // M ← M · ((1 − c1/2 − cμ/2) I + (c1/2) s sᵀ + (cμ/2) Σ w z zᵀ)
        let mut a = Array2::<f64>::eye(n) * (1.0 - self.c_1 / 2.0 - self.c_mu / 2.0);
        a = a + &(self.c_1 / 2.0 * outer(&self.s, &self.s));
        a = a + &(self.c_mu / 2.0 * &zz);
        self.m = self.m.dot(&a);

        let s_norm = self.s.dot(&self.s).sqrt();
        self.sigma *= ((self.c_sigma / self.d_sigma) * (s_norm / self.expected_norm - 1.0)).exp();
        self.sigma = self.sigma.clamp(1e-12, 1e8);

        if self.sigma.is_nan() || self.mean.iter().any(|v| v.is_nan()) {
            log::warn!("MA-ES: NaN in distribution state, resetting adaptation");
            let mean = self.best_x.clone();
            self.mean = mean;
            self.reset_adaptation();
        }
    }

    fn best_objective_value(&self) -> f64 {
        self.best_value
    }

    fn best(&self) -> Array1<f64> {
        self.best_x.clone()
    }
}
