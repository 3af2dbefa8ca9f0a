//! Limited-memory matrix-adaptation evolution strategy (LM-MA-ES).
//!
//! Replaces the n×n transformation matrix of MA-ES with `m = 4 + ⌊3 ln n⌋`
//! direction vectors, so memory and per-sample cost are O(m·n) instead of
//! O(n²). Candidates are built by folding the stored directions into a fresh
//! N(0, I) draw; step size uses the same cumulative adaptation as MA-ES.

use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::algorithm::{Recombination, rank_samples};
use crate::{EsAlgorithm, OptimizationMode, OptimizationSample};

pub struct Lmmaes {
    rng: StdRng,
    mode: OptimizationMode,
    dimension: usize,
    recomb: Recombination,
    mean: Array1<f64>,
    sigma: f64,
    initial_step_size: f64,
    /// Evolution direction vectors, oldest time scale first.
    dirs: Vec<Array1<f64>>,
    /// Step-size evolution path.
    p_sigma: Array1<f64>,
    /// Completed generations; direction j participates only once j < t.
    t: u64,
    c_sigma: f64,
    d_sigma: f64,
    /// Per-direction sampling rates `1 / (1.5^j · n)`.
    c_d: Vec<f64>,
    /// Per-direction path rates `λ / (4^j · n)`, capped at 1.
    c_c: Vec<f64>,
    z: Vec<Array1<f64>>,
    d: Vec<Array1<f64>>,
    best_value: f64,
    best_x: Array1<f64>,
}

impl Lmmaes {
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
            dirs: Vec::new(),
            p_sigma: Array1::zeros(0),
            t: 0,
            c_sigma: 0.0,
            d_sigma: 1.0,
            c_d: Vec::new(),
            c_c: Vec::new(),
            z: Vec::new(),
            d: Vec::new(),
            best_value: f64::INFINITY,
            best_x: Array1::zeros(0),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn reset_adaptation(&mut self) {
        for dir in self.dirs.iter_mut() {
            dir.fill(0.0);
        }
        self.p_sigma = Array1::zeros(self.dimension);
        self.sigma = self.initial_step_size;
        self.t = 0;
    }
}

impl EsAlgorithm for Lmmaes {
    fn init(
        &mut self,
        dimension: usize,
        population_size: usize,
        initial_mean: ArrayView1<f64>,
        initial_step_size: f64,
        mode: OptimizationMode,
    ) {
        let n = dimension as f64;
        let memory = 4 + (3.0 * n.ln()).floor().max(0.0) as usize;
        self.mode = mode;
        self.dimension = dimension;
        self.recomb = Recombination::new(population_size);
        let mu_eff = self.recomb.mu_eff;

        self.c_sigma = (mu_eff + 2.0) / (n + mu_eff + 5.0);
        self.d_sigma =
            1.0 + 2.0 * (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0) + self.c_sigma;
        self.c_d = (0..memory).map(|j| 1.0 / (1.5f64.powi(j as i32) * n)).collect();
        self.c_c = (0..memory)
            .map(|j| (population_size as f64 / (4.0f64.powi(j as i32) * n)).min(1.0))
            .collect();

        self.mean = initial_mean.to_owned();
        self.initial_step_size = initial_step_size;
        self.dirs = vec![Array1::zeros(dimension); memory];
        self.reset_adaptation();
        self.z.clear();
        self.d.clear();
        self.best_value = mode.worst();
        self.best_x = self.mean.clone();
    }

    fn generate_samples(&mut self, samples: &mut [OptimizationSample]) {
        self.z.clear();
        self.d.clear();
        let active = (self.t as usize).min(self.dirs.len());
        for sample in samples.iter_mut() {
            let z = Array1::from_shape_fn(self.dimension, |_| {
                self.rng.sample::<f64, _>(StandardNormal)
            });
            let mut d = z.clone();
            for j in 0..active {
                let proj = self.dirs[j].dot(&d);
                d = &((1.0 - self.c_d[j]) * &d) + &(self.c_d[j] * proj * &self.dirs[j]);
            }
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
        if self.z.len() != samples.len() {
            return;
        }

        let order = rank_samples(samples, self.mode);
        let n = self.dimension;
        let mu_eff = self.recomb.mu_eff;
        let mut zw = Array1::<f64>::zeros(n);
        let mut dw = Array1::<f64>::zeros(n);
        for (rank, &idx) in order.iter().take(self.recomb.mu).enumerate() {
            let w = self.recomb.weights[rank];
            zw = zw + &(w * &self.z[idx]);
            dw = dw + &(w * &self.d[idx]);
        }

        self.mean = &self.mean + &(self.sigma * &dw);
        self.p_sigma = &((1.0 - self.c_sigma) * &self.p_sigma)
            + &((mu_eff * self.c_sigma * (2.0 - self.c_sigma)).sqrt() * &zw);
        for j in 0..self.dirs.len() {
            self.dirs[j] = &((1.0 - self.c_c[j]) * &self.dirs[j])
                + &((mu_eff * self.c_c[j] * (2.0 - self.c_c[j])).sqrt() * &zw);
        }

        let p_norm_sq = self.p_sigma.dot(&self.p_sigma);
        self.sigma *= ((self.c_sigma / (2.0 * self.d_sigma)) * (p_norm_sq / n as f64 - 1.0)).exp();
        self.sigma = self.sigma.clamp(1e-12, 1e8);
        self.t += 1;

        if self.sigma.is_nan() || self.mean.iter().any(|v| v.is_nan()) {
            log::warn!("LM-MA-ES: NaN in distribution state, resetting adaptation");
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
