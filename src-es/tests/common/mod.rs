#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ndarray::{Array1, ArrayView1};

use esopt_es::{EsAlgorithm, EsError, EsObjective, OptimizationMode, OptimizationSample};

/// What a scripted backend observed, shared with the test body.
#[derive(Debug, Default)]
pub struct ScriptedLog {
    pub init_mean: Option<Array1<f64>>,
    pub updates: usize,
    pub all_scored_before_update: bool,
}

/// Deterministic backend whose best score after the k-th update is taken
/// from a fixed schedule (the last entry repeats). Used to pin down the
/// driver's convergence predicate without any stochastic search.
pub struct ScriptedAlgorithm {
    schedule: Vec<f64>,
    dimension: usize,
    best_value: f64,
    best_x: Array1<f64>,
    pub log: Rc<RefCell<ScriptedLog>>,
}

impl ScriptedAlgorithm {
    pub fn new(schedule: Vec<f64>) -> Self {
        assert!(!schedule.is_empty());
        Self {
            schedule,
            dimension: 0,
            best_value: f64::NAN,
            best_x: Array1::zeros(0),
            log: Rc::new(RefCell::new(ScriptedLog {
                all_scored_before_update: true,
                ..ScriptedLog::default()
            })),
        }
    }
}

impl EsAlgorithm for ScriptedAlgorithm {
    fn init(
        &mut self,
        dimension: usize,
        _population_size: usize,
        initial_mean: ArrayView1<f64>,
        _initial_step_size: f64,
        mode: OptimizationMode,
    ) {
        self.dimension = dimension;
        self.best_value = mode.worst();
        self.best_x = initial_mean.to_owned();
        self.log.borrow_mut().init_mean = Some(initial_mean.to_owned());
    }

    fn generate_samples(&mut self, samples: &mut [OptimizationSample]) {
        let generation = self.log.borrow().updates as f64;
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.x = Array1::from_elem(self.dimension, generation + i as f64 / 100.0);
        }
    }

    fn update(&mut self, samples: &[OptimizationSample]) {
        let mut log = self.log.borrow_mut();
        if samples.iter().any(|s| s.objective_value.is_nan()) {
            log.all_scored_before_update = false;
        }
        let idx = log.updates.min(self.schedule.len() - 1);
        log.updates += 1;
        self.best_value = self.schedule[idx];
        self.best_x = Array1::from_elem(self.dimension, self.best_value);
    }

    fn best_objective_value(&self) -> f64 {
        self.best_value
    }

    fn best(&self) -> Array1<f64> {
        self.best_x.clone()
    }
}

/// Objective that records every evaluation batch size and every `on_ready`
/// invocation through shared handles the test body keeps.
pub struct CountingObjective {
    dimension: usize,
    pub batch_sizes: Rc<RefCell<Vec<usize>>>,
    pub ready_calls: Rc<RefCell<Vec<Array1<f64>>>>,
}

impl CountingObjective {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batch_sizes: Rc::new(RefCell::new(Vec::new())),
            ready_calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl EsObjective for CountingObjective {
    fn param_dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&mut self, batch: &[Array1<f64>]) -> Result<Vec<f64>, EsError> {
        self.batch_sizes.borrow_mut().push(batch.len());
        Ok(batch.iter().map(|x| x.sum()).collect())
    }

    fn on_ready(&mut self, best: &Array1<f64>) {
        self.ready_calls.borrow_mut().push(best.clone());
    }
}

/// Objective that always returns one score too few, to exercise the
/// mismatched-result error path.
pub struct TruncatingObjective {
    dimension: usize,
}

impl TruncatingObjective {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EsObjective for TruncatingObjective {
    fn param_dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&mut self, batch: &[Array1<f64>]) -> Result<Vec<f64>, EsError> {
        Ok(batch.iter().skip(1).map(|x| x.sum()).collect())
    }
}
