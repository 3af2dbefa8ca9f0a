use ndarray::Array1;

/// One population slot: a candidate parameter vector and its score.
///
/// Slots are allocated once per session and mutated in place each iteration:
/// the backend writes a fresh `x`, the driver writes the score after the
/// candidate's evaluation batch returns.
#[derive(Debug, Clone)]
pub struct OptimizationSample {
    /// Candidate parameter vector, length equal to the problem dimension.
    pub x: Array1<f64>,
    /// Score of `x`. NaN until the driver has written an evaluation result.
    pub objective_value: f64,
}

impl OptimizationSample {
    pub fn new(dimension: usize) -> Self {
        Self {
            x: Array1::zeros(dimension),
            objective_value: f64::NAN,
        }
    }

    pub fn dimension(&self) -> usize {
        self.x.len()
    }
}
