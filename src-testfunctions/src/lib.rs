//! Benchmark objective functions for the esopt optimizer
//!
//! A small collection of standard test functions used by the integration
//! tests and the `run_es` CLI. All take an n-dimensional point and return a
//! scalar to minimize.
//!
//! # Example
//!
//! ```
//! use ndarray::Array1;
//! use esopt_testfunctions::sphere;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//! ```

use ndarray::Array1;

/// Sphere function - unimodal, separable
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi.powi(2)).sum()
}

/// Shifted quadratic - unimodal
/// Global minimum: f(x) = 0 at x = (1, 1, ..., 1)
pub fn quadratic(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| (xi - 1.0).powi(2)).sum()
}

/// Rosenbrock function - unimodal but with a narrow curved valley
/// Global minimum: f(x) = 0 at x = (1, 1, ..., 1)
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    (0..x.len() - 1)
        .map(|i| 100.0 * (x[i + 1] - x[i].powi(2)).powi(2) + (1.0 - x[i]).powi(2))
        .sum()
}

/// Rastrigin function - highly multimodal
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn rastrigin(x: &Array1<f64>) -> f64 {
    let a = 10.0;
    a * x.len() as f64
        + x.iter()
            .map(|&xi| xi.powi(2) - a * (2.0 * std::f64::consts::PI * xi).cos())
            .sum::<f64>()
}

/// Ackley function - multimodal with a deep global basin
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn ackley(x: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let sum_cos: f64 = x
        .iter()
        .map(|&xi| (2.0 * std::f64::consts::PI * xi).cos())
        .sum();
    -20.0 * (-0.2 * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp() + 20.0 + std::f64::consts::E
}

/// Griewank function - multimodal, challenging in large dimensions
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn griewank(x: &Array1<f64>) -> f64 {
    let sum_squares: f64 = x.iter().map(|&xi| xi.powi(2)).sum();
    let product_cos: f64 = x
        .iter()
        .enumerate()
        .map(|(i, &xi)| (xi / ((i + 1) as f64).sqrt()).cos())
        .product();
    1.0 + sum_squares / 4000.0 - product_cos
}

/// Look up a test function by name, as used by the `run_es` CLI.
pub fn by_name(name: &str) -> Option<fn(&Array1<f64>) -> f64> {
    match name {
        "sphere" => Some(sphere),
        "quadratic" => Some(quadratic),
        "rosenbrock" => Some(rosenbrock),
        "rastrigin" => Some(rastrigin),
        "ackley" => Some(ackley),
        "griewank" => Some(griewank),
        _ => None,
    }
}
