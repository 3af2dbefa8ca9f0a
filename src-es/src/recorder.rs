//! Per-iteration recording of optimization progress, for analysis and tests.

use std::fs::{File, create_dir_all};
use std::io::Write;

use ndarray::Array1;

use crate::EsError;

/// A single recorded iteration.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Best parameters known after this iteration.
    pub x: Vec<f64>,
    /// Best score known after this iteration.
    pub best_result: f64,
    /// Whether this iteration improved on the best recorded so far.
    pub is_improvement: bool,
}

/// Records the driver's best-known state after each iteration and can dump
/// the history as a CSV file named after the objective function.
///
/// The driver is single-threaded, so records are plainly owned; call
/// [`record`](Self::record) after each tick of a one-iteration-per-tick
/// session (see [`run_recorded_es`](crate::run_recorded_es)).
#[derive(Debug)]
pub struct OptimizationRecorder {
    function_name: String,
    records: Vec<IterationRecord>,
    best_value: Option<f64>,
}

impl OptimizationRecorder {
    pub fn new(function_name: String) -> Self {
        Self {
            function_name,
            records: Vec::new(),
            best_value: None,
        }
    }

    /// Append one iteration. Improvement is judged against the previous
    /// records, lower-is-better (recorded runs minimize; a maximizing caller
    /// can record negated scores).
    pub fn record(&mut self, iteration: usize, x: &Array1<f64>, best_result: f64) {
        let is_improvement = match self.best_value {
            Some(best) => best_result < best,
            None => true,
        };
        if is_improvement {
            self.best_value = Some(best_result);
        }
        self.records.push(IterationRecord {
            iteration,
            x: x.to_vec(),
            best_result,
            is_improvement,
        });
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn num_iterations(&self) -> usize {
        self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.best_value = None;
    }

    /// The last recorded solution, if any iterations were recorded.
    pub fn best_solution(&self) -> Option<(Vec<f64>, f64)> {
        self.records
            .last()
            .map(|r| (r.x.clone(), r.best_result))
    }

    /// Save all recorded iterations to `<output_dir>/<function_name>.csv`,
    /// creating the directory if needed. Returns the file path.
    pub fn save_to_csv(&self, output_dir: &str) -> Result<String, EsError> {
        create_dir_all(output_dir)?;

        let filename = format!("{}/{}.csv", output_dir, self.function_name);
        let mut file = File::create(&filename)?;

        if self.records.is_empty() {
            return Ok(filename);
        }

        let num_dimensions = self.records[0].x.len();
        write!(file, "iteration,")?;
        for i in 0..num_dimensions {
            write!(file, "x{},", i)?;
        }
        writeln!(file, "best_result,is_improvement")?;

        for record in &self.records {
            write!(file, "{},", record.iteration)?;
            for &xi in &record.x {
                write!(file, "{:.16},", xi)?;
            }
            writeln!(file, "{:.16},{}", record.best_result, record.is_improvement)?;
        }

        Ok(filename)
    }
}
