//! Recorded optimization runs: drive a session one iteration per tick,
//! logging the best-known state after every iteration.

use ndarray::Array1;

use crate::{
    EsConfig, EsDriver, EsError, EsReport, FnObjective, OptimizationRecorder, TickStatus,
};

/// Run an optimization session over `func` with per-iteration CSV recording.
///
/// The session is driven through the stepped protocol with one iteration per
/// tick so every iteration lands in the record. The CSV is written to
/// `<output_dir>/<function_name>.csv`; the configured `max_iteration` must be
/// positive, otherwise the recording loop would never terminate on a target
/// value the function cannot reach.
pub fn run_recorded_es<F>(
    function_name: &str,
    func: F,
    dimension: usize,
    mut config: EsConfig,
    output_dir: &str,
) -> Result<(EsReport, String), EsError>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    if config.max_iteration <= 0 {
        return Err(EsError::InvalidConfig(
            "run_recorded_es requires a positive max_iteration".into(),
        ));
    }
    config.iterations_per_tick = 1;

    let mut recorder = OptimizationRecorder::new(function_name.to_string());
    let mut driver = EsDriver::new(config);
    driver.start(FnObjective::new(dimension, func), None, None)?;

    loop {
        match driver.tick()? {
            TickStatus::Idle => break,
            status => {
                recorder.record(driver.iteration(), driver.best_params(), driver.best_score());
                if status == TickStatus::Converged {
                    break;
                }
            }
        }
    }

    // The stepped protocol also converges on the iteration bound; report
    // `converged` the way the blocking protocol does, on the score alone.
    let converged = driver
        .config()
        .mode
        .reached(driver.best_score(), driver.config().target_value);
    let report = EsReport {
        x: driver.best_params().clone(),
        fun: driver.best_score(),
        nit: driver.iteration(),
        converged,
    };
    let csv_path = recorder.save_to_csv(output_dir)?;
    Ok((report, csv_path))
}
