mod common;

use common::{CountingObjective, ScriptedAlgorithm};
use esopt_es::{
    EsConfig, EsConfigBuilder, EsDriver, EsVariant, FnObjective, OptimizationMode, TickStatus,
};
use esopt_testfunctions::sphere;
use ndarray::Array1;

fn sphere_config() -> EsConfig {
    EsConfigBuilder::new()
        .population_size(12)
        .iterations_per_tick(5)
        .evaluation_batch_size(4)
        .mode(OptimizationMode::Minimize)
        .target_value(-1.0) // unreachable for sphere, the budget terminates
        .max_iteration(40)
        .variant(EsVariant::Maes)
        .seed(42)
        .build()
}

#[test]
fn test_tick_on_idle_driver_is_a_noop() {
    let mut driver: EsDriver<CountingObjective> = EsDriver::new(EsConfig::default());
    assert_eq!(driver.tick().unwrap(), TickStatus::Idle);
    assert_eq!(driver.iteration(), 0);
    assert!(!driver.is_optimizing());
}

#[test]
fn test_stepped_protocol_matches_blocking_run() {
    let start = Array1::from_elem(3, 3.0);

    let mut stepped = EsDriver::new(sphere_config());
    stepped
        .start(
            FnObjective::new(3, sphere),
            None,
            Some(start.clone()),
        )
        .unwrap();
    let mut ticks = 0;
    while stepped.tick().unwrap() != TickStatus::Converged {
        ticks += 1;
        assert!(ticks < 100, "stepped session never converged");
    }
    assert_eq!(stepped.iteration(), 40);

    let mut blocking = EsDriver::new(sphere_config());
    let report = blocking
        .run(FnObjective::new(3, sphere), None, Some(start))
        .unwrap();

    // identical seeds and budgets, identical arithmetic: results match exactly
    assert_eq!(report.nit, 40);
    assert_eq!(stepped.best_score(), report.fun);
    assert_eq!(stepped.best_params(), &report.x);
}

#[test]
fn test_stop_between_ticks_allows_a_fresh_restart() {
    let mut driver = EsDriver::new(sphere_config());
    driver
        .start(FnObjective::new(3, sphere), None, Some(Array1::from_elem(3, 2.0)))
        .unwrap();
    assert_eq!(driver.tick().unwrap(), TickStatus::Optimizing);
    assert_eq!(driver.iteration(), 5);

    driver.stop(false);
    assert!(!driver.is_optimizing());
    assert_eq!(driver.tick().unwrap(), TickStatus::Idle);

    // a superseding session starts from scratch
    driver
        .start(FnObjective::new(3, sphere), None, Some(Array1::from_elem(3, 2.0)))
        .unwrap();
    assert_eq!(driver.iteration(), 0);
    assert_eq!(driver.tick().unwrap(), TickStatus::Optimizing);
    assert_eq!(driver.iteration(), 5);
}

#[test]
fn test_stop_can_fire_completion_before_any_iteration() {
    let config = EsConfigBuilder::new().population_size(4).build();
    let mut driver = EsDriver::new(config);

    let target = CountingObjective::new(2);
    let ready = target.ready_calls.clone();
    let mean = Array1::from(vec![1.0, 2.0]);
    driver
        .start_with(
            target,
            Box::new(ScriptedAlgorithm::new(vec![1.0])),
            None,
            Some(mean.clone()),
        )
        .unwrap();

    driver.stop(true);
    let ready = ready.borrow();
    assert_eq!(ready.len(), 1);
    // no iteration completed, the best known is still the initial mean
    assert_eq!(ready[0], mean);
}

#[test]
fn test_starting_supersedes_the_active_session_silently() {
    let config = EsConfigBuilder::new()
        .population_size(4)
        .iterations_per_tick(1)
        .max_iteration(3)
        .target_value(-1.0)
        .build();
    let mut driver = EsDriver::new(config);

    let first = CountingObjective::new(2);
    let first_ready = first.ready_calls.clone();
    driver
        .start_with(first, Box::new(ScriptedAlgorithm::new(vec![1.0])), None, None)
        .unwrap();
    driver.tick().unwrap();

    let second = CountingObjective::new(2);
    let second_ready = second.ready_calls.clone();
    driver
        .start_with(second, Box::new(ScriptedAlgorithm::new(vec![1.0])), None, None)
        .unwrap();
    assert_eq!(driver.iteration(), 0);

    while driver.tick().unwrap() != TickStatus::Converged {}

    // the superseded session's completion never fired
    assert_eq!(first_ready.borrow().len(), 0);
    assert_eq!(second_ready.borrow().len(), 1);
}

#[test]
fn test_mismatched_initial_mean_is_replaced_by_zero_vector() {
    let config = EsConfigBuilder::new().population_size(4).build();
    let mut driver = EsDriver::new(config);

    let algo = ScriptedAlgorithm::new(vec![1.0]);
    let log = algo.log.clone();
    driver
        .start_with(
            CountingObjective::new(3),
            Box::new(algo),
            None,
            Some(Array1::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])),
        )
        .unwrap();

    // the session still starts, with a zero mean of the target's dimension
    assert!(driver.is_optimizing());
    assert_eq!(
        log.borrow().init_mean.as_ref().unwrap(),
        &Array1::zeros(3)
    );
    assert_eq!(driver.best_params(), &Array1::zeros(3));
}

#[test]
fn test_session_callback_fires_alongside_target_on_ready() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let config = EsConfigBuilder::new()
        .population_size(4)
        .iterations_per_tick(10)
        .max_iteration(5)
        .target_value(-1.0)
        .build();
    let mut driver = EsDriver::new(config);

    let target = CountingObjective::new(2);
    let target_ready = target.ready_calls.clone();
    let callback_seen: Rc<RefCell<Vec<Array1<f64>>>> = Rc::new(RefCell::new(Vec::new()));
    let callback_log = callback_seen.clone();

    driver
        .start_with(
            target,
            Box::new(ScriptedAlgorithm::new(vec![1.0])),
            Some(Box::new(move |best: &Array1<f64>| {
                callback_log.borrow_mut().push(best.clone());
            })),
            None,
        )
        .unwrap();
    assert_eq!(driver.tick().unwrap(), TickStatus::Converged);

    assert_eq!(target_ready.borrow().len(), 1);
    assert_eq!(callback_seen.borrow().len(), 1);
    assert_eq!(&callback_seen.borrow()[0], &target_ready.borrow()[0]);
}
