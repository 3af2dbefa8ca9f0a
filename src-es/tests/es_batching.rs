mod common;

use common::{CountingObjective, ScriptedAlgorithm, TruncatingObjective};
use esopt_es::{EsConfigBuilder, EsDriver, EsError, TickStatus};

#[test]
fn test_population_ten_batch_three_yields_3_3_3_1() {
    let config = EsConfigBuilder::new()
        .population_size(10)
        .evaluation_batch_size(3)
        .iterations_per_tick(1)
        .build();
    let mut driver = EsDriver::new(config);

    let target = CountingObjective::new(2);
    let batch_sizes = target.batch_sizes.clone();
    let algo = ScriptedAlgorithm::new(vec![1.0]);
    let log = algo.log.clone();

    driver.start_with(target, Box::new(algo), None, None).unwrap();
    assert_eq!(driver.tick().unwrap(), TickStatus::Optimizing);

    assert_eq!(*batch_sizes.borrow(), vec![3, 3, 3, 1]);
    // every sample carried a score into the backend update
    assert!(log.borrow().all_scored_before_update);
}

#[test]
fn test_batch_equal_to_population_is_one_call() {
    let config = EsConfigBuilder::new()
        .population_size(8)
        .evaluation_batch_size(8)
        .iterations_per_tick(1)
        .build();
    let mut driver = EsDriver::new(config);

    let target = CountingObjective::new(3);
    let batch_sizes = target.batch_sizes.clone();
    driver
        .start_with(target, Box::new(ScriptedAlgorithm::new(vec![1.0])), None, None)
        .unwrap();
    driver.tick().unwrap();

    assert_eq!(*batch_sizes.borrow(), vec![8]);
}

#[test]
fn test_batching_repeats_every_iteration() {
    let config = EsConfigBuilder::new()
        .population_size(5)
        .evaluation_batch_size(2)
        .iterations_per_tick(3)
        .build();
    let mut driver = EsDriver::new(config);

    let target = CountingObjective::new(2);
    let batch_sizes = target.batch_sizes.clone();
    driver
        .start_with(target, Box::new(ScriptedAlgorithm::new(vec![1.0])), None, None)
        .unwrap();
    driver.tick().unwrap();

    assert_eq!(*batch_sizes.borrow(), vec![2, 2, 1, 2, 2, 1, 2, 2, 1]);
}

#[test]
fn test_mismatched_score_count_is_fatal_to_the_session() {
    let config = EsConfigBuilder::new()
        .population_size(4)
        .evaluation_batch_size(4)
        .iterations_per_tick(1)
        .build();
    let mut driver = EsDriver::new(config);

    driver
        .start_with(
            TruncatingObjective::new(2),
            Box::new(ScriptedAlgorithm::new(vec![1.0])),
            None,
            None,
        )
        .unwrap();
    let err = driver.tick().unwrap_err();
    assert!(matches!(
        err,
        EsError::BatchLength {
            expected: 4,
            got: 3
        }
    ));
}
