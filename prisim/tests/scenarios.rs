use float_cmp::approx_eq;
use prisim::{
    run, run_seeded, CustomerClass, Error, RandomVariates, Simulation, SimulationConfig, NO_SAMPLE,
};
use testing::{assert_close, mm1_residence};

#[test]
fn test_regular_only() -> Result<(), Error> {
    let residence = run_seeded(0.5, 0.0, 2021)?;
    assert_eq!(residence.priority, None);
    assert!(approx_eq!(f64, residence.to_pair().1, NO_SAMPLE));
    let expected = mm1_residence(0.5, 1.0).unwrap();
    assert_close(residence.regular.unwrap(), expected, 0.1);
    Ok(())
}

#[test]
fn test_priority_only() -> Result<(), Error> {
    let residence = run_seeded(0.5, 1.0, 2021)?;
    assert_eq!(residence.regular, None);
    assert!(approx_eq!(f64, residence.to_pair().0, NO_SAMPLE));
    let expected = mm1_residence(0.5, 1.0).unwrap();
    assert_close(residence.priority.unwrap(), expected, 0.1);
    Ok(())
}

#[test]
fn test_high_load_even_split() -> Result<(), Error> {
    let residence = run_seeded(0.95, 0.5, 7)?;
    let regular = residence.regular.unwrap();
    let priority = residence.priority.unwrap();
    assert!(priority < regular, "{} >= {}", priority, regular);
    assert_close(regular, mm1_residence(0.475, 1.0).unwrap(), 0.15);
    Ok(())
}

#[test]
fn test_seeded_runs_are_identical() -> Result<(), Error> {
    let config = SimulationConfig::new(0.8, 0.3)?.with_max_arrivals(5000)?;
    let first = Simulation::new(config, RandomVariates::seeded(5))?.run();
    let second = Simulation::new(config, RandomVariates::seeded(5))?.run();
    assert_eq!(first, second);
    let other = Simulation::new(config, RandomVariates::seeded(6))?.run();
    assert_ne!(first.residence, other.residence);
    Ok(())
}

#[test]
fn test_report_counts() -> Result<(), Error> {
    let config = SimulationConfig::new(0.7, 0.4)?.with_max_arrivals(2000)?;
    let report = Simulation::new(config, RandomVariates::seeded(3))?.run();
    assert_eq!(report.arrivals.priority + report.arrivals.regular, 2000);
    for &class in &CustomerClass::ALL {
        assert!(report.completions[class] <= report.service_entries[class]);
        assert!(report.service_entries[class] <= report.arrivals[class]);
    }
    assert!(report.processed_events >= 2000);
    Ok(())
}

#[test]
fn test_run_with_entropy() -> Result<(), Error> {
    let (regular, priority) = run(0.5, 0.5)?;
    assert!(regular >= 0.0);
    assert!(priority >= 0.0);
    Ok(())
}

#[test]
fn test_invalid_parameters() {
    assert_eq!(run(0.0, 0.5), Err(Error::InvalidArrivalRate(0.0)));
    assert_eq!(run(-1.0, 0.5), Err(Error::InvalidArrivalRate(-1.0)));
    assert_eq!(run(0.5, 1.5), Err(Error::InvalidPriorityFraction(1.5)));
    assert_eq!(
        run_seeded(0.5, -0.1, 1),
        Err(Error::InvalidPriorityFraction(-0.1))
    );
}
