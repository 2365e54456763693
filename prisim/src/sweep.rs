//! Repeated simulation runs across a grid of priority fractions.
//!
//! For a fixed arrival rate, the priority fraction is swept from 0 to 1. Each grid point is
//! simulated a number of times with independently seeded generators, and the per-class averages
//! are averaged over these replications. Runs are executed in parallel on the `rayon` thread
//! pool; since every run has its own random stream, the results do not depend on scheduling.

use std::collections::BTreeMap;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use rayon::prelude::*;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::{
    Error, RandomVariates, ResidenceTimes, Result, Simulation, SimulationConfig,
    DEFAULT_MAX_ARRIVALS, NO_SAMPLE,
};

/// Default distance between consecutive priority fractions.
pub const DEFAULT_STEP: f64 = 0.05;

/// Default number of runs per priority fraction.
pub const DEFAULT_REPLICATIONS: usize = 20;

fn default_step() -> f64 {
    DEFAULT_STEP
}

fn default_replications() -> usize {
    DEFAULT_REPLICATIONS
}

fn default_max_arrivals() -> usize {
    DEFAULT_MAX_ARRIVALS
}

/// Predefined system loads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString, strum::ToString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoadLevel {
    /// 95% utilization.
    High,
    /// 50% utilization.
    Low,
}

impl LoadLevel {
    /// Arrival rate producing this load.
    #[must_use]
    pub fn arrival_rate(self) -> f64 {
        match self {
            Self::High => 0.95,
            Self::Low => 0.5,
        }
    }
}

/// Sweep configuration, typically loaded from a JSON file.
///
/// ```
/// # use prisim::sweep::SweepConfig;
/// let config: SweepConfig = serde_json::from_str(r#"{"arrival_rate": 0.95, "seed": 7}"#).unwrap();
/// assert_eq!(config.replications, 20);
/// assert_eq!(config.fractions().unwrap().len(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Arrival rate shared by all runs.
    pub arrival_rate: f64,
    /// Distance between consecutive priority fractions.
    #[serde(default = "default_step")]
    pub step: f64,
    /// Number of runs per priority fraction.
    #[serde(default = "default_replications")]
    pub replications: usize,
    /// Seed from which all random streams are derived.
    #[serde(default)]
    pub seed: u64,
    /// Arrival cap of each run.
    #[serde(default = "default_max_arrivals")]
    pub max_arrivals: usize,
}

impl SweepConfig {
    /// Default sweep for the given arrival rate.
    #[must_use]
    pub fn new(arrival_rate: f64) -> Self {
        Self {
            arrival_rate,
            step: DEFAULT_STEP,
            replications: DEFAULT_REPLICATIONS,
            seed: 0,
            max_arrivals: DEFAULT_MAX_ARRIVALS,
        }
    }

    /// Checks that all parameters are within their domains.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is outside of `(0, 1]`, there are no replications, or the
    /// arrival rate or cap would be rejected by [`SimulationConfig`].
    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(Error::InvalidStep(self.step));
        }
        if self.replications == 0 {
            return Err(Error::ZeroReplications);
        }
        self.simulation_config(0.0).map(|_| ())
    }

    /// Priority fractions of the grid: multiples of the step from 0 up to 1.
    ///
    /// Each value is computed from its index, so no rounding error accumulates along the grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; see [`SweepConfig::validate`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fractions(&self) -> Result<Vec<f64>> {
        self.validate()?;
        let steps = (1.0 / self.step + 1e-9).floor() as usize;
        Ok((0..=steps)
            .map(|k| (k as f64 * self.step).min(1.0))
            .collect_vec())
    }

    fn simulation_config(&self, priority_fraction: f64) -> Result<SimulationConfig> {
        SimulationConfig::new(self.arrival_rate, priority_fraction)?
            .with_max_arrivals(self.max_arrivals)
    }
}

/// Averaged results of all runs for one priority fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Priority fraction of the runs.
    pub priority_fraction: f64,
    /// Per-class means over the runs in which the class had a defined average.
    pub mean: ResidenceTimes,
    #[serde(skip)]
    runs: Vec<ResidenceTimes>,
}

impl SweepPoint {
    /// Aggregates the results of the runs for `priority_fraction`.
    #[must_use]
    pub fn from_runs(priority_fraction: f64, runs: Vec<ResidenceTimes>) -> Self {
        let mean = ResidenceTimes {
            regular: mean_defined(runs.iter().map(|r| r.regular)),
            priority: mean_defined(runs.iter().map(|r| r.priority)),
        };
        Self {
            priority_fraction,
            mean,
            runs,
        }
    }

    /// Results of individual runs, in the order of their replication index.
    #[must_use]
    pub fn runs(&self) -> &[ResidenceTimes] {
        &self.runs
    }

    /// Mean of [`ResidenceTimes::to_pair`] over all runs, i.e., counting a missing average
    /// as [`NO_SAMPLE`].
    #[must_use]
    pub fn mean_pair(&self) -> (f64, f64) {
        if self.runs.is_empty() {
            return (NO_SAMPLE, NO_SAMPLE);
        }
        let n = self.runs.len() as f64;
        let (regular, priority) = self
            .runs
            .iter()
            .map(ResidenceTimes::to_pair)
            .fold((0.0, 0.0), |(r, p), (run_r, run_p)| (r + run_r, p + run_p));
        (regular / n, priority / n)
    }
}

fn mean_defined(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Serializes the values of an ordered map as a sequence, disregarding the keys.
/// The keys are floats, which JSON would not accept as object keys, and are already
/// contained within the values.
fn serialize_map_values<K, V, S>(
    map: &BTreeMap<K, V>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut seq = serializer.serialize_seq(Some(map.len()))?;
    for val in map.values() {
        seq.serialize_element(val)?;
    }
    seq.end()
}

/// Results of a sweep, ordered by priority fraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    /// Arrival rate shared by all runs.
    pub arrival_rate: f64,
    #[serde(serialize_with = "serialize_map_values")]
    points: BTreeMap<OrderedFloat<f64>, SweepPoint>,
}

impl SweepResult {
    /// Iterates over points in the increasing order of the priority fraction.
    pub fn points(&self) -> impl Iterator<Item = &SweepPoint> {
        self.points.values()
    }

    /// The point for the given priority fraction, if it was part of the grid.
    #[must_use]
    pub fn get(&self, priority_fraction: f64) -> Option<&SweepPoint> {
        self.points.get(&OrderedFloat(priority_fraction))
    }

    /// Number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Answers whether the sweep has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point where the two class averages are the closest to each other.
    ///
    /// Only points where both classes have an average are considered. On ties, the point with
    /// the lower priority fraction is returned.
    #[must_use]
    pub fn intersection(&self) -> Option<&SweepPoint> {
        self.points()
            .filter_map(|point| point.mean.gap().map(|gap| (point, gap)))
            .min_by_key(|(_, gap)| OrderedFloat(*gap))
            .map(|(point, _)| point)
    }
}

/// Variates for one run: all runs share the seed but each reads its own ChaCha stream.
fn replication_variates(seed: u64, stream: u64) -> RandomVariates<ChaChaRng> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    rng.set_stream(stream);
    RandomVariates::new(rng)
}

/// Runs the sweep described by `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid; see [`SweepConfig::validate`].
pub fn run_sweep(config: &SweepConfig) -> Result<SweepResult> {
    run_sweep_with_progress(config, || {})
}

/// Runs the sweep described by `config`, calling `on_run` after each finished run.
/// `on_run` may be called concurrently from multiple threads.
///
/// # Errors
///
/// Returns an error if the configuration is invalid; see [`SweepConfig::validate`].
pub fn run_sweep_with_progress<F>(config: &SweepConfig, on_run: F) -> Result<SweepResult>
where
    F: Fn() + Sync,
{
    let fractions = config.fractions()?;
    log::info!(
        "Sweeping {} priority fractions at arrival rate {} ({} runs each)",
        fractions.len(),
        config.arrival_rate,
        config.replications
    );
    let points = fractions
        .par_iter()
        .enumerate()
        .map(|(index, &fraction)| -> Result<_> {
            let sim_config = config.simulation_config(fraction)?;
            let runs = (0..config.replications)
                .into_par_iter()
                .map(|replication| -> Result<_> {
                    let stream = (index * config.replications + replication) as u64;
                    let report =
                        Simulation::new(sim_config, replication_variates(config.seed, stream))?
                            .run();
                    on_run();
                    Ok(report.residence)
                })
                .collect::<Result<Vec<_>>>()?;
            let point = SweepPoint::from_runs(fraction, runs);
            log::debug!(
                "p={:.2}: regular={:?} priority={:?}",
                fraction,
                point.mean.regular,
                point.mean.priority
            );
            Ok((OrderedFloat(fraction), point))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(SweepResult {
        arrival_rate: config.arrival_rate,
        points,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[fixture]
    fn config() -> SweepConfig {
        SweepConfig {
            step: 0.25,
            replications: 3,
            seed: 11,
            max_arrivals: 5_000,
            ..SweepConfig::new(LoadLevel::High.arrival_rate())
        }
    }

    #[test]
    fn test_default_fractions() {
        let fractions = SweepConfig::new(0.5).fractions().unwrap();
        assert_eq!(fractions.len(), 21);
        assert_eq!(fractions[0], 0.0);
        assert!(approx_eq!(f64, fractions[1], 0.05));
        assert!(approx_eq!(f64, fractions[10], 0.5));
        assert_eq!(fractions[20], 1.0);
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    }

    #[rstest(step, expected,
        case(1.0, vec![0.0, 1.0]),
        case(0.5, vec![0.0, 0.5, 1.0]),
        case(0.3, vec![0.0, 0.3, 0.6, 0.9]),
    )]
    fn test_fractions(step: f64, expected: Vec<f64>) {
        let config = SweepConfig {
            step,
            ..SweepConfig::new(0.5)
        };
        let fractions = config.fractions().unwrap();
        assert_eq!(fractions.len(), expected.len());
        for (actual, expected) in fractions.iter().zip(expected) {
            assert!(approx_eq!(f64, *actual, expected, epsilon = 1e-12));
        }
    }

    #[rstest(step, case(0.0), case(-0.1), case(1.5), case(f64::NAN))]
    fn test_invalid_step(step: f64) {
        let config = SweepConfig {
            step,
            ..SweepConfig::new(0.5)
        };
        assert!(matches!(config.fractions(), Err(Error::InvalidStep(_))));
    }

    #[test]
    fn test_invalid_sweep_config() {
        let config = SweepConfig {
            replications: 0,
            ..SweepConfig::new(0.5)
        };
        assert_eq!(run_sweep(&config), Err(Error::ZeroReplications));
        assert!(matches!(
            run_sweep(&SweepConfig::new(-0.5)),
            Err(Error::InvalidArrivalRate(_))
        ));
    }

    #[test]
    fn test_load_levels() {
        assert_eq!("high".parse::<LoadLevel>().unwrap(), LoadLevel::High);
        assert_eq!(LoadLevel::Low.to_string(), "low");
        assert_eq!(LoadLevel::High.arrival_rate(), 0.95);
        assert_eq!(LoadLevel::Low.arrival_rate(), 0.5);
    }

    #[test]
    fn test_point_aggregation() {
        let point = SweepPoint::from_runs(
            0.0,
            vec![
                ResidenceTimes {
                    regular: Some(2.0),
                    priority: None,
                },
                ResidenceTimes {
                    regular: Some(4.0),
                    priority: None,
                },
            ],
        );
        assert_eq!(point.mean.regular, Some(3.0));
        assert_eq!(point.mean.priority, None);
        assert_eq!(point.mean_pair(), (3.0, NO_SAMPLE));
        assert_eq!(point.runs().len(), 2);
    }

    #[test]
    fn test_partially_defined_point() {
        let point = SweepPoint::from_runs(
            0.5,
            vec![
                ResidenceTimes {
                    regular: Some(2.0),
                    priority: Some(1.0),
                },
                ResidenceTimes {
                    regular: Some(2.0),
                    priority: None,
                },
            ],
        );
        assert_eq!(point.mean.priority, Some(1.0));
        assert_eq!(point.mean_pair(), (2.0, 0.5));
    }

    #[rstest]
    fn test_sweep(config: SweepConfig) {
        let counter = AtomicUsize::new(0);
        let result = run_sweep_with_progress(&config, || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 15);
        assert_eq!(result.len(), 5);
        let fractions: Vec<_> = result.points().map(|p| p.priority_fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let first = result.get(0.0).unwrap();
        assert_eq!(first.mean.priority, None);
        assert!(first.mean.regular.is_some());
        let last = result.get(1.0).unwrap();
        assert_eq!(last.mean.regular, None);
        assert!(last.mean.priority.is_some());

        let intersection = result.intersection().unwrap();
        assert!(intersection.priority_fraction > 0.0);
        assert!(intersection.priority_fraction < 1.0);
    }

    #[rstest]
    fn test_sweep_deterministic(config: SweepConfig) {
        assert_eq!(run_sweep(&config).unwrap(), run_sweep(&config).unwrap());
    }

    #[rstest]
    fn test_replications_differ(config: SweepConfig) {
        let result = run_sweep(&config).unwrap();
        let runs = result.get(0.5).unwrap().runs();
        assert_ne!(runs[0], runs[1]);
    }

    #[rstest]
    fn test_serialize(config: SweepConfig) {
        let config = SweepConfig {
            step: 1.0,
            replications: 1,
            ..config
        };
        let result = run_sweep(&config).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["arrival_rate"], 0.95);
        let points = value["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["priority_fraction"], 0.0);
        assert!(points[0]["mean"]["priority"].is_null());
        assert!(points[1]["mean"]["regular"].is_null());
    }
}
