//! The event loop.

use serde::{Deserialize, Serialize};

use crate::{
    begins_service, CustomerClass, CustomerLog, Error, Event, EventKind, PerClass, RandomVariates,
    Result, Scheduler, VariateSource,
};

/// Service rate shared by both classes, i.e., the mean service time is one time unit.
pub const SERVICE_RATE: f64 = 1.0;

/// Number of arrivals after which a simulation stops.
pub const DEFAULT_MAX_ARRIVALS: usize = 50_000;

/// Value reported in place of an average residence time when no customer of a class departed.
pub const NO_SAMPLE: f64 = 0.0;

fn default_max_arrivals() -> usize {
    DEFAULT_MAX_ARRIVALS
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    arrival_rate: f64,
    priority_fraction: f64,
    #[serde(default = "default_max_arrivals")]
    max_arrivals: usize,
}

impl SimulationConfig {
    /// Constructs a configuration with the default arrival cap.
    ///
    /// # Errors
    ///
    /// Returns an error if `arrival_rate` is not a finite positive number, or if
    /// `priority_fraction` is outside of `[0, 1]`.
    pub fn new(arrival_rate: f64, priority_fraction: f64) -> Result<Self> {
        let config = Self {
            arrival_rate,
            priority_fraction,
            max_arrivals: DEFAULT_MAX_ARRIVALS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Changes the number of arrivals after which the simulation stops.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_arrivals` is 0.
    pub fn with_max_arrivals(mut self, max_arrivals: usize) -> Result<Self> {
        self.max_arrivals = max_arrivals;
        self.validate()?;
        Ok(self)
    }

    /// Checks that all parameters are within their domains. Configurations built with
    /// [`SimulationConfig::new`] are always valid, but deserialized ones might not be.
    ///
    /// # Errors
    ///
    /// See [`SimulationConfig::new`] and [`SimulationConfig::with_max_arrivals`].
    pub fn validate(&self) -> Result<()> {
        if !(self.arrival_rate.is_finite() && self.arrival_rate > 0.0) {
            return Err(Error::InvalidArrivalRate(self.arrival_rate));
        }
        if !(0.0..=1.0).contains(&self.priority_fraction) {
            return Err(Error::InvalidPriorityFraction(self.priority_fraction));
        }
        if self.max_arrivals == 0 {
            return Err(Error::InvalidMaxArrivals);
        }
        Ok(())
    }

    /// Mean number of arrivals per time unit.
    #[must_use]
    pub fn arrival_rate(&self) -> f64 {
        self.arrival_rate
    }

    /// Probability that an arriving customer is of the Priority class.
    #[must_use]
    pub fn priority_fraction(&self) -> f64 {
        self.priority_fraction
    }

    /// Number of arrivals after which the simulation stops.
    #[must_use]
    pub fn max_arrivals(&self) -> usize {
        self.max_arrivals
    }

    /// Offered load: arrival rate over service rate.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        self.arrival_rate / SERVICE_RATE
    }
}

/// Average residence times of both classes.
///
/// A class with no departed customers has no average; this is always the case for Priority when
/// the priority fraction is 0, and for Regular when it is 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidenceTimes {
    /// Average residence time of Regular customers.
    pub regular: Option<f64>,
    /// Average residence time of Priority customers.
    pub priority: Option<f64>,
}

impl ResidenceTimes {
    /// Average of the given class.
    #[must_use]
    pub fn get(&self, class: CustomerClass) -> Option<f64> {
        match class {
            CustomerClass::Priority => self.priority,
            CustomerClass::Regular => self.regular,
        }
    }

    /// Returns `(regular, priority)`, substituting [`NO_SAMPLE`] for a missing average.
    ///
    /// Note that `(0.0, 0.0)` does not distinguish between "no Priority customers" and
    /// "no customers of either class departed".
    #[must_use]
    pub fn to_pair(&self) -> (f64, f64) {
        (
            self.regular.unwrap_or(NO_SAMPLE),
            self.priority.unwrap_or(NO_SAMPLE),
        )
    }

    /// Absolute difference between the class averages, if both are defined.
    #[must_use]
    pub fn gap(&self) -> Option<f64> {
        Some((self.regular? - self.priority?).abs())
    }
}

impl From<PerClass<Option<f64>>> for ResidenceTimes {
    fn from(averages: PerClass<Option<f64>>) -> Self {
        Self {
            regular: averages.regular,
            priority: averages.priority,
        }
    }
}

/// The summary of a finished simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Average residence times.
    pub residence: ResidenceTimes,
    /// Number of arrivals of each class.
    pub arrivals: PerClass<usize>,
    /// Number of customers of each class that entered service.
    pub service_entries: PerClass<usize>,
    /// Number of customers of each class that departed.
    pub completions: PerClass<usize>,
    /// Average waiting time before entering service.
    pub waiting: PerClass<Option<f64>>,
    /// Clock value when the simulation stopped.
    pub end_time: f64,
    /// Number of processed events.
    pub processed_events: usize,
}

/// The state of a simulation right after processing an event.
#[derive(Debug)]
pub struct Snapshot<'a> {
    /// Current clock.
    pub time: f64,
    /// Number of customers of each class waiting or in service.
    pub queue_lengths: PerClass<usize>,
    /// Timestamps recorded so far.
    pub log: &'a CustomerLog,
    /// Number of pending events.
    pub pending_events: usize,
}

/// Observes each event processed by a [`Simulation`].
pub trait Probe {
    /// Called after `event` has been fully processed.
    fn observe(&mut self, event: &Event, snapshot: &Snapshot<'_>);
}

/// A probe that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl Probe for NoProbe {
    fn observe(&mut self, _: &Event, _: &Snapshot<'_>) {}
}

impl<F> Probe for F
where
    F: FnMut(&Event, &Snapshot<'_>),
{
    fn observe(&mut self, event: &Event, snapshot: &Snapshot<'_>) {
        self(event, snapshot);
    }
}

/// A single simulation run. All state is owned by the run and dropped when it finishes.
pub struct Simulation<V> {
    config: SimulationConfig,
    scheduler: Scheduler,
    queue_lengths: PerClass<usize>,
    log: CustomerLog,
    variates: V,
    processed_events: usize,
}

impl<V: VariateSource> Simulation<V> {
    /// Constructs a simulation drawing its random values from `variates`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid; see [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig, variates: V) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: Scheduler::default(),
            queue_lengths: PerClass::default(),
            log: CustomerLog::default(),
            variates,
            processed_events: 0,
        })
    }

    /// Runs the simulation until the arrival cap is reached.
    #[must_use]
    pub fn run(self) -> RunReport {
        self.run_with_probe(&mut NoProbe)
    }

    /// Runs the simulation until the arrival cap is reached, passing each processed event
    /// to `probe`.
    pub fn run_with_probe<P: Probe + ?Sized>(mut self, probe: &mut P) -> RunReport {
        log::debug!(
            "Starting simulation: lambda={} p={} cap={}",
            self.config.arrival_rate,
            self.config.priority_fraction,
            self.config.max_arrivals
        );
        self.schedule_arrival();
        while self.log.total_arrivals() < self.config.max_arrivals {
            let event = match self.scheduler.pop() {
                Some(event) => event,
                None => break,
            };
            self.process(event);
            probe.observe(
                &event,
                &Snapshot {
                    time: self.scheduler.time(),
                    queue_lengths: self.queue_lengths,
                    log: &self.log,
                    pending_events: self.scheduler.len(),
                },
            );
        }
        self.report()
    }

    fn process(&mut self, event: Event) {
        let time = self.scheduler.time();
        let class = event.class();
        log::trace!("[{:.4}] {:?} {:?}", time, event.kind(), class);
        self.processed_events += 1;
        match event.kind() {
            EventKind::Arrival => {
                self.log.arrival(class, time);
                self.queue_lengths[class] += 1;
                self.schedule_arrival();
            }
            EventKind::Departure => {
                self.log.departure(class, time);
                self.queue_lengths[class] -= 1;
            }
        }
        if begins_service(event.kind(), class, &self.queue_lengths) {
            self.begin_service(class);
        }
    }

    /// Schedules the next arrival relative to the current clock.
    fn schedule_arrival(&mut self) {
        let delay = self.variates.exponential(self.config.arrival_rate);
        let class = self.variates.class_flip(self.config.priority_fraction);
        self.scheduler.schedule(delay, EventKind::Arrival, class);
    }

    fn begin_service(&mut self, class: CustomerClass) {
        self.log.service_entry(class, self.scheduler.time());
        let service_time = self.variates.exponential(SERVICE_RATE);
        self.scheduler
            .schedule(service_time, EventKind::Departure, class);
    }

    fn report(self) -> RunReport {
        let residence = ResidenceTimes::from(self.log.average_residence());
        let counts = self.log.counts();
        for class in &CustomerClass::ALL {
            let (arrivals, _, completions) = counts[*class];
            if residence.get(*class).is_none() && arrivals > 0 {
                log::warn!(
                    "{} customers of class {} arrived but none departed",
                    arrivals,
                    class.to_string()
                );
            }
            log::debug!(
                "Class {}: {} arrivals, {} departures",
                class.to_string(),
                arrivals,
                completions
            );
        }
        RunReport {
            residence,
            arrivals: counts.map(|_, (a, _, _)| a),
            service_entries: counts.map(|_, (_, s, _)| s),
            completions: counts.map(|_, (_, _, d)| d),
            waiting: PerClass::new(
                self.log[CustomerClass::Priority].average_waiting(),
                self.log[CustomerClass::Regular].average_waiting(),
            ),
            end_time: self.scheduler.time(),
            processed_events: self.processed_events,
        }
    }
}

/// Runs a simulation with a randomly seeded generator and returns
/// `(avg_residence_regular, avg_residence_priority)`.
///
/// A class without any departed customers is reported as [`NO_SAMPLE`]; use [`run_seeded`] to
/// tell such a class apart from a genuine average.
///
/// # Errors
///
/// Returns an error if the parameters are invalid; see [`SimulationConfig::new`].
pub fn run(arrival_rate: f64, priority_fraction: f64) -> Result<(f64, f64)> {
    let config = SimulationConfig::new(arrival_rate, priority_fraction)?;
    let report = Simulation::new(config, RandomVariates::from_entropy())?.run();
    Ok(report.residence.to_pair())
}

/// Runs a simulation with a generator seeded with `seed`. The same inputs always produce
/// the same output.
///
/// # Errors
///
/// Returns an error if the parameters are invalid; see [`SimulationConfig::new`].
pub fn run_seeded(arrival_rate: f64, priority_fraction: f64, seed: u64) -> Result<ResidenceTimes> {
    let config = SimulationConfig::new(arrival_rate, priority_fraction)?;
    Ok(Simulation::new(config, RandomVariates::seeded(seed))?
        .run()
        .residence)
}
