//! Discrete-event simulation of a single-server, two-class, non-preemptive priority queue.
//!
//! Customers are either [`CustomerClass::Priority`] or [`CustomerClass::Regular`]. A single
//! server takes Priority customers ahead of Regular ones, and the simulation advances from event
//! to event (arrivals and departures) popped from a [`Scheduler`] rather than in fixed time
//! steps. The main entry point is [`run`], which maps an arrival rate and a Priority mix
//! fraction to the average residence time of each class.
//!
//! ```
//! # fn main() -> prisim::Result<()> {
//! let residence = prisim::run_seeded(0.5, 0.3, 17)?;
//! assert!(residence.priority.is_some());
//! assert!(residence.regular.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

mod admission;
pub use admission::begins_service;

mod customer_log;
pub use customer_log::{CustomerLog, Timestamps};

mod event;
pub use event::{Event, EventKey, EventKind};

pub mod logger;

mod scheduler;
pub use scheduler::Scheduler;

mod simulation;
pub use simulation::{
    run, run_seeded, NoProbe, Probe, ResidenceTimes, RunReport, Simulation, SimulationConfig,
    Snapshot, DEFAULT_MAX_ARRIVALS, NO_SAMPLE, SERVICE_RATE,
};

pub mod sweep;

mod variates;
pub use variates::{RandomVariates, ScriptedVariates, VariateSource};

/// Error type encompassing all configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// Arrival rate must be a finite, strictly positive number.
    #[error("Arrival rate must be a finite positive number, but got {0}.")]
    InvalidArrivalRate(f64),
    /// Priority fraction is a probability.
    #[error("Priority fraction must be within [0, 1], but got {0}.")]
    InvalidPriorityFraction(f64),
    /// A simulation must admit at least one arrival.
    #[error("Maximum number of arrivals must be positive.")]
    InvalidMaxArrivals,
    /// Sweep step must be within (0, 1].
    #[error("Sweep step must be within (0, 1], but got {0}.")]
    InvalidStep(f64),
    /// Sweep needs at least one replication per point.
    #[error("There must be at least one replication per sweep point.")]
    ZeroReplications,
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// Customer class.
///
/// The declaration order is significant: `Priority` compares as less than `Regular`, which is
/// what puts Priority events first in the future-event queue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::ToString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CustomerClass {
    /// Takes the server whenever the Priority queue was empty.
    Priority,
    /// Waits for the server to be free of Priority customers.
    Regular,
}

impl CustomerClass {
    /// Both classes, Priority first.
    pub const ALL: [CustomerClass; 2] = [CustomerClass::Priority, CustomerClass::Regular];
}

/// A pair of values, one for each [`CustomerClass`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerClass<T> {
    /// Value for [`CustomerClass::Priority`].
    pub priority: T,
    /// Value for [`CustomerClass::Regular`].
    pub regular: T,
}

impl<T> PerClass<T> {
    /// Constructs a pair from the two values.
    pub fn new(priority: T, regular: T) -> Self {
        Self { priority, regular }
    }

    /// Maps both values with `f`, which also receives the class of each value.
    pub fn map<U, F>(self, mut f: F) -> PerClass<U>
    where
        F: FnMut(CustomerClass, T) -> U,
    {
        PerClass {
            priority: f(CustomerClass::Priority, self.priority),
            regular: f(CustomerClass::Regular, self.regular),
        }
    }

    /// Borrows both values.
    pub fn as_ref(&self) -> PerClass<&T> {
        PerClass {
            priority: &self.priority,
            regular: &self.regular,
        }
    }
}

impl<T> Index<CustomerClass> for PerClass<T> {
    type Output = T;
    fn index(&self, class: CustomerClass) -> &Self::Output {
        match class {
            CustomerClass::Priority => &self.priority,
            CustomerClass::Regular => &self.regular,
        }
    }
}

impl<T> IndexMut<CustomerClass> for PerClass<T> {
    fn index_mut(&mut self, class: CustomerClass) -> &mut Self::Output {
        match class {
            CustomerClass::Priority => &mut self.priority,
            CustomerClass::Regular => &mut self.regular,
        }
    }
}
