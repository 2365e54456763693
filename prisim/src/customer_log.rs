use std::ops::Index;

use serde::Serialize;

use crate::{CustomerClass, PerClass};

/// Arrival, service-entry, and departure times of customers of one class.
///
/// Each sequence is append-only and the `i`-th element of each refers to the `i`-th customer
/// of the class in order of arrival. Customers of one class are served first come, first served,
/// so matching indices always belong to the same customer.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Timestamps {
    arrivals: Vec<f64>,
    service_entries: Vec<f64>,
    departures: Vec<f64>,
}

impl Timestamps {
    pub(crate) fn record_arrival(&mut self, time: f64) {
        self.arrivals.push(time);
    }

    pub(crate) fn record_service_entry(&mut self, time: f64) {
        self.service_entries.push(time);
    }

    pub(crate) fn record_departure(&mut self, time: f64) {
        self.departures.push(time);
    }

    /// Arrival times.
    #[must_use]
    pub fn arrivals(&self) -> &[f64] {
        &self.arrivals
    }

    /// Times of entering service.
    #[must_use]
    pub fn service_entries(&self) -> &[f64] {
        &self.service_entries
    }

    /// Departure times.
    #[must_use]
    pub fn departures(&self) -> &[f64] {
        &self.departures
    }

    /// Number of customers that have departed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.departures.len()
    }

    /// Residence times of all departed customers, in order of arrival.
    pub fn residence_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.departures
            .iter()
            .zip(&self.arrivals)
            .map(|(departure, arrival)| departure - arrival)
    }

    /// Waiting times (before entering service) of all customers that entered service.
    pub fn waiting_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.service_entries
            .iter()
            .zip(&self.arrivals)
            .map(|(entry, arrival)| entry - arrival)
    }

    /// Average residence time of departed customers, or `None` if none departed.
    #[must_use]
    pub fn average_residence(&self) -> Option<f64> {
        mean(self.residence_times(), self.completed())
    }

    /// Average waiting time of customers that entered service, or `None` if none did.
    #[must_use]
    pub fn average_waiting(&self) -> Option<f64> {
        mean(self.waiting_times(), self.service_entries.len())
    }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(values.sum::<f64>() / count as f64)
    }
}

/// Timestamps of both customer classes.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CustomerLog {
    timestamps: PerClass<Timestamps>,
}

impl CustomerLog {
    pub(crate) fn arrival(&mut self, class: CustomerClass, time: f64) {
        self.timestamps[class].record_arrival(time);
    }

    pub(crate) fn service_entry(&mut self, class: CustomerClass, time: f64) {
        self.timestamps[class].record_service_entry(time);
    }

    pub(crate) fn departure(&mut self, class: CustomerClass, time: f64) {
        self.timestamps[class].record_departure(time);
    }

    /// Total number of arrivals of both classes.
    #[must_use]
    pub fn total_arrivals(&self) -> usize {
        self.timestamps.priority.arrivals.len() + self.timestamps.regular.arrivals.len()
    }

    /// Number of arrivals, service entries, and departures of each class.
    #[must_use]
    pub fn counts(&self) -> PerClass<(usize, usize, usize)> {
        self.timestamps.as_ref().map(|_, t| {
            (
                t.arrivals.len(),
                t.service_entries.len(),
                t.departures.len(),
            )
        })
    }

    /// Average residence time of each class.
    #[must_use]
    pub fn average_residence(&self) -> PerClass<Option<f64>> {
        self.timestamps
            .as_ref()
            .map(|_, t| t.average_residence())
    }
}

impl Index<CustomerClass> for CustomerLog {
    type Output = Timestamps;
    fn index(&self, class: CustomerClass) -> &Self::Output {
        &self.timestamps[class]
    }
}
