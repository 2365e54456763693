use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::CustomerClass;

/// What happens to a customer at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Customer enters the system.
    Arrival,
    /// Customer leaves the system after being served.
    Departure,
}

/// The key by which the future-event queue orders events.
///
/// Keys compare lexicographically: first by class, then by scheduled time. Any Priority key is
/// therefore less than any Regular key, and within a class the earlier time is less. In
/// particular, for equal times, the Priority event comes first.
///
/// The key is fixed when an event is created and never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    class: CustomerClass,
    time: OrderedFloat<f64>,
}

impl EventKey {
    /// Constructs a key for an event of `class` scheduled at `time`.
    #[must_use]
    pub fn new(class: CustomerClass, time: f64) -> Self {
        Self {
            class,
            time: OrderedFloat(time),
        }
    }

    /// Class of the customer the event concerns.
    #[must_use]
    pub fn class(&self) -> CustomerClass {
        self.class
    }

    /// Scheduled time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time.into_inner()
    }
}

/// A scheduled arrival or departure of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    key: EventKey,
    kind: EventKind,
}

impl Event {
    /// Constructs a new event.
    #[must_use]
    pub fn new(kind: EventKind, class: CustomerClass, time: f64) -> Self {
        Self {
            key: EventKey::new(class, time),
            kind,
        }
    }

    /// Arrival of a customer of `class` at `time`.
    #[must_use]
    pub fn arrival(class: CustomerClass, time: f64) -> Self {
        Self::new(EventKind::Arrival, class, time)
    }

    /// Departure of a customer of `class` at `time`.
    #[must_use]
    pub fn departure(class: CustomerClass, time: f64) -> Self {
        Self::new(EventKind::Departure, class, time)
    }

    /// The ordering key.
    #[must_use]
    pub fn key(&self) -> EventKey {
        self.key
    }

    /// Event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Class of the customer.
    #[must_use]
    pub fn class(&self) -> CustomerClass {
        self.key.class()
    }

    /// Scheduled time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.key.time()
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Events order by their key; the kind only breaks exact ties, arrivals first.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    use CustomerClass::{Priority, Regular};

    #[rstest(lhs, rhs, expected,
        case(EventKey::new(Priority, 1.0), EventKey::new(Regular, 1.0), Ordering::Less),
        case(EventKey::new(Regular, 1.0), EventKey::new(Priority, 1.0), Ordering::Greater),
        case(EventKey::new(Priority, 1.0), EventKey::new(Priority, 2.0), Ordering::Less),
        case(EventKey::new(Regular, 3.0), EventKey::new(Regular, 2.5), Ordering::Greater),
        case(EventKey::new(Priority, 9.0), EventKey::new(Regular, 0.5), Ordering::Less),
        case(EventKey::new(Regular, 0.5), EventKey::new(Regular, 0.5), Ordering::Equal),
    )]
    fn test_key_cmp(lhs: EventKey, rhs: EventKey, expected: Ordering) {
        assert_eq!(lhs.cmp(&rhs), expected);
    }

    #[test]
    fn test_event_cmp() {
        assert!(Event::arrival(Priority, 1.0) < Event::departure(Priority, 1.0));
        assert!(Event::departure(Priority, 1.0) < Event::arrival(Regular, 1.0));
        assert!(Event::departure(Regular, 0.5) < Event::arrival(Regular, 1.0));
        assert_eq!(Event::arrival(Regular, 2.0), Event::arrival(Regular, 2.0));
    }

    #[test]
    fn test_accessors() {
        let event = Event::departure(Regular, 4.25);
        assert_eq!(event.kind(), EventKind::Departure);
        assert_eq!(event.class(), Regular);
        assert_eq!(event.time(), 4.25);
        assert_eq!(event.key(), EventKey::new(Regular, 4.25));
    }
}
