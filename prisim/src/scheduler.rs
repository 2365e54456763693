use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::{CustomerClass, Event, EventKind};

/// Scheduler is used to keep the current time and the future-event queue.
///
/// Events are popped in the order of their [`EventKey`](crate::EventKey), and popping an event
/// moves the clock to its scheduled time.
#[derive(Debug, Default)]
pub struct Scheduler {
    events: BinaryHeap<Reverse<Event>>,
    clock: f64,
}

impl Scheduler {
    /// Schedules an event of `kind` for a customer of `class` at `self.time() + delay`,
    /// and returns the scheduled event.
    pub fn schedule(&mut self, delay: f64, kind: EventKind, class: CustomerClass) -> Event {
        let event = Event::new(kind, class, self.clock + delay);
        self.events.push(Reverse(event));
        event
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock
    }

    /// Removes and returns the next scheduled event or `None` if none are left.
    /// The clock adopts the time of the returned event.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop().map(|Reverse(event)| {
            self.clock = event.time();
            event
        })
    }

    /// Returns the next scheduled event without removing it.
    #[cfg(test)]
    pub(crate) fn peek(&self) -> Option<&Event> {
        self.events.peek().map(|Reverse(event)| event)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Answers whether no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events of the given kind and class.
    #[cfg(test)]
    pub(crate) fn pending(&self, kind: EventKind, class: CustomerClass) -> usize {
        self.events
            .iter()
            .filter(|Reverse(e)| e.kind() == kind && e.class() == class)
            .count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use CustomerClass::{Priority, Regular};

    #[test]
    fn test_scheduler() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.time(), 0.0);
        assert!(scheduler.is_empty());

        scheduler.schedule(1.0, EventKind::Arrival, Regular);
        scheduler.schedule(3.0, EventKind::Departure, Priority);
        scheduler.schedule(2.0, EventKind::Arrival, Priority);
        assert_eq!(scheduler.len(), 3);
        assert_eq!(scheduler.pending(EventKind::Arrival, Priority), 1);
        assert_eq!(scheduler.pending(EventKind::Departure, Regular), 0);
        assert_eq!(scheduler.time(), 0.0);

        // Priority events go first even though the Regular arrival is earlier.
        let event = scheduler.pop().unwrap();
        assert_eq!(event, Event::arrival(Priority, 2.0));
        assert_eq!(scheduler.time(), 2.0);

        // Delays are relative to the current clock.
        let scheduled = scheduler.schedule(0.5, EventKind::Departure, Regular);
        assert_eq!(scheduled, Event::departure(Regular, 2.5));

        assert_eq!(scheduler.pop().unwrap(), Event::departure(Priority, 3.0));
        assert_eq!(scheduler.time(), 3.0);

        // Switching to the Regular class may move the clock back.
        assert_eq!(scheduler.peek(), Some(&Event::arrival(Regular, 1.0)));
        assert_eq!(scheduler.pop().unwrap(), Event::arrival(Regular, 1.0));
        assert_eq!(scheduler.time(), 1.0);
        assert_eq!(scheduler.pop().unwrap(), Event::departure(Regular, 2.5));
        assert_eq!(scheduler.time(), 2.5);

        assert!(scheduler.pop().is_none());
        assert_eq!(scheduler.time(), 2.5);
    }

    #[test]
    fn test_same_time_priority_first() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(1.0, EventKind::Departure, Regular);
        scheduler.schedule(1.0, EventKind::Arrival, Priority);
        scheduler.schedule(1.0, EventKind::Departure, Priority);
        let popped: Vec<_> = std::iter::from_fn(|| scheduler.pop()).collect();
        assert_eq!(
            popped,
            vec![
                Event::arrival(Priority, 1.0),
                Event::departure(Priority, 1.0),
                Event::departure(Regular, 1.0),
            ]
        );
    }
}
