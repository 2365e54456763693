//! Decides when a customer takes the server.
//!
//! The decision is made right after a queue length changes, from the queue lengths alone:
//!
//! | event     | class    | begins service when                      |
//! |-----------|----------|------------------------------------------|
//! | arrival   | Priority | Priority queue went from 0 to 1          |
//! | arrival   | Regular  | Regular queue went from 0 to 1, and no Priority customer is present |
//! | departure | either   | customers of the same class still remain |
//!
//! A Priority arrival into an empty Priority queue is served at once even while a Regular
//! customer is in service; that Regular service is not interrupted, so the two overlap.
//! A Regular departure hands the server to the next Regular customer without checking for
//! Priority customers.

use crate::{CustomerClass, EventKind, PerClass};

/// Returns `true` if, after an event of `kind` for a customer of `class` has been applied to
/// `queue_lengths`, the next customer of `class` begins service.
#[must_use]
pub fn begins_service(
    kind: EventKind,
    class: CustomerClass,
    queue_lengths: &PerClass<usize>,
) -> bool {
    match (kind, class) {
        (EventKind::Arrival, CustomerClass::Priority) => queue_lengths.priority == 1,
        (EventKind::Arrival, CustomerClass::Regular) => {
            queue_lengths.regular == 1 && queue_lengths.priority == 0
        }
        (EventKind::Departure, _) => queue_lengths[class] > 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use CustomerClass::{Priority, Regular};
    use EventKind::{Arrival, Departure};

    #[rstest(kind, class, priority, regular, expected,
        case(Arrival, Priority, 1, 0, true),
        case(Arrival, Priority, 1, 3, true),
        case(Arrival, Priority, 2, 0, false),
        case(Arrival, Regular, 0, 1, true),
        case(Arrival, Regular, 1, 1, false),
        case(Arrival, Regular, 0, 2, false),
        case(Departure, Priority, 0, 4, false),
        case(Departure, Priority, 2, 0, true),
        case(Departure, Regular, 0, 0, false),
        case(Departure, Regular, 3, 1, true),
    )]
    fn test_begins_service(
        kind: EventKind,
        class: CustomerClass,
        priority: usize,
        regular: usize,
        expected: bool,
    ) {
        assert_eq!(
            begins_service(kind, class, &PerClass::new(priority, regular)),
            expected
        );
    }
}
