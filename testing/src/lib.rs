//! Helpers shared by the tests of the simulation crates.

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

use quickcheck::{Arbitrary, Gen};

/// Expected residence time in an M/M/1 queue: `1 / (service_rate - arrival_rate)`.
///
/// Returns `None` if the queue is not stable, i.e., `arrival_rate >= service_rate`.
#[must_use]
pub fn mm1_residence(arrival_rate: f64, service_rate: f64) -> Option<f64> {
    if arrival_rate < service_rate {
        Some(1.0 / (service_rate - arrival_rate))
    } else {
        None
    }
}

/// Relative error of `actual` with respect to `expected`.
#[must_use]
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    ((actual - expected) / expected).abs()
}

/// Asserts that `actual` is within `tolerance` relative error of `expected`.
///
/// # Panics
///
/// Panics if the relative error exceeds `tolerance`.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    let error = relative_error(actual, expected);
    assert!(
        error <= tolerance,
        "{} is not within {}% of {} (relative error: {})",
        actual,
        tolerance * 100.0,
        expected,
        error
    );
}

/// A stable arrival rate, i.e., one within `[0.05, 0.95]`.
#[derive(Debug, Clone, Copy)]
pub struct ArrivalRate(pub f64);

impl Arbitrary for ArrivalRate {
    fn arbitrary(g: &mut Gen) -> Self {
        ArrivalRate(0.05 + 0.9 * unit(g))
    }
}

/// A probability within `[0, 1]`, with `0` and `1` drawn more often than by chance.
#[derive(Debug, Clone, Copy)]
pub struct Fraction(pub f64);

impl Arbitrary for Fraction {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 8 {
            0 => Fraction(0.0),
            1 => Fraction(1.0),
            _ => Fraction(unit(g)),
        }
    }
}

fn unit(g: &mut Gen) -> f64 {
    f64::from(u32::arbitrary(g)) / f64::from(u32::MAX)
}
