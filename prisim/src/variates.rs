use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use rand_distr::Exp1;

use crate::CustomerClass;

/// Source of the random values driving a simulation.
pub trait VariateSource {
    /// Draws a sample from the exponential distribution with the given `rate`,
    /// i.e., with mean `1 / rate`.
    fn exponential(&mut self, rate: f64) -> f64;

    /// Draws the class of a new customer: Priority with probability `priority_fraction`,
    /// Regular otherwise.
    fn class_flip(&mut self, priority_fraction: f64) -> CustomerClass;
}

impl<V: VariateSource + ?Sized> VariateSource for &mut V {
    fn exponential(&mut self, rate: f64) -> f64 {
        (**self).exponential(rate)
    }
    fn class_flip(&mut self, priority_fraction: f64) -> CustomerClass {
        (**self).class_flip(priority_fraction)
    }
}

/// Variates drawn from a random number generator.
#[derive(Debug, Clone)]
pub struct RandomVariates<R> {
    rng: R,
}

impl<R: Rng> RandomVariates<R> {
    /// Wraps the given generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomVariates<ChaChaRng> {
    /// Variates from a ChaCha generator seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaChaRng::seed_from_u64(seed))
    }

    /// Variates from a ChaCha generator seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(ChaChaRng::from_entropy())
    }
}

impl<R: Rng> VariateSource for RandomVariates<R> {
    fn exponential(&mut self, rate: f64) -> f64 {
        let unit: f64 = self.rng.sample(Exp1);
        unit / rate
    }

    fn class_flip(&mut self, priority_fraction: f64) -> CustomerClass {
        if self.rng.gen::<f64>() < priority_fraction {
            CustomerClass::Priority
        } else {
            CustomerClass::Regular
        }
    }
}

/// Replays fixed sequences of values, regardless of the requested rate or fraction.
///
/// Each sequence wraps around once exhausted. An empty exponential sequence yields `1.0`,
/// and an empty class sequence yields [`CustomerClass::Regular`].
///
/// ```
/// # use prisim::{CustomerClass, ScriptedVariates, VariateSource};
/// let mut variates = ScriptedVariates::new(vec![0.5, 2.0], vec![CustomerClass::Priority]);
/// assert_eq!(variates.exponential(10.0), 0.5);
/// assert_eq!(variates.exponential(10.0), 2.0);
/// assert_eq!(variates.exponential(10.0), 0.5);
/// assert_eq!(variates.class_flip(0.0), CustomerClass::Priority);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedVariates {
    exponentials: Vec<f64>,
    classes: Vec<CustomerClass>,
    next_exponential: usize,
    next_class: usize,
}

impl ScriptedVariates {
    /// Constructs a source replaying `exponentials` and `classes`.
    #[must_use]
    pub fn new(exponentials: Vec<f64>, classes: Vec<CustomerClass>) -> Self {
        Self {
            exponentials,
            classes,
            next_exponential: 0,
            next_class: 0,
        }
    }

    /// Number of exponential samples drawn so far.
    #[cfg(test)]
    pub(crate) fn exponentials_drawn(&self) -> usize {
        self.next_exponential
    }

    /// Number of class flips drawn so far.
    #[cfg(test)]
    pub(crate) fn classes_drawn(&self) -> usize {
        self.next_class
    }
}

impl VariateSource for ScriptedVariates {
    fn exponential(&mut self, _rate: f64) -> f64 {
        if self.exponentials.is_empty() {
            return 1.0;
        }
        let value = self.exponentials[self.next_exponential % self.exponentials.len()];
        self.next_exponential += 1;
        value
    }

    fn class_flip(&mut self, _priority_fraction: f64) -> CustomerClass {
        if self.classes.is_empty() {
            return CustomerClass::Regular;
        }
        let class = self.classes[self.next_class % self.classes.len()];
        self.next_class += 1;
        class
    }
}
