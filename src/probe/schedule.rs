//! Inter-request pacing: geometric decay with a floor, plus jitter.

use std::time::Duration;

use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RunConfig;

/// Geometric decay schedule.
///
/// Each step multiplies the interval by `factor` and clamps it to `min`. Once
/// the floor is reached it is sticky: every following interval equals `min`,
/// so a run that never gets blocked is ended by its request budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    start: f64,
    min: f64,
    factor: f64,
}

impl Schedule {
    /// Creates a schedule. Callers are expected to pass validated values
    /// (`0 < factor < 1`, `start > min`).
    pub fn new(start: f64, min: f64, factor: f64) -> Self {
        Schedule { start, min, factor }
    }

    /// Builds the schedule described by a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Schedule::new(config.start, config.min, config.factor)
    }

    /// Initial interval in seconds.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Floor interval in seconds.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns `max(min, current * factor)`.
    pub fn next_interval(&self, current: f64) -> f64 {
        (current * self.factor).max(self.min)
    }

    /// Jitter-free intervals, one per request, starting at `start`.
    ///
    /// The iterator is infinite; it repeats `min` forever once the floor is hit.
    pub fn intervals(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::successors(Some(self.start), move |&current| {
            Some(self.next_interval(current))
        })
    }
}

/// Converts a target interval plus jitter into a sleep duration.
///
/// Negative totals are clamped to zero; totals too large for a `Duration`
/// saturate.
pub fn sleep_duration(interval: f64, jitter: f64) -> Duration {
    let seconds = (interval + jitter).max(0.0);
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Source of symmetric jitter offsets.
pub trait JitterSource {
    /// Returns an offset in seconds within `[-bound, +bound]`.
    fn sample(&mut self, bound: f64) -> f64;
}

/// Uniformly distributed jitter backed by any `rand` RNG.
pub struct UniformJitter<R: Rng> {
    rng: R,
}

impl<R: Rng> UniformJitter<R> {
    /// Wraps an existing RNG.
    pub fn new(rng: R) -> Self {
        UniformJitter { rng }
    }
}

impl UniformJitter<StdRng> {
    /// Deterministic jitter for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        UniformJitter::new(StdRng::seed_from_u64(seed))
    }

    /// Jitter seeded from the operating system.
    pub fn from_os_rng() -> Self {
        UniformJitter::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> JitterSource for UniformJitter<R> {
    /// Returns 0 for a bound that is not positive or whose range width
    /// does not fit in an `f64`.
    fn sample(&mut self, bound: f64) -> f64 {
        if bound.is_nan() || bound <= 0.0 {
            return 0.0;
        }
        Uniform::new_inclusive(-bound, bound).map_or(0.0, |range| range.sample(&mut self.rng))
    }
}

/// Always returns zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&mut self, _bound: f64) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_default_schedule_sequence() {
        let schedule = Schedule::new(10.0, 0.5, 0.8);
        let expected = [
            10.0,
            8.0,
            6.4,
            5.12,
            4.096,
            3.2768,
            2.62144,
            2.097152,
            1.6777216,
            1.34217728,
            1.073741824,
            0.8589934592,
            0.68719476736,
            0.549755813888,
            0.5,
        ];
        let actual: Vec<f64> = schedule.intervals().take(expected.len()).collect();
        for (a, e) in actual.iter().zip(expected) {
            assert_close(*a, e);
        }
    }

    #[test]
    fn test_floor_is_sticky() {
        let schedule = Schedule::new(10.0, 0.5, 0.8);
        let tail: Vec<f64> = schedule.intervals().skip(14).take(50).collect();
        assert!(tail.iter().all(|&i| i == 0.5));
        assert_eq!(schedule.next_interval(0.5), 0.5);
    }

    #[test]
    fn test_next_interval_stays_between_min_and_current() {
        let factors = [0.01, 0.1, 0.5, 0.8, 0.99];
        let currents = [0.5, 0.51, 1.0, 3.3, 10.0, 1000.0];
        for factor in factors {
            let schedule = Schedule::new(10.0, 0.5, factor);
            for current in currents {
                let next = schedule.next_interval(current);
                assert!(next >= 0.5, "next {next} below floor");
                assert!(next <= current, "next {next} above current {current}");
            }
        }
    }

    #[test]
    fn test_sleep_duration_clamps_negative_to_zero() {
        assert_eq!(sleep_duration(0.05, -0.1), Duration::ZERO);
        assert_eq!(sleep_duration(0.5, 0.0), Duration::from_millis(500));
        assert_eq!(sleep_duration(0.5, 0.25), Duration::from_millis(750));
    }

    #[test]
    fn test_sleep_duration_saturates() {
        assert_eq!(sleep_duration(1e300, 0.0), Duration::MAX);
    }

    #[test]
    fn test_uniform_jitter_stays_within_bound() {
        let mut jitter = UniformJitter::seeded(7);
        for _ in 0..1000 {
            let j = jitter.sample(0.1);
            assert!((-0.1..=0.1).contains(&j), "jitter {j} out of bounds");
        }
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let mut a = UniformJitter::seeded(42);
        let mut b = UniformJitter::seeded(42);
        let first: Vec<f64> = (0..10).map(|_| a.sample(1.0)).collect();
        let second: Vec<f64> = (0..10).map(|_| b.sample(1.0)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrepresentable_bound_means_no_jitter() {
        let mut jitter = UniformJitter::seeded(1);
        assert_eq!(jitter.sample(1e308), 0.0);
        assert_eq!(jitter.sample(f64::INFINITY), 0.0);
        assert_eq!(jitter.sample(f64::NAN), 0.0);
    }

    #[test]
    fn test_zero_bound_means_no_jitter() {
        let mut jitter = UniformJitter::seeded(1);
        assert_eq!(jitter.sample(0.0), 0.0);
        assert_eq!(NoJitter.sample(5.0), 0.0);
    }
}
