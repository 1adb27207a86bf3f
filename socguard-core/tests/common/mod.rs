//! Common test utilities for integration tests
//!
//! This module provides:
//! - A deterministic pseudo-random source (no `rand` dependency)
//! - Physics-aware bank profile generation
//! - Tolerance assertion helpers

#![allow(dead_code)]

pub mod generators;

pub use generators::{BankSimulator, Phase, ProfileBuilder};

/// Linear congruential generator, same constants as Numerical Recipes
#[derive(Debug, Clone)]
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        f64::from(self.state) / (f64::from(u32::MAX) + 1.0)
    }

    /// Uniform in [min, max)
    pub fn gen_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Zero-mean uniform noise with half-width `amplitude`
    pub fn noise(&mut self, amplitude: f64) -> f64 {
        self.gen_range(-amplitude, amplitude)
    }
}

/// Assert two floats agree within an absolute tolerance
#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr, $tol:expr) => {{
        let (a, e, t): (f64, f64, f64) = ($actual, $expected, $tol);
        assert!(
            (a - e).abs() <= t,
            "{} = {} not within {} of {}",
            stringify!($actual),
            a,
            t,
            e
        );
    }};
}

/// Assert a value lies in a closed interval
#[macro_export]
macro_rules! assert_within {
    ($value:expr, $min:expr, $max:expr) => {{
        let (v, lo, hi): (f64, f64, f64) = ($value, $min, $max);
        assert!(
            v >= lo && v <= hi,
            "{} = {} outside [{}, {}]",
            stringify!($value),
            v,
            lo,
            hi
        );
    }};
}
