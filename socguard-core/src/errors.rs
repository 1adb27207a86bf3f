//! Error Types for Estimator Configuration and Per-Cycle Input
//!
//! ## Design Philosophy
//!
//! The estimator runs inside a fixed-step control loop on a microcontroller, so
//! the error system follows the same rules as the rest of the crate:
//!
//! 1. **Small Size**: Variants carry only a few scalars and `&'static str` context.
//!
//! 2. **No Heap Allocation**: No `String` anywhere, errors are `Copy`.
//!
//! 3. **Two Moments of Failure**: Configuration is checked once, loudly, at
//!    construction. Input is checked every cycle and rejected without touching
//!    estimator state.
//!
//! ## Error Categories
//!
//! ### Configuration (fatal, construction time)
//! - `EmptyTable`, `LengthMismatch`, `CapacityExceeded`: table shape is wrong
//! - `NonMonotonicAxis`: breakpoints must be strictly monotonic
//! - `NotInvertible`: a table that must support reverse lookup is not monotonic
//! - `NonFinite`: NaN or infinity in configuration data
//! - `InvalidParameter`: a scalar parameter is outside its legal domain
//!
//! ### Input (per cycle)
//! - `InvalidValue`: NaN or infinity in a measurement
//! - `OutOfRange`: measurement outside what the sensors can physically report
//!
//! Numerical degeneracy inside the estimator (flat OCV slope, vanishing
//! capacity, shorted hysteresis resistance) is *not* an error. Each component
//! recovers locally and keeps running.
//!
//! ```rust
//! use socguard_core::{lookup::Table1D, ConfigError};
//!
//! let err = Table1D::new(&[0.0, 1.0], &[1.0]).unwrap_err();
//! assert!(matches!(err, ConfigError::LengthMismatch { .. }));
//! ```

use thiserror_no_std::Error;

/// Result type for construction-time checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for per-cycle input checks
pub type InputResult<T> = Result<T, InputError>;

/// Configuration errors - raised once, at construction
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Table has no breakpoints
    #[error("Table {table} has no breakpoints")]
    EmptyTable {
        /// Which table
        table: &'static str,
    },

    /// Value array does not match the breakpoint grid
    #[error("Table {table}: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Which table
        table: &'static str,
        /// Length implied by the breakpoints
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// More points than the fixed-capacity storage can hold
    #[error("Table {table}: {requested} points exceed capacity {capacity}")]
    CapacityExceeded {
        /// Which table
        table: &'static str,
        /// Compile-time capacity
        capacity: usize,
        /// Points supplied
        requested: usize,
    },

    /// Breakpoint axis is not strictly increasing or strictly decreasing
    #[error("Table {table}: axis {axis} is not strictly monotonic at index {index}")]
    NonMonotonicAxis {
        /// Which table
        table: &'static str,
        /// Axis name
        axis: &'static str,
        /// First offending index
        index: usize,
    },

    /// Table values are not monotonic along the inverted axis
    #[error("Table {table} is not monotonic and cannot be inverted")]
    NotInvertible {
        /// Which table
        table: &'static str,
    },

    /// NaN or infinity in configuration data
    #[error("Non-finite value in {what}")]
    NonFinite {
        /// Which field or table
        what: &'static str,
    },

    /// Scalar parameter outside its domain
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Per-cycle input errors - the cycle is skipped, state is untouched
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InputError {
    /// Measurement is NaN or infinite
    #[error("Invalid value for {field}: not a valid number")]
    InvalidValue {
        /// Input field name
        field: &'static str,
    },

    /// Measurement outside the physically reportable range
    #[error("{field} = {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Input field name
        field: &'static str,
        /// The rejected value
        value: f64,
        /// Minimum acceptable value
        min: f64,
        /// Maximum acceptable value
        max: f64,
    },
}

/// Check that a configuration scalar is finite
pub(crate) fn ensure_finite(value: f64, what: &'static str) -> ConfigResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { what })
    }
}

/// Check that a configuration scalar is finite and strictly positive
pub(crate) fn ensure_positive(value: f64, name: &'static str) -> ConfigResult<f64> {
    ensure_finite(value, name)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: "must be greater than zero",
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EmptyTable { table } => defmt::write!(fmt, "Table {} empty", table),
            Self::LengthMismatch { table, expected, actual } => {
                defmt::write!(fmt, "Table {}: want {} values, got {}", table, expected, actual)
            }
            Self::CapacityExceeded { table, capacity, requested } => {
                defmt::write!(fmt, "Table {}: {} > capacity {}", table, requested, capacity)
            }
            Self::NonMonotonicAxis { table, axis, index } => {
                defmt::write!(fmt, "Table {}: axis {} not monotonic at {}", table, axis, index)
            }
            Self::NotInvertible { table } => defmt::write!(fmt, "Table {} not invertible", table),
            Self::NonFinite { what } => defmt::write!(fmt, "Non-finite {}", what),
            Self::InvalidParameter { name, reason } => {
                defmt::write!(fmt, "Parameter {}: {}", name, reason)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InputError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidValue { field } => defmt::write!(fmt, "Invalid {}", field),
            Self::OutOfRange { field, value, min, max } => {
                defmt::write!(fmt, "{} = {} outside [{}, {}]", field, value, min, max)
            }
        }
    }
}
