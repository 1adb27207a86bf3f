//! Constants for SocGuard Core
//!
//! Centralized, documented defaults used throughout the estimator. Every
//! numeric value carries its unit in the name and a note on where it comes
//! from. Chemistry-specific data (OCV curves, hysteresis tables) does not live
//! here, see [`crate::chemistry`].
//!
//! ## Organization
//!
//! - **Physics**: cell physics that holds for every LFP chemistry
//! - **Bank**: default bank geometry and capacity
//! - **Sensors**: limits of what the measurement front end can report
//! - **Tuning**: filter, delay and blend defaults
//! - **Buffers**: fixed table capacities

/// Chemistry-independent cell physics.
pub mod physics;

/// Default bank geometry (capacity, series/parallel count).
pub mod bank;

/// Measurement front-end limits used for per-cycle input checks.
pub mod sensors;

/// Estimator tuning defaults (EKF noise, debounce times, blend schedule).
pub mod tuning;

/// Fixed-capacity storage limits for lookup tables.
pub mod buffers;

pub use physics::{
    COULOMBS_PER_AMP_HOUR, DEFAULT_COULOMBIC_EFFICIENCY, REFERENCE_TEMP_C,
    MIN_CAPACITY_FRACTION, SOC_SLOPE_STEP,
};

pub use bank::{
    DEFAULT_RATED_CAPACITY_AH, DEFAULT_SERIES_COUNT, DEFAULT_PARALLEL_COUNT,
};

pub use sensors::{
    TEMP_SENSOR_MIN_C, TEMP_SENSOR_MAX_C, CURRENT_SENSOR_MAX_A,
    VOLTAGE_SENSOR_MIN_V, VOLTAGE_SENSOR_MAX_V, MAX_STEP_S,
};

pub use buffers::{MAX_AXIS_POINTS, MAX_GRID_POINTS};
