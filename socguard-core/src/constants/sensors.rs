//! Measurement Front-End Limits
//!
//! Anything outside these ranges cannot come from working hardware and is
//! rejected before it reaches the estimator.

// ===== TEMPERATURE =====

/// Lowest temperature the battery sensor reports (°C).
///
/// Source: Common sensor datasheets (DS18B20, TMP36)
pub const TEMP_SENSOR_MIN_C: f64 = -80.0;

/// Highest temperature the battery sensor reports (°C).
///
/// Source: Common sensor datasheets
pub const TEMP_SENSOR_MAX_C: f64 = 125.0;

// ===== CURRENT =====

/// Full-scale current of the shunt amplifier (A, either polarity).
pub const CURRENT_SENSOR_MAX_A: f64 = 1000.0;

// ===== VOLTAGE =====

/// Lowest bank voltage the divider reports (V).
pub const VOLTAGE_SENSOR_MIN_V: f64 = 0.0;

/// Highest bank voltage the divider reports (V).
///
/// Covers four 12V units in series with margin.
pub const VOLTAGE_SENSOR_MAX_V: f64 = 80.0;

// ===== TIMING =====

/// Longest step the estimator accepts (s).
///
/// Field logs run from sub-second to ~10s. Replays that skip a gap larger
/// than an hour should re-initialise rather than integrate across it.
pub const MAX_STEP_S: f64 = 3600.0;
