//! Estimator Tuning Defaults
//!
//! These are tunables, not laws. Every one of them is exposed through
//! [`crate::monitor::EstimatorConfig`].

// ===== TEMPERATURE =====

/// Maximum slew of the temperature seen by the capacity model (°C/s).
///
/// About one degree per minute. Sensor steps (e.g. a probe reseated) would
/// otherwise show up as a capacity jump.
pub const DEFAULT_TEMP_RATE_LIMIT_C_PER_S: f64 = 0.017;

// ===== EKF =====

/// Process noise added to SOC covariance every predict (fraction²).
pub const DEFAULT_EKF_Q: f64 = 1e-6;

/// Measurement noise of terminal voltage (V²).
pub const DEFAULT_EKF_R: f64 = 1e-2;

/// Covariance the EKF starts with after (re)initialisation (fraction²).
pub const DEFAULT_EKF_P0: f64 = 1e-2;

/// System uncertainty below which the gain is held (V²).
pub const EKF_S_TOLERANCE: f64 = 1e-12;

/// Lower SOC bound enforced after every EKF update.
pub const DEFAULT_SOC_MIN: f64 = 0.0;

/// Upper SOC bound enforced after every EKF update.
pub const DEFAULT_SOC_MAX: f64 = 1.0;

// ===== SATURATION DEBOUNCE =====

/// Static OCV must sit above saturation this long before it is trusted (s).
pub const DEFAULT_SAT_T_TRUE_S: f64 = 10.0;

/// Static OCV must sit below saturation this long before it is released (s).
pub const DEFAULT_SAT_T_FALSE_S: f64 = 20.0;

// ===== LOW ANCHOR DEBOUNCE =====

/// Static OCV must sit at the low anchor this long before SOC is re-anchored (s).
pub const DEFAULT_LOW_T_TRUE_S: f64 = 30.0;

/// Release time of the low anchor (s).
pub const DEFAULT_LOW_T_FALSE_S: f64 = 10.0;

// ===== BLEND =====

/// Weight on the Coulomb counter right after a reset event.
pub const DEFAULT_BLEND_WEIGHT_AFTER_RESET: f64 = 1.0;

/// Weight on the Coulomb counter during steady tracking.
pub const DEFAULT_BLEND_WEIGHT_TRACKING: f64 = 0.5;

/// Time constant of the weight relaxing from reset to tracking (s).
pub const DEFAULT_BLEND_RECOVERY_TAU_S: f64 = 600.0;
