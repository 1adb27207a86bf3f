//! Cell Physics Constants
//!
//! Values that hold for every LFP chemistry the estimator supports.

/// Coulombs in one ampere-hour (C/Ah).
pub const COULOMBS_PER_AMP_HOUR: f64 = 3600.0;

/// Reference temperature for saturation voltage and OCV temperature slope (°C).
///
/// Cell datasheets quote OCV and saturation at 25°C.
pub const REFERENCE_TEMP_C: f64 = 25.0;

/// Fraction of charging current that ends up as stored charge.
///
/// LFP coulombic efficiency is very close to unity. Applied to charging
/// current only.
///
/// Source: bench cycling of Battleborn 100Ah units
pub const DEFAULT_COULOMBIC_EFFICIENCY: f64 = 0.9985;

/// Lowest capacity the Coulomb counter will divide by, as a fraction of
/// scaled rated capacity.
///
/// A degenerate temperature law (very cold, large `dqdt`) can drive capacity
/// to zero. The counter substitutes this floor instead of producing NaN.
pub const MIN_CAPACITY_FRACTION: f64 = 0.05;

/// SOC step for the finite-difference OCV slope (fraction).
///
/// One percent spans at least one breakpoint interval of the production OCV
/// tables, so the slope never collapses to a single flat segment.
pub const SOC_SLOPE_STEP: f64 = 0.01;

/// Hysteresis time constant must exceed this multiple of the step size.
///
/// Below it, explicit Euler aliases and the model snaps to the bound instead.
pub const HYSTERESIS_ALIAS_FACTOR: f64 = 4.0;

/// Hysteresis scale below which the model is treated as disabled.
pub const HYSTERESIS_DISABLE_SCALE: f64 = 1e-5;
