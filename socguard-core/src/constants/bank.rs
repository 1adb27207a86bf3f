//! Default Bank Geometry
//!
//! A single 12V 100Ah unit. Real installations override these through
//! [`crate::monitor::BankConfig`].

/// Nameplate capacity of one unit (Ah).
pub const DEFAULT_RATED_CAPACITY_AH: f64 = 100.0;

/// Units in series.
pub const DEFAULT_SERIES_COUNT: u8 = 1;

/// Strings in parallel.
pub const DEFAULT_PARALLEL_COUNT: u8 = 1;

/// Multiplier applied to rated capacity to get the capacity actually tracked.
///
/// Aged banks are tracked below nameplate by lowering this.
pub const DEFAULT_CAPACITY_SCALAR: f64 = 1.0;
