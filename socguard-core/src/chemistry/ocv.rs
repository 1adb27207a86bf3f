//! Open-Circuit Voltage Curves
//!
//! Two interchangeable forms of the per-unit OCV law `voc(soc, temp)`:
//!
//! - [`OcvCurve::Table`]: bench-characterised grid over `(soc, temp)`, the
//!   canonical form. Slope is a one-sided finite difference of the same grid.
//! - [`OcvCurve::Zhang`]: the closed-form LFP fit
//!
//! ```text
//! voc(s) = a + b·(−ln s)^m + c·s + d·e^(n·(s − 1)) + (T − 25)·dvoc_dt
//! dvoc/ds = −b·m·(−ln s)^(m−1)/s + c + d·n·e^(n·(s − 1))
//! ```
//!
//! The slope of either form is the derivative of that same form, so the EKF's
//! observation Jacobian stays consistent with its predicted voltage.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::physics::{REFERENCE_TEMP_C, SOC_SLOPE_STEP};
use crate::errors::{ensure_finite, ConfigError, ConfigResult};
use crate::lookup::Table2D;
use crate::solver::{RootSolver, SolverSettings};

/// Closed-form evaluation keeps `ln(s)` away from its singularity
const ZHANG_SOC_MIN: f64 = 1e-6;

/// SOC samples used to check that the closed form can be inverted
const ZHANG_MONOTONIC_SAMPLES: usize = 64;

/// Per-unit open-circuit voltage law
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OcvCurve {
    /// Grid indexed by `(soc, temperature °C)`, volts per unit
    Table(Table2D),
    /// Closed-form fit
    Zhang {
        /// Offset (V)
        a: f64,
        /// Logarithmic term gain (V)
        b: f64,
        /// Linear term gain (V)
        c: f64,
        /// Exponential knee gain (V)
        d: f64,
        /// Logarithmic term exponent
        m: f64,
        /// Exponential knee sharpness
        n: f64,
        /// Temperature coefficient (V/°C)
        dvoc_dt: f64,
    },
}

impl OcvCurve {
    /// Per-unit OCV (V)
    pub fn voc(&self, soc: f64, temp_c: f64) -> f64 {
        match self {
            Self::Table(table) => table.interp(soc, temp_c),
            Self::Zhang { a, b, c, d, m, n, dvoc_dt } => {
                let s = soc.clamp(ZHANG_SOC_MIN, 1.0);
                let log_term = libm::pow(-libm::log(s), *m);
                a + b * log_term
                    + c * s
                    + d * libm::exp(n * (s - 1.0))
                    + (temp_c - REFERENCE_TEMP_C) * dvoc_dt
            }
        }
    }

    /// Per-unit OCV sensitivity to SOC (V per unit SOC)
    pub fn dv_dsoc(&self, soc: f64, temp_c: f64) -> f64 {
        match self {
            Self::Table(table) => {
                let h = SOC_SLOPE_STEP;
                if soc > 0.5 {
                    (table.interp(soc, temp_c) - table.interp(soc - h, temp_c)) / h
                } else {
                    (table.interp(soc + h, temp_c) - table.interp(soc, temp_c)) / h
                }
            }
            Self::Zhang { b, c, d, m, n, .. } => {
                let s = soc.clamp(ZHANG_SOC_MIN, 1.0 - ZHANG_SOC_MIN);
                let neg_ln = -libm::log(s);
                -b * m * libm::pow(neg_ln, m - 1.0) / s + c + d * n * libm::exp(n * (s - 1.0))
            }
        }
    }

    /// SOC at which the curve reads `voc` per unit.
    ///
    /// A `voc` beyond the curve's range returns the nearest end of the SOC
    /// range; a curve that is not monotonic in SOC returns `NaN`.
    pub fn soc_from_voc(&self, voc: f64, temp_c: f64) -> f64 {
        match self {
            Self::Table(table) => table.r_interp(voc, temp_c),
            Self::Zhang { .. } => {
                if !self.is_monotonic() {
                    log_warn!("Reverse lookup on non-monotonic closed-form OCV");
                    return f64::NAN;
                }
                let mut solver = RootSolver::new(SolverSettings::default());
                let solution = solver.solve(0.0, 1.0, |s| self.voc(s, temp_c) - voc);
                if !solution.bracketed && !solution.converged {
                    log_trace!(
                        "Closed-form OCV: voc {} outside curve range, clipped to {}",
                        voc,
                        solution.x
                    );
                }
                solution.x
            }
        }
    }

    /// Whether [`OcvCurve::soc_from_voc`] is usable.
    ///
    /// The temperature term is additive, so one SOC sweep covers every
    /// temperature.
    pub fn is_monotonic(&self) -> bool {
        match self {
            Self::Table(table) => table.is_monotonic(),
            Self::Zhang { .. } => {
                let step = (1.0 - ZHANG_SOC_MIN) / ZHANG_MONOTONIC_SAMPLES as f64;
                let at = |k: usize| self.voc(ZHANG_SOC_MIN + step * k as f64, REFERENCE_TEMP_C);
                let increasing = at(1) > at(0);
                (1..=ZHANG_MONOTONIC_SAMPLES).all(|k| {
                    let (prev, next) = (at(k - 1), at(k));
                    if increasing {
                        next > prev
                    } else {
                        next < prev
                    }
                })
            }
        }
    }

    /// Configuration checks beyond what the table constructors already enforce
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Self::Table(table) => {
                if table.is_monotonic() {
                    Ok(())
                } else {
                    Err(ConfigError::NotInvertible { table: table.name() })
                }
            }
            Self::Zhang { a, b, c, d, m, n, dvoc_dt } => {
                for (value, name) in [
                    (a, "zhang.a"),
                    (b, "zhang.b"),
                    (c, "zhang.c"),
                    (d, "zhang.d"),
                    (n, "zhang.n"),
                    (dvoc_dt, "zhang.dvoc_dt"),
                ] {
                    ensure_finite(*value, name)?;
                }
                ensure_finite(*m, "zhang.m")?;
                if *m <= 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "zhang.m",
                        reason: "exponent must be positive",
                    });
                }
                if !self.is_monotonic() {
                    return Err(ConfigError::NotInvertible { table: "zhang" });
                }
                Ok(())
            }
        }
    }
}
