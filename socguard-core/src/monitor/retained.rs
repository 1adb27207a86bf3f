//! Retained (non-volatile) estimator state
//!
//! The embedded host writes this record to NVM periodically and hands it back
//! after power-up. Nothing else survives a reset.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{InputError, InputResult};
use crate::traits::Validatable;

/// State persisted across power cycles
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetainedState {
    /// Coulomb counter charge deficit (C, ≤ 0)
    pub delta_q: f64,
    /// Temperature at the last counter step (°C)
    pub t_last: f64,
    /// Per-battery hysteresis voltage (V)
    pub dv_hys: f64,
    /// EKF SOC; `NaN` when the filter was never initialised
    pub soc_ekf: f64,
    /// EKF covariance
    pub ekf_covariance: f64,
}

impl Default for RetainedState {
    fn default() -> Self {
        Self {
            delta_q: 0.0,
            t_last: crate::constants::physics::REFERENCE_TEMP_C,
            dv_hys: 0.0,
            soc_ekf: f64::NAN,
            ekf_covariance: 0.0,
        }
    }
}

impl RetainedState {
    /// Reject records that would corrupt the estimator
    pub fn validate(&self) -> InputResult<()> {
        for (value, field) in [
            (self.delta_q, "delta_q"),
            (self.t_last, "t_last"),
            (self.dv_hys, "dv_hys"),
        ] {
            if !value.is_valid() {
                return Err(InputError::InvalidValue { field });
            }
        }
        if self.delta_q > 0.0 {
            return Err(InputError::OutOfRange {
                field: "delta_q",
                value: self.delta_q,
                min: f64::NEG_INFINITY,
                max: 0.0,
            });
        }
        if self.soc_ekf.is_valid() && !self.ekf_covariance.is_valid() {
            return Err(InputError::InvalidValue { field: "ekf_covariance" });
        }
        Ok(())
    }

    /// Whether the record carries an EKF state
    pub fn has_ekf(&self) -> bool {
        self.soc_ekf.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_without_ekf() {
        let state = RetainedState::default();
        state.validate().unwrap();
        assert!(!state.has_ekf());
    }

    #[test]
    fn rejects_positive_deficit() {
        let state = RetainedState {
            delta_q: 10.0,
            ..RetainedState::default()
        };
        assert!(matches!(
            state.validate(),
            Err(InputError::OutOfRange { field: "delta_q", .. })
        ));
    }

    #[test]
    fn rejects_nan_temperature() {
        let state = RetainedState {
            t_last: f64::NAN,
            ..RetainedState::default()
        };
        assert_eq!(state.validate(), Err(InputError::InvalidValue { field: "t_last" }));
    }
}
