//! Per-cycle input and output records

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chemistry::ChemistryId;
use crate::constants::sensors::{
    CURRENT_SENSOR_MAX_A, MAX_STEP_S, TEMP_SENSOR_MAX_C, TEMP_SENSOR_MIN_C, VOLTAGE_SENSOR_MAX_V,
    VOLTAGE_SENSOR_MIN_V,
};
use crate::errors::{InputError, InputResult};
use crate::traits::Validatable;

/// One cycle of measurements
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorInput {
    /// Step since the previous cycle (s)
    pub dt: f64,
    /// Battery temperature (°C)
    pub temperature: f64,
    /// Bank current (A, positive charging)
    pub current: f64,
    /// Bank terminal voltage (V)
    pub voltage: f64,
    /// Force the temperature filter and EKF to re-initialise
    pub external_reset: bool,
    /// Chemistry to switch to; `None` keeps the monitor's current one
    pub chemistry: Option<ChemistryId>,
}

impl MonitorInput {
    /// Input with no reset that keeps the current chemistry
    pub fn new(dt: f64, temperature: f64, current: f64, voltage: f64) -> Self {
        Self {
            dt,
            temperature,
            current,
            voltage,
            external_reset: false,
            chemistry: None,
        }
    }

    /// Set the reset flag
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.external_reset = reset;
        self
    }

    /// Request a chemistry for this cycle
    pub fn with_chemistry(mut self, chemistry: ChemistryId) -> Self {
        self.chemistry = Some(chemistry);
        self
    }

    /// Reject values the front end cannot physically report
    pub fn validate(&self) -> InputResult<()> {
        check("dt", self.dt, f64::MIN_POSITIVE, MAX_STEP_S)?;
        validate_measurements(self.temperature, self.current, self.voltage)
    }
}

/// Sensor range checks shared by every entry point that takes measurements
pub(crate) fn validate_measurements(temperature: f64, current: f64, voltage: f64) -> InputResult<()> {
    check("temperature", temperature, TEMP_SENSOR_MIN_C, TEMP_SENSOR_MAX_C)?;
    check("current", current, -CURRENT_SENSOR_MAX_A, CURRENT_SENSOR_MAX_A)?;
    check("voltage", voltage, VOLTAGE_SENSOR_MIN_V, VOLTAGE_SENSOR_MAX_V)
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> InputResult<()> {
    if !value.is_valid() {
        return Err(InputError::InvalidValue { field });
    }
    if value < min || value > max {
        return Err(InputError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Everything the estimator reports for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorOutput {
    /// Blended SOC
    pub soc: f64,
    /// Coulomb counter SOC
    pub soc_coulomb: f64,
    /// EKF SOC
    pub soc_ekf: f64,
    /// Model terminal voltage at the Coulomb SOC (V)
    pub terminal_voltage_predicted: f64,
    /// Model OCV at the Coulomb SOC (V)
    pub open_circuit_voltage: f64,
    /// Resistive drop (V)
    pub dynamic_drop: f64,
    /// Hysteresis voltage (V)
    pub hysteresis_voltage: f64,
    /// Debounced saturation
    pub is_saturated: bool,
    /// EKF covariance
    pub ekf_covariance: f64,
    /// Rate-limited temperature (°C)
    pub temperature_limited: f64,
    /// Minimum usable SOC at temperature
    pub soc_floor: f64,
    /// Measured voltage less resistive drop and hysteresis (V)
    pub voc_stat: f64,
    /// EKF innovation (V)
    pub ekf_residual: f64,
    /// Coulomb weight in the blend
    pub blend_weight: f64,
    /// Capacity at temperature (C)
    pub q_capacity: f64,
}
