//! Battery Voltage Model
//!
//! ## Equivalent Circuit
//!
//! ```text
//!  V_terminal = ns · ( voc(soc, T) + dvoc )        open-circuit voltage
//!             + I/np · (R0 + Rct) · ns              instantaneous resistive drop
//!             + ns · dv_hys                         hysteresis (from the RC model)
//! ```
//!
//! `ns` and `np` are the bank's series and parallel battery counts. All
//! chemistry parameters are per battery. Diffusion and double-layer dynamics
//! are not modelled here; the hysteresis state absorbs them.
//!
//! ## Saturation
//!
//! ```text
//! V_sat(T) = ns · (nom_vsat + (T − 25)·dvoc_dt)
//! saturated ⇔ voc ≥ V_sat
//! ```
//!
//! ## EKF Coupling
//!
//! [`BatteryObservation`] exposes this model to the EKF. `H` is the slope of
//! the very same OCV curve that produces `hx`.

use crate::chemistry::Chemistry;
use crate::constants::physics::REFERENCE_TEMP_C;
use crate::errors::{ConfigError, ConfigResult};
use crate::traits::ObservationModel;

/// Terminal-voltage model of a bank
#[derive(Debug, Clone)]
pub struct BatteryModel {
    series_count: f64,
    parallel_count: f64,
    soc: f64,
    soc_normalized: f64,
    open_circuit_voltage: f64,
    dv_dsoc: f64,
    dynamic_drop: f64,
    hysteresis_voltage: f64,
    terminal_voltage: f64,
    saturation_voltage: f64,
    is_saturated: bool,
}

impl BatteryModel {
    /// Model for `series_count` batteries in series, `parallel_count` strings
    pub fn new(series_count: u8, parallel_count: u8) -> ConfigResult<Self> {
        if series_count == 0 || parallel_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bank",
                reason: "series and parallel counts must be at least 1",
            });
        }
        Ok(Self {
            series_count: f64::from(series_count),
            parallel_count: f64::from(parallel_count),
            soc: 0.0,
            soc_normalized: 0.0,
            open_circuit_voltage: 0.0,
            dv_dsoc: 0.0,
            dynamic_drop: 0.0,
            hysteresis_voltage: 0.0,
            terminal_voltage: 0.0,
            saturation_voltage: 0.0,
            is_saturated: false,
        })
    }

    /// Bank open-circuit voltage (V)
    pub fn voc(&self, chem: &Chemistry, soc: f64, temp_c: f64) -> f64 {
        (chem.voltage.ocv.voc(soc, temp_c) + chem.voltage.dvoc) * self.series_count
    }

    /// Bank OCV sensitivity (V per unit SOC)
    pub fn dv_dsoc(&self, chem: &Chemistry, soc: f64, temp_c: f64) -> f64 {
        chem.voltage.ocv.dv_dsoc(soc, temp_c) * self.series_count
    }

    /// Resistive drop for bank current `current` (V, positive charging)
    pub fn dynamic_drop(&self, chem: &Chemistry, current: f64) -> f64 {
        current / self.parallel_count * (chem.voltage.r0 + chem.voltage.rct) * self.series_count
    }

    /// Bank saturation voltage at `temp_c` (V)
    pub fn saturation_voltage(&self, chem: &Chemistry, temp_c: f64) -> f64 {
        (chem.voltage.nom_vsat + (temp_c - REFERENCE_TEMP_C) * chem.voltage.dvoc_dt)
            * self.series_count
    }

    /// Bank hysteresis voltage for a per-battery state (V)
    pub fn hysteresis_voltage(&self, dv_hys: f64) -> f64 {
        dv_hys * self.series_count
    }

    /// Bank terminal voltage without touching the stored state (V)
    pub fn terminal_voltage_at(
        &self,
        chem: &Chemistry,
        soc: f64,
        temp_c: f64,
        current: f64,
        dv_hys: f64,
    ) -> f64 {
        self.voc(chem, soc, temp_c) + self.dynamic_drop(chem, current) + self.hysteresis_voltage(dv_hys)
    }

    /// Evaluate the model and store every intermediate; returns terminal voltage (V).
    ///
    /// `dv_hys` is the per-battery hysteresis voltage.
    pub fn calculate(
        &mut self,
        chem: &Chemistry,
        soc: f64,
        temp_c: f64,
        current: f64,
        dv_hys: f64,
    ) -> f64 {
        self.soc = soc;
        self.soc_normalized = soc.clamp(0.0, 1.0);
        self.open_circuit_voltage = self.voc(chem, soc, temp_c);
        self.dv_dsoc = self.dv_dsoc(chem, soc, temp_c);
        self.dynamic_drop = self.dynamic_drop(chem, current);
        self.hysteresis_voltage = self.hysteresis_voltage(dv_hys);
        self.terminal_voltage = self.open_circuit_voltage + self.dynamic_drop + self.hysteresis_voltage;
        self.saturation_voltage = self.saturation_voltage(chem, temp_c);
        self.is_saturated = self.open_circuit_voltage >= self.saturation_voltage;
        self.terminal_voltage
    }

    /// SOC whose bank OCV is `voc` at `temp_c`; `NaN` if the curve cannot be inverted
    pub fn soc_from_voc(&self, chem: &Chemistry, voc: f64, temp_c: f64) -> f64 {
        let per_unit = voc / self.series_count - chem.voltage.dvoc;
        chem.voltage.ocv.soc_from_voc(per_unit, temp_c)
    }

    /// Batteries in series
    pub fn series_count(&self) -> f64 {
        self.series_count
    }

    /// Parallel strings
    pub fn parallel_count(&self) -> f64 {
        self.parallel_count
    }

    /// SOC from the last `calculate`
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// SOC clamped to the lookup domain
    pub fn soc_normalized(&self) -> f64 {
        self.soc_normalized
    }

    /// OCV from the last `calculate` (V)
    pub fn open_circuit_voltage(&self) -> f64 {
        self.open_circuit_voltage
    }

    /// OCV slope from the last `calculate` (V per unit SOC)
    pub fn last_dv_dsoc(&self) -> f64 {
        self.dv_dsoc
    }

    /// Resistive drop from the last `calculate` (V)
    pub fn last_dynamic_drop(&self) -> f64 {
        self.dynamic_drop
    }

    /// Hysteresis contribution from the last `calculate` (V)
    pub fn last_hysteresis_voltage(&self) -> f64 {
        self.hysteresis_voltage
    }

    /// Terminal voltage from the last `calculate` (V)
    pub fn terminal_voltage(&self) -> f64 {
        self.terminal_voltage
    }

    /// Saturation voltage from the last `calculate` (V)
    pub fn last_saturation_voltage(&self) -> f64 {
        self.saturation_voltage
    }

    /// Whether the modelled OCV reached saturation in the last `calculate`
    pub fn is_saturated(&self) -> bool {
        self.is_saturated
    }
}

/// The voltage model as seen by the SOC EKF for one cycle
///
/// Process: SOC integrates current, `Fx = 1`, `Bu = dt·eff/q_capacity`
/// (efficiency only while charging). Measurement: bank terminal voltage.
pub struct BatteryObservation<'a> {
    /// Voltage model
    pub model: &'a BatteryModel,
    /// Active chemistry
    pub chem: &'a Chemistry,
    /// Step (s)
    pub dt: f64,
    /// Capacity at the present temperature (C)
    pub q_capacity: f64,
    /// Charge efficiency applied to positive current
    pub coulombic_efficiency: f64,
    /// Rate-limited temperature (°C)
    pub temp_c: f64,
    /// Bank current (A, positive charging)
    pub current: f64,
    /// Per-battery hysteresis voltage (V)
    pub dv_hys: f64,
}

impl ObservationModel for BatteryObservation<'_> {
    fn predict(&mut self, u: f64) -> (f64, f64) {
        let eff = if u > 0.0 { self.coulombic_efficiency } else { 1.0 };
        (1.0, self.dt * eff / self.q_capacity)
    }

    fn observe(&mut self, x: f64) -> (f64, f64) {
        let hx = self
            .model
            .terminal_voltage_at(self.chem, x, self.temp_c, self.current, self.dv_hys);
        let h = self.model.dv_dsoc(self.chem, x, self.temp_c);
        (hx, h)
    }
}
