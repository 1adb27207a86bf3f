//! Battle Born 100 Ah LFP
//!
//! Per-unit (one 12 V battery) characterisation. OCV rows come from rested
//! bench sweeps at four temperatures; the top row segment is steep because the
//! cells are saturating above 99 % SOC.

use super::{
    table1d, table2d, CapacityParams, CapacityTempLaw, Chemistry, ChemistryId, HysteresisParams,
    OcvCurve, VoltageParams,
};
use crate::constants::physics::DEFAULT_COULOMBIC_EFFICIENCY;
use crate::errors::ConfigResult;

/// OCV SOC breakpoints
pub const SOC_BREAKPOINTS: [f64; 17] = [
    0.0, 0.05, 0.1, 0.14, 0.17, 0.2, 0.25, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99, 1.0,
];

/// OCV temperature breakpoints (°C)
pub const TEMP_BREAKPOINTS: [f64; 4] = [5.0, 11.1, 20.0, 40.0];

/// OCV grid (V), one row per temperature
#[rustfmt::skip]
pub const VOC_GRID: [f64; 68] = [
    // 5.0 °C
    9.970, 11.970, 12.770, 12.920, 12.970, 13.000, 13.040, 13.070, 13.110, 13.140, 13.160, 13.180, 13.210, 13.250, 13.290, 13.420, 13.970,
    // 11.1 °C
    9.985, 11.985, 12.785, 12.935, 12.985, 13.015, 13.055, 13.085, 13.125, 13.155, 13.175, 13.195, 13.225, 13.265, 13.305, 13.435, 13.985,
    // 20.0 °C
    10.000, 12.000, 12.800, 12.950, 13.000, 13.030, 13.070, 13.100, 13.140, 13.170, 13.190, 13.210, 13.240, 13.280, 13.320, 13.450, 14.000,
    // 40.0 °C
    10.010, 12.010, 12.810, 12.960, 13.010, 13.040, 13.080, 13.110, 13.150, 13.180, 13.200, 13.220, 13.250, 13.290, 13.330, 13.460, 14.010,
];

/// Low-temperature derating breakpoints (°C)
pub const SOC_MIN_TEMPS: [f64; 6] = [-10.0, 0.0, 5.0, 11.1, 20.0, 30.0];

/// Minimum usable SOC at each derating breakpoint
pub const SOC_MIN_VALUES: [f64; 6] = [0.60, 0.35, 0.236, 0.10, 0.0, 0.0];

/// Hysteresis voltage breakpoints (V)
pub const HYS_DV_BREAKPOINTS: [f64; 7] = [-0.2, -0.1, -0.05, 0.0, 0.05, 0.1, 0.2];

/// Hysteresis SOC breakpoints
pub const HYS_SOC_BREAKPOINTS: [f64; 3] = [0.0, 0.5, 1.0];

/// Hysteresis resistance (Ω), one row per SOC. The ±0.2 V columns short the
/// capacitor so the state cannot run past them.
#[rustfmt::skip]
pub const HYS_RESISTANCE: [f64; 21] = [
    1e-7, 0.006, 0.012, 0.015, 0.012, 0.006, 1e-7,
    1e-7, 0.008, 0.015, 0.015, 0.015, 0.008, 1e-7,
    1e-7, 0.006, 0.012, 0.015, 0.012, 0.006, 1e-7,
];

/// Hysteresis current scalar, one row per SOC
#[rustfmt::skip]
pub const HYS_CURRENT_SCALAR: [f64; 21] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
];

/// Hysteresis upper bound vs SOC (V)
pub const DV_MAX: [f64; 3] = [0.18, 0.18, 0.12];

/// Hysteresis lower bound vs SOC (V)
pub const DV_MIN: [f64; 3] = [-0.18, -0.18, -0.12];

/// Build the parameter set
pub fn chemistry() -> ConfigResult<Chemistry> {
    let labels = ChemistryId::Battleborn.table_labels();
    let ocv = table2d(labels.voc, &SOC_BREAKPOINTS, &TEMP_BREAKPOINTS, &VOC_GRID)?
        .require_invertible()?;

    let chemistry = Chemistry {
        id: ChemistryId::Battleborn,
        capacity: CapacityParams {
            law: CapacityTempLaw::Increasing,
            dqdt: 0.01,
            rated_temp: 25.0,
            soc_min: table1d("battleborn.soc_min", &SOC_MIN_TEMPS, &SOC_MIN_VALUES)?,
            coulombic_efficiency: DEFAULT_COULOMBIC_EFFICIENCY,
        },
        hysteresis: HysteresisParams {
            resistance: table2d(
                labels.hys_r,
                &HYS_DV_BREAKPOINTS,
                &HYS_SOC_BREAKPOINTS,
                &HYS_RESISTANCE,
            )?,
            current_scalar: table2d(
                labels.hys_slr,
                &HYS_DV_BREAKPOINTS,
                &HYS_SOC_BREAKPOINTS,
                &HYS_CURRENT_SCALAR,
            )?,
            dv_max: table1d("battleborn.dv_max", &HYS_SOC_BREAKPOINTS, &DV_MAX)?,
            dv_min: table1d("battleborn.dv_min", &HYS_SOC_BREAKPOINTS, &DV_MIN)?,
            capacitance: 3.6e4,
            cap_scalar_charge: 1.0,
            cap_scalar_discharge: 1.0,
            scale_charge: 1.0,
            scale_discharge: 1.0,
            dv_min_abs: 0.06,
        },
        voltage: VoltageParams {
            ocv: OcvCurve::Table(ocv),
            nom_vsat: 13.85,
            dvoc_dt: 0.004,
            dvoc: 0.0,
            r0: 0.003,
            rct: 0.0016,
            low_voc: 10.5,
        },
    };
    chemistry.validate()?;
    Ok(chemistry)
}

/// Closed-form OCV fit to the 20 °C row, for comparison runs
pub fn zhang_curve() -> OcvCurve {
    OcvCurve::Zhang {
        a: 13.0,
        b: -0.25,
        c: 0.25,
        d: 0.15,
        m: 0.4,
        n: 20.0,
        dvoc_dt: 0.004,
    }
}
