//! CHINS 100 Ah LFP
//!
//! Sits slightly below Battle Born across the plateau and saturates a little
//! earlier. Hysteresis discharges faster than it charges.

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
    9.770, 11.870, 12.670, 12.870, 12.940, 12.980, 13.020, 13.050, 13.090, 13.120, 13.150, 13.170, 13.200, 13.240, 13.280, 13.390, 13.920,
    // 11.1 °C
    9.785, 11.885, 12.685, 12.885, 12.955, 12.995, 13.035, 13.065, 13.105, 13.135, 13.165, 13.185, 13.215, 13.255, 13.295, 13.405, 13.935,
    // 20.0 °C
    9.800, 11.900, 12.700, 12.900, 12.970, 13.010, 13.050, 13.080, 13.120, 13.150, 13.180, 13.200, 13.230, 13.270, 13.310, 13.420, 13.950,
    // 40.0 °C
    9.810, 11.910, 12.710, 12.910, 12.980, 13.020, 13.060, 13.090, 13.130, 13.160, 13.190, 13.210, 13.240, 13.280, 13.320, 13.430, 13.960,
];

/// Low-temperature derating breakpoints (°C)
pub const SOC_MIN_TEMPS: [f64; 5] = [-10.0, 0.0, 5.0, 11.1, 20.0];

/// Minimum usable SOC at each derating breakpoint
pub const SOC_MIN_VALUES: [f64; 5] = [0.50, 0.30, 0.20, 0.08, 0.0];

/// Hysteresis voltage breakpoints (V)
pub const HYS_DV_BREAKPOINTS: [f64; 7] = [-0.16, -0.08, -0.04, 0.0, 0.04, 0.08, 0.16];

/// Hysteresis SOC breakpoints
pub const HYS_SOC_BREAKPOINTS: [f64; 3] = [0.0, 0.5, 1.0];

/// Hysteresis resistance (Ω), one row per SOC
#[rustfmt::skip]
pub const HYS_RESISTANCE: [f64; 21] = [
    1e-7, 0.005, 0.010, 0.012, 0.010, 0.005, 1e-7,
    1e-7, 0.006, 0.012, 0.012, 0.012, 0.006, 1e-7,
    1e-7, 0.005, 0.010, 0.012, 0.010, 0.005, 1e-7,
];

/// Hysteresis current scalar, one row per SOC
#[rustfmt::skip]
pub const HYS_CURRENT_SCALAR: [f64; 21] = [
    0.9, 0.9, 0.9, 0.9, 0.9, 0.9, 0.9,
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    0.9, 0.9, 0.9, 0.9, 0.9, 0.9, 0.9,
];

/// Hysteresis upper bound vs SOC (V)
pub const DV_MAX: [f64; 3] = [0.14, 0.14, 0.10];

/// Hysteresis lower bound vs SOC (V)
pub const DV_MIN: [f64; 3] = [-0.14, -0.14, -0.10];

/// Build the parameter set
pub fn chemistry() -> ConfigResult<Chemistry> {
    let labels = ChemistryId::Chins.table_labels();
    let ocv = table2d(labels.voc, &SOC_BREAKPOINTS, &TEMP_BREAKPOINTS, &VOC_GRID)?
        .require_invertible()?;

    let chemistry = Chemistry {
        id: ChemistryId::Chins,
        capacity: CapacityParams {
            law: CapacityTempLaw::Increasing,
            dqdt: 0.0055,
            rated_temp: 25.0,
            soc_min: table1d("chins.soc_min", &SOC_MIN_TEMPS, &SOC_MIN_VALUES)?,
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
            dv_max: table1d("chins.dv_max", &HYS_SOC_BREAKPOINTS, &DV_MAX)?,
            dv_min: table1d("chins.dv_min", &HYS_SOC_BREAKPOINTS, &DV_MIN)?,
            capacitance: 3.6e4,
            cap_scalar_charge: 1.0,
            cap_scalar_discharge: 0.8,
            scale_charge: 1.0,
            scale_discharge: 1.0,
            dv_min_abs: 0.05,
        },
        voltage: VoltageParams {
            ocv: OcvCurve::Table(ocv),
            nom_vsat: 13.80,
            dvoc_dt: 0.004,
            dvoc: 0.0,
            r0: 0.004,
            rct: 0.002,
            low_voc: 10.3,
        },
    };
    chemistry.validate()?;
    Ok(chemistry)
}
