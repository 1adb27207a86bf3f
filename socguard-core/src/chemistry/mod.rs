//! Cell Chemistry Parameter Sets
//!
//! ## Overview
//!
//! A [`Chemistry`] is an immutable value object holding every table and
//! constant that differs between cell types. It is selected once (by
//! [`ChemistryId`]) and then passed by reference into each estimator
//! component call, so no component branches on the chemistry itself.
//!
//! ```text
//! Chemistry
//! ├── capacity:   temperature law, rated temperature, low-temp SOC floor, efficiency
//! ├── hysteresis: R(dv, soc), current scalar(dv, soc), dv bounds(soc), C, scalars
//! └── voltage:    OCV curve, saturation voltage law, R0 + Rct, low anchor voltage
//! ```
//!
//! All voltages are **per unit**, one nominal 12 V battery. The bank's series
//! and parallel counts are applied by the components.
//!
//! ## Capacity Temperature Law
//!
//! The sign of the capacity temperature coefficient differs between hardware
//! generations. It is part of the chemistry, never hard-coded:
//!
//! ```text
//! Increasing: q_cap = q_rated · (1 + dqdt·(T − T_rated))
//! Decreasing: q_cap = q_rated · (1 − dqdt·(T − T_rated))
//! ```
//!
//! ## Built-in Chemistries
//!
//! | Id | Name | Cells |
//! |----|------|-------|
//! | 0 | [`battleborn`] | Battle Born 100 Ah LFP drop-in |
//! | 1 | [`chins`] | CHINS 100 Ah LFP drop-in |

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{ensure_finite, ensure_positive, ConfigError, ConfigResult};
use crate::lookup::{Table1D, Table2D};

pub mod battleborn;
pub mod chins;
mod ocv;

pub use ocv::OcvCurve;

/// Chemistry selector as carried in the per-cycle input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum ChemistryId {
    /// Battle Born LFP
    #[default]
    Battleborn = 0,
    /// CHINS LFP
    Chins = 1,
}

impl ChemistryId {
    /// Lower-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Battleborn => "battleborn",
            Self::Chins => "chins",
        }
    }
}

/// Diagnostic labels of the 2-D tables in one parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableLabels {
    pub voc: &'static str,
    pub hys_r: &'static str,
    pub hys_slr: &'static str,
}

impl ChemistryId {
    pub(crate) const fn table_labels(self) -> TableLabels {
        match self {
            Self::Battleborn => TableLabels {
                voc: "battleborn.voc",
                hys_r: "battleborn.hys_r",
                hys_slr: "battleborn.hys_slr",
            },
            Self::Chins => TableLabels {
                voc: "chins.voc",
                hys_r: "chins.hys_r",
                hys_slr: "chins.hys_slr",
            },
        }
    }
}

impl TryFrom<u8> for ChemistryId {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Battleborn),
            1 => Ok(Self::Chins),
            _ => Err(ConfigError::InvalidParameter {
                name: "chemistry",
                reason: "unknown chemistry id",
            }),
        }
    }
}

impl FromStr for ChemistryId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("battleborn") {
            Ok(Self::Battleborn)
        } else if s.eq_ignore_ascii_case("chins") {
            Ok(Self::Chins)
        } else {
            Err(ConfigError::InvalidParameter {
                name: "chemistry",
                reason: "unknown chemistry name",
            })
        }
    }
}

impl fmt::Display for ChemistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChemistryId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

/// Direction in which usable capacity moves with temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CapacityTempLaw {
    /// Capacity grows with temperature
    Increasing,
    /// Capacity shrinks with temperature
    Decreasing,
}

/// Charge-storage parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CapacityParams {
    /// Sign of the temperature coefficient
    pub law: CapacityTempLaw,
    /// Magnitude of the temperature coefficient (fraction/°C)
    pub dqdt: f64,
    /// Temperature at which rated capacity applies (°C)
    pub rated_temp: f64,
    /// Minimum usable SOC vs temperature (°C -> fraction)
    pub soc_min: Table1D,
    /// Fraction of charging current that ends up stored
    pub coulombic_efficiency: f64,
}

impl CapacityParams {
    /// Signed temperature coefficient (fraction/°C)
    pub fn signed_dqdt(&self) -> f64 {
        match self.law {
            CapacityTempLaw::Increasing => self.dqdt,
            CapacityTempLaw::Decreasing => -self.dqdt,
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        ensure_finite(self.dqdt, "dqdt")?;
        if self.dqdt < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "dqdt",
                reason: "magnitude must be non-negative; sign comes from the law",
            });
        }
        ensure_finite(self.rated_temp, "rated_temp")?;
        ensure_positive(self.coulombic_efficiency, "coulombic_efficiency")?;
        if self.coulombic_efficiency > 1.0 {
            return Err(ConfigError::InvalidParameter {
                name: "coulombic_efficiency",
                reason: "must not exceed 1",
            });
        }
        Ok(())
    }
}

/// Hysteresis RC parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HysteresisParams {
    /// Resistance over `(dv_hys, soc)` (Ω); near-zero entries act as hard clamps
    pub resistance: Table2D,
    /// Current scalar over `(dv_hys, soc)`
    pub current_scalar: Table2D,
    /// Upper hysteresis bound vs SOC (V)
    pub dv_max: Table1D,
    /// Lower hysteresis bound vs SOC (V)
    pub dv_min: Table1D,
    /// Capacitance (F)
    pub capacitance: f64,
    /// Capacitance divisor while charging
    pub cap_scalar_charge: f64,
    /// Capacitance divisor while discharging
    pub cap_scalar_discharge: f64,
    /// Output scale for positive hysteresis; below ~1e-5 disables the model
    pub scale_charge: f64,
    /// Output scale for negative hysteresis
    pub scale_discharge: f64,
    /// Smallest magnitude an endpoint reset may land on (V)
    pub dv_min_abs: f64,
}

impl HysteresisParams {
    fn validate(&self) -> ConfigResult<()> {
        ensure_positive(self.capacitance, "hys_capacitance")?;
        ensure_positive(self.cap_scalar_charge, "hys_cap_scalar_charge")?;
        ensure_positive(self.cap_scalar_discharge, "hys_cap_scalar_discharge")?;
        ensure_finite(self.scale_charge, "hys_scale_charge")?;
        ensure_finite(self.scale_discharge, "hys_scale_discharge")?;
        ensure_finite(self.dv_min_abs, "dv_min_abs")?;
        if self.scale_charge < 0.0 || self.scale_discharge < 0.0 || self.dv_min_abs < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "hysteresis",
                reason: "scales and dv_min_abs must be non-negative",
            });
        }
        Ok(())
    }
}

/// Voltage-model parameters, per unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoltageParams {
    /// Open-circuit voltage law
    pub ocv: OcvCurve,
    /// Saturation voltage at 25 °C (V)
    pub nom_vsat: f64,
    /// Saturation voltage temperature slope (V/°C)
    pub dvoc_dt: f64,
    /// OCV calibration offset (V)
    pub dvoc: f64,
    /// Ohmic resistance (Ω)
    pub r0: f64,
    /// Charge-transfer resistance (Ω)
    pub rct: f64,
    /// Static OCV at or below which the bank is treated as empty (V)
    pub low_voc: f64,
}

impl VoltageParams {
    fn validate(&self) -> ConfigResult<()> {
        self.ocv.validate()?;
        ensure_positive(self.nom_vsat, "nom_vsat")?;
        ensure_finite(self.dvoc_dt, "dvoc_dt")?;
        ensure_finite(self.dvoc, "dvoc")?;
        ensure_finite(self.r0, "r0")?;
        ensure_finite(self.rct, "rct")?;
        if self.r0 < 0.0 || self.rct < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "r0/rct",
                reason: "resistance must be non-negative",
            });
        }
        ensure_positive(self.low_voc, "low_voc")?;
        if self.low_voc >= self.nom_vsat {
            return Err(ConfigError::InvalidParameter {
                name: "low_voc",
                reason: "must be below the saturation voltage",
            });
        }
        Ok(())
    }
}

/// Complete parameter set for one cell type
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawChemistry", into = "RawChemistry")
)]
pub struct Chemistry {
    /// Which cell type
    pub id: ChemistryId,
    /// Charge-storage parameters
    pub capacity: CapacityParams,
    /// Hysteresis RC parameters
    pub hysteresis: HysteresisParams,
    /// Voltage-model parameters
    pub voltage: VoltageParams,
}

impl Chemistry {
    /// Built-in parameter set for `id`
    pub fn for_id(id: ChemistryId) -> ConfigResult<Self> {
        match id {
            ChemistryId::Battleborn => battleborn::chemistry(),
            ChemistryId::Chins => chins::chemistry(),
        }
    }

    /// Battle Born parameter set
    pub fn battleborn() -> ConfigResult<Self> {
        battleborn::chemistry()
    }

    /// CHINS parameter set
    pub fn chins() -> ConfigResult<Self> {
        chins::chemistry()
    }

    /// Check every scalar; tables were checked when built
    pub fn validate(&self) -> ConfigResult<()> {
        self.capacity.validate()?;
        self.hysteresis.validate()?;
        self.voltage.validate()
    }

    /// Replace the OCV law, e.g. with the closed form
    pub fn with_ocv(mut self, ocv: OcvCurve) -> ConfigResult<Self> {
        ocv.validate()?;
        self.voltage.ocv = ocv;
        Ok(self)
    }

    /// Replace the OCV calibration offset
    pub fn with_dvoc(mut self, dvoc: f64) -> ConfigResult<Self> {
        self.voltage.dvoc = ensure_finite(dvoc, "dvoc")?;
        Ok(self)
    }

    /// Replace the capacity temperature law
    pub fn with_capacity_law(mut self, law: CapacityTempLaw, dqdt: f64) -> ConfigResult<Self> {
        self.capacity.law = law;
        self.capacity.dqdt = dqdt;
        self.capacity.validate()?;
        Ok(self)
    }
}

/// Helper used by the built-in parameter files
pub(crate) fn table1d(name: &'static str, x: &[f64], v: &[f64]) -> ConfigResult<Table1D> {
    Table1D::named(name, x, v)
}

/// Helper used by the built-in parameter files
pub(crate) fn table2d(name: &'static str, x: &[f64], y: &[f64], v: &[f64]) -> ConfigResult<Table2D> {
    Table2D::named(name, x, y, v)
}

/// Wire form of [`Chemistry`]; validated through `TryFrom`
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawChemistry {
    id: ChemistryId,
    capacity: CapacityParams,
    hysteresis: HysteresisParams,
    voltage: VoltageParams,
}

#[cfg(feature = "serde")]
impl TryFrom<RawChemistry> for Chemistry {
    type Error = ConfigError;

    fn try_from(raw: RawChemistry) -> Result<Self, Self::Error> {
        let mut chemistry = Chemistry {
            id: raw.id,
            capacity: raw.capacity,
            hysteresis: raw.hysteresis,
            voltage: raw.voltage,
        };
        let labels = chemistry.id.table_labels();
        chemistry.hysteresis.resistance.rename(labels.hys_r);
        chemistry.hysteresis.current_scalar.rename(labels.hys_slr);
        if let OcvCurve::Table(table) = &mut chemistry.voltage.ocv {
            table.rename(labels.voc);
        }
        chemistry.validate()?;
        Ok(chemistry)
    }
}

#[cfg(feature = "serde")]
impl From<Chemistry> for RawChemistry {
    fn from(c: Chemistry) -> Self {
        Self {
            id: c.id,
            capacity: c.capacity,
            hysteresis: c.hysteresis,
            voltage: c.voltage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_conversions() {
        assert_eq!(ChemistryId::try_from(0u8), Ok(ChemistryId::Battleborn));
        assert_eq!(ChemistryId::try_from(1u8), Ok(ChemistryId::Chins));
        assert!(ChemistryId::try_from(7u8).is_err());
        assert_eq!("CHINS".parse::<ChemistryId>(), Ok(ChemistryId::Chins));
        assert!("lead-acid".parse::<ChemistryId>().is_err());
        assert_eq!(ChemistryId::Chins.name(), "chins");
    }

    #[test]
    fn built_ins_validate() {
        for id in [ChemistryId::Battleborn, ChemistryId::Chins] {
            let chem = Chemistry::for_id(id).unwrap();
            assert_eq!(chem.id, id);
            chem.validate().unwrap();
        }
    }

    #[test]
    fn law_sets_sign() {
        let chem = Chemistry::battleborn().unwrap();
        let up = chem.clone().with_capacity_law(CapacityTempLaw::Increasing, 0.01).unwrap();
        let down = chem.with_capacity_law(CapacityTempLaw::Decreasing, 0.01).unwrap();
        assert_eq!(up.capacity.signed_dqdt(), 0.01);
        assert_eq!(down.capacity.signed_dqdt(), -0.01);
    }

    #[test]
    fn negative_dqdt_rejected() {
        let chem = Chemistry::chins().unwrap();
        assert!(matches!(
            chem.with_capacity_law(CapacityTempLaw::Increasing, -0.01),
            Err(ConfigError::InvalidParameter { name: "dqdt", .. })
        ));
    }

    #[test]
    fn bad_efficiency_rejected() {
        let mut chem = Chemistry::battleborn().unwrap();
        chem.capacity.coulombic_efficiency = 1.2;
        assert!(chem.validate().is_err());
    }
}
