//! Estimator configuration
//!
//! Everything tunable about the estimator that is *not* a property of the
//! cell chemistry. Defaults come from [`crate::constants`]; builders follow the
//! `with_*` style and [`EstimatorConfig::validate`] runs once at construction
//! (and on deserialisation).
//!
//! ```rust
//! use socguard_core::monitor::EstimatorConfig;
//!
//! let config = EstimatorConfig::default()
//!     .with_bank(400.0, 4, 2)
//!     .with_ekf_noise(1e-6, 4e-2)
//!     .with_saturation_delay(5.0, 30.0);
//! config.validate().unwrap();
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::bank::{
    DEFAULT_CAPACITY_SCALAR, DEFAULT_PARALLEL_COUNT, DEFAULT_RATED_CAPACITY_AH, DEFAULT_SERIES_COUNT,
};
use crate::constants::tuning::*;
use crate::errors::{ensure_finite, ensure_positive, ConfigError, ConfigResult};

/// Bank geometry and capacity
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BankConfig {
    /// Rated capacity of one battery (Ah)
    pub rated_capacity_ah: f64,
    /// Multiplier on rated capacity (ageing, de-rating)
    pub capacity_scalar: f64,
    /// Batteries in series
    pub series_count: u8,
    /// Parallel strings
    pub parallel_count: u8,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            rated_capacity_ah: DEFAULT_RATED_CAPACITY_AH,
            capacity_scalar: DEFAULT_CAPACITY_SCALAR,
            series_count: DEFAULT_SERIES_COUNT,
            parallel_count: DEFAULT_PARALLEL_COUNT,
        }
    }
}

impl BankConfig {
    /// Bank capacity before scaling (Ah)
    pub fn bank_capacity_ah(&self) -> f64 {
        self.rated_capacity_ah * f64::from(self.parallel_count)
    }
}

/// EKF noise and re-initialisation policy
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct EkfConfig {
    /// Process noise (fraction²)
    pub q: f64,
    /// Measurement noise (V²)
    pub r: f64,
    /// Covariance after (re)initialisation (fraction²)
    pub p0: f64,
    /// Re-initialise to full on a saturation edge
    pub reinit_on_saturation: bool,
    /// Re-initialise to the anchored SOC on a low-anchor edge
    pub reinit_on_low_anchor: bool,
}

impl Default for EkfConfig {
    fn default() -> Self {
        Self {
            q: DEFAULT_EKF_Q,
            r: DEFAULT_EKF_R,
            p0: DEFAULT_EKF_P0,
            reinit_on_saturation: true,
            reinit_on_low_anchor: true,
        }
    }
}

/// Saturation detection debounce
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SaturationConfig {
    /// Dwell before saturation is asserted (s)
    pub t_true_s: f64,
    /// Dwell before saturation is released (s)
    pub t_false_s: f64,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            t_true_s: DEFAULT_SAT_T_TRUE_S,
            t_false_s: DEFAULT_SAT_T_FALSE_S,
        }
    }
}

/// Low-SOC anchor detection
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LowAnchorConfig {
    /// Re-anchor SOC when the static OCV reaches the chemistry's low voltage
    pub enabled: bool,
    /// Dwell before the anchor fires (s)
    pub t_true_s: f64,
    /// Dwell before the anchor releases (s)
    pub t_false_s: f64,
}

impl Default for LowAnchorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            t_true_s: DEFAULT_LOW_T_TRUE_S,
            t_false_s: DEFAULT_LOW_T_FALSE_S,
        }
    }
}

/// Coulomb/EKF blend schedule
///
/// `soc = w·soc_coulomb + (1 − w)·soc_ekf`. `w` jumps to
/// `weight_after_reset` on every reset event and relaxes toward
/// `weight_tracking` with time constant `recovery_tau_s`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BlendConfig {
    /// Coulomb weight right after a reset event
    pub weight_after_reset: f64,
    /// Coulomb weight during steady tracking
    pub weight_tracking: f64,
    /// Relaxation time constant (s)
    pub recovery_tau_s: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            weight_after_reset: DEFAULT_BLEND_WEIGHT_AFTER_RESET,
            weight_tracking: DEFAULT_BLEND_WEIGHT_TRACKING,
            recovery_tau_s: DEFAULT_BLEND_RECOVERY_TAU_S,
        }
    }
}

/// Complete estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(remote = "Self", default)
)]
pub struct EstimatorConfig {
    /// Bank geometry
    pub bank: BankConfig,
    /// Temperature slew limit for the capacity model (°C/s)
    pub temp_rate_limit: f64,
    /// Physical SOC lower bound
    pub soc_min: f64,
    /// Physical SOC upper bound
    pub soc_max: f64,
    /// EKF tuning
    pub ekf: EkfConfig,
    /// Saturation debounce
    pub saturation: SaturationConfig,
    /// Low anchor
    pub low_anchor: LowAnchorConfig,
    /// Blend schedule
    pub blend: BlendConfig,
    /// Inform hysteresis endpoint resets with the measured OCV error
    pub hysteresis_e_wrap: bool,
    /// Bench mode: no coulombic efficiency on charge
    pub tweak_test: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            bank: BankConfig::default(),
            temp_rate_limit: DEFAULT_TEMP_RATE_LIMIT_C_PER_S,
            soc_min: DEFAULT_SOC_MIN,
            soc_max: DEFAULT_SOC_MAX,
            ekf: EkfConfig::default(),
            saturation: SaturationConfig::default(),
            low_anchor: LowAnchorConfig::default(),
            blend: BlendConfig::default(),
            hysteresis_e_wrap: true,
            tweak_test: false,
        }
    }
}

impl EstimatorConfig {
    /// Set bank geometry: per-battery capacity (Ah), series and parallel counts
    pub fn with_bank(mut self, rated_capacity_ah: f64, series_count: u8, parallel_count: u8) -> Self {
        self.bank.rated_capacity_ah = rated_capacity_ah;
        self.bank.series_count = series_count;
        self.bank.parallel_count = parallel_count;
        self
    }

    /// Set the capacity multiplier
    pub fn with_capacity_scalar(mut self, scalar: f64) -> Self {
        self.bank.capacity_scalar = scalar;
        self
    }

    /// Set the temperature slew limit (°C/s)
    pub fn with_temp_rate_limit(mut self, rate: f64) -> Self {
        self.temp_rate_limit = rate;
        self
    }

    /// Set physical SOC bounds
    pub fn with_soc_bounds(mut self, soc_min: f64, soc_max: f64) -> Self {
        self.soc_min = soc_min;
        self.soc_max = soc_max;
        self
    }

    /// Set EKF process (higher = less trust in the model) and measurement noise
    pub fn with_ekf_noise(mut self, q: f64, r: f64) -> Self {
        self.ekf.q = q;
        self.ekf.r = r;
        self
    }

    /// Set the covariance used at every EKF (re)initialisation
    pub fn with_ekf_initial_covariance(mut self, p0: f64) -> Self {
        self.ekf.p0 = p0;
        self
    }

    /// Set saturation dwell times (s)
    pub fn with_saturation_delay(mut self, t_true_s: f64, t_false_s: f64) -> Self {
        self.saturation.t_true_s = t_true_s;
        self.saturation.t_false_s = t_false_s;
        self
    }

    /// Enable or disable the low anchor
    pub fn with_low_anchor(mut self, enabled: bool) -> Self {
        self.low_anchor.enabled = enabled;
        self
    }

    /// Set the blend schedule
    pub fn with_blend(mut self, weight_after_reset: f64, weight_tracking: f64, recovery_tau_s: f64) -> Self {
        self.blend = BlendConfig {
            weight_after_reset,
            weight_tracking,
            recovery_tau_s,
        };
        self
    }

    /// Bench mode: no coulombic efficiency on charge
    pub fn with_tweak_test(mut self, tweak_test: bool) -> Self {
        self.tweak_test = tweak_test;
        self
    }

    /// Check every field
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_positive(self.bank.rated_capacity_ah, "rated_capacity_ah")?;
        ensure_positive(self.bank.capacity_scalar, "capacity_scalar")?;
        if self.bank.series_count == 0 || self.bank.parallel_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bank",
                reason: "series and parallel counts must be at least 1",
            });
        }
        ensure_positive(self.temp_rate_limit, "temp_rate_limit")?;

        ensure_finite(self.soc_min, "soc_min")?;
        ensure_finite(self.soc_max, "soc_max")?;
        if self.soc_min >= self.soc_max {
            return Err(ConfigError::InvalidParameter {
                name: "soc_min",
                reason: "must be below soc_max",
            });
        }

        ensure_finite(self.ekf.q, "ekf.q")?;
        if self.ekf.q < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "ekf.q",
                reason: "process noise must be non-negative",
            });
        }
        ensure_positive(self.ekf.r, "ekf.r")?;
        ensure_positive(self.ekf.p0, "ekf.p0")?;

        for (value, name) in [
            (self.saturation.t_true_s, "saturation.t_true_s"),
            (self.saturation.t_false_s, "saturation.t_false_s"),
            (self.low_anchor.t_true_s, "low_anchor.t_true_s"),
            (self.low_anchor.t_false_s, "low_anchor.t_false_s"),
            (self.blend.recovery_tau_s, "blend.recovery_tau_s"),
        ] {
            ensure_finite(value, name)?;
            if value < 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "time must be non-negative",
                });
            }
        }

        for (value, name) in [
            (self.blend.weight_after_reset, "blend.weight_after_reset"),
            (self.blend.weight_tracking, "blend.weight_tracking"),
        ] {
            ensure_finite(value, name)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "weight must lie in [0, 1]",
                });
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl Serialize for EstimatorConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EstimatorConfig::serialize(self, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for EstimatorConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let config = EstimatorConfig::deserialize(deserializer)?;
        config.validate().map_err(serde::de::Error::custom)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EstimatorConfig::default().validate().unwrap();
    }

    #[test]
    fn builders_set_fields() {
        let c = EstimatorConfig::default()
            .with_bank(200.0, 4, 3)
            .with_blend(0.9, 0.3, 120.0)
            .with_low_anchor(false)
            .with_tweak_test(true);
        assert_eq!(c.bank.series_count, 4);
        assert_eq!(c.bank.bank_capacity_ah(), 600.0);
        assert_eq!(c.blend.weight_tracking, 0.3);
        assert!(!c.low_anchor.enabled);
        assert!(c.tweak_test);
        c.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            EstimatorConfig::default().with_bank(0.0, 1, 1),
            EstimatorConfig::default().with_bank(100.0, 0, 1),
            EstimatorConfig::default().with_soc_bounds(1.0, 0.0),
            EstimatorConfig::default().with_ekf_noise(1e-6, 0.0),
            EstimatorConfig::default().with_blend(1.5, 0.5, 600.0),
            EstimatorConfig::default().with_saturation_delay(-1.0, 0.0),
            EstimatorConfig::default().with_temp_rate_limit(f64::NAN),
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
