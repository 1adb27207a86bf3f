//! Coulomb Counter
//!
//! ## Overview
//!
//! Integrates bank current into a charge deficit `delta_q` (C, always ≤ 0)
//! measured down from "full at the present temperature":
//!
//! ```text
//! q_capacity = rated_scaled · (1 + k·(T_lim − T_rated))       k signed by the chemistry's law
//! delta_q'   = clamp(delta_q + I·dt·[eff if charging] − k·q_capacity·(T_lim − T_last), −q_capacity, 0)
//! soc        = (q_capacity + delta_q') / q_capacity
//! ```
//!
//! The temperature term runs every step, not only at reset. Both capacity and
//! what "full" means move with temperature even mid-discharge.
//!
//! ## Saturation Top-Off
//!
//! Integration drifts. The counter's drift correction is free: whenever the
//! bank is detected saturated while still being charged, the increment is
//! dropped and `delta_q` snaps to 0. A bank that reaches full every day is
//! recalibrated every day.
//!
//! The snap is suppressed for exactly one step after an explicit state
//! assignment ([`CoulombCounter::apply_soc`], [`CoulombCounter::apply_delta_q_t`])
//! so a deliberate assignment is never overwritten by a stale saturation flag.
//!
//! ## Temperature Input
//!
//! Temperature is slew-limited before it reaches the capacity law. A noisy or
//! jumping sensor would otherwise move `q_capacity` (and with it the reported
//! SOC) every cycle. A `reset` jumps straight to the measured temperature.
//!
//! ## Retained State
//!
//! `(delta_q, t_last)` is the pair an embedded host writes to non-volatile
//! memory: [`CoulombCounter::update`] reads it and [`CoulombCounter::load`]
//! restores it after power-up.
//!
//! ```rust
//! use socguard_core::{chemistry::Chemistry, coulomb::CoulombCounter};
//!
//! let chem = Chemistry::battleborn().unwrap();
//! let mut cc = CoulombCounter::new(100.0, 0.017).unwrap();
//! cc.count_coulombs(&chem, 1.0, true, 25.0, 0.0, false);
//! for _ in 0..3600 {
//!     cc.count_coulombs(&chem, 1.0, false, 25.0, -10.0, false);
//! }
//! assert!((cc.soc() - 0.9).abs() < 1e-9);
//! ```

use crate::chemistry::Chemistry;
use crate::constants::physics::{COULOMBS_PER_AMP_HOUR, MIN_CAPACITY_FRACTION, REFERENCE_TEMP_C};
use crate::errors::{ensure_positive, ConfigResult};
use crate::filters::RateLimit;

/// Charge integrator with saturation top-off and temperature compensation
#[derive(Debug, Clone)]
pub struct CoulombCounter {
    delta_q: f64,
    q: f64,
    q_capacity: f64,
    rated_capacity: f64,
    rated_capacity_scaled: f64,
    rated_temp: f64,
    temp_rate_limit: f64,
    temp_limiter: RateLimit,
    last_temperature: f64,
    temperature_limited: f64,
    soc: f64,
    soc_floor: f64,
    q_floor: f64,
    saturated: bool,
    resetting: bool,
    tweak_test: bool,
    capacity_floored: bool,
}

impl CoulombCounter {
    /// Counter for a bank of `rated_capacity_ah`, starting full.
    ///
    /// `temp_rate_limit` is the temperature slew limit in °C/s.
    pub fn new(rated_capacity_ah: f64, temp_rate_limit: f64) -> ConfigResult<Self> {
        let rated = ensure_positive(rated_capacity_ah, "rated_capacity_ah")? * COULOMBS_PER_AMP_HOUR;
        let temp_rate_limit = ensure_positive(temp_rate_limit, "temp_rate_limit")?;
        Ok(Self {
            delta_q: 0.0,
            q: rated,
            q_capacity: rated,
            rated_capacity: rated,
            rated_capacity_scaled: rated,
            rated_temp: REFERENCE_TEMP_C,
            temp_rate_limit,
            temp_limiter: RateLimit::symmetric(temp_rate_limit),
            last_temperature: REFERENCE_TEMP_C,
            temperature_limited: REFERENCE_TEMP_C,
            soc: 1.0,
            soc_floor: 0.0,
            q_floor: 0.0,
            saturated: false,
            resetting: false,
            tweak_test: false,
            capacity_floored: false,
        })
    }

    /// Scale rated capacity, e.g. for an aged or de-rated bank
    pub fn with_capacity_scalar(mut self, scalar: f64) -> ConfigResult<Self> {
        let scalar = ensure_positive(scalar, "capacity_scalar")?;
        self.rated_capacity_scaled = self.rated_capacity * scalar;
        self.q_capacity = self.rated_capacity_scaled;
        self.q = self.q_capacity + self.delta_q;
        Ok(self)
    }

    /// Disable coulombic efficiency on charge (bench testing)
    pub fn with_tweak_test(mut self, tweak_test: bool) -> Self {
        self.tweak_test = tweak_test;
        self
    }

    /// Advance one step and return the new SOC.
    ///
    /// `charge_current` is positive when charging (A). `is_saturated` is the
    /// caller's (debounced) saturation detection.
    pub fn count_coulombs(
        &mut self,
        chem: &Chemistry,
        dt: f64,
        reset: bool,
        temperature: f64,
        charge_current: f64,
        is_saturated: bool,
    ) -> f64 {
        let first = !self.temp_limiter.is_initialized();
        self.temperature_limited = self.temp_limiter.calculate(temperature, reset || first, dt);
        if first {
            self.last_temperature = self.temperature_limited;
        }

        let k = chem.capacity.signed_dqdt();
        self.rated_temp = chem.capacity.rated_temp;
        self.q_capacity = self.capacity_at(k, self.temperature_limited);

        let charging = charge_current > 0.0;
        let mut d_delta_q = charge_current * dt;
        if charging && !self.tweak_test {
            d_delta_q *= chem.capacity.coulombic_efficiency;
        }

        self.saturated = is_saturated;
        if is_saturated && charging {
            d_delta_q = 0.0;
            if !self.resetting {
                self.delta_q = 0.0;
            }
        }

        let temp_comp = k * self.q_capacity * (self.temperature_limited - self.last_temperature);
        self.delta_q = (self.delta_q + d_delta_q - temp_comp).clamp(-self.q_capacity, 0.0);

        self.refresh(chem);
        self.last_temperature = self.temperature_limited;
        self.resetting = false;
        self.soc
    }

    /// Assign the state from a known SOC at `temperature`
    pub fn apply_soc(&mut self, chem: &Chemistry, soc: f64, temperature: f64) {
        self.jump_temperature(chem, temperature);
        let soc = soc.clamp(0.0, 1.0);
        self.delta_q = (soc - 1.0) * self.q_capacity;
        self.refresh(chem);
        self.resetting = true;
    }

    /// Assign the state from a stored charge deficit at `temperature`
    pub fn apply_delta_q_t(&mut self, chem: &Chemistry, delta_q: f64, temperature: f64) {
        self.jump_temperature(chem, temperature);
        self.delta_q = if delta_q.is_finite() {
            delta_q.clamp(-self.q_capacity, 0.0)
        } else {
            0.0
        };
        self.refresh(chem);
        self.resetting = true;
    }

    /// Restore the retained pair after power-up
    pub fn load(&mut self, delta_q: f64, t_last: f64) {
        self.delta_q = if delta_q.is_finite() { delta_q.min(0.0) } else { 0.0 };
        if t_last.is_finite() {
            self.last_temperature = t_last;
            self.temperature_limited = t_last;
            self.temp_limiter.load(t_last);
        }
        self.q = self.q_capacity + self.delta_q;
    }

    /// The retained pair `(delta_q, t_last)`
    pub fn update(&self) -> (f64, f64) {
        (self.delta_q, self.last_temperature)
    }

    /// SOC (fraction of capacity at the present temperature)
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Charge deficit (C, ≤ 0)
    pub fn delta_q(&self) -> f64 {
        self.delta_q
    }

    /// Present charge (C)
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Capacity at the rate-limited temperature (C)
    pub fn q_capacity(&self) -> f64 {
        self.q_capacity
    }

    /// Rated capacity before scaling (C)
    pub fn rated_capacity(&self) -> f64 {
        self.rated_capacity
    }

    /// Rated capacity after scaling (C)
    pub fn rated_capacity_scaled(&self) -> f64 {
        self.rated_capacity_scaled
    }

    /// Temperature at which rated capacity applies (°C)
    pub fn rated_temp(&self) -> f64 {
        self.rated_temp
    }

    /// Temperature slew limit (°C/s)
    pub fn temp_rate_limit(&self) -> f64 {
        self.temp_rate_limit
    }

    /// Rate-limited temperature (°C)
    pub fn temperature_limited(&self) -> f64 {
        self.temperature_limited
    }

    /// Temperature at the end of the last step (°C)
    pub fn last_temperature(&self) -> f64 {
        self.last_temperature
    }

    /// Minimum usable SOC at the present temperature
    pub fn soc_floor(&self) -> f64 {
        self.soc_floor
    }

    /// Minimum usable charge at the present temperature (C)
    pub fn q_floor(&self) -> f64 {
        self.q_floor
    }

    /// Saturation flag seen by the last step
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    /// Whether the next step will skip the saturation snap
    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    fn jump_temperature(&mut self, chem: &Chemistry, temperature: f64) {
        self.temperature_limited = self.temp_limiter.calculate(temperature, true, 0.0);
        self.last_temperature = self.temperature_limited;
        self.rated_temp = chem.capacity.rated_temp;
        self.q_capacity = self.capacity_at(chem.capacity.signed_dqdt(), self.temperature_limited);
    }

    fn refresh(&mut self, chem: &Chemistry) {
        self.q = self.q_capacity + self.delta_q;
        self.soc = self.q / self.q_capacity;
        self.soc_floor = chem.capacity.soc_min.interp(self.temperature_limited);
        self.q_floor = self.soc_floor * self.q_capacity;
    }

    /// Capacity law with a floor for degenerate results
    fn capacity_at(&mut self, k: f64, temperature: f64) -> f64 {
        let capacity = self.rated_capacity_scaled * (1.0 + k * (temperature - self.rated_temp));
        let floor = MIN_CAPACITY_FRACTION * self.rated_capacity_scaled;
        if capacity.is_finite() && capacity >= floor {
            self.capacity_floored = false;
            capacity
        } else {
            if !self.capacity_floored {
                log_warn!(
                    "Capacity {} C at {} °C below floor, using {} C",
                    capacity,
                    temperature,
                    floor
                );
            }
            self.capacity_floored = true;
            floor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::CapacityTempLaw;

    fn chem() -> Chemistry {
        Chemistry::battleborn().unwrap()
    }

    fn counter() -> CoulombCounter {
        CoulombCounter::new(100.0, 0.017).unwrap()
    }

    fn discharge_one_hour(cc: &mut CoulombCounter, chem: &Chemistry) {
        cc.count_coulombs(chem, 1.0, true, 25.0, 0.0, false);
        for _ in 0..3600 {
            cc.count_coulombs(chem, 1.0, false, 25.0, -10.0, false);
        }
    }

    #[test]
    fn ten_amp_hour_discharge() {
        let chem = chem();
        let mut cc = counter();
        discharge_one_hour(&mut cc, &chem);
        assert!((cc.delta_q() + 36000.0).abs() < 1e-6);
        assert!((cc.soc() - 0.90).abs() < 1e-9);
        assert_eq!(cc.q_capacity(), 360000.0);
    }

    #[test]
    fn saturated_charge_tops_off() {
        let chem = chem();
        let mut cc = counter();
        discharge_one_hour(&mut cc, &chem);
        cc.count_coulombs(&chem, 1.0, false, 25.0, 5.0, true);
        assert_eq!(cc.delta_q(), 0.0);
        assert_eq!(cc.soc(), 1.0);
        // stays full while charging continues
        cc.count_coulombs(&chem, 1.0, false, 25.0, 5.0, true);
        assert_eq!(cc.soc(), 1.0);
        // and leaves full once current reverses
        cc.count_coulombs(&chem, 1.0, false, 25.0, -5.0, true);
        assert!(cc.soc() < 1.0);
    }

    #[test]
    fn charge_applies_efficiency() {
        let chem = chem();
        let mut cc = counter();
        cc.apply_soc(&chem, 0.5, 25.0);
        let before = cc.delta_q();
        for _ in 0..100 {
            cc.count_coulombs(&chem, 1.0, false, 25.0, 10.0, false);
        }
        let expected = 100.0 * 10.0 * chem.capacity.coulombic_efficiency;
        assert!((cc.delta_q() - before - expected).abs() < 1e-6);
    }

    #[test]
    fn tweak_test_disables_efficiency() {
        let chem = chem();
        let mut cc = counter().with_tweak_test(true);
        cc.apply_soc(&chem, 0.5, 25.0);
        let before = cc.delta_q();
        cc.count_coulombs(&chem, 10.0, false, 25.0, 10.0, false);
        assert!((cc.delta_q() - before - 100.0).abs() < 1e-9);
    }

    #[test]
    fn assignment_suppresses_one_snap() {
        let chem = chem();
        let mut cc = counter();
        cc.count_coulombs(&chem, 1.0, true, 25.0, 0.0, false);
        cc.apply_soc(&chem, 0.6, 25.0);
        assert!(cc.is_resetting());
        cc.count_coulombs(&chem, 1.0, false, 25.0, 5.0, true);
        assert!((cc.soc() - 0.6).abs() < 1e-9);
        assert!(!cc.is_resetting());
        cc.count_coulombs(&chem, 1.0, false, 25.0, 5.0, true);
        assert_eq!(cc.soc(), 1.0);
    }

    #[test]
    fn delta_q_never_positive_or_below_capacity() {
        let chem = chem();
        let mut cc = counter();
        cc.count_coulombs(&chem, 1.0, true, 25.0, 0.0, false);
        cc.count_coulombs(&chem, 100.0, false, 25.0, 50.0, false);
        assert_eq!(cc.delta_q(), 0.0);
        cc.count_coulombs(&chem, 3600.0, false, 25.0, -500.0, false);
        assert_eq!(cc.delta_q(), -cc.q_capacity());
        assert_eq!(cc.soc(), 0.0);
    }

    #[test]
    fn temperature_is_rate_limited() {
        let chem = chem();
        let mut cc = counter();
        cc.count_coulombs(&chem, 1.0, true, 25.0, 0.0, false);
        cc.count_coulombs(&chem, 1.0, false, 35.0, 0.0, false);
        assert!((cc.temperature_limited() - 25.017).abs() < 1e-12);
        cc.count_coulombs(&chem, 1.0, true, 35.0, 0.0, false);
        assert_eq!(cc.temperature_limited(), 35.0);
    }

    #[test]
    fn warming_compensates_deficit() {
        let chem = chem();
        let mut cc = CoulombCounter::new(100.0, 100.0).unwrap();
        discharge_one_hour(&mut cc, &chem);
        cc.count_coulombs(&chem, 1.0, false, 35.0, 0.0, false);
        let cap = 360000.0 * (1.0 + 0.01 * 10.0);
        assert!((cc.q_capacity() - cap).abs() < 1e-6);
        let expected = -36000.0 - 0.01 * cap * 10.0;
        assert!((cc.delta_q() - expected).abs() < 1e-6);
    }

    #[test]
    fn decreasing_law_shrinks_capacity_when_warm() {
        let chem = chem()
            .with_capacity_law(CapacityTempLaw::Decreasing, 0.01)
            .unwrap();
        let mut cc = counter();
        cc.count_coulombs(&chem, 1.0, true, 35.0, 0.0, false);
        assert!((cc.q_capacity() - 360000.0 * 0.9).abs() < 1e-6);
    }

    #[test]
    fn degenerate_capacity_uses_floor() {
        let chem = chem()
            .with_capacity_law(CapacityTempLaw::Decreasing, 0.05)
            .unwrap();
        let mut cc = counter();
        let soc = cc.count_coulombs(&chem, 1.0, true, 50.0, 0.0, false);
        assert_eq!(cc.q_capacity(), MIN_CAPACITY_FRACTION * 360000.0);
        assert!(soc.is_finite());
    }

    #[test]
    fn soc_floor_from_derating_table() {
        let chem = chem();
        let mut cc = counter();
        cc.count_coulombs(&chem, 1.0, true, 0.0, 0.0, false);
        assert_eq!(cc.soc_floor(), 0.35);
        assert!((cc.q_floor() - 0.35 * cc.q_capacity()).abs() < 1e-9);
    }

    #[test]
    fn retained_pair_round_trip() {
        let chem = chem();
        let mut cc = counter();
        discharge_one_hour(&mut cc, &chem);
        let (dq, t) = cc.update();

        let mut restored = counter();
        restored.load(dq, t);
        restored.count_coulombs(&chem, 1.0, false, 25.0, 0.0, false);
        assert_eq!(restored.delta_q(), dq);
        assert!((restored.soc() - cc.soc()).abs() < 1e-12);
    }

    #[test]
    fn invalid_capacity_rejected() {
        assert!(CoulombCounter::new(0.0, 0.017).is_err());
        assert!(CoulombCounter::new(100.0, f64::NAN).is_err());
    }
}
