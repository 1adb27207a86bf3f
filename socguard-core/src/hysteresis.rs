//! Voltage Hysteresis Model
//!
//! ## Physics Background
//!
//! LFP cells rest at a different voltage after charging than after
//! discharging at the same SOC. The gap is tens of millivolts per cell, which
//! on the flat LFP plateau is worth tens of percent of SOC. The estimator
//! models it as a voltage `dv_hys` on an RC element driven by bank current:
//!
//! ```text
//!            I·slr(dv, soc)
//!     ──────────────────────►──┬──────────┐
//!                              │          │
//!                            ┌─┴─┐      ──┴──
//!                  R(dv,soc) │   │      ──┬── C·cap_scalar
//!                            └─┬─┘        │
//!     ─────────────────────────┴──────────┘
//!
//!     dv_dot = (I·slr − dv/R) / (C·cap_scalar)
//! ```
//!
//! `R` and the current scalar `slr` are tables over `(dv_hys, soc)`. A
//! near-zero resistance at the edges of the table is a deliberate short that
//! stops the state from running further.
//!
//! ## Integration
//!
//! 1. **Aliasing guard**: if `R·C < 4·dt` the RC pole is faster than the
//!    loop can resolve and explicit Euler would blow up. The state snaps to
//!    the bound in the direction of the current instead.
//! 2. **Endpoint reset**: on a fresh saturation (`init_high`) or low anchor
//!    (`init_low`) the state is known to sit at an extreme. It snaps there and
//!    `dv_dot` is zeroed so the next step doesn't regenerate a rate from the
//!    stale resistance.
//! 3. **Normal path**: `dv_hys += dv_dot·dt`.
//!
//! Every path ends with a clamp to `[dv_min(soc), dv_max(soc)]`.
//!
//! ## Output Scaling
//!
//! The reported hysteresis voltage is `dv_hys · scale`, with separate charge
//! (`dv_hys ≥ 0`) and discharge scales. Both scales below
//! [`HYSTERESIS_DISABLE_SCALE`] switch the model off entirely.

use crate::chemistry::{Chemistry, ChemistryId};
use crate::constants::physics::{HYSTERESIS_ALIAS_FACTOR, HYSTERESIS_DISABLE_SCALE};

/// Hysteresis RC state
#[derive(Debug, Clone, Default)]
pub struct Hysteresis {
    dv_hys: f64,
    dv_dot: f64,
    resistance: f64,
    current_scalar: f64,
    capacitance: f64,
    chemistry_id: ChemistryId,
    dv_max: f64,
    dv_min: f64,
    dv_min_abs: f64,
    current_in: f64,
    current_through_resistor: f64,
    soc: f64,
    scale_charge: f64,
    scale_discharge: f64,
    disabled: bool,
    output: f64,
}

impl Hysteresis {
    /// Zero hysteresis
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the tables at the present state and compute `dv_dot` (V/s).
    ///
    /// `current` is bank current, positive charging.
    pub fn calculate_hys(&mut self, chem: &Chemistry, current: f64, soc: f64) -> f64 {
        let p = &chem.hysteresis;
        self.chemistry_id = chem.id;
        self.current_in = current;
        self.soc = soc;
        self.capacitance = p.capacitance;
        self.scale_charge = p.scale_charge;
        self.scale_discharge = p.scale_discharge;
        self.dv_min_abs = p.dv_min_abs;
        self.dv_max = p.dv_max.interp(soc);
        self.dv_min = p.dv_min.interp(soc);

        self.disabled = self.scale_charge < HYSTERESIS_DISABLE_SCALE
            && self.scale_discharge < HYSTERESIS_DISABLE_SCALE;
        if self.disabled {
            self.dv_dot = 0.0;
            return 0.0;
        }

        self.resistance = p.resistance.interp(self.dv_hys, soc);
        self.current_scalar = p.current_scalar.interp(self.dv_hys, soc);
        self.current_through_resistor = if self.resistance > 0.0 {
            self.dv_hys / self.resistance
        } else {
            0.0
        };

        let cap_scalar = if current >= 0.0 {
            p.cap_scalar_charge
        } else {
            p.cap_scalar_discharge
        };
        self.dv_dot = (current * self.current_scalar - self.current_through_resistor)
            / self.capacitance
            / cap_scalar;
        self.dv_dot
    }

    /// Advance one step of `dt` seconds and return the scaled hysteresis voltage.
    ///
    /// `e_wrap` is the predicted minus measured static OCV; when given, an
    /// endpoint reset lands on `-e_wrap` (at least `dv_min_abs` in magnitude)
    /// rather than on the bound itself.
    pub fn update(&mut self, dt: f64, init_high: bool, init_low: bool, e_wrap: Option<f64>) -> f64 {
        if self.disabled {
            self.dv_hys = 0.0;
            self.dv_dot = 0.0;
            self.output = 0.0;
            return 0.0;
        }

        let wrap = e_wrap.filter(|e| e.is_finite());
        if init_high {
            self.dv_hys = match wrap {
                Some(e) => (-e).max(self.dv_min_abs).min(self.dv_max),
                None => self.dv_max,
            };
            self.dv_dot = 0.0;
        } else if init_low {
            self.dv_hys = match wrap {
                Some(e) => (-e).min(-self.dv_min_abs).max(self.dv_min),
                None => self.dv_min,
            };
            self.dv_dot = 0.0;
        } else if self.resistance * self.capacitance < HYSTERESIS_ALIAS_FACTOR * dt {
            if self.current_in > 0.0 {
                self.dv_hys = self.dv_max;
            } else if self.current_in < 0.0 {
                self.dv_hys = self.dv_min;
            }
        } else {
            self.dv_hys += self.dv_dot * dt;
        }

        // max/min rather than clamp: bad tables may cross the bounds
        self.dv_hys = self.dv_hys.max(self.dv_min).min(self.dv_max);

        let scale = if self.dv_hys >= 0.0 {
            self.scale_charge
        } else {
            self.scale_discharge
        };
        self.output = self.dv_hys * scale;
        self.output
    }

    /// Restore a retained hysteresis voltage
    pub fn load(&mut self, dv_hys: f64) {
        self.dv_hys = if dv_hys.is_finite() { dv_hys } else { 0.0 };
        self.dv_dot = 0.0;
    }

    /// Unscaled hysteresis state (V)
    pub fn dv_hys(&self) -> f64 {
        self.dv_hys
    }

    /// Scaled hysteresis voltage from the last update (V)
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Rate from the last `calculate_hys` (V/s)
    pub fn dv_dot(&self) -> f64 {
        self.dv_dot
    }

    /// Resistance from the last table lookup (Ω)
    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Current scalar from the last table lookup
    pub fn current_scalar(&self) -> f64 {
        self.current_scalar
    }

    /// Capacitance in use (F)
    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    /// Upper bound at the last SOC (V)
    pub fn dv_max(&self) -> f64 {
        self.dv_max
    }

    /// Lower bound at the last SOC (V)
    pub fn dv_min(&self) -> f64 {
        self.dv_min
    }

    /// Leakage current through the resistance (A)
    pub fn current_through_resistor(&self) -> f64 {
        self.current_through_resistor
    }

    /// Current seen by the last `calculate_hys` (A)
    pub fn current_in(&self) -> f64 {
        self.current_in
    }

    /// SOC seen by the last `calculate_hys`
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Chemistry seen by the last `calculate_hys`
    pub fn chemistry_id(&self) -> ChemistryId {
        self.chemistry_id
    }

    /// Whether the chemistry's scales switch the model off
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{Table1D, Table2D};

    /// Constant resistance and ±`bound` limits
    fn uniform(resistance: f64, bound: f64) -> Chemistry {
        let mut chem = Chemistry::battleborn().unwrap();
        let h = &mut chem.hysteresis;
        h.resistance = Table2D::new(&[-1.0, 1.0], &[0.0, 1.0], &[resistance; 4]).unwrap();
        h.current_scalar = Table2D::new(&[-1.0, 1.0], &[0.0, 1.0], &[1.0; 4]).unwrap();
        h.dv_max = Table1D::new(&[0.0, 1.0], &[bound, bound]).unwrap();
        h.dv_min = Table1D::new(&[0.0, 1.0], &[-bound, -bound]).unwrap();
        h.capacitance = 3.6e4;
        h.cap_scalar_charge = 1.0;
        h.cap_scalar_discharge = 1.0;
        chem
    }

    fn run(hys: &mut Hysteresis, chem: &Chemistry, current: f64, soc: f64, dt: f64, steps: usize) -> f64 {
        let mut out = 0.0;
        for _ in 0..steps {
            hys.calculate_hys(chem, current, soc);
            out = hys.update(dt, false, false, None);
        }
        out
    }

    #[test]
    fn rc_step_response() {
        let chem = uniform(0.015, 0.3);
        let mut hys = Hysteresis::new();
        let dv = run(&mut hys, &chem, 20.0, 0.5, 10.0, 100);

        // explicit Euler: 0.3·(1 − (1 − 10/540)^100)
        let euler = 0.3 * (1.0 - libm::pow(1.0 - 10.0 / 540.0, 100.0));
        assert!((dv - euler).abs() < 1e-9);
        let analytic = 0.3 * (1.0 - libm::exp(-1000.0 / 540.0));
        assert!((dv - analytic).abs() < 2e-3);
        assert!(dv < 0.3);
    }

    #[test]
    fn rc_step_response_clamps_at_bound() {
        let chem = uniform(0.015, 0.2);
        let mut hys = Hysteresis::new();
        let dv = run(&mut hys, &chem, 20.0, 0.5, 10.0, 100);
        assert_eq!(dv, 0.2);
        assert_eq!(hys.dv_max(), 0.2);
    }

    #[test]
    fn shorted_resistance_snaps_by_current_sign() {
        let chem = uniform(1e-6, 0.15);
        let mut hys = Hysteresis::new();
        assert_eq!(run(&mut hys, &chem, 5.0, 0.5, 1.0, 1), 0.15);
        assert_eq!(run(&mut hys, &chem, 0.0, 0.5, 1.0, 1), 0.15);
        assert_eq!(run(&mut hys, &chem, -5.0, 0.5, 1.0, 1), -0.15);
    }

    #[test]
    fn endpoint_reset_without_wrap() {
        let chem = uniform(0.015, 0.2);
        let mut hys = Hysteresis::new();
        hys.calculate_hys(&chem, 10.0, 0.5);
        assert_eq!(hys.update(1.0, true, false, None), 0.2);
        assert_eq!(hys.dv_dot(), 0.0);
        hys.calculate_hys(&chem, -10.0, 0.5);
        assert_eq!(hys.update(1.0, false, true, None), -0.2);
        assert_eq!(hys.dv_dot(), 0.0);
    }

    #[test]
    fn endpoint_reset_with_wrap() {
        let chem = uniform(0.015, 0.2);
        let min_abs = chem.hysteresis.dv_min_abs;
        let mut hys = Hysteresis::new();

        hys.calculate_hys(&chem, 10.0, 0.5);
        assert!((hys.update(1.0, true, false, Some(-0.1)) - 0.1).abs() < 1e-12);
        hys.calculate_hys(&chem, 10.0, 0.5);
        assert_eq!(hys.update(1.0, true, false, Some(-0.01)), min_abs);
        hys.calculate_hys(&chem, 10.0, 0.5);
        assert_eq!(hys.update(1.0, true, false, Some(-1.0)), 0.2);

        hys.calculate_hys(&chem, -10.0, 0.5);
        assert!((hys.update(1.0, false, true, Some(0.1)) + 0.1).abs() < 1e-12);
        hys.calculate_hys(&chem, -10.0, 0.5);
        assert_eq!(hys.update(1.0, false, true, Some(0.0)), -min_abs);
    }

    #[test]
    fn asymmetric_output_scale() {
        let mut chem = uniform(1e-6, 0.15);
        chem.hysteresis.scale_discharge = 0.5;
        let mut hys = Hysteresis::new();
        assert_eq!(run(&mut hys, &chem, -5.0, 0.5, 1.0, 1), -0.075);
        assert_eq!(hys.dv_hys(), -0.15);
    }

    #[test]
    fn zero_scales_disable() {
        let mut chem = uniform(0.015, 0.2);
        chem.hysteresis.scale_charge = 0.0;
        chem.hysteresis.scale_discharge = 0.0;
        let mut hys = Hysteresis::new();
        hys.load(0.1);
        assert_eq!(hys.calculate_hys(&chem, 50.0, 0.5), 0.0);
        assert_eq!(hys.update(10.0, true, false, None), 0.0);
        assert!(hys.is_disabled());
    }

    #[test]
    fn built_in_tables_stay_bounded() {
        for chem in [Chemistry::battleborn().unwrap(), Chemistry::chins().unwrap()] {
            let mut hys = Hysteresis::new();
            let profile = [(40.0, 0.9), (-60.0, 0.3), (0.0, 0.5), (100.0, 1.0), (-5.0, 0.05)];
            for &(current, soc) in profile.iter().cycle().take(500) {
                hys.calculate_hys(&chem, current, soc);
                hys.update(5.0, false, false, None);
                assert!(hys.dv_hys() <= hys.dv_max() && hys.dv_hys() >= hys.dv_min());
            }
        }
    }

    #[test]
    fn load_rejects_non_finite() {
        let mut hys = Hysteresis::new();
        hys.load(f64::NAN);
        assert_eq!(hys.dv_hys(), 0.0);
    }
}
