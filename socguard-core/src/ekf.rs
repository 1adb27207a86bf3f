//! Scalar Extended Kalman Filter
//!
//! ## Overview
//!
//! One state (SOC), one measurement (terminal voltage). The process and
//! measurement functions come from an [`ObservationModel`] supplied on every
//! call, so the filter itself knows nothing about batteries.
//!
//! ## Algorithm
//!
//! ```text
//! Predict:
//!   (Fx, Bu) = model.predict(u)
//!   x = Fx·x + Bu·u
//!   P = Fx²·P + Q
//!
//! Update:
//!   (hx, H) = model.observe(x)
//!   S = H²·P + R
//!   K = H·P / S                 (previous K held when |S| ≤ tolerance)
//!   y = z − hx
//!   x = clamp(x + K·y, x_min, x_max)
//!   P = max((1 − K·H)·P, 0)
//! ```
//!
//! ## Lifecycle
//!
//! `Uninitialized → Tracking` through [`Ekf1x1::init`]. The filter never
//! re-initialises itself; the caller decides when a reset event warrants it.
//! Calls on an uninitialised filter are ignored with a warning.
//!
//! ## Numerical Guards
//!
//! - A flat OCV region can drive `H` (and with it `S − R`) to zero. A
//!   near-zero `S` keeps the last gain instead of dividing by it.
//! - `(1 − K·H)·P` can round slightly negative; `P` is floored at zero.
//! - Nothing in the linear update keeps SOC physical, hence the clamp.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::tuning::EKF_S_TOLERANCE;
use crate::errors::{ensure_finite, ensure_positive, ConfigError, ConfigResult};
use crate::traits::ObservationModel;

/// Filter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EkfMode {
    /// `init` not yet called
    #[default]
    Uninitialized,
    /// Running
    Tracking,
}

/// One-state EKF
#[derive(Debug, Clone)]
pub struct Ekf1x1 {
    x: f64,
    p: f64,
    q: f64,
    r: f64,
    h: f64,
    fx: f64,
    bu: f64,
    hx: f64,
    y: f64,
    k: f64,
    s: f64,
    x_prior: f64,
    p_prior: f64,
    mode: EkfMode,
    gain_held: bool,
}

impl Ekf1x1 {
    /// Filter with process noise `q` and measurement noise `r`
    pub fn new(q: f64, r: f64) -> ConfigResult<Self> {
        ensure_finite(q, "ekf_q")?;
        if q < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "ekf_q",
                reason: "process noise must be non-negative",
            });
        }
        let r = ensure_positive(r, "ekf_r")?;
        Ok(Self {
            x: 0.0,
            p: 0.0,
            q,
            r,
            h: 0.0,
            fx: 1.0,
            bu: 0.0,
            hx: 0.0,
            y: 0.0,
            k: 0.0,
            s: 0.0,
            x_prior: 0.0,
            p_prior: 0.0,
            mode: EkfMode::Uninitialized,
            gain_held: false,
        })
    }

    /// Set the state and covariance and start tracking
    pub fn init(&mut self, x0: f64, p0: f64) {
        self.x = x0;
        self.p = if p0.is_finite() { p0.max(0.0) } else { 0.0 };
        self.x_prior = self.x;
        self.p_prior = self.p;
        self.y = 0.0;
        self.mode = EkfMode::Tracking;
    }

    /// Time update with input `u`
    pub fn predict<M: ObservationModel + ?Sized>(&mut self, model: &mut M, u: f64) {
        if self.mode == EkfMode::Uninitialized {
            log_warn!("EKF predict before init ignored");
            return;
        }
        let (fx, bu) = model.predict(u);
        self.fx = fx;
        self.bu = bu;
        self.x = fx * self.x + bu * u;
        self.p = fx * fx * self.p + self.q;
        self.x_prior = self.x;
        self.p_prior = self.p;
    }

    /// Measurement update with measurement `z`; the state is clamped to `[x_min, x_max]`
    pub fn update<M: ObservationModel + ?Sized>(&mut self, model: &mut M, z: f64, x_min: f64, x_max: f64) {
        if self.mode == EkfMode::Uninitialized {
            log_warn!("EKF update before init ignored");
            return;
        }
        let (hx, h) = model.observe(self.x);
        self.hx = hx;
        self.h = h;
        self.s = h * h * self.p + self.r;

        if libm::fabs(self.s) > EKF_S_TOLERANCE {
            self.k = h * self.p / self.s;
            self.gain_held = false;
        } else {
            if !self.gain_held {
                log_debug!("EKF system uncertainty {} degenerate, holding gain {}", self.s, self.k);
            }
            self.gain_held = true;
        }

        self.y = z - hx;
        self.x = (self.x + self.k * self.y).max(x_min).min(x_max);
        self.p = ((1.0 - self.k * h) * self.p).max(0.0);
    }

    /// Lifecycle state
    pub fn mode(&self) -> EkfMode {
        self.mode
    }

    /// Whether `init` has run
    pub fn is_tracking(&self) -> bool {
        self.mode == EkfMode::Tracking
    }

    /// State estimate
    pub fn x(&self) -> f64 {
        self.x
    }

    /// State covariance
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Process noise
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Measurement noise
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Measurement Jacobian from the last update
    pub fn h(&self) -> f64 {
        self.h
    }

    /// State transition from the last predict
    pub fn fx(&self) -> f64 {
        self.fx
    }

    /// Control gain from the last predict
    pub fn bu(&self) -> f64 {
        self.bu
    }

    /// Predicted measurement from the last update
    pub fn hx(&self) -> f64 {
        self.hx
    }

    /// Innovation from the last update
    pub fn residual(&self) -> f64 {
        self.y
    }

    /// Kalman gain
    pub fn k(&self) -> f64 {
        self.k
    }

    /// System uncertainty from the last update
    pub fn s(&self) -> f64 {
        self.s
    }

    /// State after the last predict
    pub fn x_prior(&self) -> f64 {
        self.x_prior
    }

    /// Covariance after the last predict
    pub fn p_prior(&self) -> f64 {
        self.p_prior
    }

    /// Whether the last update held the previous gain
    pub fn is_gain_held(&self) -> bool {
        self.gain_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// h(x) = slope·x + offset, SOC integrates current
    struct Linear {
        slope: f64,
        offset: f64,
        bu: f64,
    }

    impl ObservationModel for Linear {
        fn predict(&mut self, _u: f64) -> (f64, f64) {
            (1.0, self.bu)
        }

        fn observe(&mut self, x: f64) -> (f64, f64) {
            (self.slope * x + self.offset, self.slope)
        }
    }

    fn linear(slope: f64) -> Linear {
        Linear {
            slope,
            offset: 12.0,
            bu: 0.0,
        }
    }

    #[test]
    fn single_update_gain_and_covariance() {
        let mut ekf = Ekf1x1::new(1e-6, 0.01).unwrap();
        ekf.init(0.8, 0.01);
        let mut model = linear(0.1);
        let z = 0.1 * 0.8 + 12.0 + 0.05;
        ekf.update(&mut model, z, 0.0, 1.0);

        let k = 0.001 / 0.0101;
        assert!((ekf.k() - k).abs() < 1e-12);
        assert!((ekf.k() - 0.099).abs() < 1e-3);
        assert!((ekf.residual() - 0.05).abs() < 1e-12);
        assert!((ekf.x() - 0.8050).abs() < 1e-4);
        assert!((ekf.p() - 0.0099).abs() < 1e-5);
        assert!((ekf.s() - 0.0101).abs() < 1e-15);
    }

    #[test]
    fn predict_integrates_input() {
        let mut ekf = Ekf1x1::new(1e-6, 0.01).unwrap();
        ekf.init(0.5, 0.01);
        let mut model = Linear {
            slope: 0.1,
            offset: 0.0,
            bu: 1.0 / 360000.0,
        };
        ekf.predict(&mut model, 3600.0);
        assert!((ekf.x() - 0.51).abs() < 1e-12);
        assert!((ekf.p() - 0.010001).abs() < 1e-15);
        assert_eq!(ekf.x_prior(), ekf.x());
    }

    #[test]
    fn uninitialized_calls_are_ignored() {
        let mut ekf = Ekf1x1::new(1e-6, 0.01).unwrap();
        let mut model = linear(0.1);
        ekf.predict(&mut model, 10.0);
        ekf.update(&mut model, 13.0, 0.0, 1.0);
        assert_eq!(ekf.mode(), EkfMode::Uninitialized);
        assert_eq!(ekf.x(), 0.0);
    }

    #[test]
    fn state_clamped_to_bounds() {
        let mut ekf = Ekf1x1::new(1e-6, 0.01).unwrap();
        ekf.init(0.95, 1.0);
        let mut model = linear(1.0);
        ekf.update(&mut model, 100.0, 0.0, 1.0);
        assert_eq!(ekf.x(), 1.0);
        ekf.update(&mut model, -100.0, 0.0, 1.0);
        assert_eq!(ekf.x(), 0.0);
    }

    #[test]
    fn degenerate_s_holds_gain() {
        let mut ekf = Ekf1x1::new(0.0, 1e-13).unwrap();
        ekf.init(0.5, 0.01);
        let mut model = linear(0.1);
        ekf.update(&mut model, 12.06, 0.0, 1.0);
        let k = ekf.k();
        assert!(!ekf.is_gain_held());

        let mut flat = linear(0.0);
        ekf.update(&mut flat, 12.0, 0.0, 1.0);
        assert!(ekf.is_gain_held());
        assert_eq!(ekf.k(), k);
        assert!(ekf.x().is_finite());
        assert!(ekf.p() >= 0.0);
    }

    #[test]
    fn covariance_stays_bounded() {
        let mut ekf = Ekf1x1::new(1e-6, 0.01).unwrap();
        ekf.init(0.5, 0.05);
        let mut model = Linear {
            slope: 0.4,
            offset: 12.0,
            bu: 1.0 / 360000.0,
        };
        for i in 0..10_000 {
            ekf.predict(&mut model, if i % 2 == 0 { 20.0 } else { -20.0 });
            ekf.update(&mut model, 12.2, 0.0, 1.0);
            assert!(ekf.p() >= 0.0);
            assert!(ekf.p() <= 0.05 + 1e-6);
        }
        // settles toward the measured SOC
        assert!((ekf.x() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn invalid_noise_rejected() {
        assert!(Ekf1x1::new(-1.0, 0.01).is_err());
        assert!(Ekf1x1::new(1e-6, 0.0).is_err());
    }
}
