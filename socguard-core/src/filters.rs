//! Signal Conditioning Primitives
//!
//! Small stateful blocks used by the estimator's control loop:
//!
//! - [`LagFilter`]: first-order low-pass, exact discretisation or Tustin
//! - [`RateLimit`]: slew limiter (temperature input to the Coulomb counter)
//! - [`TfDelay`]: asymmetric debounce for boolean detections
//! - [`EdgeDetector`]: rising/falling transitions of a boolean
//!
//! All of them take `dt` per call, so a variable-step loop works without
//! reconfiguring anything, and all of them accept a `reset` that jumps the
//! state to the present input.
//!
//! ## First-Order Lag
//!
//! ```text
//! continuous:   tau·dy/dt = x - y
//! exponential:  y += (1 - e^(-dt/tau))·(x - y)           exact for piecewise-constant x
//! tustin:       y  = a·y + b·(x + x_prev),  a = (2tau - dt)/(2tau + dt),  b = dt/(2tau + dt)
//! ```
//!
//! A non-positive time constant turns the filter into a pass-through.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dwell comparisons tolerate this much accumulated `dt` rounding (s)
const DWELL_EPSILON_S: f64 = 1e-9;

/// Discretisation used by [`LagFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LagMethod {
    /// Exact for inputs held constant across the step
    #[default]
    Exponential,
    /// Bilinear transform
    Tustin,
}

/// First-order low-pass filter
#[derive(Debug, Clone)]
pub struct LagFilter {
    tau: f64,
    method: LagMethod,
    state: f64,
    prev_input: f64,
    initialized: bool,
}

impl LagFilter {
    /// Exponential lag with time constant `tau` (s)
    pub fn new(tau: f64) -> Self {
        Self::with_method(tau, LagMethod::Exponential)
    }

    /// Tustin lag with time constant `tau` (s)
    pub fn tustin(tau: f64) -> Self {
        Self::with_method(tau, LagMethod::Tustin)
    }

    /// Lag with an explicit discretisation
    pub fn with_method(tau: f64, method: LagMethod) -> Self {
        Self {
            tau,
            method,
            state: 0.0,
            prev_input: 0.0,
            initialized: false,
        }
    }

    /// Advance one step. The first call, and any call with `reset`, returns `input`.
    pub fn calculate(&mut self, input: f64, reset: bool, dt: f64) -> f64 {
        if reset || !self.initialized || self.tau <= 0.0 {
            self.state = input;
            self.prev_input = input;
            self.initialized = true;
            return self.state;
        }
        self.state = match self.method {
            LagMethod::Exponential => {
                let alpha = 1.0 - libm::exp(-dt / self.tau);
                self.state + alpha * (input - self.state)
            }
            LagMethod::Tustin => {
                let den = 2.0 * self.tau + dt;
                let a = (2.0 * self.tau - dt) / den;
                let b = dt / den;
                a * self.state + b * (input + self.prev_input)
            }
        };
        self.prev_input = input;
        self.state
    }

    /// Present output
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Time constant (s)
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Change the time constant without disturbing the state
    pub fn set_tau(&mut self, tau: f64) {
        self.tau = tau;
    }
}

/// Slew-rate limiter
#[derive(Debug, Clone)]
pub struct RateLimit {
    rate_min: f64,
    rate_max: f64,
    state: f64,
    initialized: bool,
}

impl RateLimit {
    /// Limit rising slew to `rate_max` and falling slew to `rate_min` (units/s, `rate_min <= 0`)
    pub fn new(rate_min: f64, rate_max: f64) -> Self {
        Self {
            rate_min,
            rate_max,
            state: 0.0,
            initialized: false,
        }
    }

    /// Same limit in both directions
    pub fn symmetric(rate: f64) -> Self {
        let rate = libm::fabs(rate);
        Self::new(-rate, rate)
    }

    /// Advance one step toward `input`. The first call, and any call with `reset`, jumps.
    pub fn calculate(&mut self, input: f64, reset: bool, dt: f64) -> f64 {
        if reset || !self.initialized {
            self.state = input;
            self.initialized = true;
            return self.state;
        }
        let step = (input - self.state).clamp(self.rate_min * dt, self.rate_max * dt);
        self.state += step;
        self.state
    }

    /// Present output
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Overwrite the state, e.g. from retained memory
    pub fn load(&mut self, state: f64) {
        self.state = state;
        self.initialized = true;
    }

    /// Whether the limiter has seen an input or a load
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Asymmetric debounce: the output follows the input only after the input has
/// held its new value for the matching dwell time.
#[derive(Debug, Clone, Default)]
pub struct TfDelay {
    output: bool,
    timer: f64,
}

impl TfDelay {
    /// Debounce starting from `false`
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one step.
    ///
    /// The output turns true once `input` has been true for `t_true` seconds
    /// and false once it has been false for `t_false` seconds. `reset` sets the
    /// output to `input` immediately.
    pub fn calculate(&mut self, input: bool, t_true: f64, t_false: f64, dt: f64, reset: bool) -> bool {
        if reset {
            self.output = input;
            self.timer = 0.0;
            return self.output;
        }
        if input == self.output {
            self.timer = 0.0;
            return self.output;
        }
        self.timer += dt;
        let dwell = if input { t_true } else { t_false };
        if self.timer + DWELL_EPSILON_S >= dwell {
            self.output = input;
            self.timer = 0.0;
        }
        self.output
    }

    /// Present output
    pub fn output(&self) -> bool {
        self.output
    }
}

/// Transition of a boolean signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No change
    None,
    /// false -> true
    Rising,
    /// true -> false
    Falling,
}

/// Detect transitions of a boolean between successive calls
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    /// Detector whose previous value is `false`
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against the previous call
    pub fn update(&mut self, input: bool) -> Transition {
        let transition = match (self.last, input) {
            (false, true) => Transition::Rising,
            (true, false) => Transition::Falling,
            _ => Transition::None,
        };
        self.last = input;
        transition
    }

    /// Force the remembered value without reporting a transition
    pub fn reset(&mut self, value: bool) {
        self.last = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_reaches_63_percent_in_one_tau() {
        let mut lag = LagFilter::new(10.0);
        lag.calculate(0.0, true, 1.0);
        let mut y = 0.0;
        for _ in 0..10 {
            y = lag.calculate(1.0, false, 1.0);
        }
        assert!((y - (1.0 - libm::exp(-1.0))).abs() < 1e-12);
    }

    #[test]
    fn tustin_tracks_step() {
        let mut lag = LagFilter::tustin(5.0);
        lag.calculate(0.0, true, 0.1);
        let mut y = 0.0;
        for _ in 0..500 {
            y = lag.calculate(2.0, false, 0.1);
        }
        assert!((y - 2.0).abs() < 1e-3);
        // monotone approach, no overshoot for dt < 2 tau
        assert!(y <= 2.0);
    }

    #[test]
    fn lag_non_positive_tau_passes_through() {
        let mut lag = LagFilter::new(0.0);
        lag.calculate(1.0, true, 1.0);
        assert_eq!(lag.calculate(5.0, false, 1.0), 5.0);
    }

    #[test]
    fn rate_limit_bounds_slew() {
        let mut rl = RateLimit::symmetric(0.5);
        assert_eq!(rl.calculate(20.0, true, 1.0), 20.0);
        assert_eq!(rl.calculate(30.0, false, 2.0), 21.0);
        assert_eq!(rl.calculate(0.0, false, 1.0), 20.5);
        assert_eq!(rl.calculate(20.6, false, 1.0), 20.6);
        assert_eq!(rl.calculate(-5.0, true, 1.0), -5.0);
    }

    #[test]
    fn tf_delay_asserts_after_dwell() {
        let mut d = TfDelay::new();
        assert!(!d.calculate(true, 3.0, 2.0, 1.0, false));
        assert!(!d.calculate(true, 3.0, 2.0, 1.0, false));
        assert!(d.calculate(true, 3.0, 2.0, 1.0, false));
        // one false sample is not enough to release
        assert!(d.calculate(false, 3.0, 2.0, 1.0, false));
        assert!(!d.calculate(false, 3.0, 2.0, 1.0, false));
    }

    #[test]
    fn tf_delay_glitch_restarts_timer() {
        let mut d = TfDelay::new();
        d.calculate(true, 2.0, 2.0, 1.0, false);
        d.calculate(false, 2.0, 2.0, 1.0, false);
        assert!(!d.calculate(true, 2.0, 2.0, 1.0, false));
        assert!(d.calculate(true, 2.0, 2.0, 1.0, false));
    }

    #[test]
    fn tf_delay_accumulates_fractional_steps() {
        let mut d = TfDelay::new();
        let mut out = false;
        for _ in 0..10 {
            out = d.calculate(true, 1.0, 1.0, 0.1, false);
        }
        assert!(out);
    }

    #[test]
    fn tf_delay_reset_follows_input() {
        let mut d = TfDelay::new();
        assert!(d.calculate(true, 100.0, 100.0, 1.0, true));
    }

    #[test]
    fn edges() {
        let mut e = EdgeDetector::new();
        assert_eq!(e.update(false), Transition::None);
        assert_eq!(e.update(true), Transition::Rising);
        assert_eq!(e.update(true), Transition::None);
        assert_eq!(e.update(false), Transition::Falling);
    }
}
