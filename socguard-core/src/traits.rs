//! Core traits
//!
//! One seam for what the EKF is filtering and one shared measurement check.

/// Values that can be sanity-checked before they reach the estimator
pub trait Validatable {
    /// Check if the value is physically usable (not NaN, infinite, etc)
    fn is_valid(&self) -> bool;
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

/// Scalar process and measurement model consumed by [`crate::ekf::Ekf1x1`]
///
/// ```text
/// predict:  x' = Fx·x + Bu·u
/// observe:  z  ≈ h(x),   H = ∂h/∂x
/// ```
///
/// Both methods are called once per cycle, so an implementation may refresh
/// capacity or temperature-dependent terms on every call.
pub trait ObservationModel {
    /// State-transition and control gains `(Fx, Bu)` for input `u`
    fn predict(&mut self, u: f64) -> (f64, f64);

    /// Predicted measurement and its Jacobian `(hx, H)` at state `x`
    fn observe(&mut self, x: f64) -> (f64, f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_readings_are_valid() {
        assert!(13.2f64.is_valid());
        assert!(!f64::NAN.is_valid());
        assert!(!f64::NEG_INFINITY.is_valid());
    }
}
