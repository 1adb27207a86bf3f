//! Breakpoint Tables for Constitutive Laws
//!
//! ## Motivation
//!
//! Every chemistry-specific relationship the estimator needs (open-circuit
//! voltage, hysteresis resistance, low-temperature derating) is characterised
//! on the bench as a grid of measurements, not as a formula. These tables are
//! the read-only providers of those laws.
//!
//! Storage is `heapless::Vec` with compile-time capacity
//! ([`MAX_AXIS_POINTS`], [`MAX_GRID_POINTS`]), so a table can live in a static
//! chemistry definition on a target without an allocator.
//!
//! ## Interpolation
//!
//! ### One Dimension
//!
//! ```text
//! x[i] <= x < x[i+1]:   v = v[i] + (v[i+1] - v[i]) * f,   f = (x - x[i]) / (x[i+1] - x[i])
//! ```
//!
//! Outside the breakpoints the end value is returned. There is no
//! extrapolation.
//!
//! ### Two Dimensions
//!
//! Bilinear, written as a base value plus two axis slopes plus the corner
//! (cross) term:
//!
//! ```text
//! f(u,v) = f00 + (f10 - f00)·u + (f01 - f00)·v + (f11 - f10 - f01 + f00)·u·v
//! ```
//!
//! Written this way, a lookup exactly on a breakpoint returns the stored value
//! bit-for-bit: `u = v = 0` leaves only `f00`.
//!
//! ## Reverse Lookup
//!
//! [`Table2D::r_interp`] answers "which `x` gives this value at this `y`", for
//! example SOC from a rested OCV. It runs the [`RootSolver`] over the x-axis
//! and is only meaningful when every row is strictly monotonic in `x` in the
//! same direction. That property is computed once at construction; a table
//! that lacks it returns `NaN` from reverse lookup.
//!
//! ```rust
//! use socguard_core::lookup::Table2D;
//!
//! // OCV over (soc, temp)
//! let ocv = Table2D::new(
//!     &[0.0, 0.5, 1.0],
//!     &[0.0, 25.0],
//!     &[12.0, 13.1, 13.5,
//!       12.2, 13.2, 13.6],
//! ).unwrap();
//!
//! assert_eq!(ocv.interp(0.5, 25.0), 13.2);
//! let soc = ocv.r_interp(13.2, 25.0);
//! assert!((soc - 0.5).abs() < 1e-9);
//! ```

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::buffers::{MAX_AXIS_POINTS, MAX_GRID_POINTS};
use crate::errors::{ConfigError, ConfigResult};
use crate::solver::{RootSolver, SolverSettings};

/// Breakpoint or value storage for one axis
pub type Axis = Vec<f64, MAX_AXIS_POINTS>;

/// Row-major grid storage
pub type Grid = Vec<f64, MAX_GRID_POINTS>;

/// Locate the bracketing interval of `x` on a strictly monotonic axis.
///
/// Returns `(i, f)` with `0 <= f < 1` such that `x` lies `f` of the way from
/// `axis[i]` to `axis[i + 1]`. Values beyond either end clip to that end with
/// `f = 0`, so the last breakpoint reports `(n - 1, 0.0)`. Works for both
/// increasing and decreasing axes. NaN clips to the first breakpoint.
pub fn binsearch(axis: &[f64], x: f64) -> (usize, f64) {
    let n = axis.len();
    if n < 2 {
        return (0, 0.0);
    }
    let increasing = axis[n - 1] > axis[0];
    let (at_start, at_end) = if increasing {
        (x <= axis[0], x >= axis[n - 1])
    } else {
        (x >= axis[0], x <= axis[n - 1])
    };
    if at_start || x.is_nan() {
        return (0, 0.0);
    }
    if at_end {
        return (n - 1, 0.0);
    }

    // axis[lo] <= x < axis[hi] (mirrored for decreasing axes)
    let (mut lo, mut hi) = (0usize, n - 1);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        let below = if increasing { x < axis[mid] } else { x > axis[mid] };
        if below {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (lo, (x - axis[lo]) / (axis[hi] - axis[lo]))
}

/// Validate and copy one breakpoint axis
fn build_axis(table: &'static str, axis: &'static str, data: &[f64]) -> ConfigResult<Axis> {
    if data.is_empty() {
        return Err(ConfigError::EmptyTable { table });
    }
    if data.len() > MAX_AXIS_POINTS {
        return Err(ConfigError::CapacityExceeded {
            table,
            capacity: MAX_AXIS_POINTS,
            requested: data.len(),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFinite { what: table });
    }
    if data.len() > 1 {
        let increasing = data[1] > data[0];
        for (i, pair) in data.windows(2).enumerate() {
            let ok = if increasing { pair[1] > pair[0] } else { pair[1] < pair[0] };
            if !ok {
                return Err(ConfigError::NonMonotonicAxis {
                    table,
                    axis,
                    index: i + 1,
                });
            }
        }
    }
    Axis::from_slice(data).map_err(|_| ConfigError::CapacityExceeded {
        table,
        capacity: MAX_AXIS_POINTS,
        requested: data.len(),
    })
}

/// Linear table `v = f(x)`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawTable1D", into = "RawTable1D")
)]
pub struct Table1D {
    x: Axis,
    v: Axis,
}

impl Table1D {
    /// Build from breakpoints and values
    pub fn new(x: &[f64], v: &[f64]) -> ConfigResult<Self> {
        Self::named("table1d", x, v)
    }

    /// Build with a name used in error messages
    pub fn named(table: &'static str, x: &[f64], v: &[f64]) -> ConfigResult<Self> {
        let x = build_axis(table, "x", x)?;
        if v.len() != x.len() {
            return Err(ConfigError::LengthMismatch {
                table,
                expected: x.len(),
                actual: v.len(),
            });
        }
        if v.iter().any(|e| !e.is_finite()) {
            return Err(ConfigError::NonFinite { what: table });
        }
        let v = Axis::from_slice(v).map_err(|_| ConfigError::CapacityExceeded {
            table,
            capacity: MAX_AXIS_POINTS,
            requested: v.len(),
        })?;
        Ok(Self { x, v })
    }

    /// Interpolated value, clipped at the ends
    pub fn interp(&self, x: f64) -> f64 {
        let (i, frac) = binsearch(&self.x, x);
        let base = self.v[i];
        if i + 1 < self.v.len() {
            base + (self.v[i + 1] - base) * frac
        } else {
            base
        }
    }

    /// Breakpoints
    pub fn breakpoints(&self) -> &[f64] {
        &self.x
    }

    /// Values
    pub fn values(&self) -> &[f64] {
        &self.v
    }

    /// Number of breakpoints
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; construction rejects empty tables
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Bilinear table `v = f(x, y)`, row-major: `v[j * n + i] = f(x[i], y[j])`
///
/// The wire form carries only `x`, `y` and `v`. A table read back on its own
/// is labelled `table2d`; tables inside a [`Chemistry`](crate::chemistry::Chemistry)
/// get their labels back from the chemistry id.
#[derive(Debug, Clone, PartialEq)]
pub struct Table2D {
    name: &'static str,
    x: Axis,
    y: Axis,
    v: Grid,
    monotonic: bool,
}

impl Table2D {
    /// Build from breakpoints and a row-major grid
    pub fn new(x: &[f64], y: &[f64], v: &[f64]) -> ConfigResult<Self> {
        Self::named("table2d", x, y, v)
    }

    /// Build a table that must support [`Table2D::r_interp`]
    pub fn new_invertible(x: &[f64], y: &[f64], v: &[f64]) -> ConfigResult<Self> {
        Self::new(x, y, v)?.require_invertible()
    }

    /// Build with a name used in error and log messages
    pub fn named(table: &'static str, x: &[f64], y: &[f64], v: &[f64]) -> ConfigResult<Self> {
        let x = build_axis(table, "x", x)?;
        let y = build_axis(table, "y", y)?;
        let expected = x.len() * y.len();
        if v.len() != expected {
            return Err(ConfigError::LengthMismatch {
                table,
                expected,
                actual: v.len(),
            });
        }
        if v.iter().any(|e| !e.is_finite()) {
            return Err(ConfigError::NonFinite { what: table });
        }
        let v = Grid::from_slice(v).map_err(|_| ConfigError::CapacityExceeded {
            table,
            capacity: MAX_GRID_POINTS,
            requested: expected,
        })?;
        let monotonic = rows_monotonic(x.len(), &v);
        Ok(Self {
            name: table,
            x,
            y,
            v,
            monotonic,
        })
    }

    /// Reject the table unless every row is monotonic in `x` in one direction
    pub fn require_invertible(self) -> ConfigResult<Self> {
        if self.monotonic {
            Ok(self)
        } else {
            Err(ConfigError::NotInvertible { table: self.name })
        }
    }

    /// Bilinear interpolation with per-axis clipping
    pub fn interp(&self, x: f64, y: f64) -> f64 {
        let n = self.x.len();
        let m = self.y.len();
        let (i, u) = binsearch(&self.x, x);
        let (j, w) = binsearch(&self.y, y);

        let at = |ii: usize, jj: usize| self.v[jj * n + ii];
        let base = at(i, j);
        let mut result = base;

        if i + 1 < n {
            result += (at(i + 1, j) - base) * u;
        }
        if j + 1 < m {
            let y_next = at(i, j + 1);
            result += (y_next - base) * w;
            if i + 1 < n {
                result += corner_term(base, at(i + 1, j), y_next, at(i + 1, j + 1), u, w);
            }
        }
        result
    }

    /// Solve `interp(x, y) == target` for `x`.
    ///
    /// Targets beyond the row's range return the nearest end breakpoint. A
    /// table whose rows are not monotonic in `x` returns `NaN`.
    pub fn r_interp(&self, target: f64, y: f64) -> f64 {
        if !self.monotonic {
            log_warn!("Reverse lookup on non-monotonic table {}", self.name);
            return f64::NAN;
        }
        let n = self.x.len();
        let span = libm::fabs(self.x[n - 1] - self.x[0]);
        let settings = SolverSettings {
            x_tolerance: span * 1e-12,
            ..SolverSettings::default()
        };
        let mut solver = RootSolver::new(settings);
        let solution = solver.solve(self.x[0], self.x[n - 1], |x| self.interp(x, y) - target);
        if !solution.bracketed && !solution.converged {
            log_trace!(
                "Reverse lookup on {}: target {} outside row range, clipped to {}",
                self.name,
                target,
                solution.x
            );
        }
        solution.x
    }

    /// Whether [`Table2D::r_interp`] is usable
    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }

    /// x breakpoints
    pub fn x_breakpoints(&self) -> &[f64] {
        &self.x
    }

    /// y breakpoints
    pub fn y_breakpoints(&self) -> &[f64] {
        &self.y
    }

    /// Row-major grid
    pub fn values(&self) -> &[f64] {
        &self.v
    }

    /// Table name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[cfg(feature = "serde")]
    pub(crate) fn rename(&mut self, name: &'static str) {
        self.name = name;
    }
}

/// The corner term is `(f11 - f10 - f01 + f00) * u * v`
fn corner_term(base: f64, x_next: f64, y_next: f64, corner: f64, u: f64, v: f64) -> f64 {
    (corner - x_next - y_next + base) * u * v
}

/// True when every row is strictly monotonic along x and all rows agree in direction
fn rows_monotonic(n: usize, grid: &[f64]) -> bool {
    if n < 2 {
        return false;
    }
    let increasing = grid[1] > grid[0];
    grid.chunks(n).all(|row| {
        row.windows(2).all(|pair| {
            if increasing {
                pair[1] > pair[0]
            } else {
                pair[1] < pair[0]
            }
        })
    })
}

/// Wire form of [`Table1D`]; validated through `TryFrom`
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawTable1D {
    x: Axis,
    v: Axis,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTable1D> for Table1D {
    type Error = ConfigError;

    fn try_from(raw: RawTable1D) -> Result<Self, Self::Error> {
        Table1D::new(&raw.x, &raw.v)
    }
}

#[cfg(feature = "serde")]
impl From<Table1D> for RawTable1D {
    fn from(table: Table1D) -> Self {
        Self { x: table.x, v: table.v }
    }
}

/// Wire form of [`Table2D`]
#[cfg(feature = "serde")]
#[derive(Serialize)]
struct RawTable2DRef<'a> {
    x: &'a [f64],
    y: &'a [f64],
    v: &'a [f64],
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawTable2D {
    x: Axis,
    y: Axis,
    v: Grid,
}

#[cfg(feature = "serde")]
impl Serialize for Table2D {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawTable2DRef {
            x: &self.x,
            y: &self.y,
            v: &self.v,
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Table2D {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTable2D::deserialize(deserializer)?;
        Table2D::new(&raw.x, &raw.y, &raw.v).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ocv() -> Table2D {
        Table2D::new(
            &[0.0, 0.2, 0.5, 1.0],
            &[0.0, 25.0, 40.0],
            &[
                12.0, 12.9, 13.1, 13.5, //
                12.1, 13.0, 13.2, 13.6, //
                12.15, 13.05, 13.25, 13.65,
            ],
        )
        .unwrap()
    }

    #[test]
    fn binsearch_increasing() {
        let axis = [0.0, 1.0, 2.0, 4.0];
        assert_eq!(binsearch(&axis, -1.0), (0, 0.0));
        assert_eq!(binsearch(&axis, 0.0), (0, 0.0));
        assert_eq!(binsearch(&axis, 1.0), (1, 0.0));
        assert_eq!(binsearch(&axis, 3.0), (2, 0.5));
        assert_eq!(binsearch(&axis, 4.0), (3, 0.0));
        assert_eq!(binsearch(&axis, 9.0), (3, 0.0));
    }

    #[test]
    fn binsearch_decreasing() {
        let axis = [10.0, 5.0, 0.0];
        assert_eq!(binsearch(&axis, 11.0), (0, 0.0));
        assert_eq!(binsearch(&axis, 7.5), (0, 0.5));
        assert_eq!(binsearch(&axis, 5.0), (1, 0.0));
        assert_eq!(binsearch(&axis, -3.0), (2, 0.0));
    }

    #[test]
    fn table1d_nodes_exact() {
        let x = [-10.0, 0.0, 25.0, 45.0];
        let v = [0.31, 0.17, 0.0, 0.0];
        let t = Table1D::new(&x, &v).unwrap();
        for (xi, vi) in x.iter().zip(v.iter()) {
            assert_eq!(t.interp(*xi), *vi);
        }
        assert!((t.interp(-5.0) - 0.24).abs() < 1e-12);
    }

    #[test]
    fn table1d_clips() {
        let t = Table1D::new(&[0.0, 1.0], &[2.0, 4.0]).unwrap();
        assert_eq!(t.interp(-100.0), 2.0);
        assert_eq!(t.interp(100.0), 4.0);
    }

    #[test]
    fn table1d_single_point_is_constant() {
        let t = Table1D::new(&[3.0], &[7.0]).unwrap();
        assert_eq!(t.interp(-1.0), 7.0);
        assert_eq!(t.interp(50.0), 7.0);
    }

    #[test]
    fn construction_errors() {
        assert!(matches!(
            Table1D::new(&[], &[]),
            Err(ConfigError::EmptyTable { .. })
        ));
        assert!(matches!(
            Table1D::new(&[0.0, 0.0], &[1.0, 2.0]),
            Err(ConfigError::NonMonotonicAxis { index: 1, .. })
        ));
        assert!(matches!(
            Table1D::new(&[0.0, f64::NAN], &[1.0, 2.0]),
            Err(ConfigError::NonFinite { .. })
        ));
        let long = [0.0; MAX_AXIS_POINTS + 1];
        assert!(matches!(
            Table1D::new(&long, &long),
            Err(ConfigError::CapacityExceeded { .. })
        ));
        assert!(matches!(
            Table2D::new(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0, 3.0]),
            Err(ConfigError::LengthMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn table2d_nodes_exact() {
        let t = ocv();
        let x = t.x_breakpoints();
        let y = t.y_breakpoints();
        for (j, yj) in y.iter().enumerate() {
            for (i, xi) in x.iter().enumerate() {
                assert_eq!(t.interp(*xi, *yj), t.values()[j * x.len() + i]);
            }
        }
    }

    #[test]
    fn table2d_bilinear_midpoint() {
        let t = Table2D::new(&[0.0, 1.0], &[0.0, 1.0], &[0.0, 1.0, 1.0, 3.0]).unwrap();
        // mean of the four corners
        assert!((t.interp(0.5, 0.5) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn table2d_clips() {
        let t = ocv();
        assert_eq!(t.interp(-1.0, -40.0), 12.0);
        assert_eq!(t.interp(2.0, 90.0), 13.65);
        assert_eq!(t.interp(1.5, 25.0), 13.6);
    }

    #[test]
    fn reverse_lookup_inverts_forward() {
        let t = ocv();
        for &soc in &[0.05, 0.2, 0.37, 0.8, 0.99] {
            let v = t.interp(soc, 12.0);
            let back = t.r_interp(v, 12.0);
            assert!((back - soc).abs() < 1e-6, "soc {soc} -> {back}");
        }
    }

    #[test]
    fn reverse_lookup_out_of_range_returns_end() {
        let t = ocv();
        assert_eq!(t.r_interp(20.0, 25.0), 1.0);
        assert_eq!(t.r_interp(5.0, 25.0), 0.0);
    }

    #[test]
    fn non_monotonic_table_returns_nan() {
        let t = Table2D::new(&[0.0, 0.5, 1.0], &[0.0], &[1.0, 3.0, 2.0]).unwrap();
        assert!(!t.is_monotonic());
        assert!(t.r_interp(2.5, 0.0).is_nan());
        assert!(matches!(
            t.require_invertible(),
            Err(ConfigError::NotInvertible { .. })
        ));
    }

    #[test]
    fn mixed_row_directions_are_not_monotonic() {
        let t = Table2D::new(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0, 2.0, 1.0]).unwrap();
        assert!(!t.is_monotonic());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn table2d_json_from_owned_buffer() {
        let json: String = serde_json::to_string(&ocv()).unwrap();
        let back: Table2D = serde_json::from_str(&json).unwrap();
        drop(json);
        assert_eq!(back.values(), ocv().values());
        assert_eq!(back.name(), "table2d");
        assert!(back.is_monotonic());

        let bad = String::from(r#"{"x":[0.0,1.0],"y":[0.0],"v":[1.0]}"#);
        assert!(serde_json::from_str::<Table2D>(&bad).is_err());
    }

    #[test]
    fn decreasing_rows_invert() {
        let t = Table2D::new_invertible(&[0.0, 1.0, 2.0], &[0.0], &[5.0, 3.0, 0.0]).unwrap();
        assert!((t.r_interp(4.0, 0.0) - 0.5).abs() < 1e-9);
    }
}
