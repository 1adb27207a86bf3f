//! Bracketed Root Finder
//!
//! Drives `x` toward the point where a caller-supplied error function crosses
//! zero. Used by reverse table lookup (SOC from OCV) and by the closed-form
//! OCV curve inversion.
//!
//! ## Algorithm
//!
//! ```text
//! eval #1: x = x_max          (establishes sign at the top)
//! eval #2: x = x_min          (establishes sign at the bottom)
//! eval #3..#3+success_count:  bisection of the active bracket
//! afterwards:                 secant  x' = x - e·dx/de, kept inside the bracket
//! ```
//!
//! A bad initial secant slope is the usual way a plain secant solver diverges.
//! Bisecting first shrinks the bracket until the function is close to linear.
//!
//! The bracket side whose error has the same sign as the latest evaluation is
//! replaced by that evaluation, so the root always stays bracketed.
//!
//! ## No-Solution Handling
//!
//! When both endpoint errors share a sign there is no root in range. With
//! `check_no_solution` set, the solver stops immediately, returns the endpoint
//! with the smaller |error| and reports a zero residual so callers iterating
//! on the residual stop too.
//!
//! ```rust
//! use socguard_core::solver::{RootSolver, SolverSettings};
//!
//! let mut solver = RootSolver::new(SolverSettings::default());
//! let sol = solver.solve(0.0, 4.0, |x| x * x - 2.0);
//! assert!(sol.converged);
//! assert!((sol.x - 2.0f64.sqrt()).abs() < 1e-6);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Solver limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverSettings {
    /// Stop when |error| falls to this
    pub tolerance: f64,
    /// Stop when the bracket is narrower than this
    pub x_tolerance: f64,
    /// Hard cap on error-function evaluations
    pub max_iterations: u16,
    /// Bisection steps before switching to secant
    pub success_count: u16,
    /// Stop early when the endpoints do not bracket a root
    pub check_no_solution: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            x_tolerance: 1e-12,
            max_iterations: 50,
            success_count: 2,
            check_no_solution: true,
        }
    }
}

/// Outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Best estimate of the root
    pub x: f64,
    /// Error at `x` (zero when no-solution was detected)
    pub residual: f64,
    /// Error-function evaluations used
    pub iterations: u16,
    /// Tolerance met
    pub converged: bool,
    /// Endpoints straddled zero
    pub bracketed: bool,
}

/// Point/error pair
#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    e: f64,
}

/// Step-wise root finder
///
/// Either drive it manually with [`RootSolver::iterate`] / [`RootSolver::record`]
/// when the error comes from somewhere a closure can't reach, or call
/// [`RootSolver::solve`].
#[derive(Debug, Clone)]
pub struct RootSolver {
    settings: SolverSettings,
    count: u16,
    x_min: f64,
    x_max: f64,
    /// Point handed out by the last `iterate`
    x: f64,
    last: Option<Sample>,
    prev: Option<Sample>,
    /// Bracket side with negative error
    neg: Option<Sample>,
    /// Bracket side with positive error
    pos: Option<Sample>,
    best: Option<Sample>,
    bracketed: bool,
    done: bool,
    converged: bool,
    no_solution: bool,
}

impl RootSolver {
    /// Create a solver; call [`RootSolver::init`] or [`RootSolver::solve`] next
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            count: 0,
            x_min: 0.0,
            x_max: 0.0,
            x: 0.0,
            last: None,
            prev: None,
            neg: None,
            pos: None,
            best: None,
            bracketed: false,
            done: false,
            converged: false,
            no_solution: false,
        }
    }

    /// Start a new search over `[x_min, x_max]`
    pub fn init(&mut self, x_min: f64, x_max: f64) {
        let (lo, hi) = if x_min <= x_max { (x_min, x_max) } else { (x_max, x_min) };
        *self = Self::new(self.settings);
        self.x_min = lo;
        self.x_max = hi;
    }

    /// Whether the search has finished
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Next point the caller should evaluate
    pub fn iterate(&mut self) -> f64 {
        self.x = match self.count {
            0 => self.x_max,
            1 => self.x_min,
            _ => self.next_guess(),
        };
        self.x
    }

    /// Record the error at the point from the last [`RootSolver::iterate`].
    ///
    /// Returns `true` once the search is finished.
    pub fn record(&mut self, e: f64) -> bool {
        if self.done {
            return true;
        }
        self.count = self.count.saturating_add(1);
        let sample = Sample { x: self.x, e };

        if self.best.map_or(true, |b| libm::fabs(e) < libm::fabs(b.e)) {
            self.best = Some(sample);
        }
        self.prev = self.last;
        self.last = Some(sample);

        if libm::fabs(e) <= self.settings.tolerance {
            self.converged = true;
            self.done = true;
            return true;
        }

        if self.count == 2 {
            self.classify_bracket();
            if self.done {
                return true;
            }
        } else if self.count > 2 && self.bracketed {
            if e < 0.0 {
                self.neg = Some(sample);
            } else {
                self.pos = Some(sample);
            }
            if let (Some(n), Some(p)) = (self.neg, self.pos) {
                if libm::fabs(p.x - n.x) <= self.settings.x_tolerance {
                    self.converged = true;
                    self.done = true;
                    return true;
                }
            }
        }

        if self.count >= self.settings.max_iterations {
            self.done = true;
        }
        self.done
    }

    /// Result so far
    pub fn solution(&self) -> Solution {
        let best = self.best.unwrap_or(Sample { x: self.x, e: f64::NAN });
        Solution {
            x: best.x,
            residual: if self.no_solution { 0.0 } else { best.e },
            iterations: self.count,
            converged: self.converged,
            bracketed: self.bracketed,
        }
    }

    /// Run a full search with a closure as the error function
    pub fn solve<F>(&mut self, x_min: f64, x_max: f64, mut error: F) -> Solution
    where
        F: FnMut(f64) -> f64,
    {
        self.init(x_min, x_max);
        loop {
            let x = self.iterate();
            if self.record(error(x)) {
                break;
            }
        }
        self.solution()
    }

    /// After the two endpoint evaluations, decide whether a root is bracketed
    fn classify_bracket(&mut self) {
        let (Some(at_min), Some(at_max)) = (self.last, self.prev) else {
            return;
        };
        if at_min.e.is_nan() || at_max.e.is_nan() {
            self.done = true;
            return;
        }
        if (at_min.e < 0.0) != (at_max.e < 0.0) {
            self.bracketed = true;
            if at_min.e < 0.0 {
                self.neg = Some(at_min);
                self.pos = Some(at_max);
            } else {
                self.neg = Some(at_max);
                self.pos = Some(at_min);
            }
        } else if self.settings.check_no_solution {
            self.no_solution = true;
            self.done = true;
        }
    }

    fn next_guess(&self) -> f64 {
        let bisecting = self.count - 2 < self.settings.success_count;
        let (lo, hi) = match (self.neg, self.pos) {
            (Some(n), Some(p)) if self.bracketed => {
                if n.x <= p.x { (n.x, p.x) } else { (p.x, n.x) }
            }
            _ => (self.x_min, self.x_max),
        };
        let midpoint = 0.5 * (lo + hi);

        if bisecting && self.bracketed {
            return midpoint;
        }

        let (Some(last), Some(prev)) = (self.last, self.prev) else {
            return midpoint;
        };
        let de = last.e - prev.e;
        let dx = last.x - prev.x;
        if de == 0.0 || !de.is_finite() {
            return midpoint;
        }
        let guess = last.x - last.e * dx / de;
        if !guess.is_finite() {
            return midpoint;
        }
        if self.bracketed && (guess <= lo || guess >= hi) {
            // secant left the bracket, bisect instead
            return midpoint;
        }
        guess.clamp(lo, hi)
    }
}
