//! Battery state-of-charge estimation for LFP banks
//!
//! Fuses Coulomb counting, a voltage-hysteresis model and a scalar EKF over
//! a table-driven equivalent circuit. The same code runs in firmware and in a
//! desktop replay so recorded field data can be checked against the target.
//!
//! Key constraints:
//! - `no_std`, no heap: tables live in `heapless` storage
//! - Fixed evaluation order, bit-for-bit reproducible
//! - Bad input is rejected per cycle; bad configuration at construction
//!
//! ```no_run
//! use socguard_core::{ChemistryId, EstimatorConfig, Monitor, MonitorInput};
//!
//! let config = EstimatorConfig::default().with_bank(100.0, 4, 1);
//! let mut monitor = Monitor::for_chemistry(ChemistryId::Chins, config).unwrap();
//!
//! // once per control cycle
//! match monitor.step(&MonitorInput::new(1.0, 22.0, -12.5, 52.8)) {
//!     Ok(out) => {}, // report out.soc
//!     Err(e) => {},  // sensor fault, cycle skipped
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod chemistry;
pub mod constants;
pub mod coulomb;
pub mod ekf;
pub mod errors;
pub mod filters;
pub mod hysteresis;
pub mod lookup;
pub mod monitor;
pub mod solver;
pub mod traits;
pub mod voltage;

// Public API
pub use chemistry::{Chemistry, ChemistryId};
pub use errors::{ConfigError, ConfigResult, InputError, InputResult};
pub use monitor::{EstimatorConfig, Monitor, MonitorInput, MonitorOutput, RetainedState};
pub use traits::{ObservationModel, Validatable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
