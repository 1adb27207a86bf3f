//! SocGuard Python Bindings
//!
//! Drives the battery SOC estimator from Python so recorded field data can be
//! replayed through exactly the code that runs on the target.
//!
//! ## Usage
//!
//! ```python
//! import socguard
//!
//! monitor = socguard.Monitor("battleborn")
//! out = monitor.step(dt=1.0, temperature=25.0, current=-10.0, voltage=13.25)
//! print(f"SOC: {out['soc']:.3}")
//!
//! # Whole recording at once
//! rows = socguard.replay("chins", 1.0, temps, amps, volts)
//! ```

use pyo3::prelude::*;

mod conversion;
mod errors;
mod monitor;

use errors::{ConfigurationError, InputError, SocGuardError};
use monitor::{replay, PyMonitor};

/// SocGuard Python module
#[pymodule]
fn socguard(py: Python, m: &PyModule) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Battery state-of-charge estimation for LFP banks")?;

    // Exception classes
    m.add("SocGuardError", py.get_type::<SocGuardError>())?;
    m.add("ConfigurationError", py.get_type::<ConfigurationError>())?;
    m.add("InputError", py.get_type::<InputError>())?;

    m.add_class::<PyMonitor>()?;
    m.add_function(wrap_pyfunction!(replay, m)?)?;

    m.add("CHEMISTRIES", ("battleborn", "chins"))?;
    Ok(())
}
