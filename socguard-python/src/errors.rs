//! Python Exceptions for SocGuard
//!
//! ## Error Mapping
//!
//! ```text
//! ConfigError        → socguard.ConfigurationError
//! InputError         → socguard.InputError
//! serde_json::Error  → socguard.ConfigurationError (malformed config_json)
//! length mismatch    → ValueError
//! ```
//!
//! Both SocGuard exceptions derive from `socguard.SocGuardError`, so Python
//! code can catch everything the estimator raises with a single clause.

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyValueError};
use pyo3::PyErr;
use socguard_core::{ConfigError, InputError as CoreInputError};

create_exception!(socguard, SocGuardError, PyException, "Base class for SocGuard errors");
create_exception!(
    socguard,
    ConfigurationError,
    SocGuardError,
    "Invalid chemistry or estimator configuration"
);
create_exception!(
    socguard,
    InputError,
    SocGuardError,
    "Measurement rejected; estimator state is unchanged"
);

/// Converts core errors into Python exceptions
pub struct ErrorConverter;

impl ErrorConverter {
    /// Construction-time failure
    pub fn configuration(err: ConfigError) -> PyErr {
        ConfigurationError::new_err(err.to_string())
    }

    /// Per-cycle input failure
    pub fn input(err: CoreInputError) -> PyErr {
        InputError::new_err(err.to_string())
    }

    /// Per-cycle input failure inside a replay, tagged with the sample index
    pub fn input_at(index: usize, err: CoreInputError) -> PyErr {
        InputError::new_err(format!("sample {index}: {err}"))
    }

    /// `config_json` that does not parse or validate
    pub fn config_json(err: serde_json::Error) -> PyErr {
        ConfigurationError::new_err(format!("config_json: {err}"))
    }

    /// Replay columns of different lengths
    pub fn length_mismatch(column: &str, expected: usize, actual: usize) -> PyErr {
        PyValueError::new_err(format!(
            "{column} has {actual} samples, expected {expected}"
        ))
    }
}
