//! Estimator bindings
//!
//! ```python
//! import socguard
//!
//! m = socguard.Monitor("chins", config_json='{"bank": {"series_count": 4}}')
//! out = m.step(dt=1.0, temperature=21.0, current=-12.0, voltage=52.9)
//! saved = m.retained()
//!
//! m2 = socguard.Monitor("chins")
//! m2.load(**saved)
//! ```

use pyo3::prelude::*;
use pyo3::types::PyDict;
use socguard_core::monitor::{Monitor, MonitorInput, RetainedState};

use crate::conversion::{chemistry_id, config, output_to_dict, retained_to_dict};
use crate::errors::ErrorConverter;

/// SOC estimator for one bank
#[pyclass(name = "Monitor")]
pub struct PyMonitor {
    inner: Monitor,
}

#[pymethods]
impl PyMonitor {
    #[new]
    #[pyo3(signature = (chemistry = "battleborn", config_json = None))]
    fn new(chemistry: &str, config_json: Option<&str>) -> PyResult<Self> {
        let id = chemistry_id(chemistry)?;
        let inner = Monitor::for_chemistry(id, config(config_json)?)
            .map_err(ErrorConverter::configuration)?;
        Ok(Self { inner })
    }

    /// Run one control cycle and return the outputs as a dict
    #[pyo3(signature = (dt, temperature, current, voltage, reset = false, chemistry = None))]
    #[allow(clippy::too_many_arguments)]
    fn step(
        &mut self,
        py: Python<'_>,
        dt: f64,
        temperature: f64,
        current: f64,
        voltage: f64,
        reset: bool,
        chemistry: Option<&str>,
    ) -> PyResult<Py<PyDict>> {
        let mut input = MonitorInput::new(dt, temperature, current, voltage).with_reset(reset);
        if let Some(name) = chemistry {
            input = input.with_chemistry(chemistry_id(name)?);
        }
        let out = self.inner.step(&input).map_err(ErrorConverter::input)?;
        output_to_dict(py, &out)
    }

    /// Set SOC from a rested voltage; returns the SOC (NaN if not invertible)
    #[pyo3(signature = (voltage, temperature, current = 0.0))]
    fn init_soc_from_voltage(&mut self, voltage: f64, temperature: f64, current: f64) -> PyResult<f64> {
        self.inner
            .init_soc_from_voltage(voltage, temperature, current)
            .map_err(ErrorConverter::input)
    }

    /// Restore retained state, usually `m.load(**saved)`
    #[pyo3(signature = (delta_q, t_last, dv_hys = 0.0, soc_ekf = f64::NAN, ekf_covariance = 0.0))]
    fn load(&mut self, delta_q: f64, t_last: f64, dv_hys: f64, soc_ekf: f64, ekf_covariance: f64) -> PyResult<()> {
        let state = RetainedState {
            delta_q,
            t_last,
            dv_hys,
            soc_ekf,
            ekf_covariance,
        };
        self.inner.load(&state).map_err(ErrorConverter::input)
    }

    /// State to persist across power cycles
    fn retained(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        retained_to_dict(py, &self.inner.retained())
    }

    /// Blended SOC from the last step
    #[getter]
    fn soc(&self) -> f64 {
        self.inner.last_output().soc
    }

    /// Active chemistry name
    #[getter]
    fn chemistry(&self) -> &'static str {
        self.inner.chemistry().id.name()
    }

    /// Active configuration as JSON
    #[getter]
    fn config_json(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.config()).map_err(ErrorConverter::config_json)
    }

    fn __repr__(&self) -> String {
        format!(
            "Monitor(chemistry='{}', soc={:.4})",
            self.inner.chemistry().id,
            self.inner.last_output().soc
        )
    }
}

/// Run a recorded sequence and return one output dict per sample
#[pyfunction]
#[pyo3(signature = (chemistry, dt, temperature, current, voltage, config_json = None))]
pub fn replay(
    py: Python<'_>,
    chemistry: &str,
    dt: f64,
    temperature: Vec<f64>,
    current: Vec<f64>,
    voltage: Vec<f64>,
    config_json: Option<&str>,
) -> PyResult<Vec<Py<PyDict>>> {
    let n = temperature.len();
    if current.len() != n {
        return Err(ErrorConverter::length_mismatch("current", n, current.len()));
    }
    if voltage.len() != n {
        return Err(ErrorConverter::length_mismatch("voltage", n, voltage.len()));
    }

    let id = chemistry_id(chemistry)?;
    let mut monitor =
        Monitor::for_chemistry(id, config(config_json)?).map_err(ErrorConverter::configuration)?;

    let mut outputs = Vec::with_capacity(n);
    for k in 0..n {
        let input = MonitorInput::new(dt, temperature[k], current[k], voltage[k]);
        let out = monitor
            .step(&input)
            .map_err(|e| ErrorConverter::input_at(k, e))?;
        outputs.push(output_to_dict(py, &out)?);
    }
    Ok(outputs)
}
