//! Conversions between core records and Python objects

use pyo3::prelude::*;
use pyo3::types::PyDict;
use socguard_core::{
    chemistry::ChemistryId,
    monitor::{EstimatorConfig, MonitorOutput, RetainedState},
};

use crate::errors::ErrorConverter;

/// Parse a chemistry name such as `"battleborn"` or `"CHINS"`
pub fn chemistry_id(name: &str) -> PyResult<ChemistryId> {
    name.parse().map_err(ErrorConverter::configuration)
}

/// Default configuration, or the one in `config_json`
pub fn config(config_json: Option<&str>) -> PyResult<EstimatorConfig> {
    match config_json {
        Some(json) => serde_json::from_str(json).map_err(ErrorConverter::config_json),
        None => Ok(EstimatorConfig::default()),
    }
}

/// One cycle's output as a dict
pub fn output_to_dict(py: Python<'_>, out: &MonitorOutput) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("soc", out.soc)?;
    dict.set_item("soc_coulomb", out.soc_coulomb)?;
    dict.set_item("soc_ekf", out.soc_ekf)?;
    dict.set_item("terminal_voltage_predicted", out.terminal_voltage_predicted)?;
    dict.set_item("open_circuit_voltage", out.open_circuit_voltage)?;
    dict.set_item("dynamic_drop", out.dynamic_drop)?;
    dict.set_item("hysteresis_voltage", out.hysteresis_voltage)?;
    dict.set_item("is_saturated", out.is_saturated)?;
    dict.set_item("ekf_covariance", out.ekf_covariance)?;
    dict.set_item("temperature_limited", out.temperature_limited)?;
    dict.set_item("soc_floor", out.soc_floor)?;
    dict.set_item("voc_stat", out.voc_stat)?;
    dict.set_item("ekf_residual", out.ekf_residual)?;
    dict.set_item("blend_weight", out.blend_weight)?;
    dict.set_item("q_capacity", out.q_capacity)?;
    Ok(dict.into())
}

/// Retained state as a dict; keys match `Monitor.load` keyword arguments
pub fn retained_to_dict(py: Python<'_>, state: &RetainedState) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("delta_q", state.delta_q)?;
    dict.set_item("t_last", state.t_last)?;
    dict.set_item("dv_hys", state.dv_hys)?;
    dict.set_item("soc_ekf", state.soc_ekf)?;
    dict.set_item("ekf_covariance", state.ekf_covariance)?;
    Ok(dict.into())
}
