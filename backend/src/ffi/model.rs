//! PyO3 wrapper for Model
//!
//! This module provides the Python interface to the Rust model.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::simulation::{Model as RustModel, ModelConfig, SimulationError};

fn runtime_error(err: SimulationError) -> PyErr {
    PyRuntimeError::new_err(format!("{}: {}", err.kind(), err))
}

/// Python wrapper for the Rust model
///
/// # Example (from Python)
///
/// ```python
/// from money_system_core_rs import Model
///
/// model = Model('{"max_periods": 24, "gov_spending": 150.0}')
/// summary = json.loads(model.run_to_end())
/// last = json.loads(model.snapshot_json(model.current_period()))
/// print(last["metrics"]["money_m1"])
/// ```
#[pyclass(name = "Model")]
pub struct PyModel {
    inner: RustModel,
}

#[pymethods]
impl PyModel {
    /// Create a standard model from a JSON configuration
    ///
    /// An empty string uses the default configuration.
    ///
    /// # Errors
    ///
    /// Raises ValueError if the configuration is malformed or invalid.
    #[new]
    #[pyo3(signature = (config_json = ""))]
    fn new(config_json: &str) -> PyResult<Self> {
        let config = if config_json.trim().is_empty() {
            ModelConfig::default()
        } else {
            ModelConfig::from_json(config_json)
                .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))?
        };

        let inner = RustModel::standard(config)
            .map_err(|e| PyValueError::new_err(format!("Failed to create model: {}", e)))?;

        Ok(PyModel { inner })
    }

    /// Step one period and return its snapshot as JSON
    fn step(&mut self) -> PyResult<String> {
        let snapshot = self.inner.step().map_err(runtime_error)?;
        snapshot.to_json().map_err(runtime_error)
    }

    /// Step up to `periods` periods and return the run summary as JSON
    fn run(&mut self, periods: u64) -> PyResult<String> {
        let summary = self.inner.run(periods);
        serde_json::to_string(&summary).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    /// Step to the configured horizon and return the run summary as JSON
    fn run_to_end(&mut self) -> PyResult<String> {
        let summary = self.inner.run_to_end();
        serde_json::to_string(&summary).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    /// Last committed period
    fn current_period(&self) -> u64 {
        self.inner.current_period()
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Balance of an account in currency units, or None if unknown
    fn balance(&self, account_id: &str) -> Option<f64> {
        self.inner
            .ledger()
            .balance(account_id)
            .ok()
            .map(crate::core::money::to_units)
    }

    /// Snapshot of a committed period as JSON, or None if not committed
    fn snapshot_json(&self, period: u64) -> PyResult<Option<String>> {
        self.inner
            .snapshot(period)
            .map(|s| s.to_json())
            .transpose()
            .map_err(runtime_error)
    }

    /// Every committed snapshot as a JSON array
    fn history_json(&self) -> PyResult<String> {
        serde_json::to_string(self.inner.history())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn config_hash(&self) -> String {
        self.inner.config_hash().to_string()
    }

    fn run_id(&self) -> String {
        self.inner.run_id().to_string()
    }
}
