//! PyO3 bindings
//!
//! The Python surface is JSON in, JSON out: a config document goes in, the
//! pipeline report comes back. Config errors raise `ValueError`.
//!
//! # Example (from Python)
//!
//! ```python
//! import json
//! from flow_calibration_core_rs import run_pipeline
//!
//! report = json.loads(run_pipeline(json.dumps({"rebound_goal": 5})))
//! print(report["calibration"]["factor_for_target"])
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::orchestrator::{Pipeline, PipelineConfig};

/// Run the full pipeline from a JSON config and return the JSON report
#[pyfunction]
#[pyo3(signature = (config_json, seed=None))]
pub fn run_pipeline(config_json: &str, seed: Option<u64>) -> PyResult<String> {
    let mut config = PipelineConfig::from_json_str(config_json)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    if let Some(seed) = seed {
        config = config.with_master_seed(seed);
    }

    let pipeline = Pipeline::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let report = pipeline.run();

    serde_json::to_string(&report)
        .map_err(|e| PyRuntimeError::new_err(format!("Report serialization failed: {}", e)))
}
