//! JSON <-> Python value marshaling
//!
//! Conversion goes through the interpreter's own `json` module rather than a
//! hand-rolled type mapping: `json.dumps` on the way out, `json.loads` on the
//! way in. That keeps the bridge's notion of "JSON-serializable" identical to
//! Python's.

use crate::errors::BridgeError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use serde_json::Value;

/// Convert a Python object to a JSON value via `json.dumps`.
///
/// Fails when the object is not JSON-serializable.
pub fn py_to_json(py: Python<'_>, obj: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    let json_mod = PyModule::import(py, "json")?;
    let dumped: String = json_mod.getattr("dumps")?.call1((obj,))?.extract()?;
    Ok(serde_json::from_str(&dumped)?)
}

/// Convert a Python object to a JSON value, degrading to its `str()` form
/// when it is not JSON-serializable.
pub fn py_to_json_lossy(py: Python<'_>, obj: &Bound<'_, PyAny>) -> Value {
    match py_to_json(py, obj) {
        Ok(value) => value,
        Err(_) => Value::String(
            obj.str()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| "<unprintable object>".to_string()),
        ),
    }
}

/// Convert a JSON value to a Python object via `json.loads`
pub fn json_to_py<'py>(py: Python<'py>, value: &Value) -> Result<Bound<'py, PyAny>, BridgeError> {
    let text = serde_json::to_string(value)?;
    let json_mod = PyModule::import(py, "json")?;
    Ok(json_mod.getattr("loads")?.call1((text,))?)
}
