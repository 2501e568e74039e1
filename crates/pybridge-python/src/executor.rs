//! Restricted expression evaluation
//!
//! Evaluates exactly one Python expression (not a statement block) with a
//! curated builtins allow-list merged with caller-supplied context
//! bindings.
//!
//! This is NOT a security boundary. The allow-list limits accidental
//! misuse of the full builtin namespace, but determined malicious input
//! can still reach arbitrary code through context objects or the allowed
//! builtins themselves. Only trusted call sites should use it; real
//! isolation needs an out-of-process restricted interpreter.

use crate::errors::BridgeError;
use crate::marshal;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use serde_json::{Map, Value};
use std::ffi::CString;

/// Builtins exposed to evaluated expressions
pub const ALLOWED_BUILTINS: &[&str] = &[
    "print", "len", "str", "int", "float", "bool", "list", "dict", "tuple", "set", "range",
    "enumerate", "zip", "map", "filter", "sum", "min", "max", "abs", "round",
];

/// Evaluate one expression against the allow-listed builtins plus the
/// given context bindings, returning a JSON-safe result
pub fn execute(code: &str, context: &Map<String, Value>) -> Result<Value, BridgeError> {
    Python::attach(|py| {
        let globals = PyDict::new(py);

        let builtins = PyModule::import(py, "builtins")?;
        let allowed = PyDict::new(py);
        for name in ALLOWED_BUILTINS {
            if let Ok(attr) = builtins.getattr(*name) {
                allowed.set_item(*name, attr)?;
            }
        }
        globals.set_item("__builtins__", allowed)?;

        for (key, value) in context {
            globals.set_item(key.as_str(), marshal::json_to_py(py, value)?)?;
        }

        let code = CString::new(code)
            .map_err(|e| BridgeError::Serialization(format!("Code contains NUL byte: {}", e)))?;
        let result = py
            .eval(code.as_c_str(), Some(&globals), None)
            .map_err(|e| BridgeError::from_pyerr(py, &e))?;

        Ok(marshal::py_to_json_lossy(py, &result))
    })
}
