//! Method invocation on loaded plugins
//!
//! Parameters are applied strictly positionally in the order given; there
//! is no keyword-argument support on the wire.

use crate::errors::BridgeError;
use crate::marshal;
use crate::registry::BridgeContext;
use pybridge_logger as logger;
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use serde_json::Value;
use std::time::Instant;

impl BridgeContext {
    /// Invoke a public method on a loaded plugin and marshal the result.
    ///
    /// Fails with distinct errors for an unknown plugin id, a missing
    /// method name, and an attribute that exists but is not callable.
    pub fn call_method(
        &self,
        plugin_id: &str,
        method_name: &str,
        parameters: &[Value],
    ) -> Result<Value, BridgeError> {
        Python::attach(|py| {
            let plugin = self.get(plugin_id)?;
            let target = plugin.object.target(py);

            if !target.hasattr(method_name)? {
                return Err(BridgeError::MethodNotFound(method_name.to_string()));
            }
            let attr = target.getattr(method_name)?;
            if !attr.is_callable() {
                return Err(BridgeError::NotCallable(method_name.to_string()));
            }

            let mut args = Vec::with_capacity(parameters.len());
            for parameter in parameters {
                args.push(marshal::json_to_py(py, parameter)?);
            }
            let args = PyTuple::new(py, args)?;

            let start = Instant::now();
            let result = attr.call1(args).map_err(|e| {
                BridgeError::from_pyerr_context(
                    py,
                    &e,
                    &format!("Method '{}' failed", method_name),
                )
            })?;
            logger::debug(&format!(
                "Invoked {}.{} (took {:?})",
                plugin_id,
                method_name,
                start.elapsed()
            ));

            marshal_result(py, &result)
        })
    }
}

/// Marshal an invocation result to JSON: a `to_json()` method wins, then a
/// plain `__dict__` attribute map, then the raw value. The raw path
/// stringifies values Python's serializer rejects, so the response writer
/// can never fail on an unserializable result.
fn marshal_result(py: Python<'_>, result: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    if result.hasattr("to_json")? {
        let to_json = result.getattr("to_json")?;
        if to_json.is_callable() {
            let out = to_json
                .call0()
                .map_err(|e| BridgeError::from_pyerr_context(py, &e, "to_json() failed"))?;
            if let Ok(text) = out.extract::<String>() {
                return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
            }
            return Ok(marshal::py_to_json_lossy(py, &out));
        }
    }

    if result.hasattr("__dict__")? {
        let attrs = result.getattr("__dict__")?;
        return Ok(marshal::py_to_json_lossy(py, &attrs));
    }

    Ok(marshal::py_to_json_lossy(py, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::PyModule;
    use serde_json::json;

    fn context_with_plugin() -> BridgeContext {
        Python::attach(|py| {
            let module = PyModule::from_code(
                py,
                cr#"
import json

class Result:
    def __init__(self, value):
        self.value = value

class Jsonable:
    def __init__(self, value):
        self.value = value

    def to_json(self):
        return json.dumps({"wrapped": self.value})

class Plugin:
    def __init__(self):
        self.name = "calc"

    def add(self, a, b):
        return a + b

    def wrap(self, value):
        return Result(value)

    def wrap_json(self, value):
        return Jsonable(value)

    def fail(self):
        raise ValueError("on purpose")

    def give_set(self):
        return {1, 2}
"#,
                c"calc.py",
                c"calc",
            )
            .unwrap();

            let mut ctx = BridgeContext::new();
            let instance = module.getattr("Plugin").unwrap().call0().unwrap();
            ctx.register(
                crate::registry::PluginObject::Instance(instance.unbind()),
                module.into_any().unbind(),
            );
            ctx
        })
    }

    #[test]
    fn positional_invocation() {
        let ctx = context_with_plugin();
        let result = ctx
            .call_method("python_0", "add", &[json!(2), json!(3)])
            .unwrap();
        assert_eq!(result, 5);
    }

    #[test]
    fn distinct_error_kinds() {
        let ctx = context_with_plugin();

        let err = ctx.call_method("python_7", "add", &[]).unwrap_err();
        assert!(err.to_string().contains("Plugin not found"));

        let err = ctx.call_method("python_0", "nonexistent", &[]).unwrap_err();
        assert!(err.to_string().contains("Method not found"));

        let err = ctx.call_method("python_0", "name", &[]).unwrap_err();
        assert!(err.to_string().contains("not callable"));
    }

    #[test]
    fn plugin_exception_surfaces_with_traceback() {
        let ctx = context_with_plugin();
        let err = ctx.call_method("python_0", "fail", &[]).unwrap_err();
        assert!(err.to_string().contains("on purpose"));
        let tb = err.traceback().unwrap();
        assert!(tb.contains("Traceback"));
        assert!(tb.contains("ValueError"));
    }

    #[test]
    fn result_prefers_to_json_then_dict_then_raw() {
        let ctx = context_with_plugin();

        let via_to_json = ctx
            .call_method("python_0", "wrap_json", &[json!(9)])
            .unwrap();
        assert_eq!(via_to_json, json!({"wrapped": 9}));

        let via_dict = ctx.call_method("python_0", "wrap", &[json!("x")]).unwrap();
        assert_eq!(via_dict, json!({"value": "x"}));

        let raw = ctx.call_method("python_0", "add", &[json!(1), json!(1)]).unwrap();
        assert_eq!(raw, 2);
    }

    #[test]
    fn unserializable_result_degrades_to_string() {
        let ctx = context_with_plugin();
        let result = ctx.call_method("python_0", "give_set", &[]).unwrap();
        assert!(result.is_string());
    }
}
