//! Best-effort reflection over arbitrary Python objects
//!
//! These are pure functions: they take any object and extract metadata,
//! methods, and properties without assuming a base class. Names starting
//! with an underscore are treated as private and never appear in output.
//! Enumeration order is whatever `dir()` yields; callers must not depend
//! on it.

use crate::errors::BridgeError;
use crate::marshal;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use serde_json::{json, Map, Value};

/// The capability contract every loadable plugin target satisfies, whether
/// it is a dedicated plugin instance or a wrapped plain module.
pub trait Introspect {
    fn metadata(&self, py: Python<'_>) -> Result<Value, BridgeError>;
    fn methods(&self, py: Python<'_>) -> Result<Value, BridgeError>;
    fn properties(&self, py: Python<'_>) -> Result<Value, BridgeError>;

    /// Metadata, methods, and properties in one pass
    fn describe(&self, py: Python<'_>) -> Result<(Value, Value, Value), BridgeError> {
        Ok((self.metadata(py)?, self.methods(py)?, self.properties(py)?))
    }
}

/// Public (non-underscore-prefixed) attribute names of an object
pub fn public_attr_names(obj: &Bound<'_, PyAny>) -> Result<Vec<String>, BridgeError> {
    let mut names = Vec::new();
    for item in obj.dir()?.iter() {
        let name: String = item.extract()?;
        if !name.starts_with('_') {
            names.push(name);
        }
    }
    Ok(names)
}

/// Probe a string-ish attribute, falling back to its `str()` form when the
/// attribute exists but is not a plain string
fn probe_string(obj: &Bound<'_, PyAny>, name: &str) -> Option<String> {
    let attr = obj.getattr(name).ok()?;
    if attr.is_none() {
        return None;
    }
    attr.extract::<String>()
        .ok()
        .or_else(|| attr.str().ok().map(|s| s.to_string()))
}

/// Extract plugin metadata from an instance, with documented defaults for
/// each absent field
pub fn extract_metadata(obj: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    let py = obj.py();

    let mut meta = Map::new();
    meta.insert(
        "name".to_string(),
        probe_string(obj, "name")
            .unwrap_or_else(|| "Unknown Plugin".to_string())
            .into(),
    );
    meta.insert(
        "version".to_string(),
        probe_string(obj, "version")
            .unwrap_or_else(|| "1.0.0".to_string())
            .into(),
    );
    meta.insert(
        "description".to_string(),
        probe_string(obj, "description").unwrap_or_default().into(),
    );
    meta.insert(
        "author".to_string(),
        probe_string(obj, "author").unwrap_or_default().into(),
    );
    meta.insert(
        "license".to_string(),
        probe_string(obj, "license").unwrap_or_default().into(),
    );

    let class = obj.get_type();
    if let Some(class_name) = probe_string(class.as_any(), "__name__") {
        meta.insert("class_name".to_string(), class_name.into());
    }
    if let Some(module_name) = probe_string(class.as_any(), "__module__") {
        meta.insert("module_name".to_string(), module_name.into());
    }

    let inspect = PyModule::import(py, "inspect")?;
    let doc = inspect.call_method1("getdoc", (obj,))?;
    if let Ok(text) = doc.extract::<String>() {
        meta.insert("docstring".to_string(), text.into());
    }

    Ok(Value::Object(meta))
}

/// Discover public callable attributes and their signatures.
///
/// Signature inspection fails for some native callables; those degrade to
/// an empty parameter list instead of being dropped or raising.
pub fn discover_methods(obj: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    let py = obj.py();
    let inspect = PyModule::import(py, "inspect")?;
    let empty = inspect.getattr("Parameter")?.getattr("empty")?;

    let mut methods = Vec::new();
    for name in public_attr_names(obj)? {
        let Ok(attr) = obj.getattr(name.as_str()) else {
            continue;
        };
        if !attr.is_callable() {
            continue;
        }

        let docstring = inspect
            .call_method1("getdoc", (&attr,))
            .ok()
            .and_then(|d| d.extract::<String>().ok())
            .unwrap_or_default();

        let (parameters, return_type) = match inspect.call_method1("signature", (&attr,)) {
            Ok(sig) => describe_signature(&sig, &empty)?,
            // builtins and some C-implemented callables have no signature
            Err(_) => (Vec::new(), "Any".to_string()),
        };

        methods.push(json!({
            "name": name,
            "parameters": parameters,
            "return_type": return_type,
            "docstring": docstring,
        }));
    }
    Ok(Value::Array(methods))
}

fn describe_signature(
    sig: &Bound<'_, PyAny>,
    empty: &Bound<'_, PyAny>,
) -> Result<(Vec<Value>, String), BridgeError> {
    let mut parameters = Vec::new();
    let values = sig.getattr("parameters")?.call_method0("values")?;
    for item in values.try_iter()? {
        let param = item?;
        let name: String = param.getattr("name")?.extract()?;

        let annotation = param.getattr("annotation")?;
        let type_text = if annotation.is(empty) {
            "Any".to_string()
        } else {
            annotation_text(&annotation)
        };

        let default = param.getattr("default")?;
        let default_text = if default.is(empty) {
            Value::Null
        } else {
            Value::String(default.str()?.to_string())
        };

        let kind = param.getattr("kind")?.str()?.to_string();

        parameters.push(json!({
            "name": name,
            "type": type_text,
            "default": default_text,
            "kind": kind,
        }));
    }

    let return_annotation = sig.getattr("return_annotation")?;
    let return_type = if return_annotation.is(empty) {
        "Any".to_string()
    } else {
        annotation_text(&return_annotation)
    };

    Ok((parameters, return_type))
}

/// Render an annotation as text: its `__name__` when it has one (plain
/// classes), otherwise its `str()` form (typing constructs, strings)
fn annotation_text(annotation: &Bound<'_, PyAny>) -> String {
    annotation
        .getattr("__name__")
        .ok()
        .and_then(|n| n.extract::<String>().ok())
        .unwrap_or_else(|| {
            annotation
                .str()
                .map(|s| s.to_string())
                .unwrap_or_else(|_| "Any".to_string())
        })
}

/// Discover public non-callable attributes with their runtime type name and
/// JSON-safe value (string form when not serializable)
pub fn discover_properties(obj: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    let py = obj.py();
    let mut properties = Vec::new();
    for name in public_attr_names(obj)? {
        let Ok(attr) = obj.getattr(name.as_str()) else {
            continue;
        };
        if attr.is_callable() {
            continue;
        }
        let type_name = attr.get_type().name()?.to_string();
        properties.push(json!({
            "name": name,
            "type": type_name,
            "value": marshal::py_to_json_lossy(py, &attr),
        }));
    }
    Ok(Value::Array(properties))
}

/// The same enumeration as [`discover_properties`], returned as a flat
/// name -> value mapping
pub fn get_attributes(obj: &Bound<'_, PyAny>) -> Result<Value, BridgeError> {
    let py = obj.py();
    let mut attributes = Map::new();
    for name in public_attr_names(obj)? {
        let Ok(attr) = obj.getattr(name.as_str()) else {
            continue;
        };
        if attr.is_callable() {
            continue;
        }
        attributes.insert(name, marshal::py_to_json_lossy(py, &attr));
    }
    Ok(Value::Object(attributes))
}
