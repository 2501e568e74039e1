//! Plain-module plugin wrapper
//!
//! Not every plugin file defines a plugin class; some expose module-level
//! functions and `__plugin_*__` metadata attributes. The wrapper presents
//! such a module through the same introspection contract as a dedicated
//! plugin instance. Attribute delegation is read-only: reads go to the
//! wrapped module, writes are rejected by the property accessor.

use crate::errors::BridgeError;
use crate::reflection::{self, Introspect};
use crate::registry::PluginObject;
use pyo3::prelude::*;
use serde_json::{Map, Value};

/// Class names treated as a plugin entry by convention
pub const KNOWN_PLUGIN_CLASSES: &[&str] = &["Plugin", "PluginBase", "BridgePlugin"];

/// Module-level metadata dunders recognized by the wrapper
const METADATA_ATTRS: &[&str] = &[
    "__plugin_name__",
    "__plugin_version__",
    "__plugin_description__",
    "__plugin_author__",
    "__plugin_license__",
    "__plugin_category__",
];

/// A plain module presented as a plugin
#[derive(Debug)]
pub struct ModulePlugin {
    module: Py<PyAny>,
}

impl ModulePlugin {
    pub fn new(module: &Bound<'_, PyAny>) -> Self {
        ModulePlugin {
            module: module.clone().unbind(),
        }
    }

    /// The wrapped module; attribute reads delegate here
    pub fn module<'py>(&self, py: Python<'py>) -> Bound<'py, PyAny> {
        self.module.bind(py).clone()
    }

    fn meta_string(&self, py: Python<'_>, dunder: &str) -> Option<String> {
        let module = self.module.bind(py);
        let attr = module.getattr(dunder).ok()?;
        if attr.is_none() {
            return None;
        }
        attr.extract::<String>()
            .ok()
            .or_else(|| attr.str().ok().map(|s| s.to_string()))
    }

    /// Plugin name: `__plugin_name__`, else the module's own `__name__`
    pub fn name(&self, py: Python<'_>) -> String {
        self.meta_string(py, "__plugin_name__")
            .or_else(|| self.meta_string(py, "__name__"))
            .unwrap_or_else(|| "Unknown Plugin".to_string())
    }

    pub fn version(&self, py: Python<'_>) -> String {
        self.meta_string(py, "__plugin_version__")
            .unwrap_or_else(|| "1.0.0".to_string())
    }

    pub fn category(&self, py: Python<'_>) -> String {
        self.meta_string(py, "__plugin_category__")
            .unwrap_or_else(|| "general".to_string())
    }

    /// Public module-level functions, same filtering rule as the
    /// reflection engine
    pub fn list_functions(&self, py: Python<'_>) -> Result<Vec<String>, BridgeError> {
        let module = self.module.bind(py);
        let mut functions = Vec::new();
        for name in reflection::public_attr_names(module)? {
            if let Ok(attr) = module.getattr(name.as_str()) {
                if attr.is_callable() {
                    functions.push(name);
                }
            }
        }
        Ok(functions)
    }

    /// Public non-callable module attributes
    pub fn list_attributes(&self, py: Python<'_>) -> Result<Vec<String>, BridgeError> {
        let module = self.module.bind(py);
        let mut attributes = Vec::new();
        for name in reflection::public_attr_names(module)? {
            if let Ok(attr) = module.getattr(name.as_str()) {
                if !attr.is_callable() {
                    attributes.push(name);
                }
            }
        }
        Ok(attributes)
    }
}

impl Introspect for ModulePlugin {
    fn metadata(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        let module = self.module.bind(py);

        let mut meta = Map::new();
        meta.insert("name".to_string(), self.name(py).into());
        meta.insert("version".to_string(), self.version(py).into());
        meta.insert(
            "description".to_string(),
            self.meta_string(py, "__plugin_description__")
                .unwrap_or_default()
                .into(),
        );
        meta.insert(
            "author".to_string(),
            self.meta_string(py, "__plugin_author__")
                .unwrap_or_default()
                .into(),
        );
        meta.insert(
            "license".to_string(),
            self.meta_string(py, "__plugin_license__")
                .unwrap_or_default()
                .into(),
        );
        meta.insert("category".to_string(), self.category(py).into());
        meta.insert("class_name".to_string(), "module".into());
        if let Some(module_name) = self.meta_string(py, "__name__") {
            meta.insert("module_name".to_string(), module_name.into());
        }
        if let Ok(doc) = module.getattr("__doc__") {
            if let Ok(text) = doc.extract::<String>() {
                meta.insert("docstring".to_string(), text.into());
            }
        }

        Ok(Value::Object(meta))
    }

    fn methods(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        reflection::discover_methods(self.module.bind(py))
    }

    fn properties(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        reflection::discover_properties(self.module.bind(py))
    }
}

/// Heuristic: does this module look like a plugin module at all?
pub fn is_plugin_module(module: &Bound<'_, PyAny>) -> Result<bool, BridgeError> {
    for class_name in KNOWN_PLUGIN_CLASSES {
        if module.hasattr(*class_name)? {
            return Ok(true);
        }
    }
    if module.hasattr("create_plugin")? && module.getattr("create_plugin")?.is_callable() {
        return Ok(true);
    }
    if module.hasattr("plugin")? {
        return Ok(true);
    }
    for dunder in METADATA_ATTRS {
        if module.hasattr(*dunder)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Obtain a plugin target from a module, trying in order: a known plugin
/// class, a `create_plugin()` factory, an existing `plugin` attribute, and
/// finally wrapping the module itself.
///
/// Every failed attempt is swallowed; this function never raises.
pub fn load_plugin_from_module(module: &Bound<'_, PyAny>) -> PluginObject {
    for class_name in KNOWN_PLUGIN_CLASSES {
        if let Ok(class) = module.getattr(*class_name) {
            if class.is_callable() {
                if let Ok(instance) = class.call0() {
                    return PluginObject::Instance(instance.unbind());
                }
            }
        }
    }

    if let Ok(factory) = module.getattr("create_plugin") {
        if factory.is_callable() {
            if let Ok(instance) = factory.call0() {
                return PluginObject::Instance(instance.unbind());
            }
        }
    }

    if let Ok(existing) = module.getattr("plugin") {
        if !existing.is_none() {
            return PluginObject::Instance(existing.unbind());
        }
    }

    PluginObject::Module(ModulePlugin::new(module))
}
