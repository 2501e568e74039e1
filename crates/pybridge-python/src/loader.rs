//! Dynamic plugin loading
//!
//! Every load imports the target file into a freshly created module
//! namespace (importlib `spec_from_file_location` with a unique module
//! name), so loading the same path twice yields two independent modules and
//! two independent instances. The module object is registered alongside the
//! instance and kept alive for the instance's whole lifetime.

use crate::errors::BridgeError;
use crate::module_plugin;
use crate::reflection::Introspect;
use crate::registry::{BridgeContext, PluginObject};
use pybridge_logger as logger;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

/// What `load_plugin` hands back to the protocol layer
#[derive(Debug)]
pub struct LoadReport {
    pub plugin_id: String,
    pub metadata: Value,
    pub methods: Value,
    pub properties: Value,
}

impl BridgeContext {
    /// Load the file at `path` and register a plugin instance from it.
    ///
    /// Instance resolution when `class_name` is given: an attribute named
    /// exactly `class_name` (called with no arguments if callable, used
    /// directly otherwise), else a callable `create_plugin`, else an error.
    /// Without a class name the module-wrapper fallback chain is used
    /// instead (see [`module_plugin::load_plugin_from_module`]).
    pub fn load_plugin(
        &mut self,
        path: &str,
        class_name: Option<&str>,
    ) -> Result<LoadReport, BridgeError> {
        let start = Instant::now();

        if !Path::new(path).exists() {
            return Err(BridgeError::Python {
                message: format!("Plugin file not found: {}", path),
                traceback: None,
            });
        }

        Python::attach(|py| {
            let module = import_fresh_module(py, path, self.next_seq())?;

            let object = match class_name {
                Some(name) if !name.is_empty() => resolve_instance(py, &module, name)?,
                _ => {
                    logger::debug(&format!(
                        "No plugin class given for '{}', using module fallback chain",
                        path
                    ));
                    module_plugin::load_plugin_from_module(&module)
                }
            };

            let (metadata, methods, properties) = object.describe(py)?;
            let plugin_id = self.register(object, module.unbind());

            logger::debug(&format!(
                "Loaded plugin {} from '{}' (took {:?})",
                plugin_id,
                path,
                start.elapsed()
            ));

            Ok(LoadReport {
                plugin_id,
                metadata,
                methods,
                properties,
            })
        })
    }
}

/// Import a file into a brand-new module namespace, bypassing the module
/// cache entirely
fn import_fresh_module<'py>(
    py: Python<'py>,
    path: &str,
    seq: u64,
) -> Result<Bound<'py, PyAny>, BridgeError> {
    let importlib = PyModule::import(py, "importlib.util")?;
    let module_name = format!("pybridge_plugin_{}", seq);

    let spec = importlib
        .call_method1("spec_from_file_location", (module_name.as_str(), path))
        .map_err(|e| {
            BridgeError::from_pyerr_context(
                py,
                &e,
                &format!("Failed to create import spec for '{}'", path),
            )
        })?;
    if spec.is_none() {
        return Err(BridgeError::Python {
            message: format!("Cannot import '{}' as a Python module", path),
            traceback: None,
        });
    }

    let module = importlib.call_method1("module_from_spec", (&spec,))?;
    spec.getattr("loader")?
        .call_method1("exec_module", (&module,))
        .map_err(|e| {
            BridgeError::from_pyerr_context(py, &e, &format!("Failed to import '{}'", path))
        })?;

    Ok(module)
}

/// Resolve the plugin instance from a freshly imported module
fn resolve_instance(
    py: Python<'_>,
    module: &Bound<'_, PyAny>,
    class_name: &str,
) -> Result<PluginObject, BridgeError> {
    if module.hasattr(class_name)? {
        let attr = module.getattr(class_name)?;
        let instance = if attr.is_callable() {
            attr.call0().map_err(|e| {
                BridgeError::from_pyerr_context(
                    py,
                    &e,
                    &format!("Failed to instantiate '{}'", class_name),
                )
            })?
        } else {
            attr
        };
        return Ok(PluginObject::Instance(instance.unbind()));
    }

    if module.hasattr("create_plugin")? {
        let factory = module.getattr("create_plugin")?;
        if factory.is_callable() {
            let instance = factory.call0().map_err(|e| {
                BridgeError::from_pyerr_context(py, &e, "create_plugin() failed")
            })?;
            return Ok(PluginObject::Instance(instance.unbind()));
        }
    }

    Err(BridgeError::EntryNotFound(class_name.to_string()))
}
