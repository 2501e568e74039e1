//! Plugin registry and bridge context
//!
//! The context is the single owner of all process-wide plugin state. It is
//! created at startup by the protocol handler and passed explicitly; there
//! is no global registry. Plugin ids are sequential (`python_0`,
//! `python_1`, ...) and never reused within a session. There is no unload:
//! a loaded plugin and its backing module live until the process exits,
//! which keeps the module-outlives-instance invariant trivially true.

use crate::errors::BridgeError;
use crate::module_plugin::ModulePlugin;
use crate::reflection::{self, Introspect};
use pyo3::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

/// A plugin target: either a dedicated plugin instance or a plain module
/// presented through the wrapper
#[derive(Debug)]
pub enum PluginObject {
    Instance(Py<PyAny>),
    Module(ModulePlugin),
}

impl PluginObject {
    /// The Python object attribute operations are applied to. For wrapped
    /// modules this delegates reads to the module itself.
    pub fn target<'py>(&self, py: Python<'py>) -> Bound<'py, PyAny> {
        match self {
            PluginObject::Instance(obj) => obj.bind(py).clone(),
            PluginObject::Module(wrapper) => wrapper.module(py),
        }
    }

    pub fn is_module_backed(&self) -> bool {
        matches!(self, PluginObject::Module(_))
    }
}

impl Introspect for PluginObject {
    fn metadata(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        match self {
            PluginObject::Instance(obj) => reflection::extract_metadata(obj.bind(py)),
            PluginObject::Module(wrapper) => wrapper.metadata(py),
        }
    }

    fn methods(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        match self {
            PluginObject::Instance(obj) => reflection::discover_methods(obj.bind(py)),
            PluginObject::Module(wrapper) => wrapper.methods(py),
        }
    }

    fn properties(&self, py: Python<'_>) -> Result<Value, BridgeError> {
        match self {
            PluginObject::Instance(obj) => reflection::discover_properties(obj.bind(py)),
            PluginObject::Module(wrapper) => wrapper.properties(py),
        }
    }
}

/// An event callback registered at subscribe time
#[derive(Debug)]
pub enum EventCallback {
    /// A convention-named `on_{event}` handler, called with the event data
    Named(Py<PyAny>),
    /// A generic `handle_event` handler, called with (event name, data)
    Generic(Py<PyAny>),
}

/// One loaded plugin: the target object, the module that defined it, and
/// the per-plugin event callback table
#[derive(Debug)]
pub struct LoadedPlugin {
    pub object: PluginObject,
    /// Keepalive for the defining module; must not drop before the instance
    _module: Py<PyAny>,
    pub events: HashMap<String, Vec<EventCallback>>,
}

/// Process-wide bridge state: the plugin registry and the id counter
#[derive(Default)]
pub struct BridgeContext {
    plugins: HashMap<String, LoadedPlugin>,
    next_id: u64,
}

impl BridgeContext {
    pub fn new() -> Self {
        BridgeContext::default()
    }

    /// The sequence number the next registered plugin will get
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_id
    }

    /// Register a loaded plugin and assign it the next sequential id
    pub(crate) fn register(&mut self, object: PluginObject, module: Py<PyAny>) -> String {
        let plugin_id = format!("python_{}", self.next_id);
        self.next_id += 1;
        self.plugins.insert(
            plugin_id.clone(),
            LoadedPlugin {
                object,
                _module: module,
                events: HashMap::new(),
            },
        );
        plugin_id
    }

    pub fn plugin_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub(crate) fn get(&self, plugin_id: &str) -> Result<&LoadedPlugin, BridgeError> {
        self.plugins
            .get(plugin_id)
            .ok_or_else(|| BridgeError::PluginNotFound(plugin_id.to_string()))
    }

    pub(crate) fn get_mut(&mut self, plugin_id: &str) -> Result<&mut LoadedPlugin, BridgeError> {
        self.plugins
            .get_mut(plugin_id)
            .ok_or_else(|| BridgeError::PluginNotFound(plugin_id.to_string()))
    }

    /// Metadata, methods, and properties of a loaded plugin
    pub fn describe_plugin(
        &self,
        plugin_id: &str,
    ) -> Result<(Value, Value, Value), BridgeError> {
        Python::attach(|py| {
            let plugin = self.get(plugin_id)?;
            plugin.object.describe(py)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_never_reused() {
        Python::attach(|py| {
            let mut ctx = BridgeContext::new();
            let obj = py.eval(c"object()", None, None).unwrap();
            let module = py.eval(c"object()", None, None).unwrap();

            let first = ctx.register(
                PluginObject::Instance(obj.clone().unbind()),
                module.clone().unbind(),
            );
            let second =
                ctx.register(PluginObject::Instance(obj.unbind()), module.unbind());
            assert_eq!(first, "python_0");
            assert_eq!(second, "python_1");
            assert_eq!(ctx.len(), 2);
        });
    }

    #[test]
    fn unknown_plugin_is_an_identifiable_error() {
        let ctx = BridgeContext::new();
        let err = ctx.get("python_42").unwrap_err();
        assert!(err.to_string().contains("Plugin not found"));
    }
}
