//! Embedded-Python layer for the pybridge plugin bridge
//!
//! This crate owns everything that touches the interpreter:
//! 1. Loading plugin files into fresh module namespaces
//! 2. Best-effort reflection over arbitrary plugin objects
//! 3. Method invocation, property access, and event delivery
//! 4. Restricted expression evaluation
//!
//! The protocol layer drives these through an explicit [`BridgeContext`]
//! that owns the plugin registry; there is no implicit global state beyond
//! the interpreter itself.

pub mod errors;
pub mod events;
pub mod executor;
pub mod initialization;
pub mod invoker;
pub mod loader;
pub mod marshal;
pub mod module_plugin;
pub mod properties;
pub mod reflection;
pub mod registry;

pub use errors::BridgeError;
pub use initialization::{python_version, Interpreter};
pub use loader::LoadReport;
pub use module_plugin::{is_plugin_module, load_plugin_from_module, ModulePlugin};
pub use reflection::Introspect;
pub use registry::{BridgeContext, EventCallback, LoadedPlugin, PluginObject};
