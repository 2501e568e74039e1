//! Property access on loaded plugins

use crate::errors::BridgeError;
use crate::marshal;
use crate::registry::{BridgeContext, PluginObject};
use pyo3::prelude::*;
use serde_json::Value;

impl BridgeContext {
    /// Read a property: its JSON-safe value (string form when not
    /// serializable) and its runtime type name
    pub fn get_property(
        &self,
        plugin_id: &str,
        property_name: &str,
    ) -> Result<(Value, String), BridgeError> {
        Python::attach(|py| {
            let plugin = self.get(plugin_id)?;
            let target = plugin.object.target(py);

            if !target.hasattr(property_name)? {
                return Err(BridgeError::PropertyNotFound(property_name.to_string()));
            }
            let attr = target.getattr(property_name)?;
            let type_name = attr.get_type().name()?.to_string();
            Ok((marshal::py_to_json_lossy(py, &attr), type_name))
        })
    }

    /// Assign a property by direct attribute assignment. No type
    /// compatibility check happens here; acceptance or rejection is
    /// entirely up to the target instance (a validating setter may raise,
    /// which surfaces as an error response).
    pub fn set_property(
        &self,
        plugin_id: &str,
        property_name: &str,
        value: &Value,
    ) -> Result<(), BridgeError> {
        Python::attach(|py| {
            let plugin = self.get(plugin_id)?;
            let target = match &plugin.object {
                PluginObject::Instance(obj) => obj.bind(py).clone(),
                // wrapper delegation is read-only; writes are not proxied
                PluginObject::Module(_) => {
                    return Err(BridgeError::ReadOnlyPlugin(plugin_id.to_string()))
                }
            };

            let py_value = marshal::json_to_py(py, value)?;
            target.setattr(property_name, py_value).map_err(|e| {
                BridgeError::from_pyerr_context(
                    py,
                    &e,
                    &format!("Failed to set property '{}'", property_name),
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_plugin::ModulePlugin;
    use pyo3::types::PyModule;
    use serde_json::json;

    fn context_with_plugin() -> BridgeContext {
        Python::attach(|py| {
            let module = PyModule::from_code(
                py,
                cr#"
class Plugin:
    def __init__(self):
        self.name = "initial"
        self.tags = ["a", "b"]
"#,
                c"props.py",
                c"props",
            )
            .unwrap();

            let mut ctx = BridgeContext::new();
            let instance = module.getattr("Plugin").unwrap().call0().unwrap();
            ctx.register(
                PluginObject::Instance(instance.unbind()),
                module.into_any().unbind(),
            );
            ctx
        })
    }

    #[test]
    fn get_set_get_roundtrip() {
        let ctx = context_with_plugin();

        let (value, type_name) = ctx.get_property("python_0", "name").unwrap();
        assert_eq!(value, "initial");
        assert_eq!(type_name, "str");

        ctx.set_property("python_0", "name", &json!("updated"))
            .unwrap();
        let (value, _) = ctx.get_property("python_0", "name").unwrap();
        assert_eq!(value, "updated");
    }

    #[test]
    fn missing_property_is_identifiable() {
        let ctx = context_with_plugin();
        let err = ctx.get_property("python_0", "nope").unwrap_err();
        assert!(err.to_string().contains("Property not found"));
    }

    #[test]
    fn set_accepts_structured_values() {
        let ctx = context_with_plugin();
        ctx.set_property("python_0", "tags", &json!(["x", "y", "z"]))
            .unwrap();
        let (value, type_name) = ctx.get_property("python_0", "tags").unwrap();
        assert_eq!(value, json!(["x", "y", "z"]));
        assert_eq!(type_name, "list");
    }

    #[test]
    fn module_backed_plugins_are_read_only() {
        Python::attach(|py| {
            let module = PyModule::from_code(
                py,
                c"__plugin_name__ = 'mod'\nvalue = 1\n",
                c"mod.py",
                c"mod",
            )
            .unwrap()
            .into_any();

            let mut ctx = BridgeContext::new();
            ctx.register(
                PluginObject::Module(ModulePlugin::new(&module)),
                module.unbind(),
            );

            let (value, _) = ctx.get_property("python_0", "value").unwrap();
            assert_eq!(value, 1);

            let err = ctx
                .set_property("python_0", "value", &json!(2))
                .unwrap_err();
            assert!(err.to_string().contains("read-only"));
        });
    }
}
