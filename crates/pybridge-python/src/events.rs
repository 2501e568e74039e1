//! Event subscription and emission
//!
//! Subscription is where handlers are resolved: `subscribe_events` looks up
//! the convention-named `on_{event}` handler and the generic `handle_event`
//! on the instance and records the callables in the plugin's callback
//! table. `emit_event` invokes whatever was registered. The bridge has no
//! push channel back to the host, so delivery happens only inside the
//! `emit_event` exchange the host itself triggers; nothing is queued or
//! redelivered.

use crate::errors::BridgeError;
use crate::marshal;
use crate::registry::{BridgeContext, EventCallback};
use pybridge_logger as logger;
use pyo3::prelude::*;
use serde_json::Value;

impl BridgeContext {
    /// Record event subscriptions, resolving callbacks now. Subscribing a
    /// name twice is a no-op. Returns how many callables were registered
    /// across the given names (zero is still a success: a plugin without a
    /// matching handler simply never gets called).
    pub fn subscribe_events(
        &mut self,
        plugin_id: &str,
        event_names: &[String],
    ) -> Result<usize, BridgeError> {
        Python::attach(|py| {
            let plugin = self.get_mut(plugin_id)?;
            let target = plugin.object.target(py);

            let mut registered = 0;
            for event_name in event_names {
                if plugin.events.contains_key(event_name) {
                    continue;
                }

                let mut callbacks = Vec::new();
                let handler_name = format!("on_{}", event_name);
                if target.hasattr(handler_name.as_str())? {
                    let handler = target.getattr(handler_name.as_str())?;
                    if handler.is_callable() {
                        callbacks.push(EventCallback::Named(handler.unbind()));
                    }
                }
                if target.hasattr("handle_event")? {
                    let handler = target.getattr("handle_event")?;
                    if handler.is_callable() {
                        callbacks.push(EventCallback::Generic(handler.unbind()));
                    }
                }

                logger::debug(&format!(
                    "Subscribed {} to '{}' ({} callback(s))",
                    plugin_id,
                    event_name,
                    callbacks.len()
                ));
                registered += callbacks.len();
                plugin.events.insert(event_name.clone(), callbacks);
            }
            Ok(registered)
        })
    }

    /// Drop event subscriptions. Removing a never-subscribed name is a
    /// no-op, not an error.
    pub fn unsubscribe_events(
        &mut self,
        plugin_id: &str,
        event_names: &[String],
    ) -> Result<(), BridgeError> {
        let plugin = self.get_mut(plugin_id)?;
        for event_name in event_names {
            plugin.events.remove(event_name);
        }
        Ok(())
    }

    /// Invoke the callbacks registered for an event. Returns how many were
    /// invoked; an event nobody subscribed to succeeds with zero. A
    /// callback that raises surfaces as a plugin-level error.
    pub fn emit_event(
        &self,
        plugin_id: &str,
        event_name: &str,
        event_data: &Value,
    ) -> Result<usize, BridgeError> {
        Python::attach(|py| {
            let plugin = self.get(plugin_id)?;
            let Some(callbacks) = plugin.events.get(event_name) else {
                return Ok(0);
            };

            let data = marshal::json_to_py(py, event_data)?;
            let mut invoked = 0;
            for callback in callbacks {
                match callback {
                    EventCallback::Named(handler) => {
                        handler.bind(py).call1((&data,)).map_err(|e| {
                            BridgeError::from_pyerr_context(
                                py,
                                &e,
                                &format!("Event handler 'on_{}' failed", event_name),
                            )
                        })?;
                    }
                    EventCallback::Generic(handler) => {
                        handler.bind(py).call1((event_name, &data)).map_err(|e| {
                            BridgeError::from_pyerr_context(
                                py,
                                &e,
                                &format!("handle_event('{}') failed", event_name),
                            )
                        })?;
                    }
                }
                invoked += 1;
            }
            Ok(invoked)
        })
    }
}
