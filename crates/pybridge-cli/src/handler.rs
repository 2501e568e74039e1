//! Wire protocol handler
//!
//! Single-threaded, synchronous loop: read one line from stdin, handle it,
//! write one response line, flush, repeat. Every request yields exactly
//! one response; no failure terminates the loop except stdin closing, a
//! stdout write error, or an explicit `shutdown` request (which takes
//! effect only after its own response is written).

use pybridge_logger as logger;
use pybridge_protocol::{Request, RequestOp, Response};
use pybridge_python::{executor, python_version, BridgeContext, BridgeError};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Owns the bridge state and drives the request/response loop
pub struct ProtocolHandler {
    ctx: BridgeContext,
    running: bool,
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolHandler {
    pub fn new() -> Self {
        ProtocolHandler {
            ctx: BridgeContext::new(),
            running: false,
        }
    }

    /// Run the loop until shutdown or end of input. The only suspension
    /// point is the blocking line read; responses are emitted in strict
    /// FIFO order matching request arrival.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> std::io::Result<()> {
        self.running = true;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line);
            writeln!(writer, "{}", response.to_line())?;
            // the host blocks on a synchronous read of this line
            writer.flush()?;

            if !self.running {
                logger::info("Shutdown requested, leaving request loop");
                break;
            }
        }
        Ok(())
    }

    /// Handle one raw request line. Never panics and never raises: every
    /// failure becomes a `success:false` response.
    pub fn handle_line(&mut self, line: &str) -> Response {
        let request = match Request::from_line(line) {
            Ok(request) => request,
            Err(e) => {
                logger::debug(&format!("Rejected request line: {}", e));
                return Response::failure(e.id(), e.to_string(), None);
            }
        };

        let id = request.id;
        match self.dispatch(id, request.op) {
            Ok(response) => response,
            Err(e) => {
                logger::debug(&format!("Request {} failed: {}", id, e));
                let traceback = e.traceback();
                Response::failure(id, e.to_string(), traceback)
            }
        }
    }

    fn dispatch(&mut self, id: i64, op: RequestOp) -> Result<Response, BridgeError> {
        match op {
            RequestOp::Initialize => {
                let version = python_version()?;
                Ok(Response::ok(id)
                    .with_message("Python bridge initialized")
                    .with_field("python_version", version.into()))
            }

            RequestOp::Shutdown => {
                self.running = false;
                Ok(Response::ok(id).with_message("Python bridge shutting down"))
            }

            RequestOp::Ping => Ok(Response::ok(id).with_message("pong")),

            RequestOp::ExecuteCode { code, context } => {
                let result = executor::execute(&code, &context)?;
                Ok(Response::ok(id).with_field("result", result))
            }

            RequestOp::LoadPlugin {
                plugin_path,
                plugin_class,
            } => {
                let report = self.ctx.load_plugin(&plugin_path, plugin_class.as_deref())?;
                let message = format!("Plugin loaded: {}", report.plugin_id);
                Ok(Response::ok(id)
                    .with_field("plugin_id", report.plugin_id.into())
                    .with_message(&message)
                    .with_field("metadata", report.metadata)
                    .with_field("methods", report.methods)
                    .with_field("properties", report.properties))
            }

            RequestOp::ListPlugins => {
                let ids: Vec<Value> = self
                    .ctx
                    .plugin_ids()
                    .into_iter()
                    .map(Value::String)
                    .collect();
                Ok(Response::ok(id).with_field("plugins", Value::Array(ids)))
            }

            RequestOp::CallMethod {
                plugin_id,
                method_name,
                parameters,
            } => {
                let result = self.ctx.call_method(&plugin_id, &method_name, &parameters)?;
                Ok(Response::ok(id).with_field("result", result))
            }

            RequestOp::GetPluginInfo { plugin_id } => {
                let (metadata, methods, properties) = self.ctx.describe_plugin(&plugin_id)?;
                Ok(Response::ok(id)
                    .with_field("metadata", metadata)
                    .with_field("methods", methods)
                    .with_field("properties", properties))
            }

            RequestOp::GetProperty {
                plugin_id,
                property_name,
            } => {
                let (value, type_name) = self.ctx.get_property(&plugin_id, &property_name)?;
                Ok(Response::ok(id)
                    .with_field("value", value)
                    .with_field("type", type_name.into()))
            }

            RequestOp::SetProperty {
                plugin_id,
                property_name,
                value,
            } => {
                self.ctx.set_property(&plugin_id, &property_name, &value)?;
                Ok(Response::ok(id)
                    .with_message(&format!("Property '{}' set", property_name)))
            }

            RequestOp::SubscribeEvents {
                plugin_id,
                event_names,
            } => {
                self.ctx.subscribe_events(&plugin_id, &event_names)?;
                Ok(Response::ok(id).with_message(&format!(
                    "Subscribed to {} event(s)",
                    event_names.len()
                )))
            }

            RequestOp::UnsubscribeEvents {
                plugin_id,
                event_names,
            } => {
                self.ctx.unsubscribe_events(&plugin_id, &event_names)?;
                Ok(Response::ok(id).with_message(&format!(
                    "Unsubscribed from {} event(s)",
                    event_names.len()
                )))
            }

            RequestOp::EmitEvent {
                plugin_id,
                event_name,
                event_data,
            } => {
                let invoked = self.ctx.emit_event(&plugin_id, &event_name, &event_data)?;
                Ok(Response::ok(id)
                    .with_message(&format!("Dispatched to {} handler(s)", invoked))
                    .with_field("event_name", event_name.into())
                    .with_field("event_data", event_data))
            }
        }
    }
}
