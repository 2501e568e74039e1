use pyo3::prelude::*;
use std::io;
use thiserror::Error;

/// Errors that can occur while operating on loaded plugins
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{message}")]
    Python {
        message: String,
        traceback: Option<String>,
    },

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Attribute '{0}' is not callable")]
    NotCallable(String),

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Plugin class or factory '{0}' not found in module")]
    EntryNotFound(String),

    #[error("Plugin '{0}' is module-backed and read-only")]
    ReadOnlyPlugin(String),

    #[error("Failed to serialize/deserialize data: {0}")]
    Serialization(String),

    #[error("Failed to initialize Python interpreter: {0}")]
    Initialization(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BridgeError {
    /// Build a Python error preserving the full traceback text.
    ///
    /// Prefer this over the plain `From<PyErr>` conversion anywhere the
    /// failure is user-visible (plugin import, method invocation, event
    /// handlers) so the host sees the Python-side stack.
    pub fn from_pyerr(py: Python<'_>, err: &PyErr) -> Self {
        BridgeError::Python {
            message: format!("{}", err),
            traceback: Some(format_traceback(py, err)),
        }
    }

    /// Like [`BridgeError::from_pyerr`] with a context prefix on the message
    pub fn from_pyerr_context(py: Python<'_>, err: &PyErr, context: &str) -> Self {
        BridgeError::Python {
            message: format!("{}: {}", context, err),
            traceback: Some(format_traceback(py, err)),
        }
    }

    /// The Python traceback text, when this error carries one
    pub fn traceback(&self) -> Option<String> {
        match self {
            BridgeError::Python { traceback, .. } => traceback.clone(),
            _ => None,
        }
    }
}

/// Render a PyErr the way Python itself prints it: the formatted traceback
/// frames followed by the exception line.
fn format_traceback(py: Python<'_>, err: &PyErr) -> String {
    let frames = err
        .traceback(py)
        .and_then(|tb| tb.format().ok())
        .unwrap_or_default();
    format!("{}{}", frames, err)
}

/// Generic conversion from PyErr to BridgeError.
///
/// NOTE: This conversion loses the Python traceback information!
/// Use `from_pyerr()` / `from_pyerr_context()` for user-facing failures.
impl From<PyErr> for BridgeError {
    fn from(err: PyErr) -> Self {
        BridgeError::Python {
            message: format!("{}", err),
            traceback: None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(format!("{}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_identifiable() {
        assert!(BridgeError::PluginNotFound("python_9".into())
            .to_string()
            .contains("Plugin not found"));
        assert!(BridgeError::MethodNotFound("run".into())
            .to_string()
            .contains("Method not found"));
        assert!(BridgeError::NotCallable("name".into())
            .to_string()
            .contains("not callable"));
        assert!(BridgeError::PropertyNotFound("missing".into())
            .to_string()
            .contains("Property not found"));
    }

    #[test]
    fn pyerr_with_traceback() {
        Python::attach(|py| {
            let err = py
                .eval(c"1/0", None, None)
                .expect_err("division should fail");
            let bridge_err = BridgeError::from_pyerr(py, &err);
            assert!(bridge_err.to_string().contains("ZeroDivisionError"));
            // eval has no Python frames, but the exception line is always present
            let tb = bridge_err.traceback().unwrap();
            assert!(tb.contains("ZeroDivisionError"));
        });
    }
}
