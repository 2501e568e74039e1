//! Python interpreter initialization
//!
//! The interpreter is initialized once per process through a OnceCell
//! singleton, before the protocol loop starts. An optional extra site
//! directory can be appended to `sys.path` so plugin files can import
//! their own package dependencies.

use crate::errors::BridgeError;
use once_cell::sync::OnceCell;
use pybridge_logger as logger;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use std::path::{Path, PathBuf};

/// Handle proving the embedded interpreter is up
pub struct Interpreter {
    _marker: (),
}

static INTERPRETER: OnceCell<Result<Interpreter, BridgeError>> = OnceCell::new();

impl Interpreter {
    /// Get or initialize the interpreter singleton
    pub fn get(site_dir: Option<&Path>) -> Result<&'static Interpreter, BridgeError> {
        let site_dir = site_dir.map(Path::to_path_buf);
        match INTERPRETER.get_or_init(|| Interpreter::initialize(site_dir)) {
            Ok(interpreter) => Ok(interpreter),
            Err(e) => Err(BridgeError::Initialization(format!("{}", e))),
        }
    }

    fn initialize(site_dir: Option<PathBuf>) -> Result<Interpreter, BridgeError> {
        let start_time = std::time::Instant::now();

        let pyo3_start = std::time::Instant::now();
        pyo3::Python::initialize();
        logger::debug(&format!(
            "pyo3::Python::initialize took: {:?}",
            pyo3_start.elapsed()
        ));

        if let Some(ref dir) = site_dir {
            add_site_dir(dir)?;
        }

        let version = python_version()?;
        logger::info(&format!("Embedded Python {} ready", version));

        logger::debug(&format!(
            "Total interpreter initialization took: {:?}",
            start_time.elapsed()
        ));
        Ok(Interpreter { _marker: () })
    }
}

/// Append a directory to the interpreter's module search path via
/// `site.addsitedir`, so `.pth` files are honored too
fn add_site_dir(dir: &Path) -> Result<(), BridgeError> {
    if !dir.exists() {
        return Err(BridgeError::Initialization(format!(
            "Site directory not found: {}",
            dir.display()
        )));
    }

    Python::attach(|py| {
        let site = PyModule::import(py, "site")
            .map_err(|e| BridgeError::Initialization(format!("Failed to import site: {}", e)))?;
        site.call_method1("addsitedir", (dir.to_string_lossy().as_ref(),))
            .map_err(|e| {
                BridgeError::Initialization(format!("Failed to add site directory: {}", e))
            })?;
        logger::debug(&format!("Added site directory: {}", dir.display()));
        Ok(())
    })
}

/// The embedded interpreter's version as "major.minor.micro"
pub fn python_version() -> Result<String, BridgeError> {
    Python::attach(|py| {
        let sys = PyModule::import(py, "sys")
            .map_err(|e| BridgeError::Initialization(format!("Failed to import sys: {}", e)))?;
        let version_info = sys.getattr("version_info")?;

        let major: i32 = version_info.getattr("major")?.extract()?;
        let minor: i32 = version_info.getattr("minor")?.extract()?;
        let micro: i32 = version_info.getattr("micro")?.extract()?;

        Ok(format!("{}.{}.{}", major, minor, micro))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_looks_like_a_version() {
        let version = python_version().unwrap();
        let parts: Vec<&str> = version.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "3");
    }

    #[test]
    fn missing_site_dir_is_an_error() {
        let err = add_site_dir(Path::new("/nonexistent/site-packages")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn get_is_idempotent() {
        let first = Interpreter::get(None);
        let second = Interpreter::get(None);
        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
