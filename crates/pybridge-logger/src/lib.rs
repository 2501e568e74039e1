//! Logging for the pybridge process.
//!
//! Standard output carries the wire protocol, so every diagnostic goes to
//! standard error and (always) to the log file. Console verbosity is
//! controlled by the `-v` flags on the binary; the file gets everything.

use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);

/// Get the current verbosity level for use by other modules
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Initialize the logger with a verbosity level and an optional explicit
/// log file path. When no path is given the file lives in the user config
/// directory (`~/.config/pybridge/pybridge.log` on Unix).
pub fn init_with_verbosity(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), String> {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }

    let log_file = match log_file {
        Some(path) => path,
        None => default_log_dir()?.join("pybridge.log"),
    };

    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    // Truncate the log file on each run (overwrite instead of append)
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(log_file);
    }

    Ok(())
}

/// Get the active log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

fn default_log_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("pybridge");

    #[cfg(target_os = "windows")]
    let dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("pybridge");

    Ok(dir)
}

/// Append to the log file with a timestamp
fn write_to_log(message: &str) {
    if let Ok(guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] {}", timestamp, message);
            }
        }
    }
}

/// Log an informational message (to stderr if verbose >= 1, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if get_verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

/// Log a debug message (to stderr if verbose >= 1, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 1 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Log a trace-level message (to stderr only at -vv)
pub fn trace(message: &str) {
    write_to_log(&format!("TRACE {}", message));
    if get_verbosity() >= 2 {
        eprintln!("{} {}", "TRACE:".cyan().bold(), message);
    }
}

/// Log a warning message (to both file and stderr)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Log an error message (to both file and stderr)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    eprintln!("{} {}", "Error:".red().bold(), message);
}
