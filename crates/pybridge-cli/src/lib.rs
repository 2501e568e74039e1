//! pybridge: a subprocess bridge hosting Python plugin objects
//!
//! The native host spawns this binary, writes line-delimited JSON requests
//! to its stdin, and reads one JSON response per line from its stdout.
//! See the `pybridge-protocol` crate for the wire contract and
//! `pybridge-python` for the embedded-interpreter layer.

pub mod handler;

pub use handler::ProtocolHandler;
