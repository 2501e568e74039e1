//! Wire protocol for the pybridge plugin bridge
//!
//! The host and the bridge exchange line-delimited UTF-8 JSON: one request
//! object per line on stdin, one response object per line on stdout. Every
//! request carries an `id` (defaulting to 0) which the matching response
//! echoes back; the host correlates responses by that id.

pub mod request;
pub mod response;

pub use request::{ParseError, Request, RequestOp};
pub use response::Response;
