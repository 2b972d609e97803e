//! I/O parts of the shim.

pub mod config;
pub mod host;
pub mod sink;
