//! Deterministic, pure logic shared by the shim.
//!
//! Core modules must be free of I/O side effects so they can be tested in
//! isolation.

pub mod path;
pub mod request;
