//! Port shim that persists `createFile` messages emitted by an application.
//!
//! An application (an external program, or anything implementing
//! [`io::host::Application`]) emits port messages; the shim forwards every
//! `createFile` payload to a file sink that writes it under a base directory.
//!
//! - **[`core`]**: Pure logic (message decoding, path resolution). No I/O.
//! - **[`io`]**: Side-effecting parts (configuration, application host, file sink).
//!
//! [`shim`] wires the host to the sink and supervises both for the CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod shim;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
