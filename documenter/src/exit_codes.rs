//! Stable exit codes for documenter CLI commands.

/// The application finished and every write succeeded.
pub const OK: i32 = 0;
/// Invalid config, application startup failure, or the application itself failed.
pub const INVALID: i32 = 1;
/// A file write failed; the shim stopped at the first failure.
pub const WRITE_FAILED: i32 = 2;

/// Map a failed run to its exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<crate::io::sink::WriteError>()) {
        WRITE_FAILED
    } else {
        INVALID
    }
}
