// src/error/jit_error.rs
use thiserror::Error;

/// Resource-level failures surfaced to the caller.
///
/// Contract violations (API misuse such as emitting into a closed block or
/// exceeding the six-argument limit) are caller bugs and panic with a message
/// naming the broken contract; only failures of the host environment are
/// representable as values.
#[derive(Debug, Error)]
pub enum JitError {
    #[error("memory mapping of {size} bytes failed: {source}")]
    Map { size: usize, source: std::io::Error },

    #[error("making the code region executable failed: {source}")]
    Protect { source: std::io::Error },
}
