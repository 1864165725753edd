//! Crate-wide error types.
//!
//! Each subsystem has its own narrow error enum; [`SimError`] unifies them
//! for callers that don't care which subsystem failed. `Absent` is
//! deliberately not a variant here: per the query service contract, a
//! missing component or unknown handle is represented as `Option::None`,
//! never raised as an error.

use thiserror::Error;

use crate::handle::Handle;

/// Errors from the handle allocator and component store.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum StoreError {
    #[error("handle allocator has reached its configured capacity")]
    CapacityExceeded,
    #[error("cannot attach a propagator component without orbital-elements on {0}")]
    InvariantViolation(Handle),
}

/// Errors from the shared position buffer.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum BufferError {
    #[error("position buffer is full")]
    Full,
}

/// Errors from TLE parsing.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TleError {
    #[error("line {line} must be exactly 69 characters, got {len}")]
    WrongLength { line: u8, len: usize },
    #[error("line {line} must start with \"{expected} \"")]
    WrongLineNumber { line: u8, expected: char },
    #[error("checksum mismatch on line {line}: expected {expected}, computed {computed}")]
    ChecksumMismatch { line: u8, expected: u8, computed: u8 },
    #[error("underlying element set was rejected: {0}")]
    Elements(String),
}

/// Errors from a propagator step or construction.
#[derive(Debug, Error, Clone)]
pub enum PropagationError {
    #[error("propagator was never successfully initialized")]
    NotInitialized,
    #[error("propagation failed for this step: {0}")]
    Failed(String),
}

/// The union of all error kinds a caller of this crate may observe.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Tle(#[from] TleError),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}
