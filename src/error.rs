//! Unified error types for the sensor core.
//!
//! Frame faults (bad CRC, out-of-range readings) are *not* errors at this
//! level: they are recorded per reading and never surface to callers.  What
//! remains are the faults a caller can act on: startup failures, invalid
//! configuration, storage failures and rejected display names.
//! All variants are `Copy` so they can be returned from the facade and
//! logged without allocation.

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible public operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Startup failed; no background task was left running.
    Init(&'static str),
    /// `start` was called while an acquisition task is already running.
    AlreadyRunning,
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// The key-value store or file store rejected an operation.
    Storage(StorageError),
    /// A display name was rejected.
    Name(NameError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::AlreadyRunning => write!(f, "sensors already running"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Name(e) => write!(f, "name: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Name errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// Name is longer than the stored binding can hold.
    TooLong { len: usize, max: usize },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { len, max } => write!(f, "{len} bytes exceeds the {max}-byte limit"),
        }
    }
}

impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
