//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Growing the break by `requested` bytes would cross the ceiling.
    Exhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Break at the time of the request.
        brk: usize,
        /// Configured ceiling.
        max: usize,
    },
    /// The arena configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted {
                requested,
                brk,
                max,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} bytes at break {brk}, ceiling {max} bytes"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
        }
    }
}

impl Error for ArenaError {}
