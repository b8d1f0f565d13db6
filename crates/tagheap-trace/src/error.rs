//! Error types for trace parsing and replay.

use std::error::Error;
use std::fmt;
use std::io;

use tagheap_alloc::{CheckError, HeapError};

/// Errors that can occur while reading or replaying a trace.
///
/// Every variant raised for a specific record carries its 1-based line.
#[derive(Debug)]
pub enum TraceError {
    /// An I/O error occurred while reading.
    Io(io::Error),
    /// A line could not be parsed.
    Malformed {
        /// Line number.
        line: usize,
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A free or reallocate named an id that is not live.
    UnknownId {
        /// Line number.
        line: usize,
        /// The id.
        id: u32,
    },
    /// An allocate reused an id that is still live.
    LiveId {
        /// Line number.
        line: usize,
        /// The id.
        id: u32,
    },
    /// The heap rejected an operation.
    Heap {
        /// Line number.
        line: usize,
        /// The heap's error.
        source: HeapError,
    },
    /// The consistency checker failed after an operation.
    Inconsistent {
        /// Line number.
        line: usize,
        /// The first violation.
        source: CheckError,
    },
    /// A live block's contents changed underneath it.
    Corrupted {
        /// Line number of the operation after which corruption was seen.
        line: usize,
        /// The block's id.
        id: u32,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Malformed { line, detail } => write!(f, "line {line}: malformed record: {detail}"),
            Self::UnknownId { line, id } => write!(f, "line {line}: id {id} is not live"),
            Self::LiveId { line, id } => write!(f, "line {line}: id {id} is already live"),
            Self::Heap { line, source } => write!(f, "line {line}: {source}"),
            Self::Inconsistent { line, source } => {
                write!(f, "line {line}: heap inconsistent: {source}")
            }
            Self::Corrupted { line, id } => {
                write!(f, "line {line}: contents of id {id} were overwritten")
            }
        }
    }
}

impl Error for TraceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Heap { source, .. } => Some(source),
            Self::Inconsistent { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for TraceError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
