//! Core trace types.

use std::fmt;

/// One request in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate `size` bytes and bind the block to `id`.
    Alloc {
        /// Caller-chosen block id.
        id: u32,
        /// Requested payload size.
        size: usize,
    },
    /// Release the block bound to `id`.
    Free {
        /// Block id.
        id: u32,
    },
    /// Resize the block bound to `id` to `size` bytes. Zero releases it.
    Realloc {
        /// Block id.
        id: u32,
        /// New payload size.
        size: usize,
    },
}

impl Op {
    /// The id this request targets.
    pub fn id(&self) -> u32 {
        match *self {
            Op::Alloc { id, .. } | Op::Free { id } | Op::Realloc { id, .. } => id,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Alloc { id, size } => write!(f, "a {id} {size}"),
            Op::Free { id } => write!(f, "f {id}"),
            Op::Realloc { id, size } => write!(f, "r {id} {size}"),
        }
    }
}

/// A request together with the line it was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// 1-based source line, or the 1-based position for built traces.
    pub line: usize,
    /// The request.
    pub op: Op,
}

/// An ordered sequence of requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    records: Vec<Record>,
}

impl Trace {
    /// An empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trace from bare requests, numbering them from 1.
    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        let records = ops
            .into_iter()
            .enumerate()
            .map(|(i, op)| Record { line: i + 1, op })
            .collect();
        Self { records }
    }

    /// Append a request, numbering it after the last record.
    pub fn push(&mut self, op: Op) {
        let line = self.records.last().map_or(1, |r| r.line + 1);
        self.records.push(Record { line, op });
    }

    /// The records in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of requests.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the trace has no requests.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for Trace {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Renders one request per line in the text trace format.
impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}", record.op)?;
        }
        Ok(())
    }
}
