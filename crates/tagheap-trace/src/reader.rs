//! Text trace reader.
//!
//! [`TraceReader`] reads records line by line from any `BufRead` source.
//! Blank lines and lines starting with `#` are skipped; everything else
//! must be a single request.

use std::io::BufRead;

use crate::error::TraceError;
use crate::types::{Op, Record, Trace};

/// Reads trace records from a line-oriented stream.
///
/// Generic over `R: BufRead` so tests can use `&[u8]` and production
/// code can use `BufReader<File>`.
pub struct TraceReader<R: BufRead> {
    reader: R,
    line: usize,
    buf: String,
    records_read: u64,
}

impl<R: BufRead> TraceReader<R> {
    /// Wrap a stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
            records_read: 0,
        }
    }

    /// Read the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<Record>, TraceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let op = parse_op(text, self.line)?;
            self.records_read += 1;
            return Ok(Some(Record {
                line: self.line,
                op,
            }));
        }
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Convert into a record iterator.
    pub fn records(self) -> Records<R> {
        Records {
            reader: self,
            done: false,
        }
    }
}

/// Iterator adapter over trace records.
///
/// Yields `None` after the first error.
pub struct Records<R: BufRead> {
    reader: TraceReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Record, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Trace {
    /// Parse a whole trace from text.
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        Self::read(text.as_bytes())
    }

    /// Read a whole trace from a stream.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        TraceReader::new(reader).records().collect()
    }
}

fn malformed(line: usize, detail: impl Into<String>) -> TraceError {
    TraceError::Malformed {
        line,
        detail: detail.into(),
    }
}

fn parse_op(text: &str, line: usize) -> Result<Op, TraceError> {
    let mut fields = text.split_whitespace();
    let kind = fields.next().unwrap_or_default();
    let id = match fields.next() {
        Some(field) => field
            .parse::<u32>()
            .map_err(|_| malformed(line, format!("bad id {field:?}")))?,
        None => return Err(malformed(line, "missing id")),
    };
    let mut size = || match fields.next() {
        Some(field) => field
            .parse::<usize>()
            .map_err(|_| malformed(line, format!("bad size {field:?}"))),
        None => Err(malformed(line, "missing size")),
    };
    let op = match kind {
        "a" => Op::Alloc { id, size: size()? },
        "r" => Op::Realloc { id, size: size()? },
        "f" => Op::Free { id },
        other => return Err(malformed(line, format!("unknown request {other:?}"))),
    };
    if let Some(extra) = fields.next() {
        return Err(malformed(line, format!("unexpected field {extra:?}")));
    }
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_request_kinds() {
        let trace = Trace::parse("a 0 100\nr 0 200\nf 0\n").unwrap();
        let ops: Vec<Op> = trace.records().iter().map(|r| r.op).collect();
        assert_eq!(
            ops,
            vec![
                Op::Alloc { id: 0, size: 100 },
                Op::Realloc { id: 0, size: 200 },
                Op::Free { id: 0 },
            ]
        );
    }

    #[test]
    fn skips_comments_and_blank_lines_keeping_line_numbers() {
        let trace = Trace::parse("# header\n\na 1 8\n   \nf 1\n").unwrap();
        let lines: Vec<usize> = trace.records().iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn tolerates_extra_whitespace() {
        let trace = Trace::parse("  a\t7   64  \r\n").unwrap();
        assert_eq!(trace.records()[0].op, Op::Alloc { id: 7, size: 64 });
    }

    #[test]
    fn rejects_unknown_request() {
        let err = Trace::parse("a 0 8\nx 0 8\n").unwrap_err();
        assert!(matches!(err, TraceError::Malformed { line: 2, .. }));
    }

    #[test]
    fn rejects_missing_and_bad_fields() {
        assert!(matches!(
            Trace::parse("a 0").unwrap_err(),
            TraceError::Malformed { line: 1, .. }
        ));
        assert!(matches!(
            Trace::parse("f").unwrap_err(),
            TraceError::Malformed { line: 1, .. }
        ));
        assert!(matches!(
            Trace::parse("a -1 8").unwrap_err(),
            TraceError::Malformed { line: 1, .. }
        ));
        assert!(matches!(
            Trace::parse("r 0 big").unwrap_err(),
            TraceError::Malformed { line: 1, .. }
        ));
    }

    #[test]
    fn rejects_trailing_fields() {
        let err = Trace::parse("f 0 12").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: malformed record: unexpected field \"12\""
        );
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut records = TraceReader::new(&b"a 0 8\nbogus\na 1 8\n"[..]).records();
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn counts_records_read() {
        let mut reader = TraceReader::new(&b"# c\na 0 8\nf 0\n"[..]);
        while reader.next_record().unwrap().is_some() {}
        assert_eq!(reader.records_read(), 2);
    }

    #[test]
    fn display_parses_back() {
        let trace = Trace::from_ops([
            Op::Alloc { id: 3, size: 17 },
            Op::Realloc { id: 3, size: 0 },
        ]);
        let text = trace.to_string();
        assert_eq!(text, "a 3 17\nr 3 0\n");
        assert_eq!(Trace::parse(&text).unwrap(), trace);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arbitrary_text_never_panics(text in "[afr# 0-9\t\n-]{0,200}") {
                if let Err(TraceError::Malformed { line, .. }) = Trace::parse(&text) {
                    prop_assert!(line >= 1 && line <= text.lines().count());
                }
            }
        }
    }
}
