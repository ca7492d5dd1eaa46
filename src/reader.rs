//! Row-oriented CSV reading on top of the streaming tokenizer.
//!
//! [`CsvReader`] pulls chunks from any [`Read`] source, runs them through a
//! [`Tokenizer`], and materializes owned rows. It exists for callers that
//! want rows without writing a visitor; code on a hot path should implement
//! [`FieldVisitor`](crate::visitor::FieldVisitor) directly and keep the
//! zero-copy field slices.

use crate::buffers::{input_buffer_size, DEFAULT_MAX_FIELD_LENGTH};
use crate::tokenizer::Tokenizer;
use crate::visitor::FieldVisitor;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading CSV rows.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Field in record {record} exceeds the maximum field length of {max} bytes")]
    FieldTooLong { record: u64, max: usize },
}

pub type Result<T> = std::result::Result<T, CsvError>;

/// Visitor that assembles completed rows into a FIFO queue, tagging rows
/// that contained an oversized field.
#[derive(Debug, Default)]
struct RowQueue {
    rows: VecDeque<(Vec<Vec<u8>>, bool)>,
    row: Vec<Vec<u8>>,
    field: Vec<u8>,
    oversized: bool,
}

impl FieldVisitor for RowQueue {
    fn visit_partial_field_data(&mut self, data: &[u8]) {
        self.field.extend_from_slice(data);
    }

    fn visit_end_of_field(&mut self, data: &[u8]) {
        self.field.extend_from_slice(data);
        self.row.push(std::mem::take(&mut self.field));
    }

    fn visit_end_of_line(&mut self) {
        let row = std::mem::take(&mut self.row);
        self.rows.push_back((row, self.oversized));
        self.oversized = false;
    }

    fn visit_field_too_long(&mut self, _bytes_seen: usize) {
        self.oversized = true;
    }
}

/// A streaming CSV row reader.
pub struct CsvReader<R: Read> {
    input: R,
    tokenizer: Tokenizer,
    queue: RowQueue,
    chunk: Vec<u8>,
    record: u64,
    done: bool,
}

impl CsvReader<File> {
    /// Open a CSV file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> CsvReader<R> {
    /// Create a new CSV reader from any readable source.
    pub fn new(input: R) -> Self {
        Self::with_capacity(input, input_buffer_size(false))
    }

    /// Create a CSV reader with a custom read chunk size.
    pub fn with_capacity(input: R, capacity: usize) -> Self {
        Self {
            input,
            tokenizer: Tokenizer::new(DEFAULT_MAX_FIELD_LENGTH),
            queue: RowQueue::default(),
            chunk: vec![0u8; capacity],
            record: 0,
            done: false,
        }
    }

    /// Replace the maximum field length. Only valid before the first read.
    pub fn with_max_field_length(mut self, max_field_length: usize) -> Self {
        self.tokenizer.set_max_field_length(max_field_length);
        self
    }

    /// Read the next row as owned field buffers.
    ///
    /// A row containing an oversized field comes back as
    /// [`CsvError::FieldTooLong`]; subsequent calls keep reading, so callers
    /// can skip bad records and continue.
    pub fn read_row(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
        loop {
            if let Some((row, oversized)) = self.queue.rows.pop_front() {
                self.record += 1;
                if oversized {
                    return Err(CsvError::FieldTooLong {
                        record: self.record,
                        max: self.tokenizer.max_field_length(),
                    });
                }
                return Ok(Some(row));
            }
            if self.done {
                return Ok(None);
            }
            let n = self.input.read(&mut self.chunk)?;
            if n == 0 {
                self.tokenizer.process_end_of_stream(&mut self.queue);
                self.done = true;
            } else {
                self.tokenizer.process_chunk(&self.chunk[..n], &mut self.queue);
            }
        }
    }

    /// Convert into an iterator over rows.
    pub fn rows(self) -> CsvRowIter<R> {
        CsvRowIter { reader: self }
    }
}

/// Iterator over CSV rows.
pub struct CsvRowIter<R: Read> {
    reader: CsvReader<R>,
}

impl<R: Read> Iterator for CsvRowIter<R> {
    type Item = Result<Vec<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_row().transpose()
    }
}

/// Read all rows from a CSV file into memory.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Vec<u8>>>> {
    let reader = CsvReader::from_path(path)?;
    reader.rows().collect()
}

/// Parse all rows from an in-memory byte slice.
pub fn parse_rows(content: &[u8]) -> Result<Vec<Vec<Vec<u8>>>> {
    let reader = CsvReader::new(content);
    reader.rows().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(fields: &[&str]) -> Vec<Vec<u8>> {
        fields.iter().map(|f| f.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_read_rows_from_slice() {
        let rows = parse_rows(b"a,b,c\n1,2,3\n").unwrap();
        assert_eq!(rows, vec![owned(&["a", "b", "c"]), owned(&["1", "2", "3"])]);
    }

    #[test]
    fn test_quoted_fields_survive_materialization() {
        let rows = parse_rows(b"\"a,b\",\"c\"\"d\"\n").unwrap();
        assert_eq!(rows, vec![owned(&["a,b", "c\"d"])]);
    }

    #[test]
    fn test_small_read_chunks_agree_with_whole_input() {
        let content = b"Hello,\"Wor\"\"ld\"\r\nhow,\"are,\",you\n\nasdf";
        let whole = parse_rows(content).unwrap();
        let reader = CsvReader::with_capacity(&content[..], 1);
        let tiny: Vec<_> = reader.rows().collect::<Result<_>>().unwrap();
        assert_eq!(tiny, whole);
        assert_eq!(whole.len(), 3);
    }

    #[test]
    fn test_read_row_reports_then_recovers() {
        let content = b"abcdefgh,x\nok,fine\n";
        let mut reader = CsvReader::new(&content[..]).with_max_field_length(4);
        match reader.read_row() {
            Err(CsvError::FieldTooLong { record: 1, max: 4 }) => {}
            other => panic!("expected FieldTooLong, got {:?}", other),
        }
        assert_eq!(reader.read_row().unwrap(), Some(owned(&["ok", "fine"])));
        assert_eq!(reader.read_row().unwrap(), None);
    }

    #[test]
    fn test_iterator_yields_errors_and_continues() {
        let content = b"abcdefgh\nok\n";
        let reader = CsvReader::new(&content[..]).with_max_field_length(4);
        let results: Vec<_> = reader.rows().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap(), &owned(&["ok"]));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_rows(b"").unwrap().is_empty());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let rows = parse_rows(b"a\n\n\nb\n").unwrap();
        assert_eq!(rows, vec![owned(&["a"]), owned(&["b"])]);
    }
}
