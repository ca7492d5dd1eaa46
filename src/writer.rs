//! Buffered CSV output writer.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path,
//! and quotes fields only when their content requires it.

use crate::buffers::DEFAULT_OUTPUT_BUFFER;
use memchr::memchr3;
use std::io::{self, BufWriter, Write};

use crate::tokenizer::{COMMA, CR, LF, QUOTE};

/// Whether a field must be enclosed in quotes to round-trip.
#[inline]
pub fn field_needs_quoting(field: &[u8]) -> bool {
    memchr3(COMMA, QUOTE, CR, field).is_some() || memchr::memchr(LF, field).is_some()
}

/// Buffered CSV writer.
///
/// Unquoted fields are written verbatim; fields containing a comma, quote,
/// or line break are enclosed in quotes with embedded quotes doubled.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    field_on_line: bool,
}

impl<W: Write> CsvWriter<W> {
    /// Create a new CSV writer with the default output buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new CSV writer with a specific buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            field_on_line: false,
        }
    }

    /// Write one field, quoting it if its content requires it.
    pub fn write_field(&mut self, field: &[u8]) -> io::Result<()> {
        if self.field_on_line {
            self.writer.write_all(b",")?;
        }
        self.field_on_line = true;
        if !field_needs_quoting(field) {
            return self.writer.write_all(field);
        }
        self.writer.write_all(b"\"")?;
        let mut rest = field;
        while let Some(i) = memchr::memchr(QUOTE, rest) {
            self.writer.write_all(&rest[..=i])?;
            self.writer.write_all(b"\"")?;
            rest = &rest[i + 1..];
        }
        self.writer.write_all(rest)?;
        self.writer.write_all(b"\"")
    }

    /// Write one integer field without going through a formatted string.
    #[inline]
    pub fn write_int(&mut self, value: u64) -> io::Result<()> {
        if self.field_on_line {
            self.writer.write_all(b",")?;
        }
        self.field_on_line = true;
        self.writer.write_all(self.itoa_buf.format(value).as_bytes())
    }

    /// Terminate the current row.
    #[inline]
    pub fn end_row(&mut self) -> io::Result<()> {
        self.field_on_line = false;
        self.writer.write_all(b"\n")
    }

    /// Write a full row of fields followed by a newline.
    pub fn write_row<'a, I>(&mut self, fields: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        for field in fields {
            self.write_field(field)?;
        }
        self.end_row()
    }

    /// Flush buffered output to the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: &[&[&[u8]]]) -> Vec<u8> {
        let mut writer = CsvWriter::new(Vec::new());
        for row in rows {
            writer.write_row(row.iter().copied()).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_plain_fields_unquoted() {
        let out = render(&[&[b"a", b"b", b"c"]]);
        assert_eq!(out, b"a,b,c\n");
    }

    #[test]
    fn test_comma_and_newline_force_quotes() {
        let out = render(&[&[b"a,b", b"c\nd"]]);
        assert_eq!(out, b"\"a,b\",\"c\nd\"\n");
    }

    #[test]
    fn test_quotes_are_doubled() {
        let out = render(&[&[b"say \"hi\""]]);
        assert_eq!(out, b"\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_empty_field() {
        let out = render(&[&[b"" as &[u8], b"x"]]);
        assert_eq!(out, b",x\n");
    }

    #[test]
    fn test_write_int() {
        let mut writer = CsvWriter::new(Vec::new());
        writer.write_field(b"id").unwrap();
        writer.write_int(42).unwrap();
        writer.end_row().unwrap();
        assert_eq!(writer.into_inner().unwrap(), b"id,42\n");
    }

    #[test]
    fn test_round_trips_through_reader() {
        let rows: Vec<Vec<Vec<u8>>> = vec![
            vec![b"plain".to_vec(), b"with,comma".to_vec()],
            vec![b"with\"quote".to_vec(), b"multi\r\nline".to_vec()],
        ];
        let mut writer = CsvWriter::new(Vec::new());
        for row in &rows {
            writer.write_row(row.iter().map(|f| f.as_slice())).unwrap();
        }
        let encoded = writer.into_inner().unwrap();
        let decoded = crate::reader::parse_rows(&encoded).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_field_needs_quoting() {
        assert!(!field_needs_quoting(b"plain"));
        assert!(!field_needs_quoting(b""));
        assert!(field_needs_quoting(b"a,b"));
        assert!(field_needs_quoting(b"a\"b"));
        assert!(field_needs_quoting(b"a\rb"));
        assert!(field_needs_quoting(b"a\nb"));
    }
}
