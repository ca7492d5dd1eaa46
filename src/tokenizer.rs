//! Chunk-resumable CSV tokenizer.
//!
//! The tokenizer consumes arbitrarily sized, arbitrarily aligned chunks of
//! bytes (as they arrive from a socket or file read) and pushes field and
//! row boundaries through a [`FieldVisitor`], without ever buffering the
//! whole input and without copying field data unless a field is split
//! across chunk boundaries.
//!
//! Accepted dialect:
//!
//!  - fields are separated by ASCII comma `0x2C`, exclusively
//!  - rows are terminated by CR, LF, or CRLF, mixed freely; the terminator
//!    is optional at end of stream
//!  - consecutive terminators collapse: no empty rows are emitted unless a
//!    field on the line was read or a trailing comma forces an empty field
//!  - fields may be enclosed in double quotes `0x22`; quoted fields may
//!    embed commas, quotes (doubled), and line breaks
//!  - quoting is permissive: a quote mid-way through an unquoted field is
//!    ordinary data, and bytes trailing a closed quoted region continue the
//!    field as literal data
//!  - field bytes are otherwise uninterpreted; the tokenizer is
//!    encoding-agnostic
//!
//! A tokenizer instance holds the parse state for exactly one stream. It is
//! cheap to construct, so unrelated streams get their own instances and can
//! be parsed on separate threads with no shared state.
//!
//! # Performance
//!
//! The hot path is a scan for the next stop byte (`,` `"` CR LF), done with
//! memchr's SIMD-accelerated search rather than a byte-at-a-time walk. A
//! field that lies wholly inside one chunk is emitted as a single borrowed
//! slice with no copying.

use crate::buffers::DEFAULT_MAX_FIELD_LENGTH;
use crate::cut::CutBuffer;
use crate::visitor::FieldVisitor;
use memchr::{memchr, memchr3};

pub(crate) const COMMA: u8 = b',';
pub(crate) const QUOTE: u8 = b'"';
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

/// Find the first stop byte (`,` `"` CR LF) in `haystack`.
#[inline]
fn find_stop_byte(haystack: &[u8]) -> Option<usize> {
    // memchr3 caps out at three needles; fold in LF with a second search.
    match (memchr3(COMMA, QUOTE, CR, haystack), memchr(LF, haystack)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Streaming CSV tokenizer.
///
/// Feed chunks with [`process_chunk`](Tokenizer::process_chunk) and finish
/// with [`process_end_of_stream`](Tokenizer::process_end_of_stream). All
/// state lives in the instance; nothing is shared, so independent streams
/// parse fully in parallel on their own instances.
#[derive(Debug)]
pub struct Tokenizer {
    /// At least one field (possibly empty) was read since the last row
    /// boundary; controls whether a trailing blank region is suppressed or
    /// emitted as an empty row.
    read_anything_on_line: bool,
    /// The current field has started; the next chunk resumes mid-field
    /// instead of scanning fresh.
    read_anything_in_field: bool,
    /// The current field opened with a quote as its very first byte.
    field_started_with_quote: bool,
    /// The quoted region of the current field has closed, but trailing
    /// unquoted bytes may still follow before the next delimiter.
    quoted_data_ended: bool,
    /// The previous chunk ended exactly on a quote inside quoted content;
    /// whether it closes the field or escapes a literal quote is unknown
    /// until the first byte of the next chunk.
    cut_at_possible_closing_quote: bool,
    /// Sticky once the field crossed the maximum length, so the overflow is
    /// reported once and the excess silently discarded.
    field_over_limit: bool,
    /// Logical bytes of the current field seen so far, whether emitted as
    /// partial data or held in the cut buffer. Drives the length limit
    /// independently of how the input was chunked.
    field_len: usize,
    cut: CutBuffer,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FIELD_LENGTH)
    }
}

impl Tokenizer {
    /// Create a tokenizer whose fields are bounded at `max_field_length`
    /// bytes; the cut buffer is sized to match.
    pub fn new(max_field_length: usize) -> Self {
        Self {
            read_anything_on_line: false,
            read_anything_in_field: false,
            field_started_with_quote: false,
            quoted_data_ended: false,
            cut_at_possible_closing_quote: false,
            field_over_limit: false,
            field_len: 0,
            cut: CutBuffer::with_capacity(max_field_length),
        }
    }

    /// Configured maximum field length.
    #[inline]
    pub fn max_field_length(&self) -> usize {
        self.cut.capacity()
    }

    /// Reset all parse state for a new stream, keeping the cut buffer
    /// allocation.
    pub fn reset(&mut self) {
        self.read_anything_on_line = false;
        self.read_anything_in_field = false;
        self.field_started_with_quote = false;
        self.quoted_data_ended = false;
        self.cut_at_possible_closing_quote = false;
        self.field_over_limit = false;
        self.field_len = 0;
        self.cut.clear();
    }

    /// Reconfigure the maximum field length.
    ///
    /// Resets all parse state; only valid between streams, never mid-parse.
    pub fn set_max_field_length(&mut self, max_field_length: usize) {
        self.reset();
        self.cut.set_capacity(max_field_length);
    }

    /// Consume one chunk of input, emitting visitor callbacks for every
    /// field and row boundary it completes.
    ///
    /// The entire slice is consumed before returning and no reference to it
    /// is retained; bytes that must survive to the next call are copied
    /// into the cut buffer.
    pub fn process_chunk<V: FieldVisitor>(&mut self, chunk: &[u8], visitor: &mut V) {
        let mut rest = chunk;
        while !rest.is_empty() {
            rest = if self.read_anything_in_field {
                self.resume_field(rest, visitor)
            } else {
                self.scan_fresh_field(rest, visitor)
            };
        }
    }

    /// Flush the trailing field and row after the last chunk.
    ///
    /// Emits a final field and end-of-line only if something was read on
    /// the current line, so a stream that already ended with a terminator
    /// produces no spurious empty row. Leaves the tokenizer ready for a new
    /// stream.
    pub fn process_end_of_stream<V: FieldVisitor>(&mut self, visitor: &mut V) {
        if self.cut_at_possible_closing_quote {
            // The stream ended right after the quote, so it was a closer.
            self.cut_at_possible_closing_quote = false;
            self.quoted_data_ended = true;
        }
        if self.read_anything_in_field || self.read_anything_on_line {
            self.finish_field(&[], visitor);
            visitor.visit_end_of_line();
        }
        self.reset();
    }

    /// Scan from a field boundary. Returns the unconsumed remainder.
    fn scan_fresh_field<'a, V: FieldVisitor>(
        &mut self,
        chunk: &'a [u8],
        visitor: &mut V,
    ) -> &'a [u8] {
        let mut pos = 0;
        loop {
            let Some(i) = find_stop_byte(&chunk[pos..]).map(|rel| pos + rel) else {
                // No stop byte: the remainder is partial field data, emitted
                // zero-copy but clamped to the length bound like the cut
                // buffer, so truncated contents do not depend on chunking.
                let room = self.cut.capacity().saturating_sub(self.field_len);
                let take = chunk.len().min(room);
                if take > 0 {
                    visitor.visit_partial_field_data(&chunk[..take]);
                }
                self.read_anything_in_field = true;
                self.read_anything_on_line = true;
                self.note_field_bytes(chunk.len(), visitor);
                return &[];
            };
            match chunk[i] {
                QUOTE if i == 0 => {
                    // Quoted field opens; the quote is not field data. The
                    // main loop re-enters through the quoted resume path.
                    self.read_anything_in_field = true;
                    self.read_anything_on_line = true;
                    self.field_started_with_quote = true;
                    return &chunk[1..];
                }
                QUOTE => {
                    // Permissive policy: a quote mid-way through an unquoted
                    // field is ordinary data.
                    pos = i + 1;
                }
                COMMA => {
                    self.finish_field(&chunk[..i], visitor);
                    return &chunk[i + 1..];
                }
                _ => {
                    // CR or LF. An empty field on an empty line is a
                    // consecutive terminator: suppress the row.
                    if i > 0 || self.read_anything_on_line {
                        self.finish_field(&chunk[..i], visitor);
                        visitor.visit_end_of_line();
                    }
                    self.read_anything_on_line = false;
                    return &chunk[i + 1..];
                }
            }
        }
    }

    /// Resume a field interrupted by the previous chunk boundary. Returns
    /// the unconsumed remainder.
    fn resume_field<'a, V: FieldVisitor>(
        &mut self,
        chunk: &'a [u8],
        visitor: &mut V,
    ) -> &'a [u8] {
        if self.cut_at_possible_closing_quote {
            self.cut_at_possible_closing_quote = false;
            if chunk[0] == QUOTE {
                // The cut quote was escaping this one: one literal quote.
                self.append_to_cut(b"\"", visitor);
                return &chunk[1..];
            }
            // The cut quote closed the quoted region; the byte is not
            // consumed and is rescanned as trailing data below.
            self.quoted_data_ended = true;
        }
        if self.field_started_with_quote && !self.quoted_data_ended {
            self.scan_quoted(chunk, visitor)
        } else {
            self.scan_unquoted_tail(chunk, visitor)
        }
    }

    /// Scan inside a still-open quoted region, where only `"` is
    /// significant.
    fn scan_quoted<'a, V: FieldVisitor>(&mut self, chunk: &'a [u8], visitor: &mut V) -> &'a [u8] {
        match memchr(QUOTE, chunk) {
            None => {
                self.append_to_cut(chunk, visitor);
                &[]
            }
            Some(i) if i + 1 == chunk.len() => {
                // Quote on the last byte: closer or escape, unknown until
                // the next chunk arrives.
                self.append_to_cut(&chunk[..i], visitor);
                self.cut_at_possible_closing_quote = true;
                &[]
            }
            Some(i) => match chunk[i + 1] {
                QUOTE => {
                    // Escaped quote: keep one literal quote, skip both.
                    self.append_to_cut(&chunk[..=i], visitor);
                    &chunk[i + 2..]
                }
                COMMA => {
                    self.finish_field(&chunk[..i], visitor);
                    &chunk[i + 2..]
                }
                CR | LF => {
                    self.finish_field(&chunk[..i], visitor);
                    visitor.visit_end_of_line();
                    self.read_anything_on_line = false;
                    &chunk[i + 2..]
                }
                clash => {
                    // Permissive policy: the quote closed the region and the
                    // clashing byte continues the field as literal data.
                    self.quoted_data_ended = true;
                    self.append_to_cut(&chunk[..i], visitor);
                    self.append_to_cut(&[clash], visitor);
                    &chunk[i + 2..]
                }
            },
        }
    }

    /// Scan mid-field data where quotes are no longer significant: past a
    /// closed quoted region, or an unquoted field interrupted by a chunk
    /// boundary.
    fn scan_unquoted_tail<'a, V: FieldVisitor>(
        &mut self,
        chunk: &'a [u8],
        visitor: &mut V,
    ) -> &'a [u8] {
        match memchr3(COMMA, CR, LF, chunk) {
            None => {
                self.append_to_cut(chunk, visitor);
                &[]
            }
            Some(i) => {
                let terminator = chunk[i];
                self.finish_field(&chunk[..i], visitor);
                if terminator != COMMA {
                    visitor.visit_end_of_line();
                    self.read_anything_on_line = false;
                }
                &chunk[i + 1..]
            }
        }
    }

    /// Account `n` more logical bytes to the current field, reporting the
    /// length overflow exactly once per field.
    fn note_field_bytes<V: FieldVisitor>(&mut self, n: usize, visitor: &mut V) {
        self.field_len += n;
        if self.field_len > self.cut.capacity() && !self.field_over_limit {
            self.field_over_limit = true;
            visitor.visit_field_too_long(self.field_len);
        }
    }

    /// Buffer split-field bytes in the cut buffer.
    ///
    /// Only bytes within the first `max_field_length` bytes of the field are
    /// kept, counting any prefix already emitted as partial data, so a
    /// truncated field holds the same bytes no matter how the input was
    /// chunked.
    fn append_to_cut<V: FieldVisitor>(&mut self, bytes: &[u8], visitor: &mut V) {
        self.read_anything_in_field = true;
        self.read_anything_on_line = true;
        let already = self.field_len;
        self.note_field_bytes(bytes.len(), visitor);
        let room = self.cut.capacity().saturating_sub(already);
        let take = bytes.len().min(room);
        // take is bounded by the remaining room, so this never overflows
        let _ = self.cut.append(&bytes[..take]);
    }

    /// Emit the end of the current field and reset per-field state.
    ///
    /// `tail` is the field's final span from the current chunk. When the
    /// field has no buffered prefix and fits the length bound, the tail goes
    /// out as a borrowed slice; otherwise it joins the cut buffer so the
    /// visitor sees one contiguous, bounded remainder.
    fn finish_field<V: FieldVisitor>(&mut self, tail: &[u8], visitor: &mut V) {
        if self.cut.is_empty()
            && !self.field_over_limit
            && self.field_len + tail.len() <= self.cut.capacity()
        {
            visitor.visit_end_of_field(tail);
        } else {
            self.append_to_cut(tail, visitor);
            visitor.visit_end_of_field(self.cut.as_slice());
            self.cut.clear();
        }
        self.read_anything_on_line = true;
        self.read_anything_in_field = false;
        self.field_started_with_quote = false;
        self.quoted_data_ended = false;
        self.field_over_limit = false;
        self.field_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test visitor that materializes rows, concatenating partial and final
    /// field data.
    #[derive(Debug, Default)]
    struct Collect {
        rows: Vec<Vec<Vec<u8>>>,
        row: Vec<Vec<u8>>,
        field: Vec<u8>,
        too_long: Vec<usize>,
    }

    impl FieldVisitor for Collect {
        fn visit_partial_field_data(&mut self, data: &[u8]) {
            self.field.extend_from_slice(data);
        }

        fn visit_end_of_field(&mut self, data: &[u8]) {
            self.field.extend_from_slice(data);
            self.row.push(std::mem::take(&mut self.field));
        }

        fn visit_end_of_line(&mut self) {
            self.rows.push(std::mem::take(&mut self.row));
        }

        fn visit_field_too_long(&mut self, bytes_seen: usize) {
            self.too_long.push(bytes_seen);
        }
    }

    fn rows_of(input: &[u8]) -> Vec<Vec<Vec<u8>>> {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(input, &mut out);
        tok.process_end_of_stream(&mut out);
        assert!(out.too_long.is_empty());
        out.rows
    }

    fn rows_chunked(input: &[u8], chunk_size: usize) -> Vec<Vec<Vec<u8>>> {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        for chunk in input.chunks(chunk_size) {
            tok.process_chunk(chunk, &mut out);
        }
        tok.process_end_of_stream(&mut out);
        out.rows
    }

    fn row(fields: &[&str]) -> Vec<Vec<u8>> {
        fields.iter().map(|f| f.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_simple_rows() {
        assert_eq!(
            rows_of(b"a,b,c\n1,2,3\n"),
            vec![row(&["a", "b", "c"]), row(&["1", "2", "3"])]
        );
    }

    #[test]
    fn test_unterminated_last_row() {
        assert_eq!(rows_of(b"a,b\nc,d"), vec![row(&["a", "b"]), row(&["c", "d"])]);
    }

    #[test]
    fn test_empty_input_emits_nothing() {
        assert_eq!(rows_of(b""), Vec::<Vec<Vec<u8>>>::new());
    }

    #[test]
    fn test_empty_chunk_is_harmless() {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"a,", &mut out);
        tok.process_chunk(b"", &mut out);
        tok.process_chunk(b"b\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["a", "b"])]);
    }

    #[test]
    fn test_trailing_comma_forces_empty_field() {
        assert_eq!(rows_of(b"a,b,\n"), vec![row(&["a", "b", ""])]);
        assert_eq!(rows_of(b"a,b,"), vec![row(&["a", "b", ""])]);
    }

    #[test]
    fn test_empty_fields_between_commas() {
        assert_eq!(rows_of(b",,\n"), vec![row(&["", "", ""])]);
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(rows_of(b"\r\n\r\n\r\n"), Vec::<Vec<Vec<u8>>>::new());
        assert_eq!(rows_of(b"a\n\n\nb\n"), vec![row(&["a"]), row(&["b"])]);
    }

    #[test]
    fn test_line_terminators_interchangeable() {
        let expected = vec![row(&["a"]), row(&["b"]), row(&["c"])];
        assert_eq!(rows_of(b"a\nb\nc\n"), expected);
        assert_eq!(rows_of(b"a\rb\rc\r"), expected);
        assert_eq!(rows_of(b"a\r\nb\r\nc\r\n"), expected);
        assert_eq!(rows_of(b"a\rb\nc\r\n"), expected);
    }

    #[test]
    fn test_quoted_field_with_embedded_delimiters() {
        assert_eq!(rows_of(b"\"a,b\",c\n"), vec![row(&["a,b", "c"])]);
        assert_eq!(rows_of(b"\"a\nb\",c\n"), vec![row(&["a\nb", "c"])]);
        assert_eq!(rows_of(b"\"a\r\nb\",c\n"), vec![row(&["a\r\nb", "c"])]);
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(rows_of(b"\"a\"\"b\"\n"), vec![row(&["a\"b"])]);
        assert_eq!(rows_of(b"\"\"\"\"\n"), vec![row(&["\""])]);
    }

    #[test]
    fn test_empty_quoted_field() {
        assert_eq!(rows_of(b"\"\",x\n"), vec![row(&["", "x"])]);
        assert_eq!(rows_of(b"\"\"\n"), vec![row(&[""])]);
    }

    #[test]
    fn test_quote_mid_unquoted_field_is_data() {
        assert_eq!(rows_of(b"ab\"cd,e\n"), vec![row(&["ab\"cd", "e"])]);
    }

    #[test]
    fn test_trailing_data_after_closed_quotes_is_literal() {
        assert_eq!(rows_of(b"\"ab\"x,y\n"), vec![row(&["abx", "y"])]);
    }

    #[test]
    fn test_quoted_field_at_end_of_stream() {
        assert_eq!(rows_of(b"a,\"bc\""), vec![row(&["a", "bc"])]);
    }

    #[test]
    fn test_unterminated_quoted_field_flushes() {
        assert_eq!(rows_of(b"a,\"bc"), vec![row(&["a", "bc"])]);
    }

    #[test]
    fn test_ambiguous_quote_at_chunk_boundary_escape() {
        // `"ab"` + `"cd"` is one field holding `ab"cd`.
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"\"ab\"", &mut out);
        tok.process_chunk(b"\"cd\"\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["ab\"cd"])]);
    }

    #[test]
    fn test_ambiguous_quote_at_chunk_boundary_closer() {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"\"ab\"", &mut out);
        tok.process_chunk(b",c\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["ab", "c"])]);
    }

    #[test]
    fn test_ambiguous_quote_at_end_of_stream_is_closer() {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"\"ab\"", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["ab"])]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"a,b\r", &mut out);
        tok.process_chunk(b"\nc,d\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["a", "b"]), row(&["c", "d"])]);
    }

    #[test]
    fn test_every_chunk_size_agrees() {
        let input = b"Hello,\"Wor\"\"ld\"\r\nhow,\"are,\",you\n\nasdf";
        let expected = vec![
            row(&["Hello", "Wor\"ld"]),
            row(&["how", "are,", "you"]),
            row(&["asdf"]),
        ];
        assert_eq!(rows_of(input), expected);
        for size in 1..=input.len() {
            assert_eq!(rows_chunked(input, size), expected, "chunk size {}", size);
        }
    }

    #[test]
    fn test_field_too_long_reported_once() {
        let mut tok = Tokenizer::new(4);
        let mut out = Collect::default();
        tok.process_chunk(b"\"abcdefgh\",ok\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.too_long, vec![8]);
        // Truncated field, then parsing resumed at the next field.
        assert_eq!(out.rows, vec![vec![b"abcd".to_vec(), b"ok".to_vec()]]);
    }

    #[test]
    fn test_field_too_long_unquoted_single_chunk() {
        let mut tok = Tokenizer::new(4);
        let mut out = Collect::default();
        tok.process_chunk(b"abcdefgh,ok\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.too_long, vec![8]);
        assert_eq!(out.rows, vec![vec![b"abcd".to_vec(), b"ok".to_vec()]]);
    }

    #[test]
    fn test_field_too_long_recovers_on_next_row() {
        let mut tok = Tokenizer::new(4);
        let mut out = Collect::default();
        for chunk in b"\"way too long field\"\nshort\n".chunks(3) {
            tok.process_chunk(chunk, &mut out);
        }
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.too_long.len(), 1);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[1], row(&["short"]));
    }

    #[test]
    fn test_field_too_long_fires_once_per_oversized_field() {
        let mut tok = Tokenizer::new(2);
        let mut out = Collect::default();
        tok.process_chunk(b"aaaa,bbbb\ncccc\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.too_long.len(), 3);
    }

    #[test]
    fn test_truncated_contents_agree_at_every_chunk_size() {
        // An unquoted oversized field whose prefix arrives without a stop
        // byte goes out as partial data; it must be clamped to the bound
        // just like buffered data, so every chunking yields the same rows.
        let input = b"0123456789,ok\n";
        let expected = vec![vec![b"0123".to_vec(), b"ok".to_vec()]];
        for size in 1..=input.len() {
            let mut tok = Tokenizer::new(4);
            let mut out = Collect::default();
            for chunk in input.chunks(size) {
                tok.process_chunk(chunk, &mut out);
            }
            tok.process_end_of_stream(&mut out);
            assert_eq!(out.rows, expected, "chunk size {}", size);
            assert_eq!(out.too_long.len(), 1, "chunk size {}", size);
        }
    }

    #[test]
    fn test_reuse_after_end_of_stream() {
        let mut tok = Tokenizer::default();
        let mut out = Collect::default();
        tok.process_chunk(b"a,b", &mut out);
        tok.process_end_of_stream(&mut out);
        tok.process_chunk(b"c\n", &mut out);
        tok.process_end_of_stream(&mut out);
        assert_eq!(out.rows, vec![row(&["a", "b"]), row(&["c"])]);
    }

    #[test]
    fn test_find_stop_byte() {
        assert_eq!(find_stop_byte(b"abc"), None);
        assert_eq!(find_stop_byte(b"ab,c"), Some(2));
        assert_eq!(find_stop_byte(b"ab\nc,"), Some(2));
        assert_eq!(find_stop_byte(b"\rab"), Some(0));
        assert_eq!(find_stop_byte(b"a\"b,"), Some(1));
    }
}
