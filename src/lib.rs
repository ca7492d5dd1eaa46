//! sift-csv: streaming, chunk-resumable CSV tokenization.
//!
//! The core of this library is a push-based tokenizer that accepts input in
//! arbitrary chunks, exactly as they come off a socket or a file read, and
//! reports field and row boundaries to a caller-supplied visitor. Fields that
//! lie wholly inside one chunk are handed out as borrowed slices with no
//! copying; only fields split across chunk boundaries go through a bounded
//! reassembly buffer.
//!
//! # Features
//!
//! - **Chunk-resumable**: parse state survives arbitrary chunk boundaries,
//!   including a boundary in the middle of a CRLF or an escaped quote
//! - **Zero-copy fast path**: whole-in-chunk fields are borrowed, not copied
//! - **Bounded memory**: a configurable cap on field length bounds the only
//!   internal buffer, so untrusted input cannot balloon memory
//! - **Parallel processing**: tokenizers share no state, so files parse in
//!   parallel with Rayon
//!
//! # Example
//!
//! ```rust
//! use sift_csv::{reader::parse_rows, tokenizer::Tokenizer, visitor::FieldVisitor};
//!
//! // Convenience path: materialize rows from a byte slice.
//! let rows = parse_rows(b"a,b\n\"c,d\",e\n").unwrap();
//! assert_eq!(rows[1][0], b"c,d");
//!
//! // Streaming path: feed chunks as they arrive.
//! struct RowCounter(u64);
//! impl FieldVisitor for RowCounter {
//!     fn visit_partial_field_data(&mut self, _: &[u8]) {}
//!     fn visit_end_of_field(&mut self, _: &[u8]) {}
//!     fn visit_end_of_line(&mut self) { self.0 += 1; }
//!     fn visit_field_too_long(&mut self, _: usize) {}
//! }
//!
//! let mut counter = RowCounter(0);
//! let mut tokenizer = Tokenizer::default();
//! tokenizer.process_chunk(b"a,b\nc,", &mut counter);
//! tokenizer.process_chunk(b"d\n", &mut counter);
//! tokenizer.process_end_of_stream(&mut counter);
//! assert_eq!(counter.0, 2);
//! ```

pub mod buffers;
pub mod commands;
pub mod cut;
pub mod parallel;
pub mod reader;
pub mod tokenizer;
pub mod visitor;
pub mod writer;

// Re-export commonly used types
pub use reader::{parse_rows, read_rows, CsvError, CsvReader};
pub use tokenizer::Tokenizer;
pub use visitor::{FieldVisitor, NoopVisitor};
pub use writer::CsvWriter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{CountCommand, GenerateCommand, SelectCommand};
    pub use crate::reader::{parse_rows, read_rows, CsvError, CsvReader};
    pub use crate::tokenizer::Tokenizer;
    pub use crate::visitor::{FieldVisitor, NoopVisitor};
    pub use crate::writer::CsvWriter;
}
