//! Count rows and fields without materializing any data.
//!
//! Optimizations:
//! - Memory-mapped file I/O for zero-copy access (larger files)
//! - Counting visitor: no field bytes are ever copied or allocated
//! - Parallel counting across multiple input files with Rayon

use crate::buffers::{input_buffer_size, DEFAULT_MAX_FIELD_LENGTH};
use crate::parallel::map_files;
use crate::reader::Result as CsvResult;
use crate::tokenizer::Tokenizer;
use crate::visitor::FieldVisitor;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Minimum file size to use mmap (smaller files use buffered I/O).
const MMAP_THRESHOLD: u64 = 64 * 1024;

/// Statistics from a count operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountStats {
    pub rows: u64,
    pub fields: u64,
    pub oversized_fields: u64,
    pub bytes: u64,
}

impl CountStats {
    /// Merge per-file stats into a total.
    pub fn merge(&mut self, other: &CountStats) {
        self.rows += other.rows;
        self.fields += other.fields;
        self.oversized_fields += other.oversized_fields;
        self.bytes += other.bytes;
    }
}

impl std::fmt::Display for CountStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rows: {}, Fields: {}, Oversized: {}, Bytes: {}",
            self.rows, self.fields, self.oversized_fields, self.bytes
        )
    }
}

/// Visitor that counts structure and discards all field data.
#[derive(Debug, Default)]
struct CountingVisitor {
    stats: CountStats,
}

impl FieldVisitor for CountingVisitor {
    #[inline]
    fn visit_partial_field_data(&mut self, _data: &[u8]) {}

    #[inline]
    fn visit_end_of_field(&mut self, _data: &[u8]) {
        self.stats.fields += 1;
    }

    #[inline]
    fn visit_end_of_line(&mut self) {
        self.stats.rows += 1;
    }

    #[inline]
    fn visit_field_too_long(&mut self, _bytes_seen: usize) {
        self.stats.oversized_fields += 1;
    }
}

/// Count command configuration.
#[derive(Debug, Clone, Copy)]
pub struct CountCommand {
    pub low_memory: bool,
    pub max_field_length: usize,
}

impl Default for CountCommand {
    fn default() -> Self {
        Self {
            low_memory: false,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
        }
    }
}

impl CountCommand {
    /// Count one file, memory-mapping it when large enough.
    pub fn execute<P: AsRef<Path>>(&self, path: P) -> CsvResult<CountStats> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut tokenizer = Tokenizer::new(self.max_field_length);
        let mut visitor = CountingVisitor::default();

        if len >= MMAP_THRESHOLD {
            let mmap = unsafe { Mmap::map(&file)? };
            for chunk in mmap.chunks(input_buffer_size(self.low_memory)) {
                tokenizer.process_chunk(chunk, &mut visitor);
            }
        } else {
            self.feed_reader(file, &mut tokenizer, &mut visitor)?;
        }
        tokenizer.process_end_of_stream(&mut visitor);
        visitor.stats.bytes = len;
        Ok(visitor.stats)
    }

    /// Count from any readable source (pipes, stdin).
    pub fn execute_reader<R: Read>(&self, input: R) -> CsvResult<CountStats> {
        let mut tokenizer = Tokenizer::new(self.max_field_length);
        let mut visitor = CountingVisitor::default();
        let bytes = self.feed_reader(input, &mut tokenizer, &mut visitor)?;
        tokenizer.process_end_of_stream(&mut visitor);
        visitor.stats.bytes = bytes;
        Ok(visitor.stats)
    }

    /// Count several files in parallel; results line up with `paths`.
    pub fn execute_many(&self, paths: &[PathBuf]) -> Vec<CsvResult<CountStats>> {
        map_files(paths, |path| self.execute(path))
    }

    fn feed_reader<R: Read>(
        &self,
        mut input: R,
        tokenizer: &mut Tokenizer,
        visitor: &mut CountingVisitor,
    ) -> CsvResult<u64> {
        let mut chunk = vec![0u8; input_buffer_size(self.low_memory)];
        let mut total = 0u64;
        loop {
            let n = input.read(&mut chunk)?;
            if n == 0 {
                return Ok(total);
            }
            total += n as u64;
            tokenizer.process_chunk(&chunk[..n], visitor);
        }
    }
}
