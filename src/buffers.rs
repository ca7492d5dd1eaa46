//! Buffer size constants for streaming CSV processing.
//!
//! These constants control memory usage vs I/O throughput tradeoffs. The
//! defaults favor throughput; the low-memory variants suit constrained
//! environments.

/// Default output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Low-memory output buffer size (256 KB).
pub const LOW_MEMORY_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input chunk size (256 KB).
/// Chunks of this size are fed to the tokenizer from files and pipes.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Low-memory input chunk size (64 KB).
pub const LOW_MEMORY_INPUT_BUFFER: usize = 64 * 1024;

/// Default maximum field length (1 MB).
/// Bounds the cut buffer; a single CSV field longer than this is reported
/// as too long and truncated.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 1024 * 1024;

/// Returns the appropriate output buffer size based on the low_memory flag.
#[inline]
pub const fn output_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_OUTPUT_BUFFER
    } else {
        DEFAULT_OUTPUT_BUFFER
    }
}

/// Returns the appropriate input chunk size based on the low_memory flag.
#[inline]
pub const fn input_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_INPUT_BUFFER
    } else {
        DEFAULT_INPUT_BUFFER
    }
}
