//! Visitor contract for tokenizer output.
//!
//! The tokenizer owns no field storage of its own; everything it finds is
//! pushed through a [`FieldVisitor`]. Dispatch is static (the visitor is a
//! generic parameter on `process_chunk`), so a visitor call costs no more
//! than a direct function call.

/// Receiver for field and row boundaries emitted by the tokenizer.
///
/// Per field, zero or more `visit_partial_field_data` calls are followed by
/// exactly one `visit_end_of_field` carrying the remaining bytes; the full
/// field contents are the concatenation. Per non-suppressed row, exactly one
/// `visit_end_of_line` follows the last field. `visit_field_too_long` fires
/// at most once per field whose accumulated bytes exceed the configured
/// maximum; the field's `visit_end_of_field` still arrives with the
/// truncated contents so row structure stays intact.
pub trait FieldVisitor {
    /// A prefix of the current field that is not yet known to be complete.
    fn visit_partial_field_data(&mut self, data: &[u8]);

    /// The final bytes of the current field.
    fn visit_end_of_field(&mut self, data: &[u8]);

    /// The current row is complete.
    fn visit_end_of_line(&mut self);

    /// The current field exceeded the maximum field length; `bytes_seen` is
    /// the number of bytes accumulated when the limit was crossed.
    fn visit_field_too_long(&mut self, bytes_seen: usize);
}

/// Visitor that discards everything.
///
/// Drives the state machine for validation-only parsing: the input is fully
/// scanned, nothing is materialized.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisitor;

impl FieldVisitor for NoopVisitor {
    #[inline]
    fn visit_partial_field_data(&mut self, _data: &[u8]) {}

    #[inline]
    fn visit_end_of_field(&mut self, _data: &[u8]) {}

    #[inline]
    fn visit_end_of_line(&mut self) {}

    #[inline]
    fn visit_field_too_long(&mut self, _bytes_seen: usize) {}
}

impl<V: FieldVisitor> FieldVisitor for &mut V {
    #[inline]
    fn visit_partial_field_data(&mut self, data: &[u8]) {
        (**self).visit_partial_field_data(data);
    }

    #[inline]
    fn visit_end_of_field(&mut self, data: &[u8]) {
        (**self).visit_end_of_field(data);
    }

    #[inline]
    fn visit_end_of_line(&mut self) {
        (**self).visit_end_of_line();
    }

    #[inline]
    fn visit_field_too_long(&mut self, bytes_seen: usize) {
        (**self).visit_field_too_long(bytes_seen);
    }
}
