use crate::BxformError;

/// A mutable byte buffer paired with a cursor.
///
/// `Span` never reallocates and never shrinks or grows its backing
/// buffer. Transforms read and write through the cursor, advancing it
/// as they consume or produce bytes; the remainder of the buffer past
/// the cursor is free space for them to write into.
#[derive(Debug)]
pub struct Span<'a> {
    buffer: &'a mut [u8],
    cursor: usize,
}

impl<'a> Span<'a> {
    /// Wraps `buffer` with a cursor at position 0.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Wraps `buffer` with a cursor at `cursor`.
    ///
    /// # Errors
    /// Returns [`BxformError::InvalidSpan`] if `cursor` exceeds the buffer's length.
    pub fn with_cursor(buffer: &'a mut [u8], cursor: usize) -> Result<Self, BxformError> {
        if cursor > buffer.len() {
            return Err(BxformError::InvalidSpan {
                cursor,
                length: buffer.len(),
            });
        }
        Ok(Self { buffer, cursor })
    }

    /// The cursor's current position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The backing buffer's total length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the backing buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes already consumed or produced, `[0, cursor)`.
    pub fn filled(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    /// The unused tail of the buffer, `[cursor, len)`.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// The unused tail of the buffer, mutably.
    pub fn remaining_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.cursor..]
    }

    /// Moves the cursor to `cursor`.
    ///
    /// # Errors
    /// Returns [`BxformError::InvalidSpan`] if `cursor` exceeds the buffer's length.
    pub fn set_cursor(&mut self, cursor: usize) -> Result<(), BxformError> {
        if cursor > self.buffer.len() {
            return Err(BxformError::InvalidSpan {
                cursor,
                length: self.buffer.len(),
            });
        }
        self.cursor = cursor;
        Ok(())
    }

    /// Advances the cursor by `count` bytes.
    ///
    /// # Errors
    /// Returns [`BxformError::InvalidSpan`] if the result would exceed the buffer's length.
    pub fn advance(&mut self, count: usize) -> Result<(), BxformError> {
        self.set_cursor(self.cursor + count)
    }

    /// A snapshot of the cursor, for restoring after a failed stage.
    ///
    /// Used by the sequence engine: a stage that fails mid-write leaves
    /// garbage past the old cursor, which the snapshot lets the caller
    /// simply forget by resetting the cursor back.
    pub fn snapshot(&self) -> usize {
        self.cursor
    }

    /// Restores the cursor to a previously taken [`Span::snapshot`].
    ///
    /// The snapshot is always a value this span has already validated,
    /// so this cannot fail.
    pub fn restore(&mut self, snapshot: usize) {
        self.cursor = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_starts_at_zero() {
        let mut buf = [0u8; 4];
        let span = Span::new(&mut buf);
        assert_eq!(span.cursor(), 0);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn with_cursor_rejects_out_of_range() {
        let mut buf = [0u8; 4];
        assert!(Span::with_cursor(&mut buf, 5).is_err());
    }

    #[rstest]
    #[case(0, 4)]
    #[case(2, 2)]
    #[case(4, 0)]
    fn remaining_tracks_cursor(#[case] cursor: usize, #[case] expected_remaining: usize) {
        let mut buf = [0u8; 4];
        let span = Span::with_cursor(&mut buf, cursor).unwrap();
        assert_eq!(span.remaining().len(), expected_remaining);
        assert_eq!(span.filled().len(), cursor);
    }

    #[test]
    fn advance_past_end_errs_and_leaves_cursor_unchanged() {
        let mut buf = [0u8; 4];
        let mut span = Span::new(&mut buf);
        span.advance(3).unwrap();
        assert!(span.advance(2).is_err());
        assert_eq!(span.cursor(), 3);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut buf = [0u8; 8];
        let mut span = Span::new(&mut buf);
        let snap = span.snapshot();
        span.advance(5).unwrap();
        span.restore(snap);
        assert_eq!(span.cursor(), 0);
    }
}
