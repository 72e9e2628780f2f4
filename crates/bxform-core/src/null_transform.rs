use crate::{BxformError, Context, Span, Transform};

/// The identity transform: copies bytes through unchanged.
///
/// Used to materialize slot 0 of a transform sequence when the parsed
/// spec names fewer than one real transform, and as a trivial building
/// block for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransform;

impl Transform for NullTransform {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let len = input.remaining().len();
        if output.remaining().len() < len {
            return Ok(false);
        }
        output.remaining_mut()[..len].copy_from_slice(input.remaining());
        input.advance(len)?;
        output.advance(len)?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let len = input.remaining().len();
        if output.remaining().len() < len {
            return Err(BxformError::CorruptInput("NullTransform output exceeds destination capacity"));
        }
        output.remaining_mut()[..len].copy_from_slice(input.remaining());
        input.advance(len)?;
        output.advance(len)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        input_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_copies_all_remaining_bytes() {
        let mut src = [1u8, 2, 3, 4];
        let mut dst = [0u8; 4];
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut dst);
        let ctx = Context::new();
        let mut t = NullTransform;
        assert!(t.forward(&mut input, &mut output, &ctx).unwrap());
        assert_eq!(dst, [1, 2, 3, 4]);
        assert_eq!(input.cursor(), 4);
        assert_eq!(output.cursor(), 4);
    }

    #[test]
    fn forward_into_undersized_output_soft_fails() {
        let mut src = [1u8, 2, 3, 4];
        let mut dst = [0u8; 2];
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut dst);
        let ctx = Context::new();
        let mut t = NullTransform;
        assert!(!t.forward(&mut input, &mut output, &ctx).unwrap());
    }
}
