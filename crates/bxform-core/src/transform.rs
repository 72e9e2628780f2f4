use crate::{BxformError, Context, Span};

/// The contract every block transform implements.
///
/// A transform reads from `input`'s remaining bytes and writes to
/// `output`'s remaining bytes, advancing both cursors by however much
/// it consumed and produced. `forward` may decline to apply itself to
/// this particular input (returning `Ok(false)`, never an error): this
/// is the soft-fail path the sequence engine relies on to skip a stage
/// that would not shrink its input, or that structurally cannot apply
/// (e.g. an x86 codec on a block with no qualifying jump instructions).
///
/// `inverse` has no such soft-fail path: given the forward transform's
/// own output, it must either reconstruct the input or report
/// [`BxformError::CorruptInput`].
pub trait Transform {
    /// Applies the forward transform.
    ///
    /// Returns `Ok(true)` if the transform applied and wrote to
    /// `output`; `Ok(false)` if it declined (soft-fail) and neither
    /// span's cursor should be trusted to have moved meaningfully. On
    /// `Ok(false)` the caller is responsible for restoring both
    /// cursors via their snapshots; implementations should not rely on
    /// having left them untouched.
    fn forward(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<bool, BxformError>;

    /// Applies the inverse transform, reconstructing the original
    /// bytes `forward` consumed from its own output.
    fn inverse(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<(), BxformError>;

    /// An upper bound on the number of bytes `forward` could write
    /// given `input_len` input bytes, used to size the output buffer.
    fn max_encoded_length(&self, input_len: usize) -> usize;
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn forward(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<bool, BxformError> {
        (**self).forward(input, output, context)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<(), BxformError> {
        (**self).inverse(input, output, context)
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        (**self).max_encoded_length(input_len)
    }
}
