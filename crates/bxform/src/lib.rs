#![warn(missing_docs)]

//! A composable block-transform pipeline: LZ-family match finders
//! ([`LzxCodec`], [`LzpCodec`]), rank transforms ([`Srt`], [`Sbrt`]),
//! run-length codecs ([`Rlt`], [`Zrlt`]), an x86-branch normalizer
//! ([`X86Codec`]), and the [`TransformSequence`] engine that chains up
//! to eight of them with per-stage fallback. [`TransformFactory`]
//! resolves a symbolic `"NAME+NAME+..."` spec (e.g. `"BWT+MTFT+ZRLT"`)
//! into a concrete sequence.
//!
//! This crate is a per-block library: it has no opinion on CLI
//! argument parsing, file framing, thread-pool scheduling, or the
//! downstream entropy coder that consumes a transform's output. Those
//! are a caller's concern; [`encode`]/[`decode`] below are a minimal
//! convenience wrapper over the sequence engine for callers who just
//! want to round-trip one in-memory block.

pub use bxform_codecs::{LzWindow, LzpCodec, LzxCodec, Rlt, Sbrt, SbrtMode, Srt, X86Codec, Zrlt};
pub use bxform_core::{
    BxformError, Context, ContextValue, NullTransform, PackedTransformId, Span, Transform, TransformId, MAX_STAGES,
};
pub use bxform_sequence::{TransformFactory, TransformSequence};

/// An encoded block: the transform output, the skip-flags bitmap
/// recording which stages applied, and the original block's length
/// (needed to size the destination buffer for [`decode`]).
///
/// Bundling these three is the facade's only opinion about framing;
/// how a caller actually persists them (a file header, a network
/// frame) is out of this crate's scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlock {
    /// The transform sequence's output bytes.
    pub data: Vec<u8>,
    /// The skip-flags byte produced by [`TransformSequence::forward`].
    pub skip_flags: u8,
    /// The original (pre-transform) block length, in bytes.
    pub original_len: usize,
}

/// Parses `spec`, builds a [`TransformSequence`], and runs it forward
/// over `data`.
///
/// # Errors
/// Returns [`BxformError::InvalidSpec`]/[`BxformError::TooManyStages`]
/// if `spec` cannot be parsed into a sequence.
///
/// # Examples
/// ```
/// let data = [b"a".repeat(20), b"b".repeat(20), b"c".repeat(20), b"d".repeat(20)].concat().repeat(4);
/// let encoded = bxform::encode("MTFT+ZRLT", &data).unwrap();
/// assert!(encoded.data.len() < data.len());
/// let decoded = bxform::decode("MTFT+ZRLT", &encoded).unwrap();
/// assert_eq!(decoded, data);
/// ```
pub fn encode(spec: &str, data: &[u8]) -> Result<EncodedBlock, BxformError> {
    let mut context = Context::new();
    let mut sequence = TransformFactory::build_from_spec(&mut context, spec)?;

    let mut src = data.to_vec();
    let mut dst = vec![0u8; sequence.max_encoded_length(data.len())];
    let mut input = Span::new(&mut src);
    let mut output = Span::new(&mut dst);
    sequence.forward(&mut input, &mut output, &context)?;
    let encoded_len = output.cursor();
    dst.truncate(encoded_len);

    Ok(EncodedBlock {
        data: dst,
        skip_flags: sequence.skip_flags(),
        original_len: data.len(),
    })
}

/// Parses `spec`, builds a [`TransformSequence`], restores `block`'s
/// skip-flags, and runs the sequence's inverse.
///
/// # Errors
/// Returns [`BxformError::InvalidSpec`]/[`BxformError::TooManyStages`]
/// if `spec` cannot be parsed, or [`BxformError::CorruptInput`] if
/// `block.data` is malformed (truncated, a distance past the bytes
/// already produced, and so on).
///
/// # Panics
/// This function does not panic; malformed input surfaces as
/// [`BxformError::CorruptInput`] rather than an out-of-bounds access.
pub fn decode(spec: &str, block: &EncodedBlock) -> Result<Vec<u8>, BxformError> {
    let mut context = Context::new();
    let mut sequence = TransformFactory::build_from_spec(&mut context, spec)?;
    sequence.set_skip_flags(block.skip_flags);

    let mut src = block.data.clone();
    let mut dst = vec![0u8; block.original_len];
    let mut input = Span::new(&mut src);
    let mut output = Span::new(&mut dst);
    sequence.inverse(&mut input, &mut output, &context)?;
    Ok(dst)
}
