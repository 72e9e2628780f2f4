use thiserror::Error;

/// Errors surfaced across the block-transform pipeline.
///
/// Only the two fatal kinds from the design (`INVALID_ARGUMENT` and
/// `CORRUPT_INPUT`) are represented here. The third kind, soft-fail
/// (`NOT_APPLICABLE`), is never an error: a transform that declines to
/// apply returns `false`/`None` from `forward`, and the sequence engine
/// treats that as "skip this stage", not as something to propagate.
#[derive(Debug, Error)]
pub enum BxformError {
    /// A span's cursor exceeds its backing buffer's length.
    #[error("invalid span: cursor {cursor} exceeds length {length}")]
    InvalidSpan {
        /// The cursor value that was out of range.
        cursor: usize,
        /// The buffer length it was compared against.
        length: usize,
    },

    /// A transform-name spec could not be parsed.
    #[error("invalid transform spec: {0}")]
    InvalidSpec(String),

    /// More than [`crate::MAX_STAGES`] non-`NONE` tokens were named in a spec.
    #[error("too many transform stages: {0} (maximum {max})", max = crate::MAX_STAGES)]
    TooManyStages(usize),

    /// An inverse transform failed on malformed compressed data.
    #[error("corrupt input: {0}")]
    CorruptInput(&'static str),
}
