use bxform_core::{BxformError, Context, Span, Transform, MAX_STAGES};

/// Bit mask marking every stage skipped: `skip_flags == ALL_SKIPPED` iff
/// no stage in the sequence applied.
const ALL_SKIPPED: u8 = 0xFF;

/// Chains up to [`MAX_STAGES`] transforms, running each stage's forward
/// in turn and skipping (soft-fail) any stage that declines to apply or
/// would not shrink its input. A one-byte `skip_flags` bitmap records
/// which stages ran, so [`TransformSequence::inverse`] can replay only
/// those stages in reverse order.
///
/// Implements [`Transform`] itself: a sequence is addressable anywhere
/// a single transform is, including as a stage of another sequence,
/// mirroring the reference implementation's `TransformSequence<T>`
/// deriving from the same `Function<T>` interface every codec does.
pub struct TransformSequence {
    stages: Vec<Box<dyn Transform>>,
    skip_flags: u8,
    scratch_a: Vec<u8>,
    scratch_b: Vec<u8>,
}

impl TransformSequence {
    /// Builds a sequence from 1 to [`MAX_STAGES`] stages, slot 0 first.
    ///
    /// # Errors
    /// Returns [`BxformError::InvalidSpec`] if `stages` is empty, or
    /// [`BxformError::TooManyStages`] if it holds more than [`MAX_STAGES`].
    pub fn new(stages: Vec<Box<dyn Transform>>) -> Result<Self, BxformError> {
        if stages.is_empty() {
            return Err(BxformError::InvalidSpec("at least one transform stage is required".to_owned()));
        }
        if stages.len() > MAX_STAGES {
            return Err(BxformError::TooManyStages(stages.len()));
        }
        Ok(Self {
            stages,
            skip_flags: ALL_SKIPPED,
            scratch_a: Vec::new(),
            scratch_b: Vec::new(),
        })
    }

    /// Number of configured stages (slot 0 always present).
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    /// The skip-flags byte produced by the most recent [`Self::forward`],
    /// or as set by [`Self::set_skip_flags`] ahead of an [`Self::inverse`].
    pub fn skip_flags(&self) -> u8 {
        self.skip_flags
    }

    /// Sets the skip-flags byte, typically restored from block framing
    /// before driving [`Self::inverse`] on a previously encoded block.
    pub fn set_skip_flags(&mut self, flags: u8) {
        self.skip_flags = flags;
    }

    fn ensure_len(buf: &mut Vec<u8>, len: usize) {
        if buf.len() < len {
            buf.resize(len, 0);
        }
    }
}

impl Transform for TransformSequence {
    fn forward(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<bool, BxformError> {
        let count = input.remaining().len();
        self.skip_flags = ALL_SKIPPED;
        if count == 0 {
            input.advance(0)?;
            output.advance(0)?;
            return Ok(true);
        }

        let required = self.max_encoded_length(count);
        Self::ensure_len(&mut self.scratch_a, count.max(required));
        Self::ensure_len(&mut self.scratch_b, required);
        self.scratch_a[..count].copy_from_slice(&input.remaining()[..count]);

        let mut running_count = count;
        let mut a_is_src = true;

        for (i, stage) in self.stages.iter_mut().enumerate() {
            let (src, dst) = if a_is_src {
                (&mut self.scratch_a, &mut self.scratch_b)
            } else {
                (&mut self.scratch_b, &mut self.scratch_a)
            };

            let mut in_span = Span::new(&mut src[..running_count]);
            let mut out_span = Span::new(dst.as_mut_slice());

            if stage.forward(&mut in_span, &mut out_span, context)? {
                self.skip_flags &= !(1u8 << (7 - i));
                running_count = out_span.cursor();
                a_is_src = !a_is_src;
            }
        }

        let final_buf = if a_is_src { &self.scratch_a } else { &self.scratch_b };
        output.remaining_mut()[..running_count].copy_from_slice(&final_buf[..running_count]);
        input.advance(count)?;
        output.advance(running_count)?;
        Ok(self.skip_flags != ALL_SKIPPED)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<(), BxformError> {
        let count = input.remaining().len();
        if count == 0 {
            input.advance(0)?;
            output.advance(0)?;
            return Ok(());
        }

        if self.skip_flags == ALL_SKIPPED {
            output.remaining_mut()[..count].copy_from_slice(&input.remaining()[..count]);
            input.advance(count)?;
            output.advance(count)?;
            return Ok(());
        }

        let capacity = output.remaining().len();
        let required = self.max_encoded_length(capacity).max(count);
        Self::ensure_len(&mut self.scratch_a, required);
        Self::ensure_len(&mut self.scratch_b, required);
        self.scratch_a[..count].copy_from_slice(&input.remaining()[..count]);

        let mut running_count = count;
        let mut a_is_src = true;

        for i in (0..self.stages.len()).rev() {
            let bit = 1u8 << (7 - i);
            if self.skip_flags & bit != 0 {
                continue;
            }

            let (src, dst) = if a_is_src {
                (&mut self.scratch_a, &mut self.scratch_b)
            } else {
                (&mut self.scratch_b, &mut self.scratch_a)
            };

            let mut in_span = Span::new(&mut src[..running_count]);
            let mut out_span = Span::new(dst.as_mut_slice());

            self.stages[i].inverse(&mut in_span, &mut out_span, context)?;
            running_count = out_span.cursor();
            a_is_src = !a_is_src;
        }

        let final_buf = if a_is_src { &self.scratch_a } else { &self.scratch_b };
        if running_count > output.remaining().len() {
            return Err(BxformError::CorruptInput("sequence inverse produced more bytes than the destination can hold"));
        }
        output.remaining_mut()[..running_count].copy_from_slice(&final_buf[..running_count]);
        input.advance(count)?;
        output.advance(running_count)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        let mut required = input_len;
        for stage in &self.stages {
            let candidate = stage.max_encoded_length(required);
            if candidate > required {
                required = candidate;
            }
        }
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxform_codecs::{Rlt, Sbrt, SbrtMode, Zrlt};
    use bxform_core::NullTransform;

    fn roundtrip(seq: &mut TransformSequence, data: &[u8]) -> (bool, u8) {
        let ctx = Context::new();
        let mut src = data.to_vec();
        let mut mid = vec![0u8; seq.max_encoded_length(data.len())];
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        let applied = seq.forward(&mut input, &mut output, &ctx).unwrap();
        let flags = seq.skip_flags();
        let encoded_len = output.cursor();

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        seq.set_skip_flags(flags);
        seq.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
        (applied, flags)
    }

    #[test]
    fn full_skip_is_a_byte_for_byte_copy() {
        let mut seq = TransformSequence::new(vec![Box::new(NullTransform)]).unwrap();
        let ctx = Context::new();
        let data = b"anything goes through untouched";
        let mut src = data.to_vec();
        let mut mid = vec![0u8; seq.max_encoded_length(data.len())];
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        seq.forward(&mut input, &mut output, &ctx).unwrap();

        let mut seq2 = TransformSequence::new(vec![Box::new(NullTransform)]).unwrap();
        seq2.set_skip_flags(0xFF);
        let mut mid2 = data.to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        seq2.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn skip_flags_reflect_which_stages_actually_applied() {
        // Zero runs of 3 separated by single 9s: RLT's escape-byte header
        // plus per-run overhead breaks even against the input and so
        // declines, while ZRLT's lighter marker-plus-varint framing still
        // nets a smaller stream. Stage 0 should end up skipped, stage 1
        // applied.
        let mut seq = TransformSequence::new(vec![Box::new(Rlt), Box::new(Zrlt)]).unwrap();
        let data: Vec<u8> = (0..1024u32).map(|i| if i % 4 == 3 { 9 } else { 0 }).collect();
        let (applied, flags) = roundtrip(&mut seq, &data);
        assert!(applied);
        assert_eq!(flags & (1 << 7), 1 << 7, "RLT (stage 0) should have been skipped");
        assert_eq!(flags & (1 << 6), 0, "ZRLT (stage 1) should have applied");
    }

    #[test]
    fn mtft_then_zrlt_roundtrips_a_sparse_rank_stream() {
        let mut seq = TransformSequence::new(vec![Box::new(Sbrt::new(SbrtMode::Mtf)), Box::new(Zrlt)]).unwrap();
        let data = b"abababababababababababababababababababab".to_vec();
        roundtrip(&mut seq, &data);
    }

    #[test]
    fn rejects_an_empty_stage_list() {
        assert!(TransformSequence::new(Vec::new()).is_err());
    }

    #[test]
    fn rejects_more_than_max_stages() {
        let stages: Vec<Box<dyn Transform>> = (0..9).map(|_| Box::new(NullTransform) as Box<dyn Transform>).collect();
        assert!(matches!(TransformSequence::new(stages), Err(BxformError::TooManyStages(9))));
    }

    #[test]
    fn empty_input_round_trips_trivially() {
        let mut seq = TransformSequence::new(vec![Box::new(NullTransform)]).unwrap();
        let ctx = Context::new();
        let mut src: [u8; 0] = [];
        let mut mid: [u8; 0] = [];
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(seq.forward(&mut input, &mut output, &ctx).unwrap());
    }
}
