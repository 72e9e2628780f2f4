use bxform_codecs::{Bwt, Bwts, Fsd, LzWindow, LzpCodec, LzxCodec, Rlt, Rolz, Rolzx, Sbrt, SbrtMode, Srt, Text, X86Codec, Zrlt};
use bxform_core::{BxformError, Context, NullTransform, PackedTransformId, Transform, TransformId, MAX_STAGES};

use crate::TransformSequence;

/// Recognized entropy-codec names that steer [`Text`] toward
/// `textcodec` variant 2 instead of the default variant 1.
const VARIANT_2_CODECS: [&str; 4] = ["NONE", "ANS0", "HUFFMAN", "RANGE"];

/// Resolves a `"NAME+NAME+..."` transform spec to a packed transform id,
/// and materializes a packed id into a concrete [`TransformSequence`].
///
/// Parsing is case-insensitive. `NONE` tokens are dropped before
/// packing, so `"BWT+NONE+MTFT"` and `"BWT+MTFT"` pack identically.
/// Slot 0 is always materialized — even `NONE` alone becomes a
/// one-stage sequence wrapping [`NullTransform`] — since a sequence
/// requires at least one stage.
pub struct TransformFactory;

impl TransformFactory {
    /// Parses `spec` into a packed transform id.
    ///
    /// # Errors
    /// Returns [`BxformError::InvalidSpec`] on an unrecognized token, or
    /// [`BxformError::TooManyStages`] if more than [`MAX_STAGES`]
    /// non-`NONE` tokens are named.
    pub fn parse(spec: &str) -> Result<PackedTransformId, BxformError> {
        let mut slots = Vec::new();
        for token in spec.split('+') {
            let id = TransformId::parse(token).ok_or_else(|| BxformError::InvalidSpec(format!("unknown transform name '{token}'")))?;
            if id != TransformId::None {
                slots.push(id);
            }
        }
        if slots.len() > MAX_STAGES {
            return Err(BxformError::TooManyStages(slots.len()));
        }
        Ok(PackedTransformId::pack(&slots))
    }

    /// Renders a packed transform id back to its canonical `"NAME+NAME+..."`
    /// spec, the inverse of [`Self::parse`]. An all-`NONE` id renders as `"NONE"`.
    pub fn spec_string(packed: PackedTransformId) -> String {
        let names: Vec<&str> = packed.slots().filter(|&id| id != TransformId::None).map(TransformId::name).collect();
        if names.is_empty() {
            TransformId::None.name().to_owned()
        } else {
            names.join("+")
        }
    }

    /// Builds a [`TransformSequence`] from a parsed spec, mutating
    /// `context` to forward the resolved `lz`/`textcodec`/`transform`
    /// keys the way the source factory's `newToken` does.
    ///
    /// # Errors
    /// Propagates [`TransformSequence::new`]'s errors; a packed id with
    /// zero non-`NONE` slots still yields a valid one-stage sequence,
    /// since slot 0 is always materialized.
    pub fn build(context: &mut Context, packed: PackedTransformId) -> Result<TransformSequence, BxformError> {
        let mut stages: Vec<Box<dyn Transform>> = Vec::new();
        for i in 0..MAX_STAGES {
            let id = packed.slot(i).unwrap_or(TransformId::None);
            if id != TransformId::None || i == 0 {
                stages.push(Self::materialize(context, id));
            }
        }
        TransformSequence::new(stages)
    }

    /// Builds a [`TransformSequence`] directly from a `"NAME+NAME+..."` spec.
    ///
    /// # Errors
    /// Propagates [`Self::parse`]'s and [`Self::build`]'s errors.
    pub fn build_from_spec(context: &mut Context, spec: &str) -> Result<TransformSequence, BxformError> {
        let packed = Self::parse(spec)?;
        Self::build(context, packed)
    }

    fn materialize(context: &mut Context, id: TransformId) -> Box<dyn Transform> {
        match id {
            TransformId::None => Box::new(NullTransform),
            TransformId::Bwt => Box::new(Bwt),
            TransformId::Bwts => Box::new(Bwts),
            TransformId::Lz => {
                context.set("lz", TransformId::Lz as i64);
                Box::new(LzxCodec::new(LzWindow::Standard))
            }
            TransformId::Lzx => {
                context.set("lz", TransformId::Lzx as i64);
                Box::new(LzxCodec::new(LzWindow::Extra))
            }
            TransformId::Lzp => {
                context.set("lz", TransformId::Lzp as i64);
                Box::new(LzpCodec::new())
            }
            TransformId::Rlt => Box::new(Rlt),
            TransformId::Zrlt => Box::new(Zrlt),
            TransformId::Mtft => Box::new(Sbrt::new(SbrtMode::Mtf)),
            TransformId::Rank => Box::new(Sbrt::new(SbrtMode::Rank)),
            TransformId::X86 => Box::new(X86Codec),
            TransformId::Text => {
                let entropy = context.get_text("codec", "").to_ascii_uppercase();
                let textcodec = if VARIANT_2_CODECS.contains(&entropy.as_str()) { 2 } else { 1 };
                context.set("textcodec", textcodec as i64);
                Box::new(Text)
            }
            TransformId::Rolz => {
                context.set("transform", "ROLZ");
                Box::new(Rolz)
            }
            TransformId::Rolzx => {
                context.set("transform", "ROLZX");
                Box::new(Rolzx)
            }
            TransformId::Srt => Box::new(Srt),
            TransformId::Fsd => Box::new(Fsd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_tokens_pack_identically_to_their_absence() {
        let with_none = TransformFactory::parse("BWT+NONE+MTFT").unwrap();
        let without = TransformFactory::parse("BWT+MTFT").unwrap();
        assert_eq!(with_none, without);
    }

    #[test]
    fn parse_is_case_insensitive() {
        let lower = TransformFactory::parse("bwt+mtft+zrlt").unwrap();
        let upper = TransformFactory::parse("BWT+MTFT+ZRLT").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn spec_string_round_trips_through_parse() {
        for spec in ["BWT+MTFT+ZRLT", "LZX", "SRT", "NONE"] {
            let packed = TransformFactory::parse(spec).unwrap();
            assert_eq!(TransformFactory::spec_string(packed), spec);
        }
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(TransformFactory::parse("BWT+NOT_A_TRANSFORM").is_err());
    }

    #[test]
    fn rejects_more_than_eight_non_none_tokens() {
        let spec = "BWT+MTFT+ZRLT+RLT+SRT+X86+LZ+LZX+RANK";
        assert!(matches!(TransformFactory::parse(spec), Err(BxformError::TooManyStages(9))));
    }

    #[test]
    fn none_alone_still_builds_a_one_stage_sequence() {
        let mut ctx = Context::new();
        let packed = TransformFactory::parse("NONE").unwrap();
        let seq = TransformFactory::build(&mut ctx, packed).unwrap();
        assert_eq!(seq.n_stages(), 1);
    }

    #[test]
    fn lzx_selection_forwards_the_lz_key_into_context() {
        let mut ctx = Context::new();
        let packed = TransformFactory::parse("LZX").unwrap();
        let _seq = TransformFactory::build(&mut ctx, packed).unwrap();
        assert_eq!(ctx.get_int("lz", -1), TransformId::Lzx as i64);
    }

    #[test]
    fn text_selection_picks_textcodec_variant_from_entropy_codec_name() {
        let mut ctx = Context::new();
        ctx.set("codec", "HUFFMAN");
        let packed = TransformFactory::parse("TEXT").unwrap();
        let _seq = TransformFactory::build(&mut ctx, packed).unwrap();
        assert_eq!(ctx.get_int("textcodec", -1), 2);

        let mut ctx2 = Context::new();
        ctx2.set("codec", "FPAQ");
        let packed2 = TransformFactory::parse("TEXT").unwrap();
        let _seq2 = TransformFactory::build(&mut ctx2, packed2).unwrap();
        assert_eq!(ctx2.get_int("textcodec", -1), 1);
    }

    #[test]
    fn builds_a_full_pipeline_and_round_trips_it() {
        let mut ctx = Context::new();
        let packed = TransformFactory::parse("MTFT+ZRLT").unwrap();
        let mut seq = TransformFactory::build(&mut ctx, packed).unwrap();

        let data = b"abracadabra abracadabra abracadabra".to_vec();
        let mut src = data.clone();
        let mut mid = vec![0u8; seq.max_encoded_length(data.len())];
        let mut input = bxform_core::Span::new(&mut src);
        let mut output = bxform_core::Span::new(&mut mid);
        seq.forward(&mut input, &mut output, &ctx).unwrap();
        let encoded_len = output.cursor();

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = bxform_core::Span::new(&mut mid2);
        let mut output2 = bxform_core::Span::new(&mut out);
        seq.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }
}
