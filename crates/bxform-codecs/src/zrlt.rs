use bxform_core::{BxformError, Context, Span, Transform};

use crate::varint::{decode_var7, encode_var7};

/// Below this fraction (out of 256) of zero bytes, ZRLT declines to apply.
const MIN_ZERO_FRACTION_NUM: usize = 32;
const MIN_ZERO_FRACTION_DEN: usize = 256;

/// Zero run-length transform: encodes runs of the zero byte as a `0x00`
/// marker followed by the run length in the 7-bit continuation varint,
/// copying non-zero bytes verbatim. The marker is unambiguous since a
/// literal zero byte never appears outside a run.
///
/// Declines to apply when the block is not predominantly zeros (fewer
/// than 32 zero bytes per 256), matching the common "mostly zero"
/// post-BWT/post-MTF case without a second scanning pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zrlt;

impl Transform for Zrlt {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let data = input.remaining();
        if data.is_empty() {
            return Ok(false);
        }
        let zero_count = data.iter().filter(|&&b| b == 0).count();
        if zero_count * MIN_ZERO_FRACTION_DEN < MIN_ZERO_FRACTION_NUM * data.len() {
            return Ok(false);
        }

        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] == 0 {
                let mut run_len: u64 = 0;
                while i < data.len() && data[i] == 0 {
                    run_len += 1;
                    i += 1;
                }
                out.push(0);
                encode_var7(run_len, &mut out);
            } else {
                out.push(data[i]);
                i += 1;
            }
        }

        if out.len() >= data.len() || out.len() > output.remaining().len() {
            return Ok(false);
        }
        let len = data.len();
        output.remaining_mut()[..out.len()].copy_from_slice(&out);
        input.advance(len)?;
        output.advance(out.len())?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let data = input.remaining();
        let mut out = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            if data[i] != 0 {
                out.push(data[i]);
                i += 1;
            } else {
                let (run_len, consumed) = decode_var7(&data[i + 1..]).ok_or(BxformError::CorruptInput("truncated ZRLT run length"))?;
                out.extend(std::iter::repeat(0u8).take(run_len as usize));
                i += 1 + consumed;
            }
        }
        if out.len() > output.remaining().len() {
            return Err(BxformError::CorruptInput("ZRLT output exceeds destination capacity"));
        }
        let consumed = data.len();
        output.remaining_mut()[..out.len()].copy_from_slice(&out);
        input.advance(consumed)?;
        output.advance(out.len())?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        input_len + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mostly_zero_block(len: usize) -> Vec<u8> {
        // Zero runs of 3 between single non-zero bytes: long enough that
        // the marker-plus-varint framing still nets a smaller stream.
        (0..len).map(|i| if i % 4 == 3 { 7 } else { 0 }).collect()
    }

    #[test]
    fn roundtrips_a_mostly_zero_block() {
        let data = mostly_zero_block(1024);
        let mut src = data.clone();
        let mut mid = vec![0u8; Zrlt.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut t = Zrlt;
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(t.forward(&mut input, &mut output, &ctx).unwrap());
        let encoded_len = output.cursor();
        assert!(encoded_len < data.len());

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        t.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn declines_when_not_predominantly_zero() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut src = data.clone();
        let mut mid = vec![0u8; Zrlt.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!Zrlt.forward(&mut input, &mut output, &ctx).unwrap());
    }
}
