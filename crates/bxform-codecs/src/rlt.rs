use bxform_core::{BxformError, Context, Span, Transform};

use crate::varint::{decode_extended, encode_extended};

const MIN_RUN: usize = 3;

/// Run-length transform: collapses runs of an identical byte (length
/// ≥ 3) into `[escape, byte, run_length_varint]`, where `escape` is
/// chosen per block as the block's least-frequent byte value and
/// recorded as a 1-byte header so the inverse can recover it without
/// rescanning the decoded output.
///
/// Declines to apply if no qualifying run exists, or if doing so would
/// not shrink the block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rlt;

fn pick_escape(data: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &byte in data {
        histogram[byte as usize] += 1;
    }
    histogram
        .iter()
        .enumerate()
        .min_by_key(|(_, count)| **count)
        .map(|(byte, _)| byte as u8)
        .unwrap_or(0)
}

fn encode(data: &[u8], escape: u8) -> (Vec<u8>, bool) {
    let mut out = Vec::with_capacity(data.len());
    let mut saw_run = false;
    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        if c == escape {
            out.push(escape);
            out.push(escape);
            i += 1;
            continue;
        }
        let mut run_len = 1;
        while i + run_len < data.len() && data[i + run_len] == c {
            run_len += 1;
        }
        if run_len >= MIN_RUN {
            saw_run = true;
            out.push(escape);
            out.push(c);
            encode_extended((run_len - MIN_RUN) as u64, &mut out);
        } else {
            out.extend(std::iter::repeat(c).take(run_len));
        }
        i += run_len;
    }
    (out, saw_run)
}

fn decode(data: &[u8], escape: u8) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        if b == escape {
            let next = *data.get(i + 1)?;
            if next == escape {
                out.push(escape);
                i += 2;
            } else {
                let (extra, consumed) = decode_extended(data.get(i + 2..)?)?;
                let run_len = extra as usize + MIN_RUN;
                out.extend(std::iter::repeat(next).take(run_len));
                i += 2 + consumed;
            }
        } else {
            out.push(b);
            i += 1;
        }
    }
    Some(out)
}

impl Transform for Rlt {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let data = input.remaining();
        if data.is_empty() {
            return Ok(false);
        }
        let escape = pick_escape(data);
        let (body, saw_run) = encode(data, escape);
        let total_len = 1 + body.len();
        if !saw_run || total_len >= data.len() || total_len > output.remaining().len() {
            return Ok(false);
        }
        let len = data.len();
        let dst = &mut output.remaining_mut()[..total_len];
        dst[0] = escape;
        dst[1..].copy_from_slice(&body);
        input.advance(len)?;
        output.advance(total_len)?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let data = input.remaining();
        let escape = *data.first().ok_or(BxformError::CorruptInput("empty RLT stream"))?;
        let decoded = decode(&data[1..], escape).ok_or(BxformError::CorruptInput("truncated RLT escape sequence"))?;
        if decoded.len() > output.remaining().len() {
            return Err(BxformError::CorruptInput("RLT output exceeds destination capacity"));
        }
        let consumed = data.len();
        output.remaining_mut()[..decoded.len()].copy_from_slice(&decoded);
        input.advance(consumed)?;
        output.advance(decoded.len())?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        2 * input_len + 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn roundtrip(data: &[u8]) {
        let mut src = data.to_vec();
        let mut mid = vec![0u8; Rlt.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut t = Rlt;
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        let applied = t.forward(&mut input, &mut output, &ctx).unwrap();
        assert!(applied, "expected RLT to apply to {data:?}");
        let encoded_len = output.cursor();

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        t.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }

    #[rstest]
    #[case(&[7u8; 10])]
    #[case(&[1, 1, 1, 2, 3, 3, 3, 3, 3])]
    fn roundtrips_qualifying_runs(#[case] data: &[u8]) {
        roundtrip(data);
    }

    #[test]
    fn declines_when_no_run_reaches_minimum_length() {
        let mut src = vec![1u8, 2, 3, 4, 5];
        let mut mid = vec![0u8; Rlt.max_encoded_length(src.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!Rlt.forward(&mut input, &mut output, &ctx).unwrap());
    }

    #[test]
    fn declines_on_empty_input() {
        let mut src: [u8; 0] = [];
        let mut mid: [u8; 0] = [];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!Rlt.forward(&mut input, &mut output, &ctx).unwrap());
    }
}
