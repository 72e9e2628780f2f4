use bxform_core::{BxformError, Context, Span, Transform};

const HASH_SEED: u32 = 0x7FEB_352D;
const HASH_LOG: u32 = 16;
const HASH_SHIFT: u32 = 32 - HASH_LOG;
const HASH_SIZE: usize = 1 << HASH_LOG;
const MIN_MATCH: i64 = 96;
const MIN_BLOCK_LENGTH: i64 = 128;
const MATCH_FLAG: u8 = 0xFC;

fn same_four(block: &[u8], a: i64, b: i64) -> bool {
    let a = a as usize;
    let b = b as usize;
    block[a..a + 4] == block[b..b + 4]
}

fn find_match(block: &[u8], src_idx: i64, ref_idx: i64, max_match: i64) -> i64 {
    if max_match < 4 || !same_four(block, ref_idx, src_idx) {
        return 0;
    }
    let mut len = 4i64;
    while len + 4 < max_match && same_four(block, ref_idx + len, src_idx + len) {
        len += 4;
    }
    while len < max_match && block[(ref_idx + len) as usize] == block[(src_idx + len) as usize] {
        len += 1;
    }
    len
}

/// Single-context LZP predictor.
///
/// Keeps one hash table mapping a rolling 4-byte context to the last
/// position that context was seen at. At every position it looks its
/// own preceding context up; a long enough match against that position
/// becomes a `[MATCH_FLAG, length...]` token, everything else copies
/// through literally. A literal byte that happens to equal
/// `MATCH_FLAG` is escaped with a trailing `0xFF`, and match lengths
/// beyond the 96-byte minimum are extended with `0xFE` continuation
/// bytes before a final terminator byte.
///
/// Declines to apply unless the whole block was consumed and the
/// result is smaller than `count - count/64`.
pub struct LzpCodec {
    hashes: Vec<i64>,
}

impl LzpCodec {
    /// Creates an `LzpCodec`.
    pub fn new() -> Self {
        Self { hashes: Vec::new() }
    }
}

impl Default for LzpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for LzpCodec {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let src = input.remaining();
        let count = src.len() as i64;
        if count < MIN_BLOCK_LENGTH {
            return Ok(false);
        }

        let max_len = self.max_encoded_length(src.len());
        if output.remaining().len() < max_len {
            return Ok(false);
        }

        if self.hashes.len() != HASH_SIZE {
            self.hashes = vec![0i64; HASH_SIZE];
        } else {
            self.hashes.iter_mut().for_each(|h| *h = 0);
        }

        let src_end = count;
        let dst_len = output.remaining().len() as i64;
        let dst_end = dst_len - 4;
        let dst = output.remaining_mut();

        dst[0] = src[0];
        dst[1] = src[1];
        dst[2] = src[2];
        dst[3] = src[3];
        let mut ctx = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        let mut src_idx: i64 = 4;
        let mut dst_idx: i64 = 4;
        let mut min_ref: i64 = 4;

        while src_idx < src_end - MIN_MATCH && dst_idx < dst_end {
            let h = (HASH_SEED.wrapping_mul(ctx) >> HASH_SHIFT) as usize;
            let ref_idx = self.hashes[h];
            self.hashes[h] = src_idx;
            let mut best_len = 0i64;

            if ref_idx > min_ref && same_four(src, ref_idx + MIN_MATCH - 4, src_idx + MIN_MATCH - 4) {
                best_len = find_match(src, src_idx, ref_idx, src_end - src_idx);
            }

            if best_len < MIN_MATCH {
                let val = src[src_idx as usize];
                ctx = (ctx << 8) | val as u32;
                dst[dst_idx as usize] = val;
                dst_idx += 1;
                src_idx += 1;

                if ref_idx != 0 {
                    if val == MATCH_FLAG {
                        dst[dst_idx as usize] = 0xFF;
                        dst_idx += 1;
                    }
                    if min_ref < best_len {
                        min_ref = src_idx + best_len;
                    }
                }
                continue;
            }

            src_idx += best_len;
            ctx = u32::from_le_bytes(src[(src_idx - 4) as usize..src_idx as usize].try_into().unwrap());
            dst[dst_idx as usize] = MATCH_FLAG;
            dst_idx += 1;
            let mut m_len = best_len - MIN_MATCH;

            while m_len >= 254 {
                m_len -= 254;
                dst[dst_idx as usize] = 0xFE;
                dst_idx += 1;
                if dst_idx >= dst_end {
                    break;
                }
            }
            dst[dst_idx as usize] = m_len as u8;
            dst_idx += 1;
        }

        while src_idx < src_end && dst_idx < dst_end {
            let h = (HASH_SEED.wrapping_mul(ctx) >> HASH_SHIFT) as usize;
            let ref_idx = self.hashes[h];
            self.hashes[h] = src_idx;
            let val = src[src_idx as usize];
            ctx = (ctx << 8) | val as u32;
            dst[dst_idx as usize] = val;
            dst_idx += 1;
            src_idx += 1;

            if ref_idx != 0 && val == MATCH_FLAG && dst_idx < dst_end {
                dst[dst_idx as usize] = 0xFF;
                dst_idx += 1;
            }
        }

        if src_idx != count || dst_idx >= count - (count >> 6) {
            return Ok(false);
        }

        input.advance(count as usize)?;
        output.advance(dst_idx as usize)?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let src = input.remaining();
        let count = src.len();
        if count == 0 {
            return Ok(());
        }
        if count < 4 {
            return Err(BxformError::CorruptInput("LZP stream shorter than its literal header"));
        }
        let dst_capacity = output.remaining().len();
        if dst_capacity < 4 {
            return Err(BxformError::CorruptInput("LZP destination too small for literal header"));
        }

        if self.hashes.len() != HASH_SIZE {
            self.hashes = vec![0i64; HASH_SIZE];
        } else {
            self.hashes.iter_mut().for_each(|h| *h = 0);
        }

        let dst = output.remaining_mut();
        dst[0] = src[0];
        dst[1] = src[1];
        dst[2] = src[2];
        dst[3] = src[3];
        let mut ctx = u32::from_le_bytes([dst[0], dst[1], dst[2], dst[3]]);
        let mut src_idx: usize = 4;
        let mut dst_idx: usize = 4;

        while src_idx < count {
            let h = (HASH_SEED.wrapping_mul(ctx) >> HASH_SHIFT) as usize;
            let ref_idx = self.hashes[h];
            self.hashes[h] = dst_idx as i64;

            let cur = src[src_idx];
            if ref_idx == 0 || cur != MATCH_FLAG {
                if dst_idx >= dst_capacity {
                    return Err(BxformError::CorruptInput("LZP output exceeds destination capacity"));
                }
                dst[dst_idx] = cur;
                ctx = (ctx << 8) | cur as u32;
                src_idx += 1;
                dst_idx += 1;
                continue;
            }

            src_idx += 1;
            let flag = *src.get(src_idx).ok_or(BxformError::CorruptInput("LZP stream truncated after match flag"))?;
            if flag == 0xFF {
                if dst_idx >= dst_capacity {
                    return Err(BxformError::CorruptInput("LZP output exceeds destination capacity"));
                }
                dst[dst_idx] = MATCH_FLAG;
                ctx = (ctx << 8) | MATCH_FLAG as u32;
                src_idx += 1;
                dst_idx += 1;
                continue;
            }

            let mut m_len: i64 = MIN_MATCH;
            while src_idx < count && src[src_idx] == 0xFE {
                src_idx += 1;
                m_len += 254;
            }
            if src_idx >= count {
                return Err(BxformError::CorruptInput("LZP match length truncated"));
            }
            m_len += src[src_idx] as i64;
            src_idx += 1;

            if ref_idx < 0 || ref_idx as usize >= dst_idx || dst_idx as i64 + m_len > dst_capacity as i64 {
                return Err(BxformError::CorruptInput("LZP match reference out of range"));
            }
            let ref_start = ref_idx as usize;
            for i in 0..m_len as usize {
                dst[dst_idx + i] = dst[ref_start + i];
            }
            dst_idx += m_len as usize;
            ctx = u32::from_le_bytes(dst[dst_idx - 4..dst_idx].try_into().unwrap());
        }

        output.advance(dst_idx)?;
        input.advance(src_idx)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        if input_len <= 1024 {
            input_len + 16
        } else {
            input_len + input_len / 64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxform_core::Context;

    fn repetitive_block(len: usize) -> Vec<u8> {
        let phrase = b"mississippi river valley data mississippi river valley ";
        phrase.iter().cycle().take(len).copied().collect()
    }

    #[test]
    fn roundtrips_a_repetitive_block() {
        let data = repetitive_block(4096);
        let mut src = data.clone();
        let mut codec = LzpCodec::new();
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        let applied = codec.forward(&mut input, &mut output, &ctx).unwrap();
        assert!(applied);
        let encoded_len = output.cursor();
        assert!(encoded_len < data.len());

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        codec.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn declines_on_incompressible_noise() {
        let data: Vec<u8> = (0..2048u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();
        let mut src = data.clone();
        let mut codec = LzpCodec::new();
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!codec.forward(&mut input, &mut output, &ctx).unwrap());
    }

    #[test]
    fn declines_on_short_input() {
        let mut src = vec![1u8; 64];
        let mut codec = LzpCodec::new();
        let mut mid = vec![0u8; codec.max_encoded_length(src.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!codec.forward(&mut input, &mut output, &ctx).unwrap());
    }

    #[test]
    fn truncated_stream_is_corrupt_input_not_a_panic() {
        let data = repetitive_block(4096);
        let mut src = data.clone();
        let mut codec = LzpCodec::new();
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(codec.forward(&mut input, &mut output, &ctx).unwrap());
        let encoded_len = output.cursor();

        // Cut right after a MATCH_FLAG byte so the decoder is left
        // expecting a flag/length byte that was never written.
        let cut = mid[4..encoded_len]
            .iter()
            .position(|&b| b == MATCH_FLAG)
            .map(|i| 4 + i + 1)
            .expect("a repetitive block should contain at least one match token");
        let mut truncated = mid[..cut].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut truncated);
        let mut output2 = Span::new(&mut out);
        assert!(codec.inverse(&mut input2, &mut output2, &ctx).is_err());
    }
}
