use bxform_core::{BxformError, Context, Span, Transform};

use crate::varint::{decode_extended, encode_extended};
use super::DATA_TYPE_DNA;

const HASH_SEED: u64 = 0x1E35A7BD;
const HASH_LOG1: u32 = 16;
const HASH_SHIFT1: u32 = 40 - HASH_LOG1;
const HASH_LOG2: u32 = 21;
const HASH_SHIFT2: u32 = 48 - HASH_LOG2;

const MAX_DISTANCE1: i64 = (1 << 17) - 2;
const MAX_DISTANCE2: i64 = (1 << 24) - 2;
const MIN_MATCH1: i64 = 5;
const MIN_MATCH2: i64 = 9;
const MAX_MATCH: i64 = 65535 + 254 + 15 + MIN_MATCH1;
const MIN_BLOCK_LENGTH: i64 = 24;
const MIN_MATCH_MIN_DIST: i64 = 1 << 16;

/// Which hash table size [`LzxCodec`] uses to index candidate matches.
///
/// `Standard` is the `LZ` factory name (a 64K-slot table, cheaper on
/// small blocks); `Extra` is `LZX` (a 2M-slot table, fewer collisions
/// on large ones). Either can still emit a long-distance match: the
/// distance encoding width is chosen per block from its length, not
/// from this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzWindow {
    /// 64K-slot hash table (factory name `LZ`).
    Standard,
    /// 2M-slot hash table (factory name `LZX`).
    Extra,
}

impl LzWindow {
    fn hash_log(self) -> u32 {
        match self {
            LzWindow::Standard => HASH_LOG1,
            LzWindow::Extra => HASH_LOG2,
        }
    }

    fn hash_shift(self) -> u32 {
        match self {
            LzWindow::Standard => HASH_SHIFT1,
            LzWindow::Extra => HASH_SHIFT2,
        }
    }
}

/// Hash-chained LZ77 with a two-slot repeat-offset cache.
///
/// Each candidate position is hashed from its leading 8 bytes and
/// looked up in a flat table sized by [`LzWindow`]; matches shorter
/// than the active minimum, or whose distance would collide with a
/// degenerate short-match/long-distance combination, are rejected in
/// favor of extending the literal run. The two most recently used
/// match distances are kept in a small FIFO (`repd0`, `repd1`) and
/// encoded as a 1-bit selector instead of a full distance when reused.
///
/// Output is laid out as a 13-byte prologue (total length, token-count,
/// match-descriptor-count, and a flags byte), followed by the literal
/// stream (interleaved with its own length-overflow bytes), then three
/// trailing regions: tokens, match descriptors, and match-length
/// overflow bytes.
pub struct LzxCodec {
    window: LzWindow,
    hashes: Vec<i64>,
    tk_buf: Vec<u8>,
    m_buf: Vec<u8>,
    m_len_buf: Vec<u8>,
}

impl LzxCodec {
    /// Creates an `LzxCodec` using the given hash table size.
    pub fn new(window: LzWindow) -> Self {
        Self {
            window,
            hashes: Vec::new(),
            tk_buf: Vec::new(),
            m_buf: Vec::new(),
            m_len_buf: Vec::new(),
        }
    }

    fn hash(&self, window_bytes: &[u8]) -> usize {
        let v = u64::from_le_bytes(window_bytes[..8].try_into().unwrap());
        let h = v.wrapping_mul(HASH_SEED) >> self.window.hash_shift();
        (h & ((1u64 << self.window.hash_log()) - 1)) as usize
    }

    fn same_four(block: &[u8], a: i64, b: i64) -> bool {
        let a = a as usize;
        let b = b as usize;
        block[a..a + 4] == block[b..b + 4]
    }

    fn find_match(block: &[u8], src_idx: i64, ref_idx: i64, max_match: i64) -> i64 {
        if max_match < 4 || !Self::same_four(block, ref_idx, src_idx) {
            return 0;
        }
        let mut len = 4i64;
        while len + 4 <= max_match && Self::same_four(block, ref_idx + len, src_idx + len) {
            len += 4;
        }
        while len < max_match && block[(ref_idx + len) as usize] == block[(src_idx + len) as usize] {
            len += 1;
        }
        len
    }
}

impl Transform for LzxCodec {
    fn forward(&mut self, input: &mut Span, output: &mut Span, context: &Context) -> Result<bool, BxformError> {
        let src = input.remaining();
        let count = src.len() as i64;
        if count < MIN_BLOCK_LENGTH {
            return Ok(false);
        }

        let max_len = self.max_encoded_length(src.len());
        if output.remaining().len() < max_len {
            return Ok(false);
        }

        let src_end = count - 16 - 1;
        if src_end < 0 {
            return Ok(false);
        }

        let hash_size = 1usize << self.window.hash_log();
        if self.hashes.len() != hash_size {
            self.hashes = vec![0i64; hash_size];
        } else {
            self.hashes.iter_mut().for_each(|h| *h = 0);
        }
        self.tk_buf.clear();
        self.m_buf.clear();
        self.m_len_buf.clear();

        let max_dist = if src_end < 4 * MAX_DISTANCE1 { MAX_DISTANCE1 } else { MAX_DISTANCE2 };
        let mut flags: u8 = if max_dist == MAX_DISTANCE1 { 0 } else { 1 };
        let mut min_match = MIN_MATCH1;
        if context.get_text("dataType", "") == DATA_TYPE_DNA {
            min_match = MIN_MATCH2;
            flags |= 2;
        }
        let d_threshold = if max_dist == MAX_DISTANCE1 { max_dist + 1 } else { 1 << 16 };

        let mut src_idx: i64 = 0;
        let mut anchor: i64 = 0;
        let mut repd0 = count;
        let mut repd1: i64 = 0;

        // dst_idx walks the literal region directly; the three trailing
        // regions (tokens, match descriptors, length overflow) accumulate
        // in side buffers and are appended once the literal region closes.
        let mut dst_idx: i64 = 13;

        while src_idx < src_end {
            let min_ref = (src_idx - max_dist).max(0);
            let h0 = self.hash(&src[src_idx as usize..]);
            let h1 = self.hash(&src[(src_idx + 1) as usize..]);

            let mut ref_idx = src_idx + 1 - repd0;
            let mut best_len: i64 = 0;
            if ref_idx > min_ref && Self::same_four(src, src_idx + 1, ref_idx) {
                best_len = Self::find_match(src, src_idx + 1, ref_idx, (src_end - src_idx - 1).min(MAX_MATCH));
            }

            if best_len < min_match {
                ref_idx = self.hashes[h0];
                self.hashes[h0] = src_idx;

                if ref_idx <= min_ref {
                    src_idx += 1;
                    continue;
                }
                if Self::same_four(src, src_idx, ref_idx) {
                    best_len = Self::find_match(src, src_idx, ref_idx, (src_end - src_idx).min(MAX_MATCH));
                }
            } else {
                src_idx += 1;
                self.hashes[h0] = src_idx;
            }

            if best_len < min_match
                || (best_len == min_match && src_idx - ref_idx >= MIN_MATCH_MIN_DIST && src_idx - ref_idx != repd0)
            {
                src_idx += 1;
                continue;
            }

            if ref_idx != src_idx - repd0 {
                let ref1 = self.hashes[h1];
                self.hashes[h1] = src_idx + 1;

                if ref1 > min_ref + 1 {
                    let best_len1 = Self::find_match(src, src_idx + 1, ref1, (src_end - src_idx - 1).min(MAX_MATCH));
                    if best_len1 > best_len || (best_len1 == best_len && ref1 > ref_idx + 1) {
                        ref_idx = ref1;
                        best_len = best_len1;
                        src_idx += 1;
                    }
                }
            }

            let d = src_idx - ref_idx;
            let dist;
            if d == repd0 {
                dist = 0;
            } else {
                dist = if d == repd1 { 1 } else { d + 1 };
                repd1 = repd0;
                repd0 = d;
            }

            let m_len = best_len - min_match;
            let token: u8 = (if dist > 0xFFFF { 0x10 } else { 0 }) | (m_len.min(15) as u8);

            if anchor == src_idx {
                self.tk_buf.push(token);
            } else {
                let lit_len = src_idx - anchor;
                if lit_len >= 7 {
                    if lit_len >= 1 << 24 {
                        return Ok(false);
                    }
                    self.tk_buf.push((7 << 5) | token);
                    let before = dst_idx;
                    let dst = output.remaining_mut();
                    let mut overflow = Vec::new();
                    encode_extended((lit_len - 7) as u64, &mut overflow);
                    dst[before as usize..before as usize + overflow.len()].copy_from_slice(&overflow);
                    dst_idx += overflow.len() as i64;
                } else {
                    self.tk_buf.push(((lit_len as u8) << 5) | token);
                }

                let anchor_u = anchor as usize;
                let lit_len_u = lit_len as usize;
                let dst = output.remaining_mut();
                dst[dst_idx as usize..dst_idx as usize + lit_len_u].copy_from_slice(&src[anchor_u..anchor_u + lit_len_u]);
                dst_idx += lit_len;
            }

            if m_len >= 15 {
                encode_extended((m_len - 15) as u64, &mut self.m_len_buf);
            }
            if dist >= d_threshold {
                self.m_buf.push((dist >> 16) as u8);
            }
            self.m_buf.push((dist >> 8) as u8);
            self.m_buf.push(dist as u8);

            anchor = src_idx + best_len;
            src_idx += 1;
            while src_idx < anchor {
                let h = self.hash(&src[src_idx as usize..]);
                self.hashes[h] = src_idx;
                src_idx += 1;
            }
        }

        let lit_len = count - anchor;
        let tail_total = dst_idx + lit_len + self.tk_buf.len() as i64 + self.m_buf.len() as i64;
        if tail_total >= count {
            return Ok(false);
        }

        if lit_len >= 7 {
            self.tk_buf.push(7 << 5);
            let before = dst_idx;
            let dst = output.remaining_mut();
            let mut overflow = Vec::new();
            encode_extended((lit_len - 7) as u64, &mut overflow);
            dst[before as usize..before as usize + overflow.len()].copy_from_slice(&overflow);
            dst_idx += overflow.len() as i64;
        } else {
            self.tk_buf.push((lit_len as u8) << 5);
        }

        {
            let anchor_u = anchor as usize;
            let lit_len_u = lit_len as usize;
            let dst = output.remaining_mut();
            dst[dst_idx as usize..dst_idx as usize + lit_len_u].copy_from_slice(&src[anchor_u..anchor_u + lit_len_u]);
            dst_idx += lit_len;
        }

        let tk_len = self.tk_buf.len();
        let m_len_total = self.m_buf.len();
        let m_overflow_len = self.m_len_buf.len();

        let dst = output.remaining_mut();
        dst[0..4].copy_from_slice(&(dst_idx as u32).to_le_bytes());
        dst[4..8].copy_from_slice(&(tk_len as u32).to_le_bytes());
        dst[8..12].copy_from_slice(&(m_len_total as u32).to_le_bytes());
        dst[12] = flags;

        let tk_start = dst_idx as usize;
        dst[tk_start..tk_start + tk_len].copy_from_slice(&self.tk_buf);
        dst_idx += tk_len as i64;
        let m_start = dst_idx as usize;
        dst[m_start..m_start + m_len_total].copy_from_slice(&self.m_buf);
        dst_idx += m_len_total as i64;
        let ml_start = dst_idx as usize;
        dst[ml_start..ml_start + m_overflow_len].copy_from_slice(&self.m_len_buf);
        dst_idx += m_overflow_len as i64;

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
        if count < 13 {
            return Err(BxformError::CorruptInput("LZ stream shorter than its prologue"));
        }

        let tk_idx0 = u32::from_le_bytes(src[0..4].try_into().unwrap()) as usize;
        let tk_count = u32::from_le_bytes(src[4..8].try_into().unwrap()) as usize;
        let m_count = u32::from_le_bytes(src[8..12].try_into().unwrap()) as usize;
        let flags = src[12];

        let m_idx0 = tk_idx0.checked_add(tk_count).ok_or(BxformError::CorruptInput("LZ region offsets overflow"))?;
        let m_len_idx0 = m_idx0.checked_add(m_count).ok_or(BxformError::CorruptInput("LZ region offsets overflow"))?;
        if tk_idx0 < 13 || m_len_idx0 > count {
            return Err(BxformError::CorruptInput("LZ region offsets out of range"));
        }

        let max_dist = if flags & 1 == 0 { MAX_DISTANCE1 } else { MAX_DISTANCE2 };
        let min_match = if flags & 2 == 0 { MIN_MATCH1 } else { MIN_MATCH2 };

        let dst_capacity = output.remaining().len() as i64;

        let mut tk_idx = tk_idx0;
        let mut m_idx = m_idx0;
        let mut m_len_idx = m_len_idx0;
        let mut src_idx: i64 = 13;
        let src_end = tk_idx0 as i64;
        let mut dst_idx: i64 = 0;
        let mut repd0: i64 = 0;
        let mut repd1: i64 = 0;

        loop {
            let token = *src.get(tk_idx).ok_or(BxformError::CorruptInput("LZ token stream truncated"))? as i64;
            tk_idx += 1;

            let mut lit_len = token >> 5;
            if lit_len == 7 {
                let (extra, consumed) =
                    decode_extended(src.get(src_idx as usize..).ok_or(BxformError::CorruptInput("LZ literal length truncated"))?)
                        .ok_or(BxformError::CorruptInput("LZ literal length truncated"))?;
                src_idx += consumed as i64;
                lit_len = 7 + extra as i64;
            }

            let lit_from = src_idx as usize;
            let lit_to = lit_from.checked_add(lit_len as usize).ok_or(BxformError::CorruptInput("LZ literal run overflows source"))?;
            if lit_to > src.len() || dst_idx + lit_len > dst_capacity {
                return Err(BxformError::CorruptInput("LZ literal run exceeds buffer bounds"));
            }
            {
                let dst = output.remaining_mut();
                dst[dst_idx as usize..dst_idx as usize + lit_len as usize].copy_from_slice(&src[lit_from..lit_to]);
            }
            src_idx += lit_len;
            dst_idx += lit_len;

            if src_idx >= src_end {
                // Final token carries only a trailing literal run, no match.
                break;
            }

            let mut m_len = token & 0x0F;
            if m_len == 15 {
                let (extra, consumed) =
                    decode_extended(src.get(m_len_idx..).ok_or(BxformError::CorruptInput("LZ match length truncated"))?)
                        .ok_or(BxformError::CorruptInput("LZ match length truncated"))?;
                m_len_idx += consumed;
                m_len += extra as i64;
            }
            m_len += min_match;

            let b0 = *src.get(m_idx).ok_or(BxformError::CorruptInput("LZ match descriptor truncated"))?;
            let b1 = *src.get(m_idx + 1).ok_or(BxformError::CorruptInput("LZ match descriptor truncated"))?;
            let mut d = ((b0 as i64) << 8) | b1 as i64;
            m_idx += 2;

            if token & 0x10 != 0 {
                if max_dist == MAX_DISTANCE1 {
                    d += 65536;
                } else {
                    let b2 = *src.get(m_idx).ok_or(BxformError::CorruptInput("LZ match descriptor truncated"))?;
                    d = (d << 8) | b2 as i64;
                    m_idx += 1;
                }
            }

            let dist = if d == 0 {
                repd0
            } else {
                let dist = if d == 1 { repd1 } else { d - 1 };
                repd1 = repd0;
                repd0 = dist;
                dist
            };

            let m_end = dst_idx + m_len;
            if dist <= 0 || dist > dst_idx || dist > max_dist || m_end > dst_capacity {
                return Err(BxformError::CorruptInput("LZ match distance or length out of range"));
            }

            {
                let dst = output.remaining_mut();
                let ref_start = (dst_idx - dist) as usize;
                for i in 0..m_len as usize {
                    dst[dst_idx as usize + i] = dst[ref_start + i];
                }
            }
            dst_idx = m_end;
        }

        output.advance(dst_idx as usize)?;
        input.advance(m_len_idx)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        input_len + input_len / 4 + 64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxform_core::Context;
    use rstest::rstest;

    fn roundtrip(window: LzWindow, data: &[u8]) {
        let mut src = data.to_vec();
        let mut codec = LzxCodec::new(window);
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        let applied = codec.forward(&mut input, &mut output, &ctx).unwrap();
        assert!(applied, "expected a match to be found in repetitive input");
        let encoded_len = output.cursor();

        let mut mid2 = mid[..encoded_len].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut mid2);
        let mut output2 = Span::new(&mut out);
        codec.inverse(&mut input2, &mut output2, &ctx).unwrap();
        assert_eq!(out, data);
    }

    fn repetitive_block(len: usize) -> Vec<u8> {
        let phrase = b"the quick brown fox jumps over the lazy dog. ";
        phrase.iter().cycle().take(len).copied().collect()
    }

    #[rstest]
    #[case(LzWindow::Standard)]
    #[case(LzWindow::Extra)]
    fn roundtrips_a_repetitive_block(#[case] window: LzWindow) {
        roundtrip(window, &repetitive_block(4096));
    }

    #[test]
    fn declines_on_incompressible_noise() {
        let data: Vec<u8> = (0..2048u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();
        let mut src = data.clone();
        let mut codec = LzxCodec::new(LzWindow::Standard);
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(!codec.forward(&mut input, &mut output, &ctx).unwrap());
    }

    #[test]
    fn declines_on_short_input() {
        let mut src = vec![1u8, 2, 3];
        let mut codec = LzxCodec::new(LzWindow::Standard);
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
        let mut codec = LzxCodec::new(LzWindow::Standard);
        let mut mid = vec![0u8; codec.max_encoded_length(data.len())];
        let ctx = Context::new();
        let mut input = Span::new(&mut src);
        let mut output = Span::new(&mut mid);
        assert!(codec.forward(&mut input, &mut output, &ctx).unwrap());
        let encoded_len = output.cursor();

        let mut truncated = mid[..encoded_len / 2].to_vec();
        let mut out = vec![0u8; data.len()];
        let mut input2 = Span::new(&mut truncated);
        let mut output2 = Span::new(&mut out);
        assert!(codec.inverse(&mut input2, &mut output2, &ctx).is_err());
    }
}
