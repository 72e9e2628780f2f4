use bxform_core::{BxformError, Context, Span, Transform};

use crate::varint::{decode_var7, encode_var7};

/// Sorted rank transform: a post-BWT redundancy reducer.
///
/// Live symbols are bucketed by descending frequency (ties broken by
/// ascending symbol value); within each byte's bucket, runs are
/// written as a move-to-front-style rank restricted to symbols still
/// alive, with a 256-entry frequency header (7-bit continuation
/// varint per entry) prefixed to the stream so the inverse can rebuild
/// the same buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Srt;

/// Live symbols in descending-frequency order (ties: ascending symbol).
fn preprocess(freqs: &[u32; 256]) -> Vec<u8> {
    let mut symbols: Vec<u8> = (0u16..256).filter(|&c| freqs[c as usize] != 0).map(|c| c as u8).collect();
    symbols.sort_by(|&a, &b| freqs[b as usize].cmp(&freqs[a as usize]).then(a.cmp(&b)));
    symbols
}

impl Transform for Srt {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let data = input.remaining();
        let length = data.len();
        if length == 0 {
            return Ok(false);
        }

        let mut freqs = [0u32; 256];
        let mut s2r = [0u8; 256];
        let mut r2s = [0u8; 256];

        let mut i = 0;
        let mut b = 0usize;
        while i < length {
            let c = data[i] as usize;
            let mut j = i + 1;
            while j < length && data[j] as usize == c {
                j += 1;
            }
            if freqs[c] == 0 {
                r2s[b] = c as u8;
                s2r[c] = b as u8;
                b += 1;
            }
            freqs[c] += (j - i) as u32;
            i = j;
        }

        let symbols = preprocess(&freqs);
        let mut buckets = [0usize; 256];
        let mut bucket_pos = 0usize;
        for &c in &symbols {
            buckets[c as usize] = bucket_pos;
            bucket_pos += freqs[c as usize] as usize;
        }

        let mut header = Vec::with_capacity(256 * 2);
        for f in freqs.iter() {
            encode_var7(*f as u64, &mut header);
        }

        let total_len = header.len() + length;
        if total_len > output.remaining().len() {
            return Ok(false);
        }

        let dst = &mut output.remaining_mut()[..total_len];
        dst[..header.len()].copy_from_slice(&header);
        let body = &mut dst[header.len()..];

        let mut i = 0;
        while i < length {
            let c = data[i] as usize;
            let r = s2r[c] as usize;
            let mut p = buckets[c];
            body[p] = r as u8;
            p += 1;

            if r != 0 {
                let mut rr = r;
                loop {
                    let t = r2s[rr - 1];
                    r2s[rr] = t;
                    s2r[t as usize] = rr as u8;
                    rr -= 1;
                    if rr == 0 {
                        break;
                    }
                }
                r2s[0] = c as u8;
                s2r[c] = 0;
            }

            i += 1;
            while i < length && data[i] as usize == c {
                body[p] = 0;
                p += 1;
                i += 1;
            }
            buckets[c] = p;
        }

        input.advance(length)?;
        output.advance(total_len)?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let data = input.remaining();

        let mut freqs = [0u32; 256];
        let mut offset = 0usize;
        for f in freqs.iter_mut() {
            let (value, consumed) = decode_var7(&data[offset..]).ok_or(BxformError::CorruptInput("truncated SRT header"))?;
            *f = value as u32;
            offset += consumed;
        }
        let header_len = offset;
        if header_len > data.len() {
            return Err(BxformError::CorruptInput("SRT header longer than input"));
        }
        let length = data.len() - header_len;
        if length > output.remaining().len() {
            return Err(BxformError::CorruptInput("SRT output exceeds destination capacity"));
        }

        let symbols = preprocess(&freqs);
        let mut nb_symbols = symbols.len();
        let mut buckets = [0usize; 256];
        let mut bucket_ends = [0usize; 256];
        let mut r2s = [0u8; 256];
        let body = &data[header_len..];

        let mut bucket_pos = 0usize;
        for &c in &symbols {
            if bucket_pos >= length {
                return Err(BxformError::CorruptInput("SRT bucket position exceeds body length"));
            }
            r2s[body[bucket_pos] as usize] = c;
            buckets[c as usize] = bucket_pos + 1;
            bucket_pos += freqs[c as usize] as usize;
            bucket_ends[c as usize] = bucket_pos;
        }

        let mut c = r2s[0];
        let out = &mut output.remaining_mut()[..length];
        for slot in out.iter_mut() {
            *slot = c;
            let ci = c as usize;
            if buckets[ci] < bucket_ends[ci] {
                let r = body[buckets[ci]] as usize;
                buckets[ci] += 1;
                if r == 0 {
                    continue;
                }
                for k in 0..r {
                    r2s[k] = r2s[k + 1];
                }
                r2s[r] = c;
                c = r2s[0];
            } else {
                if nb_symbols == 1 {
                    continue;
                }
                nb_symbols -= 1;
                for k in 0..nb_symbols {
                    r2s[k] = r2s[k + 1];
                }
                c = r2s[0];
            }
        }

        let consumed = data.len();
        input.advance(consumed)?;
        output.advance(length)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        256 * 5 + input_len
    }
}
