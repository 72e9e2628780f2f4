use bxform_core::{BxformError, Context, Span, Transform};

/// Which of the three classic post-BWT rank heuristics [`Sbrt`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbrtMode {
    /// Pure move-to-front: `mask1=-1, mask2=0, shift=0`.
    Mtf,
    /// Rank by averaged last-seen position: `mask1=-1, mask2=-1, shift=1`.
    Rank,
    /// Rank by last-seen position only: `mask1=0, mask2=-1, shift=0`.
    Timestamp,
}

impl SbrtMode {
    fn mask1(self) -> i32 {
        if self == SbrtMode::Timestamp {
            0
        } else {
            -1
        }
    }

    fn mask2(self) -> i32 {
        if self == SbrtMode::Mtf {
            0
        } else {
            -1
        }
    }

    fn shift(self) -> u32 {
        if self == SbrtMode::Rank {
            1
        } else {
            0
        }
    }
}

/// Self-balanced rank transform.
///
/// For each byte `c` at position `i`, computes a priority
/// `q_c = ((i & mask1) + (prev_pos[c] & mask2)) >> shift`, emits the
/// symbol's current rank, then slides it past every lower rank whose
/// own priority is `<= q_c`. The three [`SbrtMode`]s parameterize this
/// one kernel into move-to-front, rank, or timestamp behavior.
///
/// Unlike the run-shrinking transforms, this one always applies: it
/// emits exactly one output byte per input byte and never declines.
#[derive(Debug, Clone, Copy)]
pub struct Sbrt {
    mode: SbrtMode,
}

impl Sbrt {
    /// Creates an `Sbrt` in the given mode.
    pub fn new(mode: SbrtMode) -> Self {
        Self { mode }
    }
}

impl Transform for Sbrt {
    fn forward(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<bool, BxformError> {
        let data = input.remaining();
        let count = data.len();
        if count == 0 || output.remaining().len() < count {
            return Ok(false);
        }

        let mask1 = self.mode.mask1();
        let mask2 = self.mode.mask2();
        let shift = self.mode.shift();

        let mut p = [0i32; 256];
        let mut q = [0i32; 256];
        let mut s2r = [0u8; 256];
        let mut r2s = [0u8; 256];
        for i in 0..256 {
            s2r[i] = i as u8;
            r2s[i] = i as u8;
        }

        let dst = &mut output.remaining_mut()[..count];
        for i in 0..count {
            let c = data[i] as usize;
            let mut r = s2r[c] as usize;
            dst[i] = r as u8;
            let qc = ((i as i32 & mask1) + (p[c] & mask2)) >> shift;
            p[c] = i as i32;
            q[c] = qc;

            while r > 0 && q[r2s[r - 1] as usize] <= qc {
                r2s[r] = r2s[r - 1];
                s2r[r2s[r] as usize] = r as u8;
                r -= 1;
            }
            r2s[r] = c as u8;
            s2r[c] = r as u8;
        }

        input.advance(count)?;
        output.advance(count)?;
        Ok(true)
    }

    fn inverse(&mut self, input: &mut Span, output: &mut Span, _context: &Context) -> Result<(), BxformError> {
        let data = input.remaining();
        let count = data.len();
        if output.remaining().len() < count {
            return Err(BxformError::CorruptInput("SBRT output exceeds destination capacity"));
        }

        let mask1 = self.mode.mask1();
        let mask2 = self.mode.mask2();
        let shift = self.mode.shift();

        let mut p = [0i32; 256];
        let mut q = [0i32; 256];
        let mut r2s = [0u8; 256];
        for i in 0..256 {
            r2s[i] = i as u8;
        }

        let dst = &mut output.remaining_mut()[..count];
        for i in 0..count {
            let mut r = data[i] as usize;
            let c = r2s[r];
            dst[i] = c;
            let qc = ((i as i32 & mask1) + (p[c as usize] & mask2)) >> shift;
            p[c as usize] = i as i32;
            q[c as usize] = qc;

            while r > 0 && q[r2s[r - 1] as usize] <= qc {
                r2s[r] = r2s[r - 1];
                r -= 1;
            }
            r2s[r] = c;
        }

        input.advance(count)?;
        output.advance(count)?;
        Ok(())
    }

    fn max_encoded_length(&self, input_len: usize) -> usize {
        input_len
    }
}
