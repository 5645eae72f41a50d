//! Triangular-PDF dither for the final 32-bit → 16-bit truncation.
//!
//! The decode/DSP chain works in left-justified 32-bit samples throughout;
//! the last step before the samples reach the DMA buffer truncates to the
//! WM8758's 16-bit input width. Truncation alone is a deterministic
//! quantization step that correlates with the signal (harmonic distortion
//! on quiet material). TPDF dither adds a small triangular-distributed
//! random offset before truncation to decorrelate the error into noise
//! instead.
//!
//! [`Ditherer::Off`] is the variant actually wired into
//! [`crate`]'s playback path today: the bit-exact WAV round-trip property
//! depends on the 32→16 step being a pure arithmetic shift, and real TPDF
//! dither needs a noise source this `no_std` target doesn't have wired up
//! yet. [`Ditherer::Tpdf`] is implemented and tested against a supplied
//! pseudo-random source so it's ready to flip on once one is.

/// A minimal xorshift PRNG, good enough for dither noise (not
/// cryptographic). Seeded explicitly so dither is reproducible in tests.
#[derive(Debug, Clone, Copy)]
pub struct XorshiftRng(u32);

impl XorshiftRng {
    /// Construct a PRNG from a nonzero seed (zero is remapped to a fixed
    /// nonzero value, since xorshift's state is a fixed point at zero).
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    /// Next pseudo-random `u32`.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// Truncation strategy applied when narrowing a left-justified 32-bit
/// sample to the 16 bits the I²S FIFO accepts.
#[derive(Debug, Clone, Copy, Default)]
pub enum Ditherer {
    /// Arithmetic right-shift, no noise added. Bit-exact, used by the
    /// reference WAV playback path.
    #[default]
    Off,
    /// Triangular-PDF dither: two uniform random bits summed before the
    /// shift, attenuating quantization distortion at the cost of a
    /// slightly raised noise floor.
    Tpdf(XorshiftRng),
}

impl Ditherer {
    /// Construct a TPDF ditherer seeded from `seed`.
    #[must_use]
    pub fn tpdf(seed: u32) -> Self {
        Self::Tpdf(XorshiftRng::new(seed))
    }

    /// Narrow one left-justified 32-bit sample to 16 bits, keeping the
    /// most-significant bits.
    #[allow(clippy::cast_possible_truncation)]
    // Dither noise is bounded to ±1 LSB of the discarded 16 bits and the
    // result is clamped before the final shift, so the cast never wraps.
    pub fn process(&mut self, sample: i32) -> i16 {
        match self {
            Self::Off => (sample >> 16) as i16,
            Self::Tpdf(rng) => {
                // Two independent uniform draws in [-32768, 32767] summed
                // give a triangular distribution; scale down into the
                // discarded 16 bits before adding.
                let n1 = (rng.next_u32() as i32) >> 16;
                let n2 = (rng.next_u32() as i32) >> 16;
                let noise = n1.saturating_add(n2) >> 1;
                let dithered = sample.saturating_add(noise);
                (dithered >> 16) as i16
            }
        }
    }

    /// Narrow an interleaved-stereo buffer in place style: read `input`,
    /// write truncated samples to `output`. Returns the number of
    /// samples written (`input.len().min(output.len())`).
    pub fn process_slice(&mut self, input: &[i32], output: &mut [i16]) -> usize {
        let mut n = 0;
        for (dst, &src) in output.iter_mut().zip(input.iter()) {
            *dst = self.process(src);
            n = n.saturating_add(1);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_is_a_pure_arithmetic_shift() {
        let mut d = Ditherer::Off;
        assert_eq!(d.process(0x7FFF_0000u32 as i32), 0x7FFFu16 as i16);
        assert_eq!(d.process(0), 0);
        assert_eq!(d.process(-65536), -1);
    }

    #[test]
    fn tpdf_stays_within_one_lsb_of_the_undithered_value() {
        let mut d = Ditherer::tpdf(12345);
        let sample = 0x1234_0000u32 as i32;
        let undithered = (sample >> 16) as i16;
        for _ in 0..64 {
            let dithered = d.process(sample);
            assert!((i32::from(dithered) - i32::from(undithered)).abs() <= 1);
        }
    }

    #[test]
    fn process_slice_reports_count_written() {
        let mut d = Ditherer::Off;
        let input = [1i32, 2, 3, 4];
        let mut output = [0i16; 3];
        let n = d.process_slice(&input, &mut output);
        assert_eq!(n, 3);
    }

    #[test]
    fn xorshift_seed_zero_is_remapped() {
        let mut rng = XorshiftRng::new(0);
        assert_ne!(rng.next_u32(), 0);
    }
}
