//! Linear-interpolation sample-rate converter.
//!
//! Tracks are not guaranteed to share the DAC's configured output rate (a
//! gapless swap can follow a 44.1 kHz track with a 48 kHz one without a
//! silence gap to re-lock hardware clocks in). [`Resampler`] bridges the
//! gap with a simple two-point linear interpolation, not a general-purpose
//! sample-rate-conversion library: a general SRC crate (e.g. `dasp`) was
//! considered and dropped for this workspace, see `DESIGN.md`. Interleaved
//! stereo `i32` samples in, same format out — this runs on the decoder
//! side of the DSP chain, upstream of [`crate::dsp`].

/// Fractional-position precision: Q16.16 fixed point.
const FRAC_BITS: u32 = 16;
const FRAC_ONE: u32 = 1 << FRAC_BITS;

/// Stateful linear-interpolation resampler for interleaved stereo `i32`
/// PCM. Call [`Resampler::process`] once per decoded chunk; state carries
/// the fractional input position across calls so a chunk boundary never
/// introduces a click.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    in_rate: u32,
    out_rate: u32,
    /// Position of the next output frame within the frames passed to the
    /// next [`Self::process`] call, in Q16.16 frames.
    frac_pos: u32,
}

impl Resampler {
    /// Construct a resampler converting from `in_rate` to `out_rate` Hz.
    #[must_use]
    pub fn new(in_rate: u32, out_rate: u32) -> Self {
        Self {
            in_rate,
            out_rate,
            frac_pos: 0,
        }
    }

    /// Reconfigure for new rates (e.g. a gapless swap into a
    /// different-rate track); resets the fractional position since the
    /// previous track's trailing fraction no longer means anything here.
    pub fn set_rates(&mut self, in_rate: u32, out_rate: u32) {
        self.in_rate = in_rate;
        self.out_rate = out_rate;
        self.frac_pos = 0;
    }

    /// `true` when input and output rates match (or either is unset),
    /// so [`Self::process`] can take the exact-copy fast path.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.in_rate == self.out_rate || self.in_rate == 0 || self.out_rate == 0
    }

    /// Step, in Q16.16 input frames, that the read position advances per
    /// output frame produced.
    fn step_q16(&self) -> u32 {
        let step = (u64::from(self.in_rate) << FRAC_BITS) / u64::from(self.out_rate.max(1));
        u32::try_from(step).unwrap_or(u32::MAX)
    }

    /// Resample interleaved stereo frames from `input` into `output`.
    ///
    /// Returns `(frames_consumed, frames_produced)`. `frames_consumed` is
    /// how many leading frames of `input` the caller may drop; any
    /// remaining tail (at least one frame, for interpolation continuity)
    /// must be re-presented at the front of the next call.
    pub fn process(&mut self, input: &[i32], output: &mut [i32]) -> (usize, usize) {
        let in_frames = input.len() / 2;
        let out_capacity = output.len() / 2;

        if self.is_passthrough() {
            let frames = in_frames.min(out_capacity);
            let n = frames.saturating_mul(2);
            if let (Some(dst), Some(src)) = (output.get_mut(..n), input.get(..n)) {
                dst.copy_from_slice(src);
            }
            return (frames, frames);
        }

        if in_frames < 2 {
            return (0, 0);
        }

        let step = self.step_q16();
        let mut produced = 0usize;
        let mut frame_index = (self.frac_pos >> FRAC_BITS) as usize;

        while produced < out_capacity {
            if frame_index.saturating_add(1) >= in_frames {
                break;
            }
            let frac = i64::from(self.frac_pos & (FRAC_ONE - 1));

            for ch in 0..2usize {
                let cur = input.get(frame_index.saturating_mul(2).saturating_add(ch)).copied().unwrap_or(0);
                let next = input
                    .get(frame_index.saturating_add(1).saturating_mul(2).saturating_add(ch))
                    .copied()
                    .unwrap_or(0);
                let delta = i64::from(next).saturating_sub(i64::from(cur));
                let interpolated =
                    i64::from(cur).saturating_add(delta.saturating_mul(frac) / i64::from(FRAC_ONE));
                if let Some(slot) = output.get_mut(produced.saturating_mul(2).saturating_add(ch)) {
                    #[allow(clippy::cast_possible_truncation)]
                    // `interpolated` is a linear blend of two i32 samples, always in i32 range.
                    {
                        *slot = interpolated as i32;
                    }
                }
            }

            produced = produced.saturating_add(1);
            self.frac_pos = self.frac_pos.saturating_add(step);
            frame_index = (self.frac_pos >> FRAC_BITS) as usize;
        }

        let consumed = (self.frac_pos >> FRAC_BITS) as usize;
        self.frac_pos &= FRAC_ONE - 1;
        (consumed.min(in_frames.saturating_sub(1)), produced)
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_copies_exactly() {
        let mut r = Resampler::new(44_100, 44_100);
        assert!(r.is_passthrough());
        let input = [1i32, -1, 2, -2, 3, -3];
        let mut output = [0i32; 6];
        let (consumed, produced) = r.process(&input, &mut output);
        assert_eq!(consumed, 3);
        assert_eq!(produced, 3);
        assert_eq!(output, input);
    }

    #[test]
    fn upsampling_produces_more_frames_than_consumed() {
        let mut r = Resampler::new(22_050, 44_100);
        assert!(!r.is_passthrough());
        let input = [0i32, 0, 1000, 1000, 2000, 2000, 3000, 3000];
        let mut output = [0i32; 32];
        let (consumed, produced) = r.process(&input, &mut output);
        assert!(produced > consumed);
        assert!(consumed < input.len() / 2);
    }

    #[test]
    fn downsampling_produces_fewer_frames_than_consumed() {
        let mut r = Resampler::new(48_000, 44_100);
        let input = [0i32; 64];
        let mut output = [0i32; 64];
        let (consumed, produced) = r.process(&input, &mut output);
        assert!(produced <= consumed);
    }

    #[test]
    fn interpolated_value_lies_between_endpoints() {
        let mut r = Resampler::new(22_050, 44_100);
        let input = [0i32, 0, 1000, 1000, 1000, 1000];
        let mut output = [0i32; 8];
        r.process(&input, &mut output);
        assert!(output[2] >= 0 && output[2] <= 1000);
    }

    #[test]
    fn empty_input_produces_nothing() {
        let mut r = Resampler::new(48_000, 44_100);
        let mut output = [0i32; 8];
        let (consumed, produced) = r.process(&[], &mut output);
        assert_eq!(consumed, 0);
        assert_eq!(produced, 0);
    }
}
