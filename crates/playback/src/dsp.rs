//! Post-ring-buffer DSP chain: bass shelf, 5-band parametric EQ, stereo
//! widener, and the ramped master volume.
//!
//! Runs once per sample, after the ring buffer and before the 32→16-bit
//! truncation ([`crate::dither`]), on left-justified 32-bit interleaved
//! stereo PCM — never at decode time, so a gapless slot swap
//! ([`crate::decoder_slots`]) never has to re-run the chain over buffered
//! history. Filtering uses [`biquad`]'s `DirectForm1` implementation, one
//! instance per band per channel (filter state cannot be shared across
//! channels without bleeding left into right).

use biquad::{Biquad, Coefficients, DirectForm1, Q_BUTTERWORTH_F32, ToHertz, Type};

use crate::volume::Volume;

/// Center frequencies of the 5-band parametric EQ, Hz.
const EQ_BAND_HZ: [f32; 5] = [60.0, 230.0, 910.0, 4000.0, 14000.0];

/// Corner frequency of the bass-boost low shelf, Hz.
const BASS_SHELF_HZ: f32 = 100.0;

/// User-controlled gain settings for the filter chain. All gains are in
/// dB; 0.0 everywhere is the flat, do-nothing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqGains {
    /// Bass-boost shelf gain, dB.
    pub bass_db: f32,
    /// Per-band parametric EQ gain, dB, indexed in the same order as
    /// [`EQ_BAND_HZ`].
    pub bands_db: [f32; 5],
}

impl EqGains {
    /// All gains at 0 dB — the filter chain passes audio through
    /// unmodified (up to floating-point rounding in the biquad sections).
    pub const FLAT: Self = Self {
        bass_db: 0.0,
        bands_db: [0.0; 5],
    };

    fn is_flat(&self) -> bool {
        self.bass_db == 0.0 && self.bands_db.iter().all(|&g| g == 0.0)
    }
}

impl Default for EqGains {
    fn default() -> Self {
        Self::FLAT
    }
}

/// Coefficients that implement an identity (pass-through) biquad, used as
/// the fallback when `biquad::Coefficients::from_params` rejects a
/// parameter combination (e.g. a corner frequency above Nyquist after a
/// very low sample rate).
fn identity_coeffs() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}

fn shelf_coeffs(fs_hz: f32, gain_db: f32) -> Coefficients<f32> {
    Coefficients::<f32>::from_params(Type::LowShelf(gain_db), fs_hz.hz(), BASS_SHELF_HZ.hz(), Q_BUTTERWORTH_F32)
        .unwrap_or_else(|_| identity_coeffs())
}

fn peaking_coeffs(fs_hz: f32, f0_hz: f32, gain_db: f32) -> Coefficients<f32> {
    Coefficients::<f32>::from_params(Type::PeakingEQ(gain_db), fs_hz.hz(), f0_hz.hz(), Q_BUTTERWORTH_F32)
        .unwrap_or_else(|_| identity_coeffs())
}

/// One channel's worth of filter state: a bass shelf feeding five
/// parametric bands in series.
struct FilterStack {
    bass: DirectForm1<f32>,
    bands: [DirectForm1<f32>; 5],
}

impl FilterStack {
    fn new(sample_rate_hz: u32, gains: &EqGains) -> Self {
        let fs = sample_rate_hz.max(1) as f32;
        Self {
            bass: DirectForm1::<f32>::new(shelf_coeffs(fs, gains.bass_db)),
            bands: core::array::from_fn(|i| {
                #[allow(clippy::indexing_slicing)]
                // `i` ranges over 0..5, the exact length of EQ_BAND_HZ/bands_db.
                let (hz, gain) = (EQ_BAND_HZ[i], gains.bands_db[i]);
                DirectForm1::<f32>::new(peaking_coeffs(fs, hz, gain))
            }),
        }
    }

    fn run(&mut self, sample: f32) -> f32 {
        let mut s = self.bass.run(sample);
        for band in &mut self.bands {
            s = band.run(s);
        }
        s
    }
}

/// Stereo widener: scales the mid/side decomposition's side component by
/// `width` (1.0 = unmodified, 0.0 = mono-sum, >1.0 = wider than source).
#[derive(Debug, Clone, Copy)]
pub struct Widener {
    width: f32,
}

impl Widener {
    /// Construct a widener; `width` is clamped to `0.0..=2.0`.
    #[must_use]
    pub fn new(width: f32) -> Self {
        Self {
            width: width.clamp(0.0, 2.0),
        }
    }

    fn is_identity(&self) -> bool {
        self.width == 1.0
    }

    fn apply(&self, left: f32, right: f32) -> (f32, f32) {
        if self.is_identity() {
            return (left, right);
        }
        let mid = (left + right) * 0.5;
        let side = (left - right) * 0.5 * self.width;
        (mid + side, mid - side)
    }
}

impl Default for Widener {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// The full post-ring-buffer DSP chain for one stream: bass shelf → 5-band
/// EQ → stereo widener → ramped volume, operating sample-by-sample on
/// left-justified 32-bit interleaved stereo PCM.
pub struct DspChain {
    sample_rate_hz: u32,
    gains: EqGains,
    left: FilterStack,
    right: FilterStack,
    widener: Widener,
    volume: Volume,
}

impl DspChain {
    /// Construct a chain at `sample_rate_hz`, flat EQ, identity widener,
    /// and volume already settled at `initial_volume_percent`.
    #[must_use]
    pub fn new(sample_rate_hz: u32, initial_volume_percent: u8) -> Self {
        let gains = EqGains::FLAT;
        Self {
            sample_rate_hz,
            left: FilterStack::new(sample_rate_hz, &gains),
            right: FilterStack::new(sample_rate_hz, &gains),
            gains,
            widener: Widener::default(),
            volume: Volume::new(initial_volume_percent, sample_rate_hz),
        }
    }

    /// Re-point the chain at a new sample rate (a gapless rate-change
    /// swap). Filter state is rebuilt from scratch at the new rate; the
    /// volume ramp's slew length is recomputed but its current/target
    /// register values carry over unchanged.
    pub fn set_sample_rate(&mut self, sample_rate_hz: u32) {
        self.sample_rate_hz = sample_rate_hz;
        self.left = FilterStack::new(sample_rate_hz, &self.gains);
        self.right = FilterStack::new(sample_rate_hz, &self.gains);
        self.volume.set_sample_rate(sample_rate_hz);
    }

    /// Replace the EQ gain settings; rebuilds filter coefficients in
    /// place (no new allocation — `no_std`, no heap).
    pub fn set_gains(&mut self, gains: EqGains) {
        self.gains = gains;
        self.left = FilterStack::new(self.sample_rate_hz, &gains);
        self.right = FilterStack::new(self.sample_rate_hz, &gains);
    }

    /// Set the stereo widener amount.
    pub fn set_width(&mut self, width: f32) {
        self.widener = Widener::new(width);
    }

    /// Request a new target volume; [`Self::process_stereo`] ramps toward
    /// it sample-by-sample per [`Volume::set_target`].
    pub fn set_volume_target(&mut self, percent: u8) {
        self.volume.set_target(percent);
    }

    /// `true` when the EQ is flat and the widener is identity — the
    /// caller can skip the per-sample filter calls entirely and only the
    /// volume stage still runs.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.gains.is_flat() && self.widener.is_identity()
    }

    /// Run one interleaved stereo frame `[left, right]` through the chain,
    /// returning the processed frame.
    pub fn process_frame(&mut self, left: i32, right: i32) -> [i32; 2] {
        let register = self.volume.tick();
        let gain = f32::from(register) / 255.0;

        if self.is_flat() {
            #[allow(clippy::cast_possible_truncation)]
            // gain in [0,1] scaling an i32 sample never exceeds i32 range.
            return [
                ((left as f32) * gain) as i32,
                ((right as f32) * gain) as i32,
            ];
        }

        let l = self.left.run(left as f32);
        let r = self.right.run(right as f32);
        let (l, r) = self.widener.apply(l, r);
        #[allow(clippy::cast_possible_truncation)]
        [((l * gain) as i32), ((r * gain) as i32)]
    }

    /// Run an interleaved stereo buffer in place (`samples.len()` must be
    /// even). Odd trailing samples are left untouched.
    pub fn process_buffer(&mut self, samples: &mut [i32]) {
        let mut chunks = samples.chunks_exact_mut(2);
        for frame in &mut chunks {
            if let [left, right] = frame {
                let processed = self.process_frame(*left, *right);
                *left = processed[0];
                *right = processed[1];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_chain_at_full_volume_is_near_identity() {
        let mut chain = DspChain::new(44_100, 100);
        // Drain the volume ramp from 0 (construction jumps to target
        // directly via `Volume::new`, so no ramp is actually in flight).
        let frame = chain.process_frame(10_000, -10_000);
        assert_eq!(frame, [10_000, -10_000]);
    }

    #[test]
    fn zero_volume_mutes_regardless_of_eq() {
        let mut chain = DspChain::new(44_100, 0);
        let frame = chain.process_frame(10_000, -10_000);
        assert_eq!(frame, [0, 0]);
    }

    #[test]
    fn non_flat_gains_disable_the_identity_fast_path() {
        let mut chain = DspChain::new(44_100, 100);
        assert!(chain.is_flat());
        chain.set_gains(EqGains {
            bass_db: 6.0,
            bands_db: [0.0; 5],
        });
        assert!(!chain.is_flat());
    }

    #[test]
    fn widener_identity_at_width_one() {
        let w = Widener::new(1.0);
        assert_eq!(w.apply(100.0, -100.0), (100.0, -100.0));
    }

    #[test]
    fn widener_zero_width_collapses_to_mono() {
        let w = Widener::new(0.0);
        let (l, r) = w.apply(100.0, -100.0);
        assert_eq!(l, r);
    }

    #[test]
    fn process_buffer_handles_multiple_frames() {
        let mut chain = DspChain::new(44_100, 100);
        let mut samples = [1000i32, -1000, 2000, -2000];
        chain.process_buffer(&mut samples);
        assert_eq!(samples, [1000, -1000, 2000, -2000]);
    }
}
