//! Volume control mapping for the WM8758 codec's DAC digital volume
//! registers.
//!
//! The WM8758 uses an 8-bit digital volume field where:
//! - `0x00` = mute (minimum gain)
//! - `0xFF` = 0 dB reference (maximum gain)
//!
//! This is the opposite sense from an attenuation register: higher values
//! are louder here. [`VolumePercent`] and [`DacVolumeRegister`] are
//! compile-time-checked newtypes, the same pattern the teacher used for
//! its ES9038Q2M attenuation mapping, adapted to the WM8758's register
//! polarity.

/// Volume as a percentage, clamped to 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VolumePercent(u8);

impl VolumePercent {
    /// Create a `VolumePercent`, clamping values above 100 to 100.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Return the inner volume value (0–100).
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// WM8758 DAC digital volume register value (0x00 = mute, 0xFF = 0 dB).
///
/// Can only be constructed from a [`VolumePercent`], so the conversion
/// formula is applied consistently everywhere the codec's volume is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct DacVolumeRegister(u8);

impl DacVolumeRegister {
    /// Convert a [`VolumePercent`] to a WM8758 digital volume register
    /// value.
    ///
    /// - 100% volume → register 0xFF (0 dB reference)
    /// - 0% volume   → register 0x00 (mute)
    #[must_use]
    pub fn from_volume(vol: VolumePercent) -> Self {
        Self(audio_driver::Wm8758::percent_to_register(vol.get()))
    }

    /// Return the raw register value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Map a raw 0–100 volume percentage straight to the WM8758's digital
/// volume register value, clamping out-of-range input.
///
/// | `volume` | Register | Effect            |
/// |----------|----------|-------------------|
/// | 0%       | 0        | Mute              |
/// | 50%      | ~127     | ~50% loudness     |
/// | 100%     | 255      | 0 dB (full scale) |
#[must_use]
pub fn volume_to_dac_register(volume: u8) -> u8 {
    DacVolumeRegister::from_volume(VolumePercent::new(volume)).get()
}

/// Milliseconds the DAC register ramps over when [`Volume::set_target`]
/// moves the target, per the ~30 ms volume-ramp requirement.
const RAMP_MS: u32 = 30;

/// A DAC volume register that slews toward a target over [`RAMP_MS`]
/// instead of jumping, so a user-initiated volume change never produces
/// an audible step. Startup is the one exception — [`Volume::jump_to`]
/// sets the register directly, matching the "direct jump-to-target at
/// startup" rule; everything after that goes through [`Volume::set_target`]
/// and [`Volume::tick`].
///
/// `current`/`target` are tracked in Q8.8 fixed point (register value
/// shifted left 8) so the per-sample step can be smaller than one
/// register unit without drifting from repeated rounding.
#[derive(Debug, Clone, Copy)]
pub struct Volume {
    current_q8: i32,
    target_q8: i32,
    ramp_len_samples: u32,
    remaining_samples: u32,
    per_sample_step_q8: i32,
}

impl Volume {
    /// Construct a ramp already settled at `percent`, sized for a stream
    /// sampled at `sample_rate_hz`.
    #[must_use]
    pub fn new(percent: u8, sample_rate_hz: u32) -> Self {
        let register_q8 = Self::register_q8(percent);
        Self {
            current_q8: register_q8,
            target_q8: register_q8,
            ramp_len_samples: Self::ramp_len_samples(sample_rate_hz),
            remaining_samples: 0,
            per_sample_step_q8: 0,
        }
    }

    fn register_q8(percent: u8) -> i32 {
        i32::from(volume_to_dac_register(percent)) << 8
    }

    fn ramp_len_samples(sample_rate_hz: u32) -> u32 {
        (sample_rate_hz.saturating_mul(RAMP_MS) / 1000).max(1)
    }

    /// Recompute the ramp length for a new sample rate (e.g. a gapless
    /// rate-change swap). Does not disturb an in-flight ramp's target.
    pub fn set_sample_rate(&mut self, sample_rate_hz: u32) {
        self.ramp_len_samples = Self::ramp_len_samples(sample_rate_hz);
    }

    /// Jump directly to `percent` with no ramp.
    pub fn jump_to(&mut self, percent: u8) {
        let register_q8 = Self::register_q8(percent);
        self.current_q8 = register_q8;
        self.target_q8 = register_q8;
        self.remaining_samples = 0;
        self.per_sample_step_q8 = 0;
    }

    /// Set a new target; subsequent [`Self::tick`] calls slew toward it
    /// over [`RAMP_MS`].
    pub fn set_target(&mut self, percent: u8) {
        self.target_q8 = Self::register_q8(percent);
        let delta = self.target_q8.saturating_sub(self.current_q8);
        if delta == 0 {
            self.remaining_samples = 0;
            self.per_sample_step_q8 = 0;
            return;
        }
        self.remaining_samples = self.ramp_len_samples;
        let len = i32::try_from(self.ramp_len_samples).unwrap_or(1).max(1);
        let step = delta / len;
        self.per_sample_step_q8 = if step == 0 {
            if delta > 0 { 1 } else { -1 }
        } else {
            step
        };
    }

    /// Advance the ramp by one sample, returning the register value to
    /// apply for that sample. A no-op (beyond returning the settled
    /// value) once the target has been reached.
    pub fn tick(&mut self) -> u8 {
        if self.remaining_samples > 0 {
            self.current_q8 = self.current_q8.saturating_add(self.per_sample_step_q8);
            self.remaining_samples = self.remaining_samples.saturating_sub(1);
            let overshot = (self.per_sample_step_q8 > 0 && self.current_q8 >= self.target_q8)
                || (self.per_sample_step_q8 < 0 && self.current_q8 <= self.target_q8);
            if overshot || self.remaining_samples == 0 {
                self.current_q8 = self.target_q8;
                self.remaining_samples = 0;
            }
        }
        Self::q8_to_register(self.current_q8)
    }

    /// The register value for the current sample without advancing the
    /// ramp.
    #[must_use]
    pub fn current_register(&self) -> u8 {
        Self::q8_to_register(self.current_q8)
    }

    /// True while a ramp toward a new target is still in flight.
    #[must_use]
    pub fn is_ramping(&self) -> bool {
        self.remaining_samples > 0
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    // Clamped to 0..=255 before the cast, so truncation never loses range.
    fn q8_to_register(q8: i32) -> u8 {
        (q8 >> 8).clamp(0, 255) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_percent_mutes() {
        assert_eq!(volume_to_dac_register(0), 0);
    }

    #[test]
    fn full_percent_is_full_scale() {
        assert_eq!(volume_to_dac_register(100), 255);
    }

    #[test]
    fn above_100_clamps() {
        assert_eq!(volume_to_dac_register(150), volume_to_dac_register(100));
    }

    #[test]
    fn jump_to_is_immediate() {
        let mut vol = Volume::new(0, 44_100);
        vol.jump_to(100);
        assert_eq!(vol.current_register(), 255);
        assert!(!vol.is_ramping());
    }

    #[test]
    fn set_target_ramps_to_zero_within_30ms_and_never_overshoots() {
        let mut vol = Volume::new(100, 44_100);
        vol.set_target(0);
        assert!(vol.is_ramping());

        let ramp_samples = (44_100u32 * RAMP_MS) / 1000;
        let mut previous = vol.current_register();
        for _ in 0..ramp_samples {
            let next = vol.tick();
            assert!(next <= previous, "volume must decrease monotonically");
            previous = next;
        }
        assert_eq!(vol.current_register(), 0);
        assert!(!vol.is_ramping());
    }

    #[test]
    fn tick_after_settled_holds_target() {
        let mut vol = Volume::new(50, 44_100);
        vol.set_target(80);
        for _ in 0..100_000 {
            vol.tick();
        }
        assert_eq!(vol.current_register(), volume_to_dac_register(80));
    }
}
