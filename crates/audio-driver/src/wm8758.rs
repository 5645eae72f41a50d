//! WM8758 stereo audio codec driver.
//!
//! Reference: Wolfson Microelectronics WM8758 datasheet. Registers are
//! 7-bit address + 9-bit data, sent as two bytes: `[addr << 1 |
//! (data >> 8), data & 0xFF]`.

use hal::Hal;

use crate::AudioDriverError;

const I2C_BUS: u8 = 0;

/// R0: Software reset — any write resets the whole device.
pub const REG_SOFTWARE_RESET: u8 = 0x00;
/// R1: Power Management 1 (bias, VMID, PLL).
pub const REG_POWER_MGMT_1: u8 = 0x01;
/// R2: Power Management 2 (output stages).
pub const REG_POWER_MGMT_2: u8 = 0x02;
/// R3: Power Management 3 (DAC, mixers).
pub const REG_POWER_MGMT_3: u8 = 0x03;
/// R4: Audio Interface (format, word length).
pub const REG_AUDIO_INTERFACE: u8 = 0x04;
/// R6: Clock Generation Control.
pub const REG_CLOCK_GEN: u8 = 0x06;
/// R10: DAC Control (mute, de-emphasis).
pub const REG_DAC_CONTROL: u8 = 0x0A;
/// R11: Left DAC digital volume.
pub const REG_DAC_VOL_LEFT: u8 = 0x0B;
/// R12: Right DAC digital volume.
pub const REG_DAC_VOL_RIGHT: u8 = 0x0C;
/// R45: Left Out Mixer (routes DAC into the left output).
pub const REG_LEFT_OUT_MIXER: u8 = 0x2D;
/// R46: Right Out Mixer (routes DAC into the right output).
pub const REG_RIGHT_OUT_MIXER: u8 = 0x2E;

/// PWRMGMT1 bits: VMID at 75k (bits 8:7 = 01), bias and buffer enabled.
const PWRMGMT1_BIAS_VMID_PLL: u16 = 0b0_1001_1001;
/// PWRMGMT2 bits: left/right output amps and DAC output enabled.
const PWRMGMT2_OUTPUTS: u16 = 0b0_0111_1000;
/// PWRMGMT3 bits: left/right DAC and output mixers enabled.
const PWRMGMT3_DAC_MIXER: u16 = 0b0_0001_1111;
/// Audio interface: I2S format, 16-bit words.
const AUDIO_INTERFACE_I2S_16BIT: u16 = 0b0_0001_0000;
/// Clock gen: master mode, MCLK divide for 44.1/48k family.
const CLOCK_GEN_MASTER: u16 = 0b0_0100_0000;
/// DAC control: soft-mute disabled (playing).
const DAC_CONTROL_UNMUTED: u16 = 0x000;
/// Out mixer: route DAC straight through at 0 dB.
const OUT_MIXER_DAC_ROUTE: u16 = 0b0_0000_0001;

/// Sample rates the codec's clock tables support (§203 of the hardware
/// reference). 44100 Hz is the playback-engine default.
pub const SUPPORTED_SAMPLE_RATES_HZ: [u32; 9] = [
    8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000,
];

/// WM8758 I2C address and bus speed.
pub const I2C_ADDR: u8 = hal::regs::WM8758_I2C_ADDR;
/// Bus speed the codec is initialized at.
pub const I2C_FREQ_HZ: u32 = hal::regs::WM8758_I2C_FREQ_HZ;

fn encode_write(reg: u8, data: u16) -> [u8; 2] {
    [(reg << 1) | ((data >> 8) as u8 & 0x01), (data & 0xFF) as u8]
}

/// Stateless register-sequence driver for the WM8758. Holds no hardware
/// state of its own — callers own the `Hal` instance.
pub struct Wm8758;

impl Wm8758 {
    fn write<H: Hal>(hal: &mut H, reg: u8, data: u16) -> Result<(), AudioDriverError> {
        hal.i2c_write(I2C_BUS, I2C_ADDR, &encode_write(reg, data))?;
        Ok(())
    }

    /// Run the full bring-up sequence: software reset, power-up in two
    /// stages with a settle delay, I2S format, master-mode clock,
    /// un-mute the DAC, and route it to both output mixers at 0 dB.
    ///
    /// # Errors
    ///
    /// Propagates any I2C write failure.
    pub fn init<H: Hal>(hal: &mut H) -> Result<(), AudioDriverError> {
        hal.i2c_init(I2C_BUS, I2C_FREQ_HZ)?;
        Self::write(hal, REG_SOFTWARE_RESET, 0)?;
        Self::write(hal, REG_POWER_MGMT_1, PWRMGMT1_BIAS_VMID_PLL)?;
        hal.delay_ms(5);
        Self::write(hal, REG_POWER_MGMT_2, PWRMGMT2_OUTPUTS)?;
        Self::write(hal, REG_POWER_MGMT_3, PWRMGMT3_DAC_MIXER)?;
        Self::write(hal, REG_AUDIO_INTERFACE, AUDIO_INTERFACE_I2S_16BIT)?;
        Self::write(hal, REG_CLOCK_GEN, CLOCK_GEN_MASTER)?;
        Self::write(hal, REG_DAC_CONTROL, DAC_CONTROL_UNMUTED)?;
        Self::write(hal, REG_LEFT_OUT_MIXER, OUT_MIXER_DAC_ROUTE)?;
        Self::write(hal, REG_RIGHT_OUT_MIXER, OUT_MIXER_DAC_ROUTE)?;
        Ok(())
    }

    /// Set the DAC digital volume (0 = mute, 255 = 0 dB reference),
    /// applied to both channels.
    ///
    /// # Errors
    ///
    /// Propagates any I2C write failure.
    pub fn set_volume<H: Hal>(hal: &mut H, volume: u8) -> Result<(), AudioDriverError> {
        Self::write(hal, REG_DAC_VOL_LEFT, u16::from(volume))?;
        Self::write(hal, REG_DAC_VOL_RIGHT, u16::from(volume))?;
        Ok(())
    }

    /// Map a 0–100 volume percentage to the codec's 0–255 digital
    /// volume field (user-scaled against the 0 dB reference).
    #[must_use]
    pub fn percent_to_register(percent: u8) -> u8 {
        let clamped = percent.min(100);
        ((u32::from(clamped) * 255) / 100) as u8
    }

    /// Reject a rate the codec's clock tables don't cover.
    ///
    /// # Errors
    ///
    /// [`AudioDriverError::UnsupportedSampleRate`] if `rate_hz` is not in
    /// [`SUPPORTED_SAMPLE_RATES_HZ`].
    pub fn validate_sample_rate(rate_hz: u32) -> Result<(), AudioDriverError> {
        if SUPPORTED_SAMPLE_RATES_HZ.contains(&rate_hz) {
            Ok(())
        } else {
            Err(AudioDriverError::UnsupportedSampleRate)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    fn reg_of(t: &hal::mock::I2cTransaction) -> Option<u8> {
        match t {
            hal::mock::I2cTransaction::Write { data, .. } => data.first().map(|b| b >> 1),
            hal::mock::I2cTransaction::WriteRead { .. } => None,
        }
    }

    #[test]
    fn init_writes_reset_then_power_and_route_registers() {
        let mut mock = MockHal::new(64 * 1024);
        Wm8758::init(&mut mock).unwrap();
        let log = mock.i2c_log();
        assert!(!log.is_empty());
        match &log[0] {
            hal::mock::I2cTransaction::Write { addr, data, .. } => {
                assert_eq!(*addr, I2C_ADDR);
                assert_eq!(data[0] >> 1, REG_SOFTWARE_RESET);
            }
            hal::mock::I2cTransaction::WriteRead { .. } => panic!("expected a write"),
        }
        assert!(log.iter().any(|t| reg_of(t) == Some(REG_LEFT_OUT_MIXER)));
        assert!(log.iter().any(|t| reg_of(t) == Some(REG_RIGHT_OUT_MIXER)));
    }

    #[test]
    fn percent_to_register_maps_endpoints() {
        assert_eq!(Wm8758::percent_to_register(0), 0);
        assert_eq!(Wm8758::percent_to_register(100), 255);
        assert_eq!(Wm8758::percent_to_register(200), 255);
    }

    #[test]
    fn validates_supported_rates() {
        assert!(Wm8758::validate_sample_rate(44_100).is_ok());
        assert!(Wm8758::validate_sample_rate(96_000).is_err());
    }

    #[test]
    fn encode_write_packs_9th_data_bit_into_register_byte() {
        let bytes = encode_write(0x01, 0x1FF);
        assert_eq!(bytes[0], (0x01 << 1) | 0x01);
        assert_eq!(bytes[1], 0xFF);
    }
}
