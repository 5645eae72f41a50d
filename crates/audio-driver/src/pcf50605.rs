//! PCF50605 power management IC driver: battery monitoring, charging
//! state, and CPU clock-profile switching.

use hal::config::CpuProfile;
use hal::Hal;

use crate::AudioDriverError;

const I2C_BUS: u8 = 0;

/// PCF50605 I2C address.
pub const I2C_ADDR: u8 = hal::regs::PCF50605_I2C_ADDR;

/// R0: Battery voltage ADC result register.
pub const REG_BATTERY_VOLTAGE: u8 = 0x00;
/// R1: Charger status register.
pub const REG_CHARGER_STATUS: u8 = 0x01;
/// R2: Power source status register.
pub const REG_POWER_SOURCE: u8 = 0x02;

/// Charging status as reported by the charger status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargingState {
    /// No charge cycle in progress.
    NotCharging,
    /// Pre-charge (deeply discharged battery) in progress.
    PreCharge,
    /// Full-rate constant-current charging.
    Fast,
    /// Trickle/top-off charging near full.
    Trickle,
    /// Charge cycle completed.
    Complete,
    /// A charger fault was reported.
    Error,
}

impl ChargingState {
    fn from_byte(b: u8) -> Self {
        match b & 0x07 {
            0 => Self::NotCharging,
            1 => Self::PreCharge,
            2 => Self::Fast,
            3 => Self::Trickle,
            4 => Self::Complete,
            _ => Self::Error,
        }
    }
}

/// Which supply is currently powering the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSource {
    /// Running from the battery alone.
    Battery,
    /// A USB host is supplying power.
    Usb,
    /// A wall adapter is supplying power.
    Adapter,
}

impl PowerSource {
    fn from_byte(b: u8) -> Self {
        match b & 0x03 {
            1 => Self::Usb,
            2 => Self::Adapter,
            _ => Self::Battery,
        }
    }
}

/// A single sampled battery reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    /// Terminal voltage in millivolts.
    pub voltage_mv: u32,
    /// Charge percentage, 0–100, from the piecewise-linear Li-Ion curve.
    pub percent: u8,
    /// Current charging status.
    pub charging: ChargingState,
    /// Current power source.
    pub source: PowerSource,
}

/// Piecewise-linear Li-Ion discharge curve control points, `(mv, percent)`,
/// voltage descending.
const CURVE: [(u32, u8); 5] = [
    (4200, 100),
    (3900, 80),
    (3700, 50),
    (3400, 10),
    (3000, 0),
];

/// Interpolate battery percentage from terminal voltage using the
/// hardware reference's Li-Ion curve. Voltages above the highest
/// control point clamp to 100%; below the lowest clamp to 0%.
#[must_use]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
pub fn voltage_to_percent(mv: u32) -> u8 {
    if mv >= CURVE[0].0 {
        return CURVE[0].1;
    }
    let last = CURVE.len().saturating_sub(1);
    if let Some(&(lowest_mv, lowest_pct)) = CURVE.get(last) {
        if mv <= lowest_mv {
            return lowest_pct;
        }
    }
    for pair in CURVE.windows(2) {
        let (hi_mv, hi_pct) = pair[0];
        let (lo_mv, lo_pct) = pair[1];
        if mv <= hi_mv && mv >= lo_mv {
            let span_mv = hi_mv.saturating_sub(lo_mv).max(1);
            let span_pct = i32::from(hi_pct) - i32::from(lo_pct);
            let offset_mv = mv.saturating_sub(lo_mv);
            let interpolated =
                i32::from(lo_pct) + span_pct * offset_mv as i32 / span_mv as i32;
            return interpolated.clamp(0, 100) as u8;
        }
    }
    0
}

/// Stateless register-sequence driver for the PCF50605.
pub struct Pcf50605;

impl Pcf50605 {
    /// Sample the current battery/power state over I2C.
    ///
    /// # Errors
    ///
    /// Propagates any I2C transaction failure.
    pub fn read_battery<H: Hal>(hal: &mut H) -> Result<BatteryState, AudioDriverError> {
        let mut buf = [0u8; 1];
        hal.i2c_write_read(I2C_BUS, I2C_ADDR, &[REG_BATTERY_VOLTAGE], &mut buf)?;
        let voltage_mv = decode_battery_voltage_mv(buf[0]);

        let mut status = [0u8; 1];
        hal.i2c_write_read(I2C_BUS, I2C_ADDR, &[REG_CHARGER_STATUS], &mut status)?;
        let charging = ChargingState::from_byte(status[0]);

        let mut source = [0u8; 1];
        hal.i2c_write_read(I2C_BUS, I2C_ADDR, &[REG_POWER_SOURCE], &mut source)?;
        let source = PowerSource::from_byte(source[0]);

        Ok(BatteryState {
            voltage_mv,
            percent: voltage_to_percent(voltage_mv),
            charging,
            source,
        })
    }

    /// Switch the CPU clock-scaling profile.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `Hal::set_cpu_profile` failure.
    pub fn set_cpu_profile<H: Hal>(
        hal: &mut H,
        profile: CpuProfile,
    ) -> Result<(), AudioDriverError> {
        Ok(hal.set_cpu_profile(profile)?)
    }

    /// Downshift the CPU profile when reported engine load is low,
    /// upshift when it's high. `load_percent` is the playback engine's
    /// reported DSP load, 0–100.
    #[must_use]
    pub fn profile_for_load(load_percent: u8) -> CpuProfile {
        match load_percent {
            0..=20 => CpuProfile::Ultralow,
            21..=45 => CpuProfile::Powersave,
            46..=75 => CpuProfile::Balanced,
            _ => CpuProfile::Performance,
        }
    }
}

/// Decode a raw ADC byte to millivolts. Formula mirrors the BQ25895's
/// `decode_battery_voltage_mv`: linear ADC with a fixed offset, full
/// 8-bit range here (no status bit to mask).
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
const fn decode_battery_voltage_mv(raw_adc: u8) -> u32 {
    2800 + (raw_adc as u32) * 6
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn voltage_curve_matches_control_points() {
        assert_eq!(voltage_to_percent(4200), 100);
        assert_eq!(voltage_to_percent(3900), 80);
        assert_eq!(voltage_to_percent(3700), 50);
        assert_eq!(voltage_to_percent(3400), 10);
        assert_eq!(voltage_to_percent(3000), 0);
    }

    #[test]
    fn voltage_curve_interpolates_between_points() {
        let mid = voltage_to_percent(3800);
        assert!(mid > 50 && mid < 80, "got {mid}");
    }

    #[test]
    fn voltage_above_full_clamps_to_100() {
        assert_eq!(voltage_to_percent(4500), 100);
    }

    #[test]
    fn voltage_below_empty_clamps_to_0() {
        assert_eq!(voltage_to_percent(2500), 0);
    }

    #[test]
    fn read_battery_decodes_scripted_registers() {
        let mut mock = MockHal::new(0);
        // battery_voltage byte, charger_status byte, power_source byte
        mock.queue_i2c_read_bytes(&[100, 2, 1]);
        let state = Pcf50605::read_battery(&mut mock).unwrap();
        assert_eq!(state.charging, ChargingState::Fast);
        assert_eq!(state.source, PowerSource::Usb);
    }

    #[test]
    fn profile_for_load_downshifts_when_idle() {
        assert_eq!(Pcf50605::profile_for_load(5), CpuProfile::Ultralow);
        assert_eq!(Pcf50605::profile_for_load(90), CpuProfile::Performance);
    }
}
