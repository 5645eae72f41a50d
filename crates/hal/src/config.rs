//! Build-time naming/version constants and the CPU clock-scaling profile.

/// Firmware product name.
pub const APP_NAME: &str = "ZigPod";
/// Short form used in constrained-width UI contexts.
pub const APP_NAME_SHORT: &str = "ZPod";
/// Firmware version string, taken from the crate version at build time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CPU clock-scaling profile selectable via [`crate::Hal::set_cpu_profile`].
///
/// The PLL driver offers four profiles; a temporary boost request (with a
/// timeout, tracked above this crate in the power-management glue) can
/// momentarily override the active profile, and the audio engine's
/// reported load can trigger a dynamic downshift when idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuProfile {
    /// 80 MHz — both ARM7TDMI cores at full rate.
    Performance,
    /// 66 MHz — default during normal playback.
    Balanced,
    /// 48 MHz — reduced rate while idle or on battery.
    Powersave,
    /// 24 MHz — deepest non-sleep rate, screen off.
    Ultralow,
}

impl CpuProfile {
    /// Core clock frequency in Hz for this profile.
    #[must_use]
    pub const fn clock_hz(self) -> u32 {
        match self {
            Self::Performance => 80_000_000,
            Self::Balanced => 66_000_000,
            Self::Powersave => 48_000_000,
            Self::Ultralow => 24_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_are_ordered_by_clock_descending() {
        assert!(CpuProfile::Performance.clock_hz() > CpuProfile::Balanced.clock_hz());
        assert!(CpuProfile::Balanced.clock_hz() > CpuProfile::Powersave.clock_hz());
        assert!(CpuProfile::Powersave.clock_hz() > CpuProfile::Ultralow.clock_hz());
    }
}
