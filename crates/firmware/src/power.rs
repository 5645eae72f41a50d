//! Battery-threshold policy and CPU clock-profile arbitration.
//!
//! Wraps [`audio_driver::Pcf50605`] with the user-visible battery
//! thresholds (low/critical/fatal) and the CPU profile selection logic:
//! the audio engine's reported DSP load drives a dynamic downshift, and
//! the UI may request a temporary boost (e.g. during a disk seek) that
//! expires on its own after a timeout rather than requiring an explicit
//! release call — a caller that forgets to un-boost cannot wedge the
//! system into `Performance` forever.

use audio_driver::pcf50605::{BatteryState, Pcf50605};
use hal::config::CpuProfile;
use hal::{Hal, Ticks};

use crate::fault::{FaultInfo, FaultKind};

/// User-visible battery level, derived from [`BatteryState::percent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryLevel {
    /// Above the low-battery threshold; no warning shown.
    Normal,
    /// At or below 20% — the UI shows a low-battery warning.
    Low,
    /// At or below 10% — the UI shows a critical-battery warning.
    Critical,
    /// At or below 5% — fatal; the caller must halt.
    Fatal,
}

const LOW_THRESHOLD_PERCENT: u8 = 20;
const CRITICAL_THRESHOLD_PERCENT: u8 = 10;
const FATAL_THRESHOLD_PERCENT: u8 = 5;

/// Classify a battery percentage into a [`BatteryLevel`].
#[must_use]
pub const fn classify_percent(percent: u8) -> BatteryLevel {
    if percent <= FATAL_THRESHOLD_PERCENT {
        BatteryLevel::Fatal
    } else if percent <= CRITICAL_THRESHOLD_PERCENT {
        BatteryLevel::Critical
    } else if percent <= LOW_THRESHOLD_PERCENT {
        BatteryLevel::Low
    } else {
        BatteryLevel::Normal
    }
}

/// A sampled battery reading paired with its derived [`BatteryLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReading {
    /// The raw PMU sample.
    pub battery: BatteryState,
    /// The threshold bucket `battery.percent` falls into.
    pub level: BatteryLevel,
}

/// Polls the PMU, derives the battery level, and arbitrates the active
/// CPU clock profile between the audio engine's reported load and any
/// outstanding temporary boost request.
pub struct PowerMonitor {
    boost: Option<(Ticks, u32)>,
}

impl PowerMonitor {
    /// Create a monitor with no outstanding boost request.
    #[must_use]
    pub fn new() -> Self {
        Self { boost: None }
    }

    /// Sample the PMU and classify the reading.
    ///
    /// # Errors
    ///
    /// Propagates any I2C transaction failure from the underlying PMU read.
    pub fn poll<H: Hal>(&self, hal: &mut H) -> Result<PowerReading, audio_driver::AudioDriverError> {
        let battery = Pcf50605::read_battery(hal)?;
        Ok(PowerReading {
            level: classify_percent(battery.percent),
            battery,
        })
    }

    /// Request a temporary `Performance` boost lasting `duration_us` from
    /// `now`. A later call (e.g. a repeated seek) replaces any
    /// outstanding boost rather than stacking them.
    pub fn request_boost(&mut self, now: Ticks, duration_us: u32) {
        self.boost = Some((now, duration_us));
    }

    /// True if a boost requested at `now` is still within its duration.
    fn boost_active(&mut self, now: Ticks) -> bool {
        match self.boost {
            Some((started, duration_us)) if now.wrapping_sub(started) < duration_us => true,
            Some(_) => {
                self.boost = None;
                false
            }
            None => false,
        }
    }

    /// Select and apply the CPU profile for this frame: a live boost
    /// overrides the load-derived profile; otherwise the profile follows
    /// [`Pcf50605::profile_for_load`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying `Hal::set_cpu_profile` failure.
    pub fn apply_profile<H: Hal>(
        &mut self,
        hal: &mut H,
        now: Ticks,
        load_percent: u8,
    ) -> Result<(), audio_driver::AudioDriverError> {
        let profile = if self.boost_active(now) {
            CpuProfile::Performance
        } else {
            Pcf50605::profile_for_load(load_percent)
        };
        Pcf50605::set_cpu_profile(hal, profile)
    }

    /// Build the [`FaultInfo`] for a fatal battery reading, ready for
    /// [`FaultInfo::halt`].
    #[must_use]
    pub fn fatal_fault() -> FaultInfo {
        FaultInfo::without_context(FaultKind::BatteryFatal)
    }
}

impl Default for PowerMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn classifies_thresholds() {
        assert_eq!(classify_percent(100), BatteryLevel::Normal);
        assert_eq!(classify_percent(21), BatteryLevel::Normal);
        assert_eq!(classify_percent(20), BatteryLevel::Low);
        assert_eq!(classify_percent(10), BatteryLevel::Critical);
        assert_eq!(classify_percent(5), BatteryLevel::Fatal);
        assert_eq!(classify_percent(0), BatteryLevel::Fatal);
    }

    #[test]
    fn poll_classifies_mock_reading() {
        let mut mock = MockHal::new(0);
        mock.set_battery(8, 3450, false);
        let monitor = PowerMonitor::new();
        let reading = monitor.poll(&mut mock).expect("poll should succeed");
        assert_eq!(reading.level, BatteryLevel::Critical);
    }

    #[test]
    fn boost_overrides_load_profile_until_expiry() {
        let mut mock = MockHal::new(0);
        let mut monitor = PowerMonitor::new();
        monitor.request_boost(0, 1000);
        monitor
            .apply_profile(&mut mock, 500, 0)
            .expect("apply profile should succeed");
        // Load is 0 (would normally pick Ultralow) but the boost is active.
        assert_eq!(mock.cpu_profile(), CpuProfile::Performance);
    }

    #[test]
    fn profile_follows_load_once_boost_expires() {
        let mut mock = MockHal::new(0);
        let mut monitor = PowerMonitor::new();
        monitor.request_boost(0, 1000);
        monitor
            .apply_profile(&mut mock, 2000, 0)
            .expect("apply profile should succeed");
        assert_eq!(mock.cpu_profile(), CpuProfile::Ultralow);
    }
}
