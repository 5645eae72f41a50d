//! The cooperative main loop.
//!
//! Single-threaded, no preemption, no scheduler: `app.update()` (UI state
//! and any disk reads it needs) runs first, then
//! `audio.refillDmaIfNeeded()` tops up the I²S FIFO, then the loop waits
//! out the remainder of the frame period. The watchdog is kicked exactly
//! once per iteration, after both steps have run, so a stall in either
//! one is what trips it. The DMA-completion IRQ and the click-wheel
//! sampling hardware are the only other actors; neither is driven from
//! here — the IRQ runs independently, and `app.update()` is expected to
//! poll the wheel itself as part of its own UI state.

use hal::Hal;

use crate::audio_engine::AudioEngine;
use crate::fault::{FaultInfo, FaultKind};
use crate::frame_limiter::FrameLimiter;
use crate::power::{BatteryLevel, PowerMonitor};

/// What the application-update step reports back about this frame, so
/// the frame limiter and the idle-drop rule agree on what "idle" means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// True if no click-wheel input was observed and nothing required a
    /// redraw this frame.
    pub ui_idle: bool,
}

/// Owns the audio engine, the power monitor, and the frame limiter, and
/// drives one iteration of the cooperative loop at a time.
pub struct MainLoop<const RING_N: usize> {
    /// The playback/ring-buffer/FIFO-refill stack.
    pub audio: AudioEngine<RING_N>,
    /// Battery-threshold and CPU-profile arbitration.
    pub power: PowerMonitor,
    frame_limiter: FrameLimiter,
}

impl<const RING_N: usize> MainLoop<RING_N> {
    /// Create a new main loop, anchoring the frame limiter at `now`.
    #[must_use]
    pub fn new(now: hal::Ticks) -> Self {
        Self {
            audio: AudioEngine::new(),
            power: PowerMonitor::new(),
            frame_limiter: FrameLimiter::new(now),
        }
    }

    /// Run one iteration: `app_update` (UI + disk reads), then the audio
    /// FIFO refill, then the battery check, then the frame wait. Returns
    /// `Err(FaultInfo)` on a fatal battery reading — the caller should
    /// invoke [`FaultInfo::halt`] with the same `hal`, which never
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `Err(FaultInfo)` with [`FaultKind::BatteryFatal`] when the
    /// battery reading is at or below the fatal threshold (5%).
    pub fn run_iteration<H, F>(&mut self, hal: &mut H, app_update: F) -> Result<(), FaultInfo>
    where
        H: Hal,
        F: FnOnce(&mut H) -> FrameReport,
    {
        let report = app_update(hal);

        let _ = self.audio.refill_dma_if_needed(hal);

        if let Ok(reading) = self.power.poll(hal) {
            if reading.level == BatteryLevel::Fatal {
                return Err(FaultInfo::without_context(FaultKind::BatteryFatal));
            }
        }

        let now = hal.get_ticks_us();
        let _ = self
            .power
            .apply_profile(hal, now, self.audio.reported_load_percent());

        hal.watchdog_kick();

        let idle = report.ui_idle && self.audio.state() != playback::engine::PlaybackState::Playing;
        self.frame_limiter.wait_for_next_frame(hal, idle);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn iteration_kicks_watchdog_once() {
        let mut mock = MockHal::new(0);
        let mut main_loop: MainLoop<64> = MainLoop::new(mock.get_ticks_us());
        main_loop
            .run_iteration(&mut mock, |_| FrameReport { ui_idle: true })
            .expect("normal battery should not fault");
        assert_eq!(mock.watchdog_kicks(), 1);
    }

    #[test]
    fn fatal_battery_returns_err() {
        let mut mock = MockHal::new(0);
        mock.set_battery(3, 3000, false);
        let mut main_loop: MainLoop<64> = MainLoop::new(mock.get_ticks_us());
        let result = main_loop.run_iteration(&mut mock, |_| FrameReport { ui_idle: true });
        assert_eq!(
            result,
            Err(FaultInfo::without_context(FaultKind::BatteryFatal))
        );
    }

    #[test]
    fn active_playback_counts_as_non_idle_even_when_ui_is_idle() {
        let mut mock = MockHal::new(0);
        let mut main_loop: MainLoop<64> = MainLoop::new(mock.get_ticks_us());
        main_loop.audio.play().expect("play should succeed");
        main_loop
            .run_iteration(&mut mock, |_| FrameReport { ui_idle: true })
            .expect("normal battery should not fault");
        // Non-idle frames reset the idle streak — verified indirectly via
        // the frame limiter still reporting the 60 Hz period.
        assert_eq!(main_loop.frame_limiter.period_us(), 1_000_000 / 60);
    }
}
