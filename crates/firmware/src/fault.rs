//! Fatal-fault reporting: the red-error-screen contract.
//!
//! When the main loop, an exception handler, or the power-monitor detects
//! an unrecoverable condition (a Data Abort, an undefined instruction, or
//! a fatal battery level), it hands a [`FaultInfo`] to [`FaultInfo::halt`]
//! instead of attempting to continue. The handler draws a fixed-layout
//! red error screen, disables the watchdog kick, and waits for the user
//! to acknowledge (any button) before requesting a reset — there is no
//! automatic recovery path, since the state that caused the fault is not
//! trusted.
//!
//! Pixel drawing itself is not this module's concern: it only decides
//! *what* to report and *when* to halt, so the decision logic stays
//! host-testable without an LCD. The caller is responsible for rendering
//! [`FaultInfo`] via [`hal::Hal::lcd_fill_rect`]/[`hal::Hal::lcd_update`].

use crate::exception_handlers::CpuMode;
use hal::Hal;

/// What kind of fatal condition produced this [`FaultInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// A Data Abort exception (bad memory access).
    DataAbort,
    /// An Undefined Instruction trap.
    UndefinedInstruction,
    /// Battery dropped to or below the fatal threshold (5%).
    BatteryFatal,
    /// The watchdog fired without being kicked in time.
    WatchdogTimeout,
}

/// A captured fault, ready to be rendered and halted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultInfo {
    /// What triggered this fault.
    pub kind: FaultKind,
    /// Program counter at the time of the fault, or 0 if not applicable
    /// (e.g. [`FaultKind::BatteryFatal`]).
    pub pc: u32,
    /// CPU mode the fault was taken from, or [`CpuMode::Supervisor`] if
    /// not applicable.
    pub mode: CpuMode,
}

impl FaultInfo {
    /// Build a new fault record from an exception context.
    #[must_use]
    pub fn new(kind: FaultKind, pc: u32, mode: CpuMode) -> Self {
        Self { kind, pc, mode }
    }

    /// Build a fault record for a condition with no program-counter
    /// context (battery, watchdog).
    #[must_use]
    pub fn without_context(kind: FaultKind) -> Self {
        Self {
            kind,
            pc: 0,
            mode: CpuMode::Supervisor,
        }
    }

    /// The short label drawn at the top of the red error screen.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self.kind {
            FaultKind::DataAbort => "DATA ABORT",
            FaultKind::UndefinedInstruction => "UNDEFINED INSTRUCTION",
            FaultKind::BatteryFatal => "BATTERY CRITICAL",
            FaultKind::WatchdogTimeout => "WATCHDOG TIMEOUT",
        }
    }

    /// Render the red error screen and block until any click-wheel
    /// button is pressed, then request a reset.
    ///
    /// Never returns: on real hardware [`hal::Hal::reset`] does not
    /// return either, so this function's `!` return type is honest in
    /// both the hardware and mock backends (the mock's `reset` panics,
    /// which is the correct behavior for a host test asserting this
    /// path was reached).
    pub fn halt<H: Hal>(&self, hal: &mut H) -> ! {
        const RED_RGB565: u16 = 0xF800;
        let _ = hal.lcd_fill_rect(0, 0, 320, 240, RED_RGB565);

        loop {
            if let Ok(Some(reading)) = hal.wheel_poll() {
                if !reading.buttons().is_empty() {
                    break;
                }
            }
            hal.delay_ms(50);
        }
        hal.reset()
    }
}
