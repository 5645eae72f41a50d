//! The boot-stage state machine driven by the boot stub after the raw
//! reset handler (in `firmware`) hands off.

use crate::boot_config::FailureReason;
use crate::BootConfig;

/// A named boot stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStage {
    /// Mask ROM entry point, before the stub has run at all.
    BootRom,
    /// Exception vectors installed, stacks assigned, BSS zeroed, cache
    /// controller enabled.
    StubInit,
    /// Boot configuration record loaded (or defaulted).
    ConfigLoad,
    /// 200 ms click-wheel sample window for a button override.
    ButtonSample,
    /// Pre-boot hardware checks: battery, SDRAM walking-ones, ATA IDENTIFY.
    HwCheck,
    /// FAT32 mounted, firmware image header read and validated.
    ImageLoad,
    /// Body CRC32 verified.
    Verify,
    /// Body copied to `load_address`, watchdog armed, about to branch.
    Jump,
    /// Application running, has not yet signalled success.
    AppRunning,
    /// Application called the boot-success entry point.
    SuccessSignalled,
    /// Terminal state: fell back to recovery/Apple after repeated failure.
    Fallback,
}

/// The result of attempting a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage completed; proceed to the next one in sequence.
    Continue,
    /// The stage failed for `reason`. The caller should persist the
    /// failure reason and either retry from [`BootStage::BootRom`] (if
    /// `cfg.should_force_fallback()` is false after recording the
    /// attempt) or move to [`BootStage::Fallback`].
    Fail(FailureReason),
}

impl BootStage {
    /// Advance the state machine given the outcome of running the
    /// current stage. `cfg` must already reflect the attempt-start
    /// bookkeeping ([`BootConfig::record_attempt_start`]) for this boot.
    #[must_use]
    pub fn advance(self, outcome: StageOutcome, cfg: &BootConfig) -> Self {
        match outcome {
            StageOutcome::Continue => self.next_on_success(),
            StageOutcome::Fail(_) => {
                if cfg.should_force_fallback() {
                    Self::Fallback
                } else {
                    Self::BootRom
                }
            }
        }
    }

    fn next_on_success(self) -> Self {
        match self {
            Self::BootRom => Self::StubInit,
            Self::StubInit => Self::ConfigLoad,
            Self::ConfigLoad => Self::ButtonSample,
            Self::ButtonSample => Self::HwCheck,
            Self::HwCheck => Self::ImageLoad,
            Self::ImageLoad => Self::Verify,
            Self::Verify => Self::Jump,
            Self::Jump => Self::AppRunning,
            Self::AppRunning => Self::SuccessSignalled,
            Self::SuccessSignalled | Self::Fallback => self,
        }
    }

    /// True once the application is running but has not yet signalled
    /// success; the watchdog is armed in this state.
    #[must_use]
    pub fn is_watchdog_armed(self) -> bool {
        matches!(self, Self::Jump | Self::AppRunning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_success_signalled() {
        let cfg = BootConfig::defaults();
        let mut stage = BootStage::BootRom;
        for _ in 0..9 {
            stage = stage.advance(StageOutcome::Continue, &cfg);
        }
        assert_eq!(stage, BootStage::SuccessSignalled);
    }

    #[test]
    fn failure_below_threshold_restarts_at_boot_rom() {
        let mut cfg = BootConfig::defaults();
        cfg.record_attempt_start();
        assert!(!cfg.should_force_fallback());
        let stage = BootStage::HwCheck.advance(
            StageOutcome::Fail(FailureReason::HwCheck),
            &cfg,
        );
        assert_eq!(stage, BootStage::BootRom);
    }

    #[test]
    fn failure_at_threshold_forces_fallback() {
        let mut cfg = BootConfig::defaults();
        cfg.consecutive_failures = 2;
        cfg.record_attempt_start();
        assert!(cfg.should_force_fallback());
        let stage = BootStage::Verify.advance(
            StageOutcome::Fail(FailureReason::Validation),
            &cfg,
        );
        assert_eq!(stage, BootStage::Fallback);
    }

    #[test]
    fn watchdog_armed_only_after_jump() {
        assert!(!BootStage::ImageLoad.is_watchdog_armed());
        assert!(BootStage::Jump.is_watchdog_armed());
        assert!(BootStage::AppRunning.is_watchdog_armed());
        assert!(!BootStage::SuccessSignalled.is_watchdog_armed());
    }
}
