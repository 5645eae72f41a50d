//! ARM7TDMI exception vectors and banked CPU mode handling.
//!
//! The ARM7TDMI has no MMU and no Cortex-M-style exception frame: each of
//! its seven operating modes (`User`, `FIQ`, `IRQ`, `Supervisor`, `Abort`,
//! `Undefined`, `System`) banks its own `r13` (SP) and `r14` (LR), and all
//! modes except `User`/`System` additionally bank a Saved Program Status
//! Register. Modelling "the current mode" as a class hierarchy (the way a
//! Cortex-M HAL might model NVIC exception priority) would be wrong here —
//! there is no is-a relationship between modes, only a closed set of seven
//! mutually exclusive register banks selected by the low 5 bits of CPSR.
//! [`CpuMode`] is therefore a plain tagged enum, decoded from the mode
//! bits rather than inferred from control flow.
//!
//! # Vector table
//!
//! The PP5021C maps the standard ARM exception vector table at address
//! 0x0000_0000 (mirrored from IRAM after boot). Each entry holds a branch
//! instruction to the corresponding handler:
//!
//! | Offset | Vector              | Mode entered  |
//! |--------|---------------------|---------------|
//! | 0x00   | Reset               | Supervisor    |
//! | 0x04   | Undefined Instr.    | Undefined     |
//! | 0x08   | Software Interrupt  | Supervisor    |
//! | 0x0C   | Prefetch Abort      | Abort         |
//! | 0x10   | Data Abort          | Abort         |
//! | 0x14   | (reserved)          | —             |
//! | 0x18   | IRQ                 | IRQ           |
//! | 0x1C   | FIQ                 | FIQ           |
//!
//! Only the Data Abort and IRQ handlers are wired here: Undefined
//! Instruction falls through to the same [`crate::fault::FaultInfo`]
//! red-screen path, and FIQ is left unconfigured — the audio
//! DMA-completion source is wired as a regular IRQ, not FIQ.
//!
//! # Hardware-only handlers
//!
//! The handlers themselves require inline ARM assembly to save banked
//! registers and live in [`hardware`], gated behind `#[cfg(feature =
//! "hardware")]`. The decode/classify logic they call into is plain Rust
//! so it is host-testable without an ARM toolchain.

use crate::fault::{FaultInfo, FaultKind};

/// Marker constant confirmed by architecture tests: this module and its
/// Data Abort / IRQ handlers exist.
pub const EXCEPTION_HANDLERS_DEFINED: bool = true;

/// The seven ARM7TDMI operating modes, tagged by their CPSR mode bits
/// (`CPSR[4:0]`). Each variant owns exactly the register bank that mode
/// has access to — there is no shared banked-register base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuMode {
    /// Normal unprivileged execution — the decoded application (`0b10000`).
    User,
    /// Fast interrupt — highest priority, extra banked registers (`0b10001`).
    Fiq,
    /// Normal interrupt — the DMA-completion and click-wheel-poll source (`0b10010`).
    Irq,
    /// Entered on reset and `SWI` (`0b10011`).
    Supervisor,
    /// Entered on a failed memory access (`0b10111`).
    Abort,
    /// Entered on an undecodable instruction (`0b11011`).
    Undefined,
    /// Privileged mode sharing `User`'s register bank (`0b11111`).
    System,
}

impl CpuMode {
    /// Decode a mode from the low 5 bits of a CPSR/SPSR value.
    ///
    /// Returns `None` for the two reserved encodings ARM does not define.
    #[must_use]
    pub const fn from_cpsr_bits(bits: u32) -> Option<Self> {
        match bits & 0b1_1111 {
            0b10000 => Some(Self::User),
            0b10001 => Some(Self::Fiq),
            0b10010 => Some(Self::Irq),
            0b10011 => Some(Self::Supervisor),
            0b10111 => Some(Self::Abort),
            0b11011 => Some(Self::Undefined),
            0b11111 => Some(Self::System),
            _ => None,
        }
    }

    /// True if this mode banks its own Saved Program Status Register.
    /// `User` and `System` share the same register bank and have no SPSR.
    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }
}

/// Which interrupt source the IRQ handler observed.
///
/// The handler is the only actor besides the main loop and the mutually
/// exclusive fault handlers; it must touch nothing beyond the active
/// DMA-buffer index, the refill flag, and the DMA channel's own
/// configuration registers — never FAT, decoders, or the LCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqSource {
    /// The active I2S DMA half-buffer finished transferring.
    AudioDmaComplete,
    /// An unrecognised IRQ fired (stale/unconfigured source).
    Unknown,
}

/// Classify the dispatch-register value the IRQ handler reads on entry.
///
/// `dma_request_id` mirrors [`hal::regs::DMA_REQUEST_I2S`] for audio;
/// anything else is reported as [`IrqSource::Unknown`] so the handler can
/// clear and ignore it without touching the audio engine's state.
#[must_use]
pub const fn classify_irq(dma_request_id: u8) -> IrqSource {
    if dma_request_id == hal::regs::DMA_REQUEST_I2S {
        IrqSource::AudioDmaComplete
    } else {
        IrqSource::Unknown
    }
}

/// DMA channel index the I²S audio feed is wired to.
pub const AUDIO_I2S_DMA_CHANNEL: u8 = 0;

/// Shared state between the DMA-completion IRQ and the main loop's audio
/// refill code: which half-buffer is active, whether a refill is due, and
/// the two half-buffer addresses to re-arm against.
///
/// Plain `core::sync::atomic` cells, not a `critical_section::Mutex` —
/// the IRQ handler and the main loop never run concurrently on this
/// single-core, cooperatively-scheduled target (the IRQ always runs to
/// completion before the interrupted main-loop instruction resumes), so
/// there is no actual race to order against. Atomics are used only so the
/// fields can live in a `static` without `unsafe` interior mutability.
/// `Ordering::Relaxed` is correct everywhere below for the same reason.
pub struct DmaIrqState {
    active_half: core::sync::atomic::AtomicU8,
    refill_needed: core::sync::atomic::AtomicBool,
    buffer_addrs: [core::sync::atomic::AtomicU32; 2],
    half_len_bytes: core::sync::atomic::AtomicU32,
}

impl DmaIrqState {
    /// A fresh state: half 0 active, no refill pending, zeroed addresses.
    /// Call [`Self::configure`] before starting DMA.
    const fn new() -> Self {
        Self {
            active_half: core::sync::atomic::AtomicU8::new(0),
            refill_needed: core::sync::atomic::AtomicBool::new(false),
            buffer_addrs: [
                core::sync::atomic::AtomicU32::new(0),
                core::sync::atomic::AtomicU32::new(0),
            ],
            half_len_bytes: core::sync::atomic::AtomicU32::new(0),
        }
    }

    /// Record the two half-buffer addresses and each half's length, ahead
    /// of starting DMA. Resets to half 0 active, no refill pending.
    pub fn configure(&self, buf0_addr: u32, buf1_addr: u32, half_len_bytes: u32) {
        use core::sync::atomic::Ordering::Relaxed;
        self.buffer_addrs[0].store(buf0_addr, Relaxed);
        self.buffer_addrs[1].store(buf1_addr, Relaxed);
        self.half_len_bytes.store(half_len_bytes, Relaxed);
        self.active_half.store(0, Relaxed);
        self.refill_needed.store(false, Relaxed);
    }

    /// Which half-buffer index the DMA controller is currently reading
    /// from (the main loop must refill the *other* half).
    #[must_use]
    pub fn active_half(&self) -> u8 {
        self.active_half.load(core::sync::atomic::Ordering::Relaxed)
    }

    /// Consume the refill-needed flag, returning its previous value. The
    /// main loop calls this once per iteration; a `true` result means a
    /// half-buffer just went active and the other half needs filling.
    pub fn take_refill_needed(&self) -> bool {
        self.refill_needed.swap(false, core::sync::atomic::Ordering::Relaxed)
    }

    /// Called from the IRQ handler when the active half finishes
    /// transferring: flips which half is active, flags a refill, and
    /// returns `(next_addr, len_bytes)` for the caller to re-arm DMA with.
    pub(crate) fn on_dma_complete(&self) -> (u32, u32) {
        use core::sync::atomic::Ordering::Relaxed;
        let next_half = if self.active_half.load(Relaxed) == 0 { 1 } else { 0 };
        self.active_half.store(next_half, Relaxed);
        self.refill_needed.store(true, Relaxed);
        let addr_index = usize::from(next_half);
        let next_addr = self
            .buffer_addrs
            .get(addr_index)
            .map_or(0, |cell| cell.load(Relaxed));
        (next_addr, self.half_len_bytes.load(Relaxed))
    }
}

/// Global DMA-completion state for the I²S audio feed, shared between
/// [`hardware::irq_handler_rust`] and [`crate::audio_engine::AudioEngine`].
pub static AUDIO_DMA_IRQ_STATE: DmaIrqState = DmaIrqState::new();

/// Build the [`FaultInfo`] the red-error-screen handler receives from a
/// Data Abort, given the faulting instruction address and the mode the
/// fault was taken from.
#[must_use]
pub fn data_abort_fault(faulting_pc: u32, mode: CpuMode) -> FaultInfo {
    FaultInfo::new(FaultKind::DataAbort, faulting_pc, mode)
}

/// Build the [`FaultInfo`] for an Undefined Instruction trap.
#[must_use]
pub fn undefined_instruction_fault(faulting_pc: u32, mode: CpuMode) -> FaultInfo {
    FaultInfo::new(FaultKind::UndefinedInstruction, faulting_pc, mode)
}

/// Raw ARM7TDMI exception vector/handler plumbing (inline assembly, MMIO).
#[cfg(feature = "hardware")]
pub mod hardware {
    use core::arch::global_asm;

    // Entered in Abort mode with LR = faulting instruction address + 8
    // per the ARM7TDMI-S Technical Reference Manual §2.6. Saves r0-r3
    // (caller-save, clobbered by the handler call) and the adjusted LR,
    // then calls into Rust. There is no resumable recovery from a data
    // abort in this firmware, so the handler never returns.
    global_asm!(
        ".section .text.data_abort_vector",
        ".global data_abort_vector",
        "data_abort_vector:",
        "    sub lr, lr, #8",
        "    stmfd sp!, {{r0-r3, lr}}",
        "    bl data_abort_handler_rust",
        "    b .",
    );

    global_asm!(
        ".section .text.irq_vector",
        ".global irq_vector",
        "irq_vector:",
        "    sub lr, lr, #4",
        "    stmfd sp!, {{r0-r3, lr}}",
        "    bl irq_handler_rust",
        "    ldmfd sp!, {{r0-r3, lr}}",
        "    subs pc, lr, #0",
    );

    /// Called from `data_abort_vector` after banked state is saved. Never
    /// returns — the caller halts and waits for a button press to request
    /// a reset, per the red-error-screen contract.
    #[unsafe(no_mangle)]
    extern "C" fn data_abort_handler_rust() -> ! {
        loop {
            core::hint::spin_loop();
        }
    }

    /// Called from `irq_vector`. Reads the DMA dispatch register,
    /// classifies the source via [`super::classify_irq`], and if it is
    /// the audio DMA completion, toggles the refill flag the main loop
    /// polls. Must complete in well under 50 microseconds.
    #[unsafe(no_mangle)]
    extern "C" fn irq_handler_rust() {
        let dma_request_id = hal::hardware::irq_read_dma_request_id(super::AUDIO_I2S_DMA_CHANNEL);
        if super::classify_irq(dma_request_id) != super::IrqSource::AudioDmaComplete {
            return;
        }
        let (next_addr, len_bytes) = super::AUDIO_DMA_IRQ_STATE.on_dma_complete();
        hal::hardware::irq_rearm_dma(
            super::AUDIO_I2S_DMA_CHANNEL,
            hal::regs::DMA_REQUEST_I2S,
            next_addr,
            len_bytes,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_seven_modes() {
        assert_eq!(CpuMode::from_cpsr_bits(0b10000), Some(CpuMode::User));
        assert_eq!(CpuMode::from_cpsr_bits(0b10001), Some(CpuMode::Fiq));
        assert_eq!(CpuMode::from_cpsr_bits(0b10010), Some(CpuMode::Irq));
        assert_eq!(CpuMode::from_cpsr_bits(0b10011), Some(CpuMode::Supervisor));
        assert_eq!(CpuMode::from_cpsr_bits(0b10111), Some(CpuMode::Abort));
        assert_eq!(CpuMode::from_cpsr_bits(0b11011), Some(CpuMode::Undefined));
        assert_eq!(CpuMode::from_cpsr_bits(0b11111), Some(CpuMode::System));
    }

    #[test]
    fn reserved_mode_bits_decode_to_none() {
        assert_eq!(CpuMode::from_cpsr_bits(0b10100), None);
        assert_eq!(CpuMode::from_cpsr_bits(0b10101), None);
    }

    #[test]
    fn ignores_upper_cpsr_bits() {
        // Condition flags and control bits above bit 4 must not affect
        // mode decoding.
        assert_eq!(
            CpuMode::from_cpsr_bits(0xF000_0013),
            Some(CpuMode::Supervisor)
        );
    }

    #[test]
    fn user_and_system_have_no_spsr() {
        assert!(!CpuMode::User.has_spsr());
        assert!(!CpuMode::System.has_spsr());
        assert!(CpuMode::Irq.has_spsr());
        assert!(CpuMode::Abort.has_spsr());
    }

    #[test]
    fn classifies_audio_dma_irq() {
        assert_eq!(
            classify_irq(hal::regs::DMA_REQUEST_I2S),
            IrqSource::AudioDmaComplete
        );
        assert_eq!(classify_irq(99), IrqSource::Unknown);
    }

    #[test]
    fn data_abort_fault_carries_pc_and_mode() {
        let fault = data_abort_fault(0x4010_0000, CpuMode::Abort);
        assert_eq!(fault.kind, FaultKind::DataAbort);
        assert_eq!(fault.pc, 0x4010_0000);
        assert_eq!(fault.mode, CpuMode::Abort);
    }

    #[test]
    fn module_marker_is_true() {
        assert!(EXCEPTION_HANDLERS_DEFINED);
    }

    #[test]
    fn dma_irq_state_starts_on_half_zero_with_no_refill_due() {
        let state = DmaIrqState::new();
        state.configure(0x4200_0000, 0x4200_2000, 0x2000);
        assert_eq!(state.active_half(), 0);
        assert!(!state.take_refill_needed());
    }

    #[test]
    fn on_dma_complete_flips_half_and_flags_refill() {
        let state = DmaIrqState::new();
        state.configure(0x4200_0000, 0x4200_2000, 0x2000);
        let (next_addr, len) = state.on_dma_complete();
        assert_eq!(state.active_half(), 1);
        assert_eq!(next_addr, 0x4200_2000);
        assert_eq!(len, 0x2000);
        assert!(state.take_refill_needed());
        // Consuming the flag clears it until the next completion.
        assert!(!state.take_refill_needed());
    }

    #[test]
    fn on_dma_complete_alternates_halves_across_calls() {
        let state = DmaIrqState::new();
        state.configure(0x4200_0000, 0x4200_2000, 0x2000);
        let (first_addr, _) = state.on_dma_complete();
        let (second_addr, _) = state.on_dma_complete();
        assert_eq!(first_addr, 0x4200_2000);
        assert_eq!(second_addr, 0x4200_0000);
        assert_eq!(state.active_half(), 0);
    }
}
