//! Hardware Abstraction Layer for the PP5021C target.
//!
//! This crate provides a single, synchronous capability surface covering
//! every peripheral the firmware touches. There is no async executor on
//! this target: every method here either completes immediately or
//! busy-waits bounded by an explicit timeout, returning
//! [`HalError::Timeout`] if the bound is exceeded.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: boot stub, main loop)
//!         ↓
//! Feature Layers (bootloader, storage, playback, audio-driver)
//!         ↓
//! Hardware Abstraction (this crate — the Hal trait)
//!         ↓
//! Silicon (PP5021C MMIO) or Mock (host tests)
//! ```
//!
//! Two implementations of [`Hal`] exist: [`mock::MockHal`] for host tests
//! and a silicon backend (gated behind the `hardware` feature, built only
//! for the `armv4t-none-eabi` target) that performs raw MMIO against the
//! addresses in [`regs`].
//!
//! # Features
//!
//! - `hardware`: compile the silicon MMIO backend.
//! - `defmt`: enable `defmt::Format` on HAL types.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod clickwheel;
pub mod config;
pub mod error;
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod lcd;
pub mod mock;
pub mod regs;
pub mod storage_device;

#[cfg(feature = "hardware")]
pub use hardware::Pp5021cHal;
pub use clickwheel::{ClickwheelReading, WheelButton};
pub use error::HalError;
pub use gpio::{GpioDirection, PinId};
pub use lcd::LcdInfo;
pub use storage_device::{AtaIdentify, SectorAddress};

/// A monotonic tick counter in microseconds since power-on.
///
/// Wraps at `u32::MAX` (~71.5 minutes); callers computing elapsed time must
/// use wrapping subtraction, as the main loop does for frame timing.
pub type Ticks = u32;

/// Single capability surface for every peripheral on the board.
///
/// Implementations MUST NOT block indefinitely: every method is either
/// O(1) register access or a busy-wait bounded by an internally tracked
/// timeout, returning [`HalError::Timeout`] if hardware never signals
/// readiness. This makes the capability surface safe to call from the
/// main loop without risking a watchdog reset from an unbounded stall.
pub trait Hal {
    // ---- system -------------------------------------------------------
    /// One-time system bring-up: clocks, SDRAM controller, IRAM carve-out.
    /// Must be called exactly once, before any other capability.
    fn system_init(&mut self) -> Result<(), HalError>;
    /// Busy-wait for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);
    /// Busy-wait for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
    /// Read the free-running microsecond tick counter.
    fn get_ticks_us(&self) -> Ticks;
    /// Enter the lowest-power wait state until the next interrupt.
    fn sleep(&mut self);
    /// Request a full system reset. Does not return on real hardware.
    fn reset(&mut self) -> !;

    // ---- GPIO -----------------------------------------------------------
    /// Configure a pin's direction.
    fn gpio_set_direction(&mut self, pin: PinId, dir: GpioDirection) -> Result<(), HalError>;
    /// Read a pin's logic level.
    fn gpio_read(&self, pin: PinId) -> Result<bool, HalError>;
    /// Drive a pin's logic level. No-op (returns `InvalidParameter`) on an
    /// input-configured pin.
    fn gpio_write(&mut self, pin: PinId, level: bool) -> Result<(), HalError>;
    /// Arm an edge-triggered interrupt on a pin. Unused by the click-wheel
    /// driver (which is poll-based per the concurrency model) but required
    /// by the power-button wake source.
    fn gpio_set_interrupt(&mut self, pin: PinId, enabled: bool) -> Result<(), HalError>;

    // ---- I2C --------------------------------------------------------------
    /// Initialize an I2C bus at the given clock frequency (Hz).
    fn i2c_init(&mut self, bus: u8, freq_hz: u32) -> Result<(), HalError>;
    /// Write `data` to the 7-bit address `addr` on `bus`.
    fn i2c_write(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), HalError>;
    /// Read `buf.len()` bytes from `addr` on `bus`.
    fn i2c_read(&mut self, bus: u8, addr: u8, buf: &mut [u8]) -> Result<(), HalError>;
    /// Write `data` then read into `buf` with a repeated start condition.
    fn i2c_write_read(
        &mut self,
        bus: u8,
        addr: u8,
        data: &[u8],
        buf: &mut [u8],
    ) -> Result<(), HalError>;

    // ---- I2S / audio FIFO ---------------------------------------------
    /// Configure the I2S peripheral for 16-bit stereo at `sample_rate_hz`.
    fn i2s_init(&mut self, sample_rate_hz: u32) -> Result<(), HalError>;
    /// Enable or disable the I2S transmit path.
    fn i2s_enable(&mut self, enabled: bool) -> Result<(), HalError>;
    /// Write interleaved 16-bit stereo samples into the TX FIFO, returning
    /// the number of samples actually accepted.
    fn i2s_write(&mut self, samples: &[i16]) -> Result<usize, HalError>;
    /// True if the TX FIFO has room below its empty threshold.
    fn i2s_tx_ready(&self) -> bool;
    /// Number of free stereo-sample slots in the TX FIFO.
    fn i2s_tx_free_slots(&self) -> usize;

    // ---- ATA / IDE block device ----------------------------------------
    /// Reset and IDENTIFY the attached ATA device.
    fn ata_init(&mut self) -> Result<AtaIdentify, HalError>;
    /// Read `buf.len() / 512` contiguous 512-byte sectors starting at `lba`.
    fn ata_read_sectors(&mut self, lba: SectorAddress, buf: &mut [u8]) -> Result<(), HalError>;
    /// Write `buf.len() / 512` contiguous 512-byte sectors starting at `lba`.
    fn ata_write_sectors(&mut self, lba: SectorAddress, buf: &[u8]) -> Result<(), HalError>;
    /// Flush the device's write cache.
    fn ata_flush(&mut self) -> Result<(), HalError>;
    /// Spin the disk down to its lowest-power standby state.
    fn ata_standby(&mut self) -> Result<(), HalError>;

    // ---- LCD / BCM2722 ---------------------------------------------------
    /// Bring up the LCD controller and backlight driver.
    fn lcd_init(&mut self) -> Result<LcdInfo, HalError>;
    /// Write a single RGB565 pixel at `(x, y)`.
    fn lcd_write_pixel(&mut self, x: u16, y: u16, rgb565: u16) -> Result<(), HalError>;
    /// Fill a rectangular region with a solid color.
    fn lcd_fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, rgb565: u16)
        -> Result<(), HalError>;
    /// Push the full framebuffer to the panel.
    fn lcd_update(&mut self, framebuffer: &[u16]) -> Result<(), HalError>;
    /// Push a sub-rectangle of the framebuffer to the panel.
    fn lcd_update_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        framebuffer: &[u16],
    ) -> Result<(), HalError>;
    /// Set backlight brightness, 0 (off) to 100 (full).
    fn lcd_backlight(&mut self, percent: u8) -> Result<(), HalError>;
    /// Put the LCD panel into its low-power sleep state.
    fn lcd_sleep(&mut self) -> Result<(), HalError>;
    /// Wake the LCD panel from sleep.
    fn lcd_wake(&mut self) -> Result<(), HalError>;

    // ---- Click-wheel -----------------------------------------------------
    /// Bring up the click-wheel controller (sends the magic configuration
    /// words documented in the external-interfaces register map).
    fn wheel_init(&mut self) -> Result<(), HalError>;
    /// Poll the wheel status register; returns `None` if no new packet is
    /// ready (status bit 26 clear or validation byte mismatched).
    fn wheel_poll(&mut self) -> Result<Option<ClickwheelReading>, HalError>;

    // ---- DMA --------------------------------------------------------------
    /// Configure DMA channel `channel` for a RAM→FIFO transfer of
    /// `len_bytes` from `src_addr`, request id `request_id`.
    fn dma_init(
        &mut self,
        channel: u8,
        request_id: u8,
        src_addr: u32,
        len_bytes: usize,
    ) -> Result<(), HalError>;
    /// Arm and start the configured transfer.
    fn dma_start(&mut self, channel: u8) -> Result<(), HalError>;
    /// True while the transfer is still in flight.
    fn dma_is_busy(&self, channel: u8) -> bool;
    /// Abort an in-flight transfer.
    fn dma_abort(&mut self, channel: u8) -> Result<(), HalError>;

    // ---- Power / PMU -------------------------------------------------------
    /// Battery state-of-charge, 0–100 percent.
    fn battery_percent(&self) -> u8;
    /// Raw battery terminal voltage in millivolts.
    fn battery_voltage_mv(&self) -> u32;
    /// True while external (USB/dock) power is present.
    fn is_charging(&self) -> bool;
    /// Select a CPU clock-scaling profile.
    fn set_cpu_profile(&mut self, profile: config::CpuProfile) -> Result<(), HalError>;

    // ---- Watchdog -----------------------------------------------------------
    /// Arm the watchdog for `timeout_ms`. Subsequent calls re-arm it.
    fn watchdog_init(&mut self, timeout_ms: u32) -> Result<(), HalError>;
    /// Kick the watchdog, postponing the reset deadline.
    fn watchdog_kick(&mut self);
}
