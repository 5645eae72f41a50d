//! Silicon backend: raw MMIO against the PP5021C register map in [`crate::regs`].
//!
//! Compiled only behind the `hardware` feature, for the `armv4t-none-eabi`
//! target. Every register access goes through [`read_reg32`]/[`write_reg32`]
//! (or the 8-bit variants for the ATA task file) so there is exactly one
//! place in the crate that performs a raw volatile MMIO access.

// Register-offset arithmetic below (base + offset, channel * stride) is
// all compile-time-bounded against the fixed register map in `regs` —
// exempted as a module rather than annotated call-by-call.
#![allow(clippy::arithmetic_side_effects)]

use crate::clickwheel::ClickwheelReading;
use crate::config::CpuProfile;
use crate::error::HalError;
use crate::gpio::{GpioDirection, PinId};
use crate::lcd::{self, LcdInfo};
use crate::regs;
use crate::storage_device::{AtaIdentify, SectorAddress};
use crate::{Hal, Ticks};

#[inline]
fn read_reg32(addr: u32) -> u32 {
    // SAFETY: `addr` is always one of the documented MMIO offsets in
    // `regs`, which fall within a mapped peripheral window for the
    // lifetime of the program.
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

#[inline]
fn write_reg32(addr: u32, value: u32) {
    // SAFETY: see `read_reg32`.
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

#[inline]
fn read_reg8(addr: u32) -> u8 {
    // SAFETY: see `read_reg32`.
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

#[inline]
fn write_reg8(addr: u32, value: u8) {
    // SAFETY: see `read_reg32`.
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

/// Microseconds to busy-wait for a bounded hardware condition before
/// giving up with [`HalError::Timeout`].
const BUSY_WAIT_TIMEOUT_US: u32 = 50_000;

/// The silicon [`Hal`] implementation: one instance per core, talking
/// directly to the PP5021C registers named in [`crate::regs`].
///
/// Battery readings are cached rather than re-read from the PMU on every
/// call, since [`Hal::battery_percent`] and friends take `&self` — a
/// background refresh (driven by [`crate::Hal::i2c_read`] against
/// [`regs::PCF50605_I2C_ADDR`]) is expected to update these fields
/// periodically; this struct only stores the most recent sample.
pub struct Pp5021cHal {
    battery_percent: u8,
    battery_voltage_mv: u32,
    charging: bool,
    dma_len_bytes: [usize; 4],
}

impl Pp5021cHal {
    /// Construct the backend. Touches no hardware until [`Hal::system_init`]
    /// is called.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            battery_percent: 0,
            battery_voltage_mv: 0,
            charging: false,
            dma_len_bytes: [0; 4],
        }
    }

    fn wait_until<F: Fn() -> bool>(&self, condition: F) -> Result<(), HalError> {
        let mut waited_us = 0u32;
        while !condition() {
            if waited_us >= BUSY_WAIT_TIMEOUT_US {
                return Err(HalError::Timeout);
            }
            self.delay_us_const(1);
            waited_us = waited_us.saturating_add(1);
        }
        Ok(())
    }

    /// A `&self`-compatible microsecond delay, for use inside
    /// `wait_until`'s busy loop.
    fn delay_us_const(&self, us: u32) {
        let start = read_reg32(regs::SYSTEM_BASE + regs::TIMER_USEC_OFFSET);
        loop {
            let now = read_reg32(regs::SYSTEM_BASE + regs::TIMER_USEC_OFFSET);
            if now.wrapping_sub(start) >= us {
                return;
            }
        }
    }

    fn ata_status(&self) -> u8 {
        read_reg8(regs::ATA_BASE + regs::ATA_COMMAND_OFFSET)
    }

    fn ata_wait_not_busy(&self) -> Result<(), HalError> {
        self.wait_until(|| self.ata_status() & regs::ATA_STATUS_BUSY_BIT == 0)
    }

    fn ata_wait_drq(&self) -> Result<(), HalError> {
        self.wait_until(|| self.ata_status() & regs::ATA_STATUS_DRQ_BIT != 0)
    }

    fn ata_set_lba(&mut self, lba: SectorAddress, sector_count: u8) {
        let addr = lba.0;
        write_reg8(regs::ATA_BASE + regs::ATA_SECCOUNT_OFFSET, sector_count);
        write_reg8(regs::ATA_BASE + regs::ATA_LBA_LOW_OFFSET, addr as u8);
        write_reg8(regs::ATA_BASE + regs::ATA_LBA_MID_OFFSET, (addr >> 8) as u8);
        write_reg8(regs::ATA_BASE + regs::ATA_LBA_HIGH_OFFSET, (addr >> 16) as u8);
        write_reg8(
            regs::ATA_BASE + regs::ATA_DEVICE_OFFSET,
            0xE0 | (((addr >> 24) & 0x0F) as u8),
        );
    }
}

impl Default for Pp5021cHal {
    fn default() -> Self {
        Self::new()
    }
}

impl Hal for Pp5021cHal {
    // ---- system ---------------------------------------------------------
    fn system_init(&mut self) -> Result<(), HalError> {
        write_reg32(regs::SYSTEM_BASE + regs::WATCHDOG_OFFSET, 0);
        write_reg32(
            regs::SYSTEM_BASE + regs::CPU_CLOCK_OFFSET,
            CpuProfile::Balanced.clock_hz(),
        );
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_us_const(us);
    }

    fn get_ticks_us(&self) -> Ticks {
        read_reg32(regs::SYSTEM_BASE + regs::TIMER_USEC_OFFSET)
    }

    fn sleep(&mut self) {
        write_reg32(regs::SYSTEM_BASE + regs::SLEEP_OFFSET, 1);
    }

    fn reset(&mut self) -> ! {
        write_reg32(regs::SYSTEM_BASE + regs::RESET_OFFSET, 1);
        loop {
            core::hint::spin_loop();
        }
    }

    // ---- GPIO -------------------------------------------------------------
    fn gpio_set_direction(&mut self, pin: PinId, dir: GpioDirection) -> Result<(), HalError> {
        let addr = regs::GPIO_BASE + regs::GPIO_DIR_OFFSET + pin.port_offset();
        let mut reg = read_reg32(addr);
        match dir {
            GpioDirection::Output => reg |= pin.mask(),
            GpioDirection::Input => reg &= !pin.mask(),
        }
        write_reg32(addr, reg);
        Ok(())
    }

    fn gpio_read(&self, pin: PinId) -> Result<bool, HalError> {
        let addr = regs::GPIO_BASE + regs::GPIO_INPUT_OFFSET + pin.port_offset();
        Ok(read_reg32(addr) & pin.mask() != 0)
    }

    fn gpio_write(&mut self, pin: PinId, level: bool) -> Result<(), HalError> {
        let dir_addr = regs::GPIO_BASE + regs::GPIO_DIR_OFFSET + pin.port_offset();
        if read_reg32(dir_addr) & pin.mask() == 0 {
            return Err(HalError::InvalidParameter);
        }
        let addr = regs::GPIO_BASE + regs::GPIO_OUTPUT_OFFSET + pin.port_offset();
        let mut reg = read_reg32(addr);
        if level {
            reg |= pin.mask();
        } else {
            reg &= !pin.mask();
        }
        write_reg32(addr, reg);
        Ok(())
    }

    fn gpio_set_interrupt(&mut self, pin: PinId, enabled: bool) -> Result<(), HalError> {
        let addr = regs::GPIO_BASE + regs::GPIO_INT_ENABLE_OFFSET + pin.port_offset();
        let mut reg = read_reg32(addr);
        if enabled {
            reg |= pin.mask();
        } else {
            reg &= !pin.mask();
        }
        write_reg32(addr, reg);
        Ok(())
    }

    // ---- I2C ----------------------------------------------------------------
    fn i2c_init(&mut self, bus: u8, freq_hz: u32) -> Result<(), HalError> {
        if freq_hz == 0 {
            return Err(HalError::InvalidParameter);
        }
        let base = regs::I2C_BASE + u32::from(bus) * 0x100;
        write_reg32(base + regs::I2C_CLOCK_DIV_OFFSET, freq_hz);
        Ok(())
    }

    fn i2c_write(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), HalError> {
        if data.len() > 4 {
            return Err(HalError::InvalidParameter);
        }
        let base = regs::I2C_BASE + u32::from(bus) * 0x100;
        write_reg32(base + regs::I2C_ADDR_OFFSET, u32::from(addr) << 1);
        for &byte in data {
            write_reg32(base + regs::I2C_DATA_OFFSET, u32::from(byte));
            write_reg32(base + regs::I2C_CONTROL_OFFSET, 1);
            self.wait_until(|| read_reg32(base + regs::I2C_STATUS_OFFSET) & regs::I2C_STATUS_BUSY_BIT == 0)?;
            if read_reg32(base + regs::I2C_STATUS_OFFSET) & regs::I2C_STATUS_ACK_BIT == 0 {
                return Err(HalError::Nack);
            }
        }
        Ok(())
    }

    fn i2c_read(&mut self, bus: u8, addr: u8, buf: &mut [u8]) -> Result<(), HalError> {
        if buf.len() > 4 {
            return Err(HalError::InvalidParameter);
        }
        let base = regs::I2C_BASE + u32::from(bus) * 0x100;
        write_reg32(base + regs::I2C_ADDR_OFFSET, (u32::from(addr) << 1) | 1);
        for slot in buf.iter_mut() {
            write_reg32(base + regs::I2C_CONTROL_OFFSET, 1);
            self.wait_until(|| read_reg32(base + regs::I2C_STATUS_OFFSET) & regs::I2C_STATUS_BUSY_BIT == 0)?;
            *slot = read_reg32(base + regs::I2C_DATA_OFFSET) as u8;
        }
        Ok(())
    }

    fn i2c_write_read(
        &mut self,
        bus: u8,
        addr: u8,
        data: &[u8],
        buf: &mut [u8],
    ) -> Result<(), HalError> {
        self.i2c_write(bus, addr, data)?;
        self.i2c_read(bus, addr, buf)
    }

    // ---- I2S / audio FIFO ---------------------------------------------
    fn i2s_init(&mut self, sample_rate_hz: u32) -> Result<(), HalError> {
        if sample_rate_hz == 0 {
            return Err(HalError::InvalidParameter);
        }
        write_reg32(regs::I2S_BASE + regs::IIS_CLOCK_OFFSET, sample_rate_hz);
        write_reg32(regs::I2S_BASE + regs::IIS_CONFIG_OFFSET, 0);
        Ok(())
    }

    fn i2s_enable(&mut self, enabled: bool) -> Result<(), HalError> {
        write_reg32(
            regs::I2S_BASE + regs::IIS_CONFIG_OFFSET,
            u32::from(enabled),
        );
        Ok(())
    }

    fn i2s_write(&mut self, samples: &[i16]) -> Result<usize, HalError> {
        let free = self.i2s_tx_free_slots();
        let count = free.min(samples.len());
        for &sample in samples.iter().take(count) {
            write_reg32(regs::I2S_BASE + regs::IIS_FIFO_OFFSET, sample as u16 as u32);
        }
        Ok(count)
    }

    fn i2s_tx_ready(&self) -> bool {
        self.i2s_tx_free_slots() > 0
    }

    fn i2s_tx_free_slots(&self) -> usize {
        let status = read_reg32(regs::I2S_BASE + regs::IIS_FIFO_STATUS_OFFSET);
        (status & 0xFF) as usize
    }

    // ---- ATA / IDE block device ----------------------------------------
    fn ata_init(&mut self) -> Result<AtaIdentify, HalError> {
        self.ata_wait_not_busy()?;
        write_reg8(
            regs::ATA_BASE + regs::ATA_COMMAND_OFFSET,
            regs::ATA_CMD_IDENTIFY,
        );
        self.ata_wait_drq()?;
        let mut words = [0u16; 256];
        for word in words.iter_mut() {
            let lo = read_reg8(regs::ATA_BASE + regs::ATA_DATA_OFFSET);
            let hi = read_reg8(regs::ATA_BASE + regs::ATA_DATA_OFFSET);
            *word = u16::from(lo) | (u16::from(hi) << 8);
        }
        let supports_lba48 = words.get(83).copied().unwrap_or(0) & (1 << 10) != 0;
        let total_sectors = if supports_lba48 {
            let lo = u64::from(words.get(100).copied().unwrap_or(0));
            let mid = u64::from(words.get(101).copied().unwrap_or(0));
            let hi = u64::from(words.get(102).copied().unwrap_or(0));
            lo | (mid << 16) | (hi << 32)
        } else {
            let lo = u64::from(words.get(60).copied().unwrap_or(0));
            let hi = u64::from(words.get(61).copied().unwrap_or(0));
            lo | (hi << 16)
        };
        Ok(AtaIdentify {
            total_sectors,
            supports_lba48,
        })
    }

    fn ata_read_sectors(&mut self, lba: SectorAddress, buf: &mut [u8]) -> Result<(), HalError> {
        let sector_count = buf.len() / SectorAddress::SECTOR_BYTES;
        if sector_count == 0 || sector_count > u8::MAX as usize {
            return Err(HalError::InvalidParameter);
        }
        self.ata_wait_not_busy()?;
        self.ata_set_lba(lba, sector_count as u8);
        write_reg8(
            regs::ATA_BASE + regs::ATA_COMMAND_OFFSET,
            regs::ATA_CMD_READ_SECTORS,
        );
        for sector in buf.chunks_mut(SectorAddress::SECTOR_BYTES) {
            self.ata_wait_drq()?;
            for byte in sector.iter_mut() {
                *byte = read_reg8(regs::ATA_BASE + regs::ATA_DATA_OFFSET);
            }
        }
        Ok(())
    }

    fn ata_write_sectors(&mut self, lba: SectorAddress, buf: &[u8]) -> Result<(), HalError> {
        let sector_count = buf.len() / SectorAddress::SECTOR_BYTES;
        if sector_count == 0 || sector_count > u8::MAX as usize {
            return Err(HalError::InvalidParameter);
        }
        self.ata_wait_not_busy()?;
        self.ata_set_lba(lba, sector_count as u8);
        write_reg8(
            regs::ATA_BASE + regs::ATA_COMMAND_OFFSET,
            regs::ATA_CMD_WRITE_SECTORS,
        );
        for sector in buf.chunks(SectorAddress::SECTOR_BYTES) {
            self.ata_wait_drq()?;
            for &byte in sector {
                write_reg8(regs::ATA_BASE + regs::ATA_DATA_OFFSET, byte);
            }
        }
        Ok(())
    }

    fn ata_flush(&mut self) -> Result<(), HalError> {
        self.ata_wait_not_busy()?;
        write_reg8(
            regs::ATA_BASE + regs::ATA_COMMAND_OFFSET,
            regs::ATA_CMD_FLUSH_CACHE,
        );
        self.ata_wait_not_busy()
    }

    fn ata_standby(&mut self) -> Result<(), HalError> {
        self.ata_wait_not_busy()?;
        write_reg8(
            regs::ATA_BASE + regs::ATA_COMMAND_OFFSET,
            regs::ATA_CMD_STANDBY_IMMEDIATE,
        );
        self.ata_wait_not_busy()
    }

    // ---- LCD / BCM2722 -----------------------------------------------------
    fn lcd_init(&mut self) -> Result<LcdInfo, HalError> {
        write_reg32(regs::LCD_BASE + regs::BCM_CONTROL, 1);
        Ok(LcdInfo::IPOD_CLASSIC)
    }

    fn lcd_write_pixel(&mut self, x: u16, y: u16, rgb565: u16) -> Result<(), HalError> {
        if x >= LcdInfo::IPOD_CLASSIC.width || y >= LcdInfo::IPOD_CLASSIC.height {
            return Err(HalError::InvalidParameter);
        }
        write_reg32(
            regs::LCD_BASE + regs::LCD_PARAM_ADDR,
            u32::from(rgb565),
        );
        write_reg32(
            regs::LCD_BASE + regs::LCD_CMD_ADDR,
            lcd::encode_command(lcd::LCD_UPDATE_CMD),
        );
        Ok(())
    }

    fn lcd_fill_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        rgb565: u16,
    ) -> Result<(), HalError> {
        if u32::from(x) + u32::from(w) > u32::from(LcdInfo::IPOD_CLASSIC.width)
            || u32::from(y) + u32::from(h) > u32::from(LcdInfo::IPOD_CLASSIC.height)
        {
            return Err(HalError::InvalidParameter);
        }
        for _ in 0..(u32::from(w) * u32::from(h)) {
            write_reg32(regs::LCD_BASE + regs::LCD_PARAM_ADDR, u32::from(rgb565));
        }
        write_reg32(
            regs::LCD_BASE + regs::LCD_CMD_ADDR,
            lcd::encode_command(lcd::LCD_UPDATE_CMD),
        );
        Ok(())
    }

    fn lcd_update(&mut self, framebuffer: &[u16]) -> Result<(), HalError> {
        if framebuffer.len() != LcdInfo::IPOD_CLASSIC.pixel_count() {
            return Err(HalError::InvalidParameter);
        }
        for &pixel in framebuffer {
            write_reg32(regs::LCD_BASE + regs::LCD_PARAM_ADDR, u32::from(pixel));
        }
        write_reg32(
            regs::LCD_BASE + regs::LCD_CMD_ADDR,
            lcd::encode_command(lcd::LCD_UPDATE_CMD),
        );
        Ok(())
    }

    fn lcd_update_rect(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        framebuffer: &[u16],
    ) -> Result<(), HalError> {
        let expected = usize::from(w) * usize::from(h);
        if framebuffer.len() != expected {
            return Err(HalError::InvalidParameter);
        }
        let _ = (x, y);
        for &pixel in framebuffer {
            write_reg32(regs::LCD_BASE + regs::LCD_PARAM_ADDR, u32::from(pixel));
        }
        write_reg32(
            regs::LCD_BASE + regs::LCD_CMD_ADDR,
            lcd::encode_command(lcd::LCD_UPDATE_CMD),
        );
        Ok(())
    }

    fn lcd_backlight(&mut self, percent: u8) -> Result<(), HalError> {
        if percent > 100 {
            return Err(HalError::InvalidParameter);
        }
        write_reg32(regs::LCD_BASE + regs::BCM_CONTROL, u32::from(percent));
        Ok(())
    }

    fn lcd_sleep(&mut self) -> Result<(), HalError> {
        write_reg32(regs::LCD_BASE + regs::BCM_CONTROL, 0);
        Ok(())
    }

    fn lcd_wake(&mut self) -> Result<(), HalError> {
        write_reg32(regs::LCD_BASE + regs::BCM_CONTROL, 1);
        Ok(())
    }

    // ---- Click-wheel -----------------------------------------------------
    fn wheel_init(&mut self) -> Result<(), HalError> {
        write_reg32(
            regs::WHEEL_BASE + regs::WHEEL_CTRL_OFFSET,
            regs::WHEEL_MAGIC_1,
        );
        write_reg32(
            regs::WHEEL_BASE + regs::WHEEL_CTRL_OFFSET,
            regs::WHEEL_MAGIC_2,
        );
        Ok(())
    }

    fn wheel_poll(&mut self) -> Result<Option<ClickwheelReading>, HalError> {
        let status = read_reg32(regs::WHEEL_BASE + regs::WHEEL_STATUS_OFFSET);
        let data = read_reg32(regs::WHEEL_BASE + regs::WHEEL_DATA_OFFSET);
        Ok(ClickwheelReading::decode(status, data))
    }

    // ---- DMA --------------------------------------------------------------
    fn dma_init(
        &mut self,
        channel: u8,
        request_id: u8,
        src_addr: u32,
        len_bytes: usize,
    ) -> Result<(), HalError> {
        let Some(slot) = self.dma_len_bytes.get_mut(usize::from(channel)) else {
            return Err(HalError::InvalidParameter);
        };
        let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
        write_reg32(base + regs::DMA_SRC_ADDR_OFFSET, src_addr);
        write_reg32(base + regs::DMA_LEN_OFFSET, len_bytes as u32);
        write_reg32(base + regs::DMA_REQUEST_ID_OFFSET, u32::from(request_id));
        *slot = len_bytes;
        Ok(())
    }

    fn dma_start(&mut self, channel: u8) -> Result<(), HalError> {
        if usize::from(channel) >= self.dma_len_bytes.len() {
            return Err(HalError::InvalidParameter);
        }
        let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
        write_reg32(base + regs::DMA_CONTROL_OFFSET, regs::DMA_CONTROL_START_BIT);
        Ok(())
    }

    fn dma_is_busy(&self, channel: u8) -> bool {
        let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
        read_reg32(base + regs::DMA_STATUS_OFFSET) & regs::DMA_STATUS_BUSY_BIT != 0
    }

    fn dma_abort(&mut self, channel: u8) -> Result<(), HalError> {
        if usize::from(channel) >= self.dma_len_bytes.len() {
            return Err(HalError::InvalidParameter);
        }
        let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
        write_reg32(base + regs::DMA_CONTROL_OFFSET, regs::DMA_CONTROL_ABORT_BIT);
        Ok(())
    }

    // ---- Power / PMU -------------------------------------------------------
    fn battery_percent(&self) -> u8 {
        self.battery_percent
    }

    fn battery_voltage_mv(&self) -> u32 {
        self.battery_voltage_mv
    }

    fn is_charging(&self) -> bool {
        self.charging
    }

    fn set_cpu_profile(&mut self, profile: CpuProfile) -> Result<(), HalError> {
        write_reg32(regs::SYSTEM_BASE + regs::CPU_CLOCK_OFFSET, profile.clock_hz());
        Ok(())
    }

    // ---- Watchdog -----------------------------------------------------------
    fn watchdog_init(&mut self, timeout_ms: u32) -> Result<(), HalError> {
        write_reg32(regs::SYSTEM_BASE + regs::WATCHDOG_OFFSET, timeout_ms);
        Ok(())
    }

    fn watchdog_kick(&mut self) {
        write_reg32(regs::SYSTEM_BASE + regs::WATCHDOG_OFFSET, 0);
    }
}

// ---- IRQ-context DMA re-arm ------------------------------------------------
//
// The DMA-completion IRQ handler runs with no `&mut Pp5021cHal` in scope —
// interrupt entry is a bare `extern "C" fn`, not a method call. `dma_init`/
// `dma_start` above only use `&mut self` to update the `dma_len_bytes`
// bookkeeping array (channel-count bounds checking for callers, not
// anything the silicon needs back); the MMIO writes themselves address
// purely from `channel`. These free functions perform the same writes
// without that bookkeeping, so `irq_handler_rust` can re-arm the I²S DMA
// channel directly from interrupt context.

/// Re-arm a DMA channel from IRQ context: write source address, length,
/// and request ID, then set the start bit. Mirrors [`Pp5021cHal::dma_init`]
/// followed by [`Pp5021cHal::dma_start`], minus the `dma_len_bytes` cache
/// update (which exists only for `Hal` trait callers' bounds checking).
pub fn irq_rearm_dma(channel: u8, request_id: u8, src_addr: u32, len_bytes: u32) {
    let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
    write_reg32(base + regs::DMA_SRC_ADDR_OFFSET, src_addr);
    write_reg32(base + regs::DMA_LEN_OFFSET, len_bytes);
    write_reg32(base + regs::DMA_REQUEST_ID_OFFSET, u32::from(request_id));
    write_reg32(base + regs::DMA_CONTROL_OFFSET, regs::DMA_CONTROL_START_BIT);
}

/// Read back the request-ID register of a DMA channel, for classifying
/// which peripheral's transfer completed in the shared DMA IRQ handler.
#[must_use]
pub fn irq_read_dma_request_id(channel: u8) -> u8 {
    let base = regs::DMA_BASE + u32::from(channel) * regs::DMA_CHANNEL_STRIDE;
    // The request-ID register is an 8-bit field in a 32-bit-addressed word.
    #[allow(clippy::cast_possible_truncation)]
    {
        read_reg32(base + regs::DMA_REQUEST_ID_OFFSET) as u8
    }
}
