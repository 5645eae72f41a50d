//! Host-test backend: records calls, answers from scripted/in-memory state.
//!
//! `MockHal` owns an in-memory byte vector standing in for the ATA disk, a
//! framebuffer, a queue of scripted click-wheel readings, and a log of
//! every I2C transaction — the same "record what happened, answer from a
//! script" shape the upstream HAL's mock audio/input/display backends use.

#![cfg(any(test, feature = "std"))]

extern crate std;

use crate::{
    clickwheel::ClickwheelReading, config::CpuProfile, error::HalError, gpio::GpioDirection,
    gpio::PinId, lcd::LcdInfo, storage_device::AtaIdentify, storage_device::SectorAddress, Hal,
    Ticks,
};
use std::vec;
use std::vec::Vec;

/// One recorded I2C transaction, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// A plain write.
    Write {
        /// Bus index.
        bus: u8,
        /// 7-bit device address.
        addr: u8,
        /// Bytes written.
        data: Vec<u8>,
    },
    /// A write-then-read with repeated start.
    WriteRead {
        /// Bus index.
        bus: u8,
        /// 7-bit device address.
        addr: u8,
        /// Bytes written before the repeated start.
        data: Vec<u8>,
    },
}

/// In-memory [`crate::Hal`] implementation for host tests.
pub struct MockHal {
    ticks_us: Ticks,
    disk: Vec<u8>,
    framebuffer: Vec<u16>,
    lcd_info: LcdInfo,
    backlight_percent: u8,
    wheel_queue: std::collections::VecDeque<(u32, u32)>,
    i2c_log: Vec<I2cTransaction>,
    i2c_read_script: std::collections::VecDeque<u8>,
    i2s_fifo_capacity: usize,
    i2s_fifo_used: usize,
    gpio_levels: [bool; 96],
    gpio_dirs: [Option<GpioDirection>; 96],
    battery_percent: u8,
    battery_mv: u32,
    charging: bool,
    cpu_profile: CpuProfile,
    watchdog_timeout_ms: Option<u32>,
    watchdog_kicks: u32,
    ata_identify: AtaIdentify,
}

impl MockHal {
    /// Create a mock with a `disk_bytes`-byte zeroed backing disk image and
    /// the standard iPod Classic LCD geometry.
    #[must_use]
    pub fn new(disk_bytes: usize) -> Self {
        let sectors = (disk_bytes / SectorAddress::SECTOR_BYTES) as u64;
        Self {
            ticks_us: 0,
            disk: vec![0u8; disk_bytes],
            framebuffer: vec![0u16; LcdInfo::IPOD_CLASSIC.pixel_count()],
            lcd_info: LcdInfo::IPOD_CLASSIC,
            backlight_percent: 0,
            wheel_queue: std::collections::VecDeque::new(),
            i2c_log: Vec::new(),
            i2c_read_script: std::collections::VecDeque::new(),
            i2s_fifo_capacity: 16,
            i2s_fifo_used: 0,
            gpio_levels: [false; 96],
            gpio_dirs: [None; 96],
            battery_percent: 100,
            battery_mv: 4200,
            charging: false,
            cpu_profile: CpuProfile::Balanced,
            watchdog_timeout_ms: None,
            watchdog_kicks: 0,
            ata_identify: AtaIdentify {
                total_sectors: sectors,
                supports_lba48: true,
            },
        }
    }

    /// Borrow the backing disk image, e.g. to seed an MBR + FAT32 layout.
    pub fn disk_mut(&mut self) -> &mut [u8] {
        &mut self.disk
    }

    /// Queue a raw `(status, data)` pair to be returned by the next
    /// [`crate::Hal::wheel_poll`] call.
    pub fn push_wheel_packet(&mut self, status: u32, data: u32) {
        self.wheel_queue.push_back((status, data));
    }

    /// Every I2C transaction recorded so far, in order.
    #[must_use]
    pub fn i2c_log(&self) -> &[I2cTransaction] {
        &self.i2c_log
    }

    /// Queue bytes to be returned by subsequent [`crate::Hal::i2c_read`] /
    /// `i2c_write_read` calls, one byte per queued entry.
    pub fn queue_i2c_read_bytes(&mut self, bytes: &[u8]) {
        self.i2c_read_script.extend(bytes.iter().copied());
    }

    /// Set the battery reading the mock reports.
    pub fn set_battery(&mut self, percent: u8, mv: u32, charging: bool) {
        self.battery_percent = percent;
        self.battery_mv = mv;
        self.charging = charging;
    }

    /// Number of times [`crate::Hal::watchdog_kick`] has been called.
    #[must_use]
    pub fn watchdog_kicks(&self) -> u32 {
        self.watchdog_kicks
    }

    /// The profile most recently set via [`crate::Hal::set_cpu_profile`].
    #[must_use]
    pub fn cpu_profile(&self) -> CpuProfile {
        self.cpu_profile
    }
}

impl Hal for MockHal {
    fn system_init(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.ticks_us = self.ticks_us.wrapping_add(us);
    }

    fn get_ticks_us(&self) -> Ticks {
        self.ticks_us
    }

    fn sleep(&mut self) {}

    fn reset(&mut self) -> ! {
        panic!("MockHal::reset called — host tests must not exercise this path");
    }

    fn gpio_set_direction(&mut self, pin: PinId, dir: GpioDirection) -> Result<(), HalError> {
        let idx = Self::gpio_index(pin).ok_or(HalError::InvalidParameter)?;
        self.gpio_dirs[idx] = Some(dir);
        Ok(())
    }

    fn gpio_read(&self, pin: PinId) -> Result<bool, HalError> {
        let idx = Self::gpio_index(pin).ok_or(HalError::InvalidParameter)?;
        Ok(self.gpio_levels[idx])
    }

    fn gpio_write(&mut self, pin: PinId, level: bool) -> Result<(), HalError> {
        let idx = Self::gpio_index(pin).ok_or(HalError::InvalidParameter)?;
        if self.gpio_dirs[idx] != Some(GpioDirection::Output) {
            return Err(HalError::InvalidParameter);
        }
        self.gpio_levels[idx] = level;
        Ok(())
    }

    fn gpio_set_interrupt(&mut self, pin: PinId, _enabled: bool) -> Result<(), HalError> {
        Self::gpio_index(pin).ok_or(HalError::InvalidParameter)?;
        Ok(())
    }

    fn i2c_init(&mut self, _bus: u8, _freq_hz: u32) -> Result<(), HalError> {
        Ok(())
    }

    fn i2c_write(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), HalError> {
        self.i2c_log.push(I2cTransaction::Write {
            bus,
            addr,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn i2c_read(&mut self, bus: u8, _addr: u8, buf: &mut [u8]) -> Result<(), HalError> {
        for slot in buf.iter_mut() {
            *slot = self.i2c_read_script.pop_front().unwrap_or(0);
        }
        let _ = bus;
        Ok(())
    }

    fn i2c_write_read(
        &mut self,
        bus: u8,
        addr: u8,
        data: &[u8],
        buf: &mut [u8],
    ) -> Result<(), HalError> {
        self.i2c_log.push(I2cTransaction::WriteRead {
            bus,
            addr,
            data: data.to_vec(),
        });
        for slot in buf.iter_mut() {
            *slot = self.i2c_read_script.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn i2s_init(&mut self, _sample_rate_hz: u32) -> Result<(), HalError> {
        self.i2s_fifo_used = 0;
        Ok(())
    }

    fn i2s_enable(&mut self, _enabled: bool) -> Result<(), HalError> {
        Ok(())
    }

    fn i2s_write(&mut self, samples: &[i16]) -> Result<usize, HalError> {
        let free = self.i2s_fifo_capacity.saturating_sub(self.i2s_fifo_used);
        let n = samples.len().min(free);
        self.i2s_fifo_used = self.i2s_fifo_used.saturating_add(n);
        Ok(n)
    }

    fn i2s_tx_ready(&self) -> bool {
        self.i2s_fifo_used < 4
    }

    fn i2s_tx_free_slots(&self) -> usize {
        self.i2s_fifo_capacity.saturating_sub(self.i2s_fifo_used)
    }

    fn ata_init(&mut self) -> Result<AtaIdentify, HalError> {
        Ok(self.ata_identify)
    }

    fn ata_read_sectors(&mut self, lba: SectorAddress, buf: &mut [u8]) -> Result<(), HalError> {
        let start = lba.byte_offset() as usize;
        let end = start.checked_add(buf.len()).ok_or(HalError::InvalidParameter)?;
        let src = self.disk.get(start..end).ok_or(HalError::TransferError)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn ata_write_sectors(&mut self, lba: SectorAddress, buf: &[u8]) -> Result<(), HalError> {
        let start = lba.byte_offset() as usize;
        let end = start.checked_add(buf.len()).ok_or(HalError::InvalidParameter)?;
        let dst = self
            .disk
            .get_mut(start..end)
            .ok_or(HalError::TransferError)?;
        dst.copy_from_slice(buf);
        Ok(())
    }

    fn ata_flush(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn ata_standby(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn lcd_init(&mut self) -> Result<LcdInfo, HalError> {
        Ok(self.lcd_info)
    }

    fn lcd_write_pixel(&mut self, x: u16, y: u16, rgb565: u16) -> Result<(), HalError> {
        let idx = y as usize * self.lcd_info.width as usize + x as usize;
        *self
            .framebuffer
            .get_mut(idx)
            .ok_or(HalError::InvalidParameter)? = rgb565;
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
        for row in y..y.saturating_add(h) {
            for col in x..x.saturating_add(w) {
                self.lcd_write_pixel(col, row, rgb565)?;
            }
        }
        Ok(())
    }

    fn lcd_update(&mut self, framebuffer: &[u16]) -> Result<(), HalError> {
        if framebuffer.len() != self.framebuffer.len() {
            return Err(HalError::InvalidParameter);
        }
        self.framebuffer.copy_from_slice(framebuffer);
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
        if framebuffer.len() != w as usize * h as usize {
            return Err(HalError::InvalidParameter);
        }
        for row in 0..h {
            for col in 0..w {
                let src = *framebuffer
                    .get(row as usize * w as usize + col as usize)
                    .ok_or(HalError::InvalidParameter)?;
                self.lcd_write_pixel(x + col, y + row, src)?;
            }
        }
        Ok(())
    }

    fn lcd_backlight(&mut self, percent: u8) -> Result<(), HalError> {
        self.backlight_percent = percent.min(100);
        Ok(())
    }

    fn lcd_sleep(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn lcd_wake(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn wheel_init(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn wheel_poll(&mut self) -> Result<Option<ClickwheelReading>, HalError> {
        match self.wheel_queue.pop_front() {
            Some((status, data)) => Ok(ClickwheelReading::decode(status, data)),
            None => Ok(None),
        }
    }

    fn dma_init(
        &mut self,
        _channel: u8,
        _request_id: u8,
        _src_addr: u32,
        _len_bytes: usize,
    ) -> Result<(), HalError> {
        Ok(())
    }

    fn dma_start(&mut self, _channel: u8) -> Result<(), HalError> {
        Ok(())
    }

    fn dma_is_busy(&self, _channel: u8) -> bool {
        false
    }

    fn dma_abort(&mut self, _channel: u8) -> Result<(), HalError> {
        Ok(())
    }

    fn battery_percent(&self) -> u8 {
        self.battery_percent
    }

    fn battery_voltage_mv(&self) -> u32 {
        self.battery_mv
    }

    fn is_charging(&self) -> bool {
        self.charging
    }

    fn set_cpu_profile(&mut self, profile: CpuProfile) -> Result<(), HalError> {
        self.cpu_profile = profile;
        Ok(())
    }

    fn watchdog_init(&mut self, timeout_ms: u32) -> Result<(), HalError> {
        self.watchdog_timeout_ms = Some(timeout_ms);
        Ok(())
    }

    fn watchdog_kick(&mut self) {
        self.watchdog_kicks = self.watchdog_kicks.saturating_add(1);
    }
}

impl MockHal {
    fn gpio_index(pin: PinId) -> Option<usize> {
        let idx = pin.port as usize * 8 + pin.bit as usize;
        (idx < 96).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::PinId;

    #[test]
    fn ata_round_trips_sectors() {
        let mut hal = MockHal::new(64 * 1024);
        let data = [0xABu8; 512];
        hal.ata_write_sectors(SectorAddress(3), &data).unwrap();
        let mut out = [0u8; 512];
        hal.ata_read_sectors(SectorAddress(3), &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn gpio_output_roundtrips() {
        let mut hal = MockHal::new(0);
        let pin = PinId::new('A', 3);
        hal.gpio_set_direction(pin, GpioDirection::Output).unwrap();
        hal.gpio_write(pin, true).unwrap();
        assert!(hal.gpio_read(pin).unwrap());
    }

    #[test]
    fn gpio_write_to_input_pin_is_rejected() {
        let mut hal = MockHal::new(0);
        let pin = PinId::new('B', 0);
        hal.gpio_set_direction(pin, GpioDirection::Input).unwrap();
        assert_eq!(hal.gpio_write(pin, true), Err(HalError::InvalidParameter));
    }

    #[test]
    fn wheel_poll_drains_queued_packets() {
        let mut hal = MockHal::new(0);
        let status = crate::regs::WHEEL_STATUS_READY_BIT;
        hal.push_wheel_packet(status, (10u32 << 8) | 0x1A);
        let reading = hal.wheel_poll().unwrap().expect("packet");
        assert_eq!(reading.position, 10);
        assert!(hal.wheel_poll().unwrap().is_none());
    }

    #[test]
    fn i2c_write_is_logged() {
        let mut hal = MockHal::new(0);
        hal.i2c_write(3, 0x1A, &[0x00, 0x01]).unwrap();
        assert_eq!(hal.i2c_log().len(), 1);
    }

    #[test]
    fn watchdog_kicks_are_counted() {
        let mut hal = MockHal::new(0);
        hal.watchdog_init(30_000).unwrap();
        hal.watchdog_kick();
        hal.watchdog_kick();
        assert_eq!(hal.watchdog_kicks(), 2);
    }
}
