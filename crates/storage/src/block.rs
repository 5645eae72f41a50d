//! Raw 512-byte sector access over a [`hal::Hal`] ATA capability.

use hal::{Hal, SectorAddress};

use crate::StorageError;

/// Sector size in bytes for every device this stack supports.
pub const SECTOR_BYTES: usize = SectorAddress::SECTOR_BYTES;

/// Thin wrapper binding block-level read/write/flush to a concrete [`Hal`].
pub struct BlockDevice<'a, H: Hal> {
    hal: &'a mut H,
}

impl<'a, H: Hal> BlockDevice<'a, H> {
    /// Wrap a HAL reference as a block device. Does not itself touch
    /// hardware; call [`Self::init`] before issuing reads.
    pub fn new(hal: &'a mut H) -> Self {
        Self { hal }
    }

    /// Reset and IDENTIFY the attached device.
    pub fn init(&mut self) -> Result<hal::AtaIdentify, StorageError> {
        Ok(self.hal.ata_init()?)
    }

    /// Read exactly one 512-byte sector at `lba` into `buf`.
    ///
    /// # Panics
    ///
    /// Never — `buf.len()` must equal [`SECTOR_BYTES`]; callers that pass a
    /// mismatched buffer get `StorageError::Hal(HalError::InvalidParameter)`
    /// from the underlying HAL rather than a panic.
    pub fn read_sector(&mut self, lba: u32, buf: &mut [u8; SECTOR_BYTES]) -> Result<(), StorageError> {
        self.hal.ata_read_sectors(SectorAddress(u64::from(lba)), buf)?;
        Ok(())
    }

    /// Write exactly one 512-byte sector at `lba` from `buf`.
    pub fn write_sector(&mut self, lba: u32, buf: &[u8; SECTOR_BYTES]) -> Result<(), StorageError> {
        self.hal.ata_write_sectors(SectorAddress(u64::from(lba)), buf)?;
        Ok(())
    }

    /// Flush the device's write cache.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        Ok(self.hal.ata_flush()?)
    }

    /// Spin the disk down to standby.
    pub fn standby(&mut self) -> Result<(), StorageError> {
        Ok(self.hal.ata_standby()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    #[test]
    fn read_after_write_round_trips() {
        let mut mock = MockHal::new(64 * 1024);
        let mut dev = BlockDevice::new(&mut mock);
        dev.init().unwrap();
        let mut sector = [0u8; SECTOR_BYTES];
        sector[0] = 0x55;
        sector[511] = 0xAA;
        dev.write_sector(5, &sector).unwrap();
        let mut out = [0u8; SECTOR_BYTES];
        dev.read_sector(5, &mut out).unwrap();
        assert_eq!(out, sector);
    }
}
