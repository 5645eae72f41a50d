//! Master Boot Record parsing.

use crate::block::{BlockDevice, SECTOR_BYTES};
use crate::StorageError;
use hal::Hal;

/// Required signature bytes at offset 510–511 of sector 0.
pub const MBR_SIGNATURE: u16 = 0x55AA;

/// MBR partition type bytes recognized as FAT32.
pub const FAT32_PARTITION_TYPES: [u8; 2] = [0x0B, 0x0C];

/// One decoded 16-byte MBR partition table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionEntry {
    /// Partition type byte.
    pub partition_type: u8,
    /// First sector of the partition (LBA).
    pub start_lba: u32,
    /// Partition size in sectors.
    pub sector_count: u32,
}

impl PartitionEntry {
    /// Partition size in megabytes (whole number, truncated).
    #[must_use]
    pub fn size_mb(&self) -> u32 {
        (u64::from(self.sector_count) * SECTOR_BYTES as u64 / (1024 * 1024)) as u32
    }

    fn decode(raw: &[u8]) -> Option<Self> {
        let partition_type = *raw.get(4)?;
        let start_lba = u32::from_le_bytes(raw.get(8..12)?.try_into().ok()?);
        let sector_count = u32::from_le_bytes(raw.get(12..16)?.try_into().ok()?);
        Some(Self {
            partition_type,
            start_lba,
            sector_count,
        })
    }

    fn is_fat32(self) -> bool {
        FAT32_PARTITION_TYPES.contains(&self.partition_type)
    }
}

/// Parsed Master Boot Record: the four primary partition entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mbr {
    /// The four primary partition table entries, in table order.
    pub partitions: [PartitionEntry; 4],
}

impl Mbr {
    /// Read sector 0 and parse the partition table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BadMbrSignature`] if bytes 510–511 are not
    /// `0x55 0xAA`.
    pub fn read<H: Hal>(dev: &mut BlockDevice<'_, H>) -> Result<Self, StorageError> {
        let mut sector = [0u8; SECTOR_BYTES];
        dev.read_sector(0, &mut sector)?;
        Self::decode(&sector)
    }

    /// Parse an already-read sector-0 buffer.
    pub fn decode(sector: &[u8; SECTOR_BYTES]) -> Result<Self, StorageError> {
        let signature = u16::from_le_bytes([
            *sector.get(510).ok_or(StorageError::BadMbrSignature)?,
            *sector.get(511).ok_or(StorageError::BadMbrSignature)?,
        ]);
        if signature != MBR_SIGNATURE {
            return Err(StorageError::BadMbrSignature);
        }
        let mut partitions = [PartitionEntry {
            partition_type: 0,
            start_lba: 0,
            sector_count: 0,
        }; 4];
        for (i, slot) in partitions.iter_mut().enumerate() {
            let offset = 446 + i * 16;
            let raw = sector
                .get(offset..offset + 16)
                .ok_or(StorageError::BadMbrSignature)?;
            *slot = PartitionEntry::decode(raw).ok_or(StorageError::BadMbrSignature)?;
        }
        Ok(Self { partitions })
    }

    /// Find the first FAT32 partition (type `0x0B`/`0x0C`), falling back to
    /// the first partition whose type byte is nonzero ("FAT-family
    /// fallback") if none is an exact match.
    pub fn find_fat32_partition(&self) -> Result<PartitionEntry, StorageError> {
        if let Some(entry) = self.partitions.iter().find(|p| p.is_fat32()) {
            return Ok(*entry);
        }
        self.partitions
            .iter()
            .find(|p| p.partition_type != 0)
            .copied()
            .ok_or(StorageError::NoFat32Partition)
    }
}
