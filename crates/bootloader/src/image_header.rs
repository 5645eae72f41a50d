//! The 256-byte firmware image header at the start of
//! `/.zigpod/firmware.bin`.

use crate::{BootloaderError, DRAM_END, DRAM_START, MAX_FIRMWARE_SIZE};

/// `"ZPOD"` little-endian.
pub const MAGIC: u32 = 0x5A50_4F44;

/// Fixed 256-byte on-disk layout.
///
/// ```text
/// [0..4]    magic               u32 le, 0x5A504F44
/// [4]       version_major       u8
/// [5]       version_minor       u8
/// [6]       version_patch       u8
/// [7]       flags               u8
/// [8..12]   entry_point         u32 le
/// [12..16]  load_address        u32 le
/// [16..20]  firmware_size       u32 le
/// [20..24]  body_checksum       u32 le (CRC32 of the firmware body)
/// [24..88]  signature           [u8; 64], reserved
/// [88..92]  build_timestamp     u32 le (Unix seconds)
/// [92]      min_bootloader_version u8
/// [93..256] _pad                [u8; 163]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Semantic version of the image.
    pub version: (u8, u8, u8),
    /// Image flags byte (reserved for future use, currently unconstrained).
    pub flags: u8,
    /// Address the bootloader branches to after copying the body.
    pub entry_point: u32,
    /// Address the body is copied to.
    pub load_address: u32,
    /// Size in bytes of the body following this header.
    pub firmware_size: u32,
    /// CRC32 of the body, computed over exactly `firmware_size` bytes.
    pub body_checksum: u32,
    /// Reserved signature bytes, currently unchecked.
    pub signature: [u8; 64],
    /// Unix build timestamp.
    pub build_timestamp: u32,
    /// Minimum bootloader version able to load this image.
    pub min_bootloader_version: u8,
}

impl ImageHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 256;

    /// Encode the header into a 256-byte buffer.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        if let Some(s) = buf.get_mut(0..4) {
            s.copy_from_slice(&MAGIC.to_le_bytes());
        }
        if let Some(b) = buf.get_mut(4) {
            *b = self.version.0;
        }
        if let Some(b) = buf.get_mut(5) {
            *b = self.version.1;
        }
        if let Some(b) = buf.get_mut(6) {
            *b = self.version.2;
        }
        if let Some(b) = buf.get_mut(7) {
            *b = self.flags;
        }
        if let Some(s) = buf.get_mut(8..12) {
            s.copy_from_slice(&self.entry_point.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(12..16) {
            s.copy_from_slice(&self.load_address.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(16..20) {
            s.copy_from_slice(&self.firmware_size.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(20..24) {
            s.copy_from_slice(&self.body_checksum.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(24..88) {
            s.copy_from_slice(&self.signature);
        }
        if let Some(s) = buf.get_mut(88..92) {
            s.copy_from_slice(&self.build_timestamp.to_le_bytes());
        }
        if let Some(b) = buf.get_mut(92) {
            *b = self.min_bootloader_version;
        }
        buf
    }

    /// Decode and structurally validate a 256-byte header.
    ///
    /// # Errors
    ///
    /// [`BootloaderError::BadMagic`] if bytes `[0..4]` are not
    /// [`MAGIC`]. [`BootloaderError::InvalidHeader`] if
    /// `entry_point`/`load_address`/`firmware_size` violate
    /// `load_address <= entry_point < load_address + firmware_size`,
    /// `load_address` is outside `[DRAM_START, DRAM_END)`, or
    /// `firmware_size` exceeds [`MAX_FIRMWARE_SIZE`]. Does **not** check
    /// the body CRC32 — see [`Self::verify_body`].
    pub fn decode(buf: &[u8; Self::SIZE]) -> Result<Self, BootloaderError> {
        let magic = u32::from_le_bytes(
            buf.get(0..4)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );
        if magic != MAGIC {
            return Err(BootloaderError::BadMagic);
        }
        let version = (
            *buf.get(4).ok_or(BootloaderError::InvalidHeader)?,
            *buf.get(5).ok_or(BootloaderError::InvalidHeader)?,
            *buf.get(6).ok_or(BootloaderError::InvalidHeader)?,
        );
        let flags = *buf.get(7).ok_or(BootloaderError::InvalidHeader)?;
        let entry_point = u32::from_le_bytes(
            buf.get(8..12)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::InvalidHeader)?,
        );
        let load_address = u32::from_le_bytes(
            buf.get(12..16)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::InvalidHeader)?,
        );
        let firmware_size = u32::from_le_bytes(
            buf.get(16..20)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::InvalidHeader)?,
        );
        let body_checksum = u32::from_le_bytes(
            buf.get(20..24)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::InvalidHeader)?,
        );
        let mut signature = [0u8; 64];
        signature.copy_from_slice(
            buf.get(24..88).ok_or(BootloaderError::InvalidHeader)?,
        );
        let build_timestamp = u32::from_le_bytes(
            buf.get(88..92)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::InvalidHeader)?,
        );
        let min_bootloader_version = *buf.get(92).ok_or(BootloaderError::InvalidHeader)?;

        let header = Self {
            version,
            flags,
            entry_point,
            load_address,
            firmware_size,
            body_checksum,
            signature,
            build_timestamp,
            min_bootloader_version,
        };
        header.validate_bounds()?;
        Ok(header)
    }

    fn validate_bounds(&self) -> Result<(), BootloaderError> {
        let end = self
            .load_address
            .checked_add(self.firmware_size)
            .ok_or(BootloaderError::InvalidHeader)?;
        let in_range = self.load_address <= self.entry_point && self.entry_point < end;
        let in_dram = self.load_address >= DRAM_START && self.load_address < DRAM_END;
        let size_ok = self.firmware_size <= MAX_FIRMWARE_SIZE;
        if in_range && in_dram && size_ok {
            Ok(())
        } else {
            Err(BootloaderError::InvalidHeader)
        }
    }

    /// Verify `body`'s CRC32 against [`Self::body_checksum`].
    ///
    /// # Errors
    ///
    /// [`BootloaderError::ChecksumMismatch`] on mismatch.
    pub fn verify_body(&self, body: &[u8]) -> Result<(), BootloaderError> {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(body);
        if hasher.finalize() == self.body_checksum {
            Ok(())
        } else {
            Err(BootloaderError::ChecksumMismatch)
        }
    }
}
