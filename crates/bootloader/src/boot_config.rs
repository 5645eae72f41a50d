//! The persisted boot configuration record: default target, timeout,
//! boot counters, and the 3-strike failure fallback.

use crate::{BootloaderError, MAX_CONSECUTIVE_FAILURES};

/// `"ZPOD"` little-endian — shared with [`crate::image_header::MAGIC`].
pub const MAGIC: u32 = 0x5A50_4F44;

/// Record format version understood by this implementation.
pub const VERSION: u8 = 1;

/// Default timeout before the bootloader proceeds with `default_boot_target`.
pub const DEFAULT_TIMEOUT_MS: u16 = 3000;

/// Which image the bootloader should load absent a button override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootTarget {
    /// Load `/.zigpod/firmware.bin`.
    ZigPod,
    /// Fall back to the original Apple firmware.
    Apple,
    /// Boot into the recovery menu.
    Recovery,
    /// Boot into USB DFU mode.
    Dfu,
    /// Boot into the minimal safe-mode UI.
    Safe,
}

impl BootTarget {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::ZigPod),
            1 => Some(Self::Apple),
            2 => Some(Self::Recovery),
            3 => Some(Self::Dfu),
            4 => Some(Self::Safe),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::ZigPod => 0,
            Self::Apple => 1,
            Self::Recovery => 2,
            Self::Dfu => 3,
            Self::Safe => 4,
        }
    }
}

/// Why the previous boot attempt did not reach the success signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureReason {
    /// No failure recorded (or this is the first boot).
    None,
    /// The application failed to signal success before the watchdog fired.
    Watchdog,
    /// A pre-boot hardware check failed (battery, SDRAM, ATA).
    HwCheck,
    /// Image header or CRC32 validation failed.
    Validation,
    /// The user forced a fallback via a button override.
    User,
}

impl FailureReason {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::Watchdog),
            2 => Some(Self::HwCheck),
            3 => Some(Self::Validation),
            4 => Some(Self::User),
            _ => None,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Watchdog => 1,
            Self::HwCheck => 2,
            Self::Validation => 3,
            Self::User => 4,
        }
    }
}

/// Persisted boot configuration, fixed 32-byte layout.
///
/// ```text
/// [0..4]   magic                  u32 le, 0x5A504F44
/// [4]      version                u8
/// [5]      default_boot_target    u8 (BootTarget discriminant)
/// [6]      last_failure_reason    u8 (FailureReason discriminant)
/// [7]      flags                  u8, reserved
/// [8..10]  timeout_ms             u16 le
/// [10..12] boot_count             u16 le
/// [12..14] consecutive_failures   u16 le
/// [14..18] checksum               u32 le, CRC32 over bytes [0..14)
/// [18..32] _pad                   [u8; 14]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Target to boot absent an override.
    pub default_boot_target: BootTarget,
    /// Reason the previous boot did not reach success.
    pub last_failure_reason: FailureReason,
    /// Reserved flags byte.
    pub flags: u8,
    /// Milliseconds to wait for a button override before proceeding.
    pub timeout_ms: u16,
    /// Total number of boot attempts ever recorded.
    pub boot_count: u16,
    /// Number of boot attempts since the last success signal.
    pub consecutive_failures: u16,
}

impl BootConfig {
    /// Encoded size in bytes.
    pub const SIZE: usize = 32;

    /// The record used when none is present or the stored one fails
    /// checksum validation.
    #[must_use]
    pub const fn defaults() -> Self {
        Self {
            default_boot_target: BootTarget::ZigPod,
            last_failure_reason: FailureReason::None,
            flags: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            boot_count: 0,
            consecutive_failures: 0,
        }
    }

    fn payload_bytes(&self) -> [u8; 14] {
        let mut buf = [0u8; 14];
        if let Some(s) = buf.get_mut(0..4) {
            s.copy_from_slice(&MAGIC.to_le_bytes());
        }
        if let Some(b) = buf.get_mut(4) {
            *b = VERSION;
        }
        if let Some(b) = buf.get_mut(5) {
            *b = self.default_boot_target.to_byte();
        }
        if let Some(b) = buf.get_mut(6) {
            *b = self.last_failure_reason.to_byte();
        }
        if let Some(b) = buf.get_mut(7) {
            *b = self.flags;
        }
        if let Some(s) = buf.get_mut(8..10) {
            s.copy_from_slice(&self.timeout_ms.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(10..12) {
            s.copy_from_slice(&self.boot_count.to_le_bytes());
        }
        if let Some(s) = buf.get_mut(12..14) {
            s.copy_from_slice(&self.consecutive_failures.to_le_bytes());
        }
        buf
    }

    /// Encode into a 32-byte buffer, computing and storing the checksum.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let payload = self.payload_bytes();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload);
        let checksum = hasher.finalize();

        let mut buf = [0u8; Self::SIZE];
        if let Some(s) = buf.get_mut(0..14) {
            s.copy_from_slice(&payload);
        }
        if let Some(s) = buf.get_mut(14..18) {
            s.copy_from_slice(&checksum.to_le_bytes());
        }
        buf
    }

    /// Decode and validate a 32-byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BootloaderError::BadMagic`] or
    /// [`BootloaderError::ChecksumMismatch`] on any structural problem.
    /// Per the record's lifecycle contract, callers should treat either
    /// error as "use [`Self::defaults`]" rather than propagate a hard
    /// failure.
    pub fn decode(buf: &[u8; Self::SIZE]) -> Result<Self, BootloaderError> {
        let payload = buf.get(0..14).ok_or(BootloaderError::BadMagic)?;
        let stored_checksum = u32::from_le_bytes(
            buf.get(14..18)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        if hasher.finalize() != stored_checksum {
            return Err(BootloaderError::ChecksumMismatch);
        }

        let magic = u32::from_le_bytes(
            payload
                .get(0..4)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );
        if magic != MAGIC {
            return Err(BootloaderError::BadMagic);
        }

        let default_boot_target = BootTarget::from_byte(*payload.get(5).ok_or(BootloaderError::BadMagic)?)
            .ok_or(BootloaderError::BadMagic)?;
        let last_failure_reason =
            FailureReason::from_byte(*payload.get(6).ok_or(BootloaderError::BadMagic)?)
                .ok_or(BootloaderError::BadMagic)?;
        let flags = *payload.get(7).ok_or(BootloaderError::BadMagic)?;
        let timeout_ms = u16::from_le_bytes(
            payload
                .get(8..10)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );
        let boot_count = u16::from_le_bytes(
            payload
                .get(10..12)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );
        let consecutive_failures = u16::from_le_bytes(
            payload
                .get(12..14)
                .and_then(|s| s.try_into().ok())
                .ok_or(BootloaderError::BadMagic)?,
        );

        Ok(Self {
            default_boot_target,
            last_failure_reason,
            flags,
            timeout_ms,
            boot_count,
            consecutive_failures,
        })
    }

    /// Load from `buf`, falling back to [`Self::defaults`] on any
    /// decode error (bad magic or checksum mismatch) per the record's
    /// documented "factory defaults" contract.
    #[must_use]
    pub fn load_or_default(buf: &[u8; Self::SIZE]) -> Self {
        Self::decode(buf).unwrap_or_else(|_| Self::defaults())
    }

    /// True once three or more consecutive boots have failed to reach
    /// the success signal; the bootloader must force
    /// [`BootTarget::Apple`] in this case.
    #[must_use]
    pub fn should_force_fallback(&self) -> bool {
        self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES
    }

    /// Record the start of a new boot attempt: increments `boot_count`
    /// and `consecutive_failures`. Must be persisted **before** jumping
    /// to the application, so a hang on this attempt counts against the
    /// 3-strike budget.
    pub fn record_attempt_start(&mut self) {
        self.boot_count = self.boot_count.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// Record a boot failure with its reason, to be persisted before
    /// rebooting.
    pub fn record_failure(&mut self, reason: FailureReason) {
        self.last_failure_reason = reason;
    }

    /// Record the application's "boot success" signal: clears
    /// `consecutive_failures` and the last failure reason.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_failure_reason = FailureReason::None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn size_is_32_bytes() {
        assert_eq!(BootConfig::SIZE, 32);
    }

    #[test]
    fn defaults_roundtrip() {
        let cfg = BootConfig::defaults();
        let bytes = cfg.encode();
        assert_eq!(BootConfig::decode(&bytes).unwrap(), cfg);
    }

    #[test]
    fn bad_magic_falls_back_to_defaults() {
        let buf = [0u8; BootConfig::SIZE];
        assert_eq!(
            BootConfig::load_or_default(&buf),
            BootConfig::defaults()
        );
    }

    #[test]
    fn corrupted_checksum_falls_back_to_defaults() {
        let cfg = BootConfig {
            consecutive_failures: 2,
            ..BootConfig::defaults()
        };
        let mut bytes = cfg.encode();
        bytes[14] ^= 0xFF;
        assert_eq!(BootConfig::load_or_default(&bytes), BootConfig::defaults());
    }

    #[test]
    fn three_strikes_forces_fallback() {
        let mut cfg = BootConfig::defaults();
        assert!(!cfg.should_force_fallback());
        cfg.consecutive_failures = 3;
        assert!(cfg.should_force_fallback());
    }

    #[test]
    fn attempt_start_increments_before_success_clears() {
        let mut cfg = BootConfig::defaults();
        cfg.record_attempt_start();
        cfg.record_attempt_start();
        assert_eq!(cfg.consecutive_failures, 2);
        assert_eq!(cfg.boot_count, 2);
        cfg.record_success();
        assert_eq!(cfg.consecutive_failures, 0);
        assert_eq!(cfg.boot_count, 2);
    }

    #[test]
    fn record_failure_sets_reason() {
        let mut cfg = BootConfig::defaults();
        cfg.record_failure(FailureReason::Watchdog);
        assert_eq!(cfg.last_failure_reason, FailureReason::Watchdog);
    }
}
