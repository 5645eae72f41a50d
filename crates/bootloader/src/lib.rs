//! Boot stub support: the firmware image header, the persisted boot
//! configuration record, and the boot-stage state machine.
//!
//! This crate implements everything the boot stub needs *after* the raw
//! assembly reset handler has run (that lives in `firmware`): loading and
//! validating the two on-disk binary records, and sequencing the named
//! boot stages with the 3-strike fallback rule.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod boot_config;
pub mod image_header;
pub mod loader;
pub mod stage;

pub use boot_config::{BootConfig, BootTarget, FailureReason};
pub use image_header::ImageHeader;
pub use loader::{copy_and_verify_body, mount_data_partition, read_image_header, FIRMWARE_PATH};
pub use stage::{BootStage, StageOutcome};

/// Errors shared by boot-stub record decoding and stage sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootloaderError {
    /// Image or config record magic did not match.
    #[error("bad magic")]
    BadMagic,
    /// Stored checksum did not match a recomputation.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// `entry_point`/`load_address`/`firmware_size` failed the DRAM-bounds
    /// or size-budget invariant.
    #[error("invalid image header")]
    InvalidHeader,
    /// A lower-level storage operation failed.
    #[error("storage error")]
    Storage(storage::StorageError),
    /// A lower-level HAL operation failed.
    #[error("hal error")]
    Hal(hal::HalError),
}

impl From<storage::StorageError> for BootloaderError {
    fn from(e: storage::StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<hal::HalError> for BootloaderError {
    fn from(e: hal::HalError) -> Self {
        Self::Hal(e)
    }
}

/// Lower bound of the DRAM window `load_address` must fall within.
pub const DRAM_START: u32 = 0x4000_1000;
/// Exclusive upper bound of the DRAM window.
pub const DRAM_END: u32 = 0x41B0_0000;
/// Maximum accepted firmware body size (27 MiB).
pub const MAX_FIRMWARE_SIZE: u32 = 27 * 1024 * 1024;
/// Number of consecutive boot failures before forcing the Apple fallback
/// target.
pub const MAX_CONSECUTIVE_FAILURES: u16 = 3;
