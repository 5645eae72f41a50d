//! Block device, MBR, and FAT32 reader for the ZigPod data partition.
//!
//! Everything here is read-only: writes from the running OS are an
//! explicit non-goal. The stack is three layers:
//!
//! - [`block`]: raw 512-byte sector read/write/flush over [`hal::Hal`]'s
//!   ATA capability.
//! - [`mbr`]: MBR signature + partition-table parsing.
//! - [`fat32`]: BIOS parameter block parsing, cluster-chain walking with a
//!   bounded-hop guarantee, 8.3 path resolution, and directory iteration.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod block;
pub mod fat32;
pub mod mbr;

pub use block::BlockDevice;
pub use fat32::{DirEntry, Fat32Mount, OpenFile};
pub use mbr::{Mbr, PartitionEntry, FAT32_PARTITION_TYPES, MBR_SIGNATURE};

/// Errors shared by every layer of the storage stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// A lower-level HAL operation failed.
    #[error("hal error")]
    Hal(hal::HalError),
    /// Sector 0 does not carry the `0x55AA` MBR signature.
    #[error("bad MBR signature")]
    BadMbrSignature,
    /// No FAT-family partition was found in the partition table.
    #[error("no FAT32 partition found")]
    NoFat32Partition,
    /// The BIOS parameter block does not look like FAT32
    /// (`root_entries != 0` or `fat_size_16 != 0`).
    #[error("not a FAT32 volume")]
    NotFat32,
    /// A cluster chain did not reach end-of-chain within `total_clusters` hops.
    #[error("corrupt cluster chain")]
    CorruptChain,
    /// A path component was not found.
    #[error("not found")]
    NotFound,
    /// The resolved entry is a directory, not a file.
    #[error("not a file")]
    NotAFile,
    /// The resolved entry is a file, not a directory.
    #[error("not a directory")]
    NotADirectory,
    /// A path component exceeded the 8.3 name budget.
    #[error("path too long")]
    PathTooLong,
    /// The mount has not been initialized.
    #[error("not initialized")]
    NotInitialized,
}

impl From<hal::HalError> for StorageError {
    fn from(e: hal::HalError) -> Self {
        Self::Hal(e)
    }
}
