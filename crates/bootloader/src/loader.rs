//! Stages 9–11: mount FAT32, open `/.zigpod/firmware.bin`, validate the
//! header, and copy the body to its load address.

use hal::Hal;
use storage::{BlockDevice, Fat32Mount, Mbr};

use crate::{BootloaderError, ImageHeader};

/// Canonical path to the application image on the data partition.
pub const FIRMWARE_PATH: &str = "/.zigpod/firmware.bin";

/// Mount the data partition's FAT32 volume.
///
/// # Errors
///
/// Propagates MBR/FAT32 mount failures (no FAT32 partition, bad BPB).
pub fn mount_data_partition<H: Hal>(
    dev: &mut BlockDevice<'_, H>,
) -> Result<Fat32Mount, BootloaderError> {
    let mbr = Mbr::read(dev)?;
    let partition = mbr.find_fat32_partition()?;
    Ok(Fat32Mount::mount(dev, partition)?)
}

/// Open and validate the firmware image header at [`FIRMWARE_PATH`].
/// Does not yet verify the body CRC32 — call [`ImageHeader::verify_body`]
/// once the body has been copied out.
///
/// # Errors
///
/// Propagates path-resolution failures, and returns
/// [`BootloaderError::InvalidHeader`]/[`BootloaderError::BadMagic`] if
/// the header is malformed.
pub fn read_image_header<H: Hal>(
    mount: &mut Fat32Mount,
    dev: &mut BlockDevice<'_, H>,
) -> Result<(storage::OpenFile, ImageHeader), BootloaderError> {
    let mut file = mount.open(dev, FIRMWARE_PATH)?;
    let mut header_buf = [0u8; ImageHeader::SIZE];
    let n = file.read(mount, dev, &mut header_buf)?;
    if n != ImageHeader::SIZE {
        return Err(BootloaderError::InvalidHeader);
    }
    let header = ImageHeader::decode(&header_buf)?;
    Ok((file, header))
}

/// Copy `header.firmware_size` bytes of body (immediately following the
/// header in the file) into `dest`, then verify the CRC32.
///
/// `dest` must be at least `header.firmware_size` bytes — it is the
/// caller's view of the SDRAM region at `header.load_address` (the
/// bootloader has no MMU to remap through; `firmware` owns the actual
/// pointer and is responsible for passing a slice over the right
/// physical address).
///
/// # Errors
///
/// [`BootloaderError::InvalidHeader`] if `dest` is smaller than the body.
/// Propagates read and [`ImageHeader::verify_body`] failures.
pub fn copy_and_verify_body<H: Hal>(
    mount: &mut Fat32Mount,
    dev: &mut BlockDevice<'_, H>,
    file: &mut storage::OpenFile,
    header: &ImageHeader,
    dest: &mut [u8],
) -> Result<(), BootloaderError> {
    let size = header.firmware_size as usize;
    let dest = dest.get_mut(..size).ok_or(BootloaderError::InvalidHeader)?;

    let mut copied = 0usize;
    while copied < size {
        let chunk = dest.get_mut(copied..).ok_or(BootloaderError::InvalidHeader)?;
        let n = file.read(mount, dev, chunk)?;
        if n == 0 {
            return Err(BootloaderError::InvalidHeader);
        }
        copied = copied.saturating_add(n);
    }

    header.verify_body(dest)
}
