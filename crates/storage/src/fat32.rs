//! FAT32 BIOS parameter block parsing, cluster-chain walking, and 8.3 path
//! resolution.

use hal::Hal;

use crate::block::{BlockDevice, SECTOR_BYTES};
use crate::mbr::PartitionEntry;
use crate::StorageError;

/// Cluster numbers `< 2` are reserved; `>= 0x0FFF_FFF8` mark end-of-chain.
const EOC_THRESHOLD: u32 = 0x0FFF_FFF8;
const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// A single-sector FAT cache: one cached sector plus its sector number and
/// a validity flag.
struct FatCache {
    sector: [u8; SECTOR_BYTES],
    sector_number: u32,
    valid: bool,
}

impl FatCache {
    const fn empty() -> Self {
        Self {
            sector: [0u8; SECTOR_BYTES],
            sector_number: 0,
            valid: false,
        }
    }
}

/// Mounted FAT32 volume state.
pub struct Fat32Mount {
    partition_start_lba: u32,
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    fat_start_lba: u32,
    fat_size_sectors: u32,
    num_fats: u8,
    data_start_lba: u32,
    root_cluster: u32,
    total_clusters: u32,
    fat_cache: FatCache,
}

impl Fat32Mount {
    /// Cluster size in bytes (`bytes_per_sector * sectors_per_cluster`).
    #[must_use]
    pub fn cluster_size(&self) -> u32 {
        u32::from(self.bytes_per_sector) * u32::from(self.sectors_per_cluster)
    }

    /// Mount the FAT32 volume described by `partition`, reading its BPB
    /// from the partition's first sector.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFat32`] if the BPB does not carry the
    /// FAT32 markers (`root_entries == 0 && fat_size_16 == 0`).
    pub fn mount<H: Hal>(
        dev: &mut BlockDevice<'_, H>,
        partition: PartitionEntry,
    ) -> Result<Self, StorageError> {
        let mut bpb = [0u8; SECTOR_BYTES];
        dev.read_sector(partition.start_lba, &mut bpb)?;

        let bytes_per_sector = u16::from_le_bytes(
            bpb.get(11..13)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let sectors_per_cluster = *bpb.get(13).ok_or(StorageError::NotFat32)?;
        let reserved_sectors = u16::from_le_bytes(
            bpb.get(14..16)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let num_fats = *bpb.get(16).ok_or(StorageError::NotFat32)?;
        let root_entries = u16::from_le_bytes(
            bpb.get(17..19)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let fat_size_16 = u16::from_le_bytes(
            bpb.get(22..24)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let fat_size_32 = u32::from_le_bytes(
            bpb.get(36..40)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let root_cluster = u32::from_le_bytes(
            bpb.get(44..48)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );
        let total_sectors_32 = u32::from_le_bytes(
            bpb.get(32..36)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::NotFat32)?,
        );

        if root_entries != 0 || fat_size_16 != 0 {
            return Err(StorageError::NotFat32);
        }

        let fat_start_lba = partition.start_lba + u32::from(reserved_sectors);
        let data_start_lba = fat_start_lba + u32::from(num_fats) * fat_size_32;
        let data_sectors = total_sectors_32.saturating_sub(data_start_lba - partition.start_lba);
        let total_clusters = data_sectors / u32::from(sectors_per_cluster.max(1));

        Ok(Self {
            partition_start_lba: partition.start_lba,
            bytes_per_sector,
            sectors_per_cluster,
            fat_start_lba,
            fat_size_sectors: fat_size_32,
            num_fats,
            data_start_lba,
            root_cluster,
            total_clusters,
            fat_cache: FatCache::empty(),
        })
    }

    /// First data sector (LBA) of `cluster` (cluster 2 is the first usable
    /// data cluster).
    fn cluster_to_lba(&self, cluster: u32) -> u32 {
        self.data_start_lba + (cluster.saturating_sub(2)) * u32::from(self.sectors_per_cluster)
    }

    /// Follow the FAT chain one link: return the next cluster, or `None`
    /// at end-of-chain.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::CorruptChain`] if the FAT entry is the
    /// reserved "bad cluster" marker.
    pub fn next_cluster<H: Hal>(
        &mut self,
        dev: &mut BlockDevice<'_, H>,
        cluster: u32,
    ) -> Result<Option<u32>, StorageError> {
        let fat_byte_offset = cluster.saturating_mul(4);
        let sector_offset = fat_byte_offset / self.bytes_per_sector as u32;
        let in_sector_offset = (fat_byte_offset % self.bytes_per_sector as u32) as usize;
        let fat_sector_number = self.fat_start_lba + sector_offset;

        if !self.fat_cache.valid || self.fat_cache.sector_number != fat_sector_number {
            dev.read_sector(fat_sector_number, &mut self.fat_cache.sector)?;
            self.fat_cache.sector_number = fat_sector_number;
            self.fat_cache.valid = true;
        }

        let raw = u32::from_le_bytes(
            self.fat_cache
                .sector
                .get(in_sector_offset..in_sector_offset + 4)
                .and_then(|s| s.try_into().ok())
                .ok_or(StorageError::CorruptChain)?,
        ) & 0x0FFF_FFFF;

        if raw == BAD_CLUSTER {
            return Err(StorageError::CorruptChain);
        }
        if raw >= EOC_THRESHOLD || raw == 0 || raw == 1 {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    /// Read the full contents of a cluster chain starting at
    /// `first_cluster` into `out`, stopping when `out` is full or the
    /// chain ends. Returns the number of bytes written.
    ///
    /// Walks the chain one cluster at a time through a stack buffer
    /// (bounded at the volume's cluster size, at most 32 KiB), matching
    /// the read path used by [`OpenFile::read`]. Guaranteed to terminate:
    /// the walk aborts with [`StorageError::CorruptChain`] if it exceeds
    /// `total_clusters` hops without reaching end-of-chain.
    fn read_chain<H: Hal>(
        &mut self,
        dev: &mut BlockDevice<'_, H>,
        first_cluster: u32,
        mut skip_bytes: u64,
        out: &mut [u8],
    ) -> Result<usize, StorageError> {
        let cluster_size = self.cluster_size() as usize;
        let mut cluster = Some(first_cluster);
        let mut written = 0usize;
        let mut hops = 0u32;
        let mut scratch = [0u8; 32 * 1024];
        let scratch = scratch
            .get_mut(..cluster_size.min(scratch.len()))
            .ok_or(StorageError::CorruptChain)?;

        while let Some(c) = cluster {
            if hops > self.total_clusters {
                return Err(StorageError::CorruptChain);
            }
            hops += 1;

            let lba = self.cluster_to_lba(c);
            let sectors = self.sectors_per_cluster as usize;
            for s in 0..sectors {
                let mut sector = [0u8; SECTOR_BYTES];
                dev.read_sector(lba + s as u32, &mut sector)?;
                let dst_start = s * SECTOR_BYTES;
                if let Some(dst) = scratch.get_mut(dst_start..dst_start + SECTOR_BYTES) {
                    dst.copy_from_slice(&sector);
                }
            }

            let available = scratch.len() as u64;
            if skip_bytes >= available {
                skip_bytes -= available;
            } else {
                let start = skip_bytes as usize;
                let chunk = scratch.get(start..).unwrap_or(&[]);
                let n = chunk.len().min(out.len() - written);
                if let Some(dst) = out.get_mut(written..written + n) {
                    if let Some(src) = chunk.get(..n) {
                        dst.copy_from_slice(src);
                    }
                }
                written += n;
                skip_bytes = 0;
                if written >= out.len() {
                    break;
                }
            }

            cluster = self.next_cluster(dev, c)?;
        }
        Ok(written)
    }

    /// Resolve a `/`-separated, case-insensitive 8.3 path to an open file
    /// handle.
    ///
    /// # Errors
    ///
    /// [`StorageError::NotFound`] if any component is missing,
    /// [`StorageError::NotAFile`] if the final component is a directory,
    /// [`StorageError::PathTooLong`] if a component exceeds 8.3 limits.
    pub fn open<H: Hal>(
        &mut self,
        dev: &mut BlockDevice<'_, H>,
        path: &str,
    ) -> Result<OpenFile, StorageError> {
        let entry = self.resolve(dev, path)?;
        if entry.is_directory() {
            return Err(StorageError::NotAFile);
        }
        Ok(OpenFile {
            start_cluster: entry.first_cluster(),
            current_cluster: Some(entry.first_cluster()),
            position: 0,
            size: entry.size,
        })
    }

    /// List the entries of the directory cluster chain starting at
    /// `cluster` (use [`Self::root_cluster`] for the root).
    #[must_use]
    pub fn read_dir<'a, H: Hal>(
        &'a mut self,
        dev: &'a mut BlockDevice<'_, H>,
        cluster: u32,
    ) -> DirIter<'a, H> {
        DirIter {
            mount: self,
            dev,
            cluster: Some(cluster),
            offset_in_cluster: 0,
            scratch: None,
        }
    }

    /// The volume's root directory cluster.
    #[must_use]
    pub fn root_cluster(&self) -> u32 {
        self.root_cluster
    }

    fn resolve<H: Hal>(
        &mut self,
        dev: &mut BlockDevice<'_, H>,
        path: &str,
    ) -> Result<DirEntry, StorageError> {
        let mut cluster = self.root_cluster;
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        let mut last: Option<DirEntry> = None;

        while let Some(name) = components.next() {
            let target = to_8_3(name)?;
            let mut iter = self.read_dir(dev, cluster);
            let found = loop {
                match iter.next() {
                    Some(Ok(entry)) if entry.name_8_3 == target => break Some(entry),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e),
                    None => break None,
                }
            };
            let entry = found.ok_or(StorageError::NotFound)?;
            if components.peek().is_some() {
                if !entry.is_directory() {
                    return Err(StorageError::NotADirectory);
                }
                cluster = entry.first_cluster();
            }
            last = Some(entry);
        }
        last.ok_or(StorageError::NotFound)
    }
}

/// Convert a path component to an uppercase, space-padded 8.3 name.
///
/// A leading `.` (as in the conventional hidden-directory name
/// `.zigpod`) is treated as part of the base name rather than an
/// extension separator — only a `.` at index `> 0` splits base/ext.
fn to_8_3(name: &str) -> Result<[u8; 11], StorageError> {
    let dot = name.rfind('.').filter(|&i| i > 0);
    let (base, ext) = match dot {
        Some(i) => (
            name.get(..i).unwrap_or(name),
            name.get(i + 1..).unwrap_or(""),
        ),
        None => (name, ""),
    };
    if base.len() > 8 || ext.len() > 3 {
        return Err(StorageError::PathTooLong);
    }
    let mut out = [b' '; 11];
    for (i, b) in base.bytes().take(8).enumerate() {
        if let Some(slot) = out.get_mut(i) {
            *slot = b.to_ascii_uppercase();
        }
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        if let Some(slot) = out.get_mut(8 + i) {
            *slot = b.to_ascii_uppercase();
        }
    }
    Ok(out)
}

/// One 32-byte on-disk directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    name_8_3: [u8; 11],
    attr: u8,
    first_cluster_high: u16,
    first_cluster_low: u16,
    /// File size in bytes (meaningless for directories).
    pub size: u32,
}

const ATTR_DIRECTORY: u8 = 0x10;
const ATTR_LFN: u8 = 0x0F;
const ATTR_VOLUME_LABEL: u8 = 0x08;

impl DirEntry {
    fn decode(raw: &[u8]) -> Option<Self> {
        let name_8_3: [u8; 11] = raw.get(0..11)?.try_into().ok()?;
        let attr = *raw.get(11)?;
        let first_cluster_high = u16::from_le_bytes(raw.get(20..22)?.try_into().ok()?);
        let first_cluster_low = u16::from_le_bytes(raw.get(26..28)?.try_into().ok()?);
        let size = u32::from_le_bytes(raw.get(28..32)?.try_into().ok()?);
        Some(Self {
            name_8_3,
            attr,
            first_cluster_high,
            first_cluster_low,
            size,
        })
    }

    /// True if this entry names a subdirectory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    /// First cluster of this entry's data.
    #[must_use]
    pub fn first_cluster(&self) -> u32 {
        (u32::from(self.first_cluster_high) << 16) | u32::from(self.first_cluster_low)
    }

    /// The padded 8.3 name bytes (uppercase, space-padded, 8+3).
    #[must_use]
    pub fn name_8_3(&self) -> [u8; 11] {
        self.name_8_3
    }
}

/// Iterator over the 32-byte records of a directory's cluster chain.
///
/// Skips deleted entries (first byte `0xE5`), long-filename entries
/// (attribute `0x0F`), and the volume-label entry; stops at the first
/// entry whose first byte is `0x00`.
pub struct DirIter<'a, H: Hal> {
    mount: &'a mut Fat32Mount,
    dev: &'a mut BlockDevice<'a, H>,
    cluster: Option<u32>,
    offset_in_cluster: usize,
    scratch: Option<([u8; 16 * 1024], usize)>,
}

impl<'a, H: Hal> Iterator for DirIter<'a, H> {
    type Item = Result<DirEntry, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cluster = self.cluster?;
            let cluster_size = self.mount.cluster_size() as usize;

            if self.scratch.is_none() {
                let mut buf = [0u8; 16 * 1024];
                let lba = self.mount.cluster_to_lba(cluster);
                let sectors = self.mount.sectors_per_cluster as usize;
                for s in 0..sectors {
                    let mut sector = [0u8; SECTOR_BYTES];
                    if let Err(e) = self.dev.read_sector(lba + s as u32, &mut sector) {
                        return Some(Err(e));
                    }
                    let start = s * SECTOR_BYTES;
                    if let Some(dst) = buf.get_mut(start..start + SECTOR_BYTES) {
                        dst.copy_from_slice(&sector);
                    }
                }
                self.scratch = Some((buf, cluster_size.min(buf.len())));
                self.offset_in_cluster = 0;
            }

            let (buf, len) = self.scratch.as_ref().expect("scratch populated above");
            if self.offset_in_cluster >= *len {
                self.scratch = None;
                match self.mount.next_cluster(self.dev, cluster) {
                    Ok(next) => {
                        self.cluster = next;
                        continue;
                    }
                    Err(e) => return Some(Err(e)),
                }
            }

            let raw = match buf.get(self.offset_in_cluster..self.offset_in_cluster + 32) {
                Some(r) => r,
                None => {
                    self.scratch = None;
                    continue;
                }
            };
            self.offset_in_cluster += 32;

            match raw.first() {
                Some(0x00) => {
                    self.cluster = None;
                    return None;
                }
                Some(0xE5) => continue,
                _ => {}
            }

            let attr = match raw.get(11) {
                Some(a) => *a,
                None => continue,
            };
            if attr == ATTR_LFN || attr & ATTR_VOLUME_LABEL != 0 {
                continue;
            }

            if let Some(entry) = DirEntry::decode(raw) {
                return Some(Ok(entry));
            }
        }
    }
}

/// An open file: a cursor walking a cluster chain plus a byte position.
#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
    start_cluster: u32,
    current_cluster: Option<u32>,
    position: u64,
    size: u32,
}

impl OpenFile {
    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Current byte position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read up to `out.len()` bytes starting at the current position.
    /// Returns the number of bytes read; `0` signals end-of-file. Reads
    /// past EOF return whatever bytes remain (possibly fewer than
    /// requested), never an error.
    pub fn read<H: Hal>(
        &mut self,
        mount: &mut Fat32Mount,
        dev: &mut BlockDevice<'_, H>,
        out: &mut [u8],
    ) -> Result<usize, StorageError> {
        if self.position >= u64::from(self.size) {
            return Ok(0);
        }
        let remaining = u64::from(self.size) - self.position;
        let want = out.len().min(remaining as usize);
        if want == 0 {
            return Ok(0);
        }
        let n = mount.read_chain(dev, self.start_cluster, self.position, &mut out[..want])?;
        self.position += n as u64;
        Ok(n)
    }

    /// Seek to an absolute byte position. Re-walks the chain from the
    /// first cluster on the next read — there is no random-access
    /// acceleration in v1.
    pub fn seek(&mut self, position: u64) {
        self.position = position.min(u64::from(self.size));
        self.current_cluster = Some(self.start_cluster);
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects, clippy::unwrap_used)]
mod tests {
    use super::*;
    use hal::mock::MockHal;

    /// Build a minimal in-memory FAT32 image: partition at LBA 0 (no MBR,
    /// direct BPB for simplicity of these unit tests), 1 FAT, one file in
    /// the root directory.
    fn build_image() -> MockHal {
        let mut mock = MockHal::new(4 * 1024 * 1024);
        {
            let disk = mock.disk_mut();
            let bpb = &mut disk[0..512];
            bpb[11..13].copy_from_slice(&512u16.to_le_bytes()); // bytes/sector
            bpb[13] = 1; // sectors/cluster
            bpb[14..16].copy_from_slice(&1u16.to_le_bytes()); // reserved sectors
            bpb[16] = 1; // num FATs
            bpb[17..19].copy_from_slice(&0u16.to_le_bytes()); // root_entries = 0 (FAT32 marker)
            bpb[22..24].copy_from_slice(&0u16.to_le_bytes()); // fat_size_16 = 0 (FAT32 marker)
            bpb[32..36].copy_from_slice(&2048u32.to_le_bytes()); // total sectors
            bpb[36..40].copy_from_slice(&8u32.to_le_bytes()); // fat_size_32
            bpb[44..48].copy_from_slice(&2u32.to_le_bytes()); // root cluster = 2

            // FAT sector at LBA 1: cluster 2 (root dir) -> EOC, cluster 3 (file data) -> EOC
            let fat = &mut disk[512..1024];
            fat[8..12].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes()); // cluster 2 entry
            fat[12..16].copy_from_slice(&0x0FFF_FFFFu32.to_le_bytes()); // cluster 3 entry

            // data_start_lba = 1 + 1*8 = 9; cluster 2 -> lba 9 (root dir), cluster 3 -> lba 10
            let root_dir = &mut disk[9 * 512..9 * 512 + 512];
            root_dir[0..11].copy_from_slice(b"HELLO   TXT");
            root_dir[11] = 0x00; // attr: plain file
            root_dir[20..22].copy_from_slice(&0u16.to_le_bytes()); // cluster high
            root_dir[26..28].copy_from_slice(&3u16.to_le_bytes()); // cluster low = 3
            root_dir[28..32].copy_from_slice(&5u32.to_le_bytes()); // size = 5 bytes

            let file_data = &mut disk[10 * 512..10 * 512 + 512];
            file_data[0..5].copy_from_slice(b"hello");
        }
        mock
    }

    #[test]
    fn mount_reads_fat32_geometry() {
        let mut mock = build_image();
        let mut dev = BlockDevice::new(&mut mock);
        let partition = PartitionEntry {
            partition_type: 0x0B,
            start_lba: 0,
            sector_count: 2048,
        };
        let mount = Fat32Mount::mount(&mut dev, partition).unwrap();
        assert_eq!(mount.root_cluster(), 2);
        assert_eq!(mount.cluster_size(), 512);
    }

    #[test]
    fn open_and_read_file_round_trips() {
        let mut mock = build_image();
        let mut dev = BlockDevice::new(&mut mock);
        let partition = PartitionEntry {
            partition_type: 0x0B,
            start_lba: 0,
            sector_count: 2048,
        };
        let mut mount = Fat32Mount::mount(&mut dev, partition).unwrap();
        let mut file = mount.open(&mut dev, "HELLO.TXT").unwrap();
        let mut buf = [0u8; 5];
        let n = file.read(&mut mount, &mut dev, &mut buf).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
        // Next read is EOF.
        let n2 = file.read(&mut mount, &mut dev, &mut buf).unwrap();
        assert_eq!(n2, 0);
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let mut mock = build_image();
        let mut dev = BlockDevice::new(&mut mock);
        let partition = PartitionEntry {
            partition_type: 0x0B,
            start_lba: 0,
            sector_count: 2048,
        };
        let mut mount = Fat32Mount::mount(&mut dev, partition).unwrap();
        assert_eq!(
            mount.open(&mut dev, "NOPE.TXT"),
            Err(StorageError::NotFound)
        );
    }

    #[test]
    fn to_8_3_rejects_overlong_component() {
        assert_eq!(to_8_3("averylongname.txt"), Err(StorageError::PathTooLong));
    }

    #[test]
    fn to_8_3_uppercases_and_pads() {
        let out = to_8_3("hello.c").unwrap();
        assert_eq!(&out, b"HELLO   C  ");
    }
}
