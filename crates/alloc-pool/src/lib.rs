//! Fixed-block memory pools.
//!
//! A deliberately non-general-purpose allocator: five fixed size classes
//! (64 B, 256 B, 1 KiB, 4 KiB, 16 KiB), each a contiguous byte array plus a
//! free-bitmap. `alloc(n)` picks the smallest sufficient size class and
//! first-fit-scans its bitmap; `free` clears the bit. There is no
//! coalescing and no splitting — fragmentation cannot occur because every
//! block in a class is the same size. This is not meant to grow into a
//! general allocator; callers that need a size between classes simply use
//! the next class up and waste the remainder.
//!
//! A second, DMA-aligned set of pools exists for buffers handed to
//! [`hal::Hal::dma_init`]: each block in [`DmaPool`] starts on a 32-byte
//! (ARM cache-line) boundary, and the only way to obtain a [`DmaBlock`]
//! handle is through [`DmaPool::alloc`] — a plain [`Block`] from the
//! ordinary pools cannot be passed where a `DmaBlock` is expected, so a
//! non-DMA-sourced address can never reach the DMA start call. This is the
//! type-level address validation called for by the component design.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

mod bitmap;

use bitmap::Bitmap;

/// Error returned by [`FixedBlockAllocator::alloc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocError {
    /// The request exceeds the largest size class (16 KiB).
    #[error("requested size exceeds the largest pool class")]
    TooLarge,
    /// The selected size class has no free blocks remaining.
    #[error("pool exhausted")]
    PoolExhausted,
}

/// Handle to a block allocated from one of the ordinary (non-DMA) pools.
///
/// Carries the size class and block index needed to free it; the backing
/// byte slice is borrowed from the allocator for the handle's lifetime
/// rather than stored, so there is no risk of a dangling pointer outliving
/// the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    class: SizeClass,
    index: u16,
}

impl Block {
    /// The size class this block was allocated from.
    #[must_use]
    pub fn class(&self) -> SizeClass {
        self.class
    }
}

/// The five fixed size classes, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SizeClass {
    /// 64 bytes.
    Bytes64,
    /// 256 bytes.
    Bytes256,
    /// 1024 bytes.
    Bytes1k,
    /// 4096 bytes.
    Bytes4k,
    /// 16384 bytes.
    Bytes16k,
}

impl SizeClass {
    /// Block size in bytes for this class.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Bytes64 => 64,
            Self::Bytes256 => 256,
            Self::Bytes1k => 1024,
            Self::Bytes4k => 4096,
            Self::Bytes16k => 16384,
        }
    }

    /// The smallest class whose block size is `>= n`, or `None` if `n`
    /// exceeds the largest class.
    #[must_use]
    pub const fn smallest_fitting(n: usize) -> Option<Self> {
        if n <= 64 {
            Some(Self::Bytes64)
        } else if n <= 256 {
            Some(Self::Bytes256)
        } else if n <= 1024 {
            Some(Self::Bytes1k)
        } else if n <= 4096 {
            Some(Self::Bytes4k)
        } else if n <= 16384 {
            Some(Self::Bytes16k)
        } else {
            None
        }
    }
}

const COUNT_64: usize = 512;
const COUNT_256: usize = 256;
const COUNT_1K: usize = 64;
const COUNT_4K: usize = 16;
const COUNT_16K: usize = 4;

/// The five fixed-size memory pools, statically sized for this target.
///
/// Total footprint: 512*64 + 256*256 + 64*1024 + 16*4096 + 4*16384 bytes
/// (~288 KiB), carved from a fixed SDRAM region reserved at boot.
pub struct FixedBlockAllocator {
    pool_64: ([[u8; 64]; COUNT_64], Bitmap<COUNT_64>),
    pool_256: ([[u8; 256]; COUNT_256], Bitmap<COUNT_256>),
    pool_1k: ([[u8; 1024]; COUNT_1K], Bitmap<COUNT_1K>),
    pool_4k: ([[u8; 4096]; COUNT_4K], Bitmap<COUNT_4K>),
    pool_16k: ([[u8; 16384]; COUNT_16K], Bitmap<COUNT_16K>),
}

impl FixedBlockAllocator {
    /// Construct a new allocator with every block free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool_64: ([[0u8; 64]; COUNT_64], Bitmap::new()),
            pool_256: ([[0u8; 256]; COUNT_256], Bitmap::new()),
            pool_1k: ([[0u8; 1024]; COUNT_1K], Bitmap::new()),
            pool_4k: ([[0u8; 4096]; COUNT_4K], Bitmap::new()),
            pool_16k: ([[0u8; 16384]; COUNT_16K], Bitmap::new()),
        }
    }

    /// Allocate at least `n` bytes from the smallest sufficient size class.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::TooLarge`] if `n` exceeds 16 KiB, or
    /// [`AllocError::PoolExhausted`] if that class has no free blocks.
    pub fn alloc(&mut self, n: usize) -> Result<(Block, &mut [u8]), AllocError> {
        let class = SizeClass::smallest_fitting(n).ok_or(AllocError::TooLarge)?;
        match class {
            SizeClass::Bytes64 => Self::alloc_from(&mut self.pool_64, class),
            SizeClass::Bytes256 => Self::alloc_from(&mut self.pool_256, class),
            SizeClass::Bytes1k => Self::alloc_from(&mut self.pool_1k, class),
            SizeClass::Bytes4k => Self::alloc_from(&mut self.pool_4k, class),
            SizeClass::Bytes16k => Self::alloc_from(&mut self.pool_16k, class),
        }
    }

    fn alloc_from<const SIZE: usize, const N: usize>(
        pool: &mut ([[u8; SIZE]; N], Bitmap<N>),
        class: SizeClass,
    ) -> Result<(Block, &mut [u8]), AllocError> {
        let (storage, bitmap) = pool;
        let index = bitmap.first_free().ok_or(AllocError::PoolExhausted)?;
        bitmap.set(index);
        let slice = storage
            .get_mut(index)
            .map(|arr| arr.as_mut_slice())
            .ok_or(AllocError::PoolExhausted)?;
        Ok((
            Block {
                class,
                index: index as u16,
            },
            slice,
        ))
    }

    /// Free a previously allocated block. Idempotent: freeing an already-free
    /// block is a silent no-op in release builds and a debug-assert failure
    /// in debug builds (catches double-free bugs without paying the cost in
    /// production).
    pub fn free(&mut self, block: Block) {
        let index = block.index as usize;
        let bitmap = match block.class {
            SizeClass::Bytes64 => &mut self.pool_64.1,
            SizeClass::Bytes256 => &mut self.pool_256.1,
            SizeClass::Bytes1k => &mut self.pool_1k.1,
            SizeClass::Bytes4k => &mut self.pool_4k.1,
            SizeClass::Bytes16k => &mut self.pool_16k.1,
        };
        debug_assert!(bitmap.is_set(index), "double free of alloc-pool block");
        bitmap.clear(index);
    }
}

impl Default for FixedBlockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A 32-byte-aligned block, obtainable only from [`DmaPool::alloc`].
///
/// The alignment and the "only constructed by the DMA pool" property
/// together guarantee that any address derived from a `DmaBlock` is safe
/// to hand to a DMA engine — a block from the ordinary [`FixedBlockAllocator`]
/// has no such guarantee and the type system will not accept one in its
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBlock {
    class: SizeClass,
    index: u16,
}

impl DmaBlock {
    /// The size class this block was allocated from.
    #[must_use]
    pub fn class(&self) -> SizeClass {
        self.class
    }
}

#[repr(align(32))]
struct Aligned32<const SIZE: usize>([u8; SIZE]);

/// DMA-aligned counterpart of [`FixedBlockAllocator`]; same five size
/// classes, same bitmap-scan algorithm, 32-byte block alignment.
pub struct DmaPool {
    pool_64: ([Aligned32<64>; COUNT_64], Bitmap<COUNT_64>),
    pool_256: ([Aligned32<256>; COUNT_256], Bitmap<COUNT_256>),
    pool_1k: ([Aligned32<1024>; COUNT_1K], Bitmap<COUNT_1K>),
    pool_4k: ([Aligned32<4096>; COUNT_4K], Bitmap<COUNT_4K>),
    pool_16k: ([Aligned32<16384>; COUNT_16K], Bitmap<COUNT_16K>),
}

impl DmaPool {
    /// Construct a new DMA-aligned pool with every block free.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool_64: ([const { Aligned32([0u8; 64]) }; COUNT_64], Bitmap::new()),
            pool_256: (
                [const { Aligned32([0u8; 256]) }; COUNT_256],
                Bitmap::new(),
            ),
            pool_1k: ([const { Aligned32([0u8; 1024]) }; COUNT_1K], Bitmap::new()),
            pool_4k: ([const { Aligned32([0u8; 4096]) }; COUNT_4K], Bitmap::new()),
            pool_16k: (
                [const { Aligned32([0u8; 16384]) }; COUNT_16K],
                Bitmap::new(),
            ),
        }
    }

    /// Allocate at least `n` bytes, 32-byte aligned, from the smallest
    /// sufficient size class.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::TooLarge`] if `n` exceeds 16 KiB, or
    /// [`AllocError::PoolExhausted`] if that class has no free blocks.
    pub fn alloc(&mut self, n: usize) -> Result<(DmaBlock, &mut [u8]), AllocError> {
        let class = SizeClass::smallest_fitting(n).ok_or(AllocError::TooLarge)?;
        match class {
            SizeClass::Bytes64 => Self::alloc_from(&mut self.pool_64, class),
            SizeClass::Bytes256 => Self::alloc_from(&mut self.pool_256, class),
            SizeClass::Bytes1k => Self::alloc_from(&mut self.pool_1k, class),
            SizeClass::Bytes4k => Self::alloc_from(&mut self.pool_4k, class),
            SizeClass::Bytes16k => Self::alloc_from(&mut self.pool_16k, class),
        }
    }

    fn alloc_from<const SIZE: usize, const N: usize>(
        pool: &mut ([Aligned32<SIZE>; N], Bitmap<N>),
        class: SizeClass,
    ) -> Result<(DmaBlock, &mut [u8]), AllocError> {
        let (storage, bitmap) = pool;
        let index = bitmap.first_free().ok_or(AllocError::PoolExhausted)?;
        bitmap.set(index);
        let slice = storage
            .get_mut(index)
            .map(|arr| arr.0.as_mut_slice())
            .ok_or(AllocError::PoolExhausted)?;
        Ok((
            DmaBlock {
                class,
                index: index as u16,
            },
            slice,
        ))
    }

    /// Free a previously allocated DMA block. Same idempotence contract as
    /// [`FixedBlockAllocator::free`].
    pub fn free(&mut self, block: DmaBlock) {
        let index = block.index as usize;
        let bitmap = match block.class {
            SizeClass::Bytes64 => &mut self.pool_64.1,
            SizeClass::Bytes256 => &mut self.pool_256.1,
            SizeClass::Bytes1k => &mut self.pool_1k.1,
            SizeClass::Bytes4k => &mut self.pool_4k.1,
            SizeClass::Bytes16k => &mut self.pool_16k.1,
        };
        debug_assert!(bitmap.is_set(index), "double free of DMA pool block");
        bitmap.clear(index);
    }
}

impl Default for DmaPool {
    fn default() -> Self {
        Self::new()
    }
}
