//! Backing store contract shared by the in-memory and paged variants.

use fragbank_core::SlotId;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A set of fixed-size byte blobs indexed by dense, reusable slot ids.
///
/// Implemented by [`crate::MemoryStore`] and by `fragbank_io::PagedStore`.
/// Reads and writes at or past the end of a blob transfer zero bytes instead
/// of failing; callers stream variable amounts into a fixed reservation.
pub trait BackingStore: Send {
    /// Reserve `size` bytes. The blob reads as zeros until written; `clear`
    /// forces an explicit zero fill of the reserved range.
    fn alloc(&mut self, size: usize, clear: bool) -> Result<SlotId>;

    /// Copy `data` into the blob at `offset`, clipped to the blob size.
    fn write(&mut self, id: SlotId, offset: u64, data: &[u8]) -> Result<usize>;

    /// Copy blob bytes from `offset` into `buf`, clipped to the blob size.
    fn read(&mut self, id: SlotId, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Size fixed at `alloc` time.
    fn size_of(&self, id: SlotId) -> Result<usize>;

    /// Release the blob and make `id` available for reuse.
    fn free(&mut self, id: SlotId) -> Result<()>;

    fn stats(&self) -> StoreStats;
}

/// Number of bytes a transfer of `len` bytes at `offset` may move inside a
/// blob of `size` bytes.
pub fn clip(size: usize, offset: u64, len: usize) -> usize {
    if offset >= size as u64 {
        0
    } else {
        len.min(size - offset as usize)
    }
}

/// Page cache counters of the paged store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub writebacks: u64,
}

/// Usage snapshot for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub live: usize,
    pub live_bytes: u64,
    pub peak_bytes: u64,
    /// Ids waiting on the released stack.
    pub released: usize,
    /// Current size of the backing file (0 for the in-memory store).
    pub file_bytes: u64,
    pub cache: Option<CacheStats>,
}
