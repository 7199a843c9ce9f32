//! Paged, file-backed backing store.
//!
//! The backing file is created in the configured directory and unlinked at
//! once, so it disappears with the process even after a crash. Blobs occupy
//! runs of fixed-size chunks ([`extent`]); a blob byte at `offset` lives at
//! file address `first_chunk * chunk_size + offset`, which the page cache
//! ([`cache`]) maps onto pages.

pub mod cache;
pub mod extent;

use std::fs;
use std::path::Path;

use fragbank_core::{PoolConfig, SlotId};
use fragbank_mem::store::{clip, BackingStore, StoreStats};
use fragbank_mem::tracking::UsageTracker;
use fragbank_mem::{Error, Result, SlotTable};
use tracing::debug;

use cache::PageCache;
use extent::{ChunkAllocator, Extent};

/// Layout and limits of one paged store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedStoreOptions {
    pub chunk_size: usize,
    pub page_size: usize,
    pub cache_pages: usize,
    pub max_file_bytes: u64,
}

impl PagedStoreOptions {
    pub fn from_pool_config(cfg: &PoolConfig) -> Self {
        Self {
            chunk_size: cfg.chunk_size,
            page_size: cfg.page_size,
            cache_pages: cfg.cache_pages(),
            max_file_bytes: cfg.max_file_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Blob {
    extent: Extent,
    size: usize,
}

pub struct PagedStore {
    tag: &'static str,
    chunk_size: u64,
    page_size: u64,
    max_file_bytes: u64,
    slots: SlotTable<Blob>,
    chunks: ChunkAllocator,
    cache: PageCache,
    usage: UsageTracker,
}

impl PagedStore {
    /// Create the store with a fresh, already-unlinked backing file in `dir`.
    pub fn create(dir: impl AsRef<Path>, opts: PagedStoreOptions, tag: &'static str) -> Result<Self> {
        if opts.chunk_size == 0 || opts.page_size == 0 {
            return Err(Error::Storage(format!(
                "pool '{tag}': chunk and page sizes must be non-zero"
            )));
        }

        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| Error::Storage(format!("mkdir {}: {e}", dir.display())))?;
        let file = tempfile::tempfile_in(dir)
            .map_err(|e| Error::Storage(format!("create backing file: {e}")))?;

        debug!(
            pool = tag,
            dir = %dir.display(),
            chunk_size = opts.chunk_size,
            page_size = opts.page_size,
            cache_pages = opts.cache_pages,
            max_file_bytes = opts.max_file_bytes,
            "created unlinked backing file"
        );

        Ok(Self {
            tag,
            chunk_size: opts.chunk_size as u64,
            page_size: opts.page_size as u64,
            max_file_bytes: opts.max_file_bytes,
            slots: SlotTable::new(),
            chunks: ChunkAllocator::new(),
            cache: PageCache::new(file, opts.page_size, opts.cache_pages),
            usage: UsageTracker::new(),
        })
    }

    fn blob(&self, id: SlotId) -> Result<Blob> {
        self.slots
            .get(id)
            .copied()
            .ok_or(Error::UnknownSlot { tag: self.tag, id })
    }

    fn addr(&self, blob: &Blob, offset: u64) -> u64 {
        blob.extent.first * self.chunk_size + offset
    }
}

impl BackingStore for PagedStore {
    // Chunks past the high-water mark have never been written and read as
    // zeros; recycled chunks are zeroed here. `clear` therefore adds nothing.
    fn alloc(&mut self, size: usize, _clear: bool) -> Result<SlotId> {
        let chunks = (size as u64).div_ceil(self.chunk_size);

        if !self.chunks.has_free_run(chunks) {
            // The file grows in whole pages.
            let needed = self
                .chunks
                .high_water_after_append(chunks)
                .saturating_mul(self.chunk_size)
                .div_ceil(self.page_size)
                .saturating_mul(self.page_size);
            if needed > self.max_file_bytes {
                return Err(Error::StoreFull {
                    tag: self.tag,
                    requested: needed,
                    ceiling: self.max_file_bytes,
                });
            }
        }

        let placement = self.chunks.allocate(chunks);
        if placement.reused && size > 0 {
            let addr = placement.extent.first * self.chunk_size;
            if let Err(e) = self.cache.zero(addr, size) {
                self.chunks.release(placement.extent);
                return Err(e);
            }
        }

        let id = self.slots.insert(Blob {
            extent: placement.extent,
            size,
        });
        self.usage.record_alloc(size);
        Ok(id)
    }

    fn write(&mut self, id: SlotId, offset: u64, data: &[u8]) -> Result<usize> {
        let blob = self.blob(id)?;
        let n = clip(blob.size, offset, data.len());
        if n > 0 {
            let addr = self.addr(&blob, offset);
            self.cache.write(addr, &data[..n])?;
        }
        Ok(n)
    }

    fn read(&mut self, id: SlotId, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let blob = self.blob(id)?;
        let n = clip(blob.size, offset, buf.len());
        if n > 0 {
            let addr = self.addr(&blob, offset);
            self.cache.read(addr, &mut buf[..n])?;
        }
        Ok(n)
    }

    fn size_of(&self, id: SlotId) -> Result<usize> {
        Ok(self.blob(id)?.size)
    }

    fn free(&mut self, id: SlotId) -> Result<()> {
        let blob = self
            .slots
            .remove(id)
            .ok_or(Error::UnknownSlot { tag: self.tag, id })?;
        self.chunks.release(blob.extent);
        self.usage.record_free(blob.size);
        Ok(())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            live: self.usage.live(),
            live_bytes: self.usage.live_bytes(),
            peak_bytes: self.usage.peak_bytes(),
            released: self.slots.released(),
            file_bytes: self.cache.file_bytes(),
            cache: Some(self.cache.stats()),
        }
    }
}

impl Drop for PagedStore {
    fn drop(&mut self) {
        debug!(
            pool = self.tag,
            live = self.usage.live(),
            file_bytes = self.cache.file_bytes(),
            "discarding backing file"
        );
    }
}
