//! Chunk extent allocator for the paged store.
//!
//! The backing file is an array of fixed-size chunks. An allocation takes a
//! run of contiguous chunks. Freed runs are filed by length; a request takes
//! the smallest run that fits and returns the unused tail to the free lists.
//! Neighbouring free runs are never merged.

use std::collections::BTreeMap;

/// A run of contiguous chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub first: u64,
    pub chunks: u64,
}

impl Extent {
    pub const EMPTY: Extent = Extent {
        first: 0,
        chunks: 0,
    };
}

/// Outcome of [`ChunkAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub extent: Extent,
    /// The run came from the free lists and may hold bytes of an earlier blob.
    pub reused: bool,
}

#[derive(Debug, Default)]
pub struct ChunkAllocator {
    /// First chunk never handed out.
    high_water: u64,
    free: BTreeMap<u64, Vec<u64>>,
    free_chunks: u64,
}

impl ChunkAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks the high-water mark would reach if `chunks` had to be appended.
    pub fn high_water_after_append(&self, chunks: u64) -> u64 {
        self.high_water.saturating_add(chunks)
    }

    /// Whether a run of `chunks` can be served from the free lists.
    pub fn has_free_run(&self, chunks: u64) -> bool {
        chunks == 0 || self.free.range(chunks..).next().is_some()
    }

    /// Take a run of `chunks` chunks, best fit first, appending otherwise.
    pub fn allocate(&mut self, chunks: u64) -> Placement {
        if chunks == 0 {
            return Placement {
                extent: Extent::EMPTY,
                reused: false,
            };
        }

        if let Some(len) = self.free.range(chunks..).next().map(|(len, _)| *len) {
            if let Some(first) = self.pop_run(len) {
                if len > chunks {
                    self.push_run(first + chunks, len - chunks);
                }
                return Placement {
                    extent: Extent { first, chunks },
                    reused: true,
                };
            }
        }

        let first = self.high_water;
        self.high_water += chunks;
        Placement {
            extent: Extent { first, chunks },
            reused: false,
        }
    }

    pub fn release(&mut self, extent: Extent) {
        if extent.chunks == 0 {
            return;
        }
        self.push_run(extent.first, extent.chunks);
    }

    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    pub fn free_chunks(&self) -> u64 {
        self.free_chunks
    }

    fn push_run(&mut self, first: u64, len: u64) {
        self.free.entry(len).or_default().push(first);
        self.free_chunks += len;
    }

    fn pop_run(&mut self, len: u64) -> Option<u64> {
        let runs = self.free.get_mut(&len)?;
        let first = runs.pop();
        if runs.is_empty() {
            self.free.remove(&len);
        }
        if first.is_some() {
            self.free_chunks -= len;
        }
        first
    }
}
