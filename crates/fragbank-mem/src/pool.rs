//! A lifetime pool: one backing store selected by a [`PoolKind`].

use fragbank_core::{PoolKind, SlotId};

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::store::{BackingStore, StoreStats};

pub struct Pool {
    kind: PoolKind,
    store: Box<dyn BackingStore>,
}

impl Pool {
    pub fn new(kind: PoolKind, store: Box<dyn BackingStore>) -> Self {
        Self { kind, store }
    }

    /// Pool over an unbounded [`MemoryStore`].
    pub fn in_memory(kind: PoolKind) -> Self {
        Self::new(kind, Box::new(MemoryStore::new(kind.tag())))
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn alloc(&mut self, size: usize, clear: bool) -> Result<SlotId> {
        self.store.alloc(size, clear)
    }

    pub fn write(&mut self, id: SlotId, offset: u64, data: &[u8]) -> Result<usize> {
        self.store.write(id, offset, data)
    }

    pub fn read(&mut self, id: SlotId, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.store.read(id, offset, buf)
    }

    pub fn size(&self, id: SlotId) -> Result<usize> {
        self.store.size_of(id)
    }

    pub fn free(&mut self, id: SlotId) -> Result<()> {
        self.store.free(id)
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}
