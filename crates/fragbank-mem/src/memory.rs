//! In-memory backing store.
//!
//! Each blob is an owned, zero-initialized buffer charged against the pool's
//! [`ByteBudget`]. Used for tests and for inputs small enough to skip paging.

use fragbank_core::SlotId;

use crate::error::{Error, Result};
use crate::guard::{ByteBudget, Reservation};
use crate::slots::SlotTable;
use crate::store::{clip, BackingStore, StoreStats};
use crate::tracking::UsageTracker;

struct Blob {
    bytes: Box<[u8]>,
    _reservation: Reservation,
}

pub struct MemoryStore {
    tag: &'static str,
    budget: ByteBudget,
    slots: SlotTable<Blob>,
    usage: UsageTracker,
}

impl MemoryStore {
    /// Unbounded store (process memory is the only limit).
    pub fn new(tag: &'static str) -> Self {
        Self::with_budget(ByteBudget::unlimited(tag), tag)
    }

    /// Store whose live bytes are capped by `budget`.
    pub fn with_budget(budget: ByteBudget, tag: &'static str) -> Self {
        Self {
            tag,
            budget,
            slots: SlotTable::new(),
            usage: UsageTracker::new(),
        }
    }

    pub fn budget(&self) -> &ByteBudget {
        &self.budget
    }

    fn blob(&self, id: SlotId) -> Result<&Blob> {
        self.slots
            .get(id)
            .ok_or(Error::UnknownSlot { tag: self.tag, id })
    }

    fn blob_mut(&mut self, id: SlotId) -> Result<&mut Blob> {
        let tag = self.tag;
        self.slots
            .get_mut(id)
            .ok_or(Error::UnknownSlot { tag, id })
    }
}

impl BackingStore for MemoryStore {
    // Fresh buffers are always zeroed, so `clear` needs no extra work here.
    fn alloc(&mut self, size: usize, _clear: bool) -> Result<SlotId> {
        let reservation = self.budget.try_reserve(size)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(size).map_err(|_| Error::AllocFailed {
            tag: self.tag,
            bytes: size,
        })?;
        buf.resize(size, 0u8);

        let id = self.slots.insert(Blob {
            bytes: buf.into_boxed_slice(),
            _reservation: reservation,
        });
        self.usage.record_alloc(size);
        Ok(id)
    }

    fn write(&mut self, id: SlotId, offset: u64, data: &[u8]) -> Result<usize> {
        let blob = self.blob_mut(id)?;
        let n = clip(blob.bytes.len(), offset, data.len());
        if n > 0 {
            let start = offset as usize;
            blob.bytes[start..start + n].copy_from_slice(&data[..n]);
        }
        Ok(n)
    }

    fn read(&mut self, id: SlotId, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let blob = self.blob(id)?;
        let n = clip(blob.bytes.len(), offset, buf.len());
        if n > 0 {
            let start = offset as usize;
            buf[..n].copy_from_slice(&blob.bytes[start..start + n]);
        }
        Ok(n)
    }

    fn size_of(&self, id: SlotId) -> Result<usize> {
        Ok(self.blob(id)?.bytes.len())
    }

    fn free(&mut self, id: SlotId) -> Result<()> {
        let blob = self
            .slots
            .remove(id)
            .ok_or(Error::UnknownSlot { tag: self.tag, id })?;
        self.usage.record_free(blob.bytes.len());
        Ok(())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            live: self.usage.live(),
            live_bytes: self.usage.live_bytes(),
            peak_bytes: self.usage.peak_bytes(),
            released: self.slots.released(),
            file_bytes: 0,
            cache: None,
        }
    }
}
