//! Two-pool memory bank.
//!
//! Handles are minted here and nowhere else. Every other call decodes the
//! handle and forwards to the pool named by its pool bit.

use fragbank_core::{BankConfig, Handle, PoolKind};
use fragbank_io::{PagedStore, PagedStoreOptions};
use fragbank_mem::{BackingStore, ByteBudget, MemoryStore, Pool, Result, StoreStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Usage snapshot of both pools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStats {
    pub short_lived: StoreStats,
    pub long_lived: StoreStats,
}

impl BankStats {
    pub fn live(&self) -> usize {
        self.short_lived.live + self.long_lived.live
    }

    pub fn live_bytes(&self) -> u64 {
        self.short_lived.live_bytes + self.long_lived.live_bytes
    }
}

/// Scratch store for fragments waiting on their mate.
///
/// Single-threaded: every mutating call takes `&mut self`. Wrap the whole bank
/// in a mutex to share it between threads.
pub struct MemoryBank {
    short_lived: Pool,
    long_lived: Pool,
}

impl MemoryBank {
    /// Build both pools from `cfg`. Without a backing directory both pools
    /// are in memory; otherwise each gets its own paged file.
    pub fn make(cfg: &BankConfig) -> Result<Self> {
        cfg.validate()?;
        let bank = Self {
            short_lived: build_pool(cfg, PoolKind::ShortLived)?,
            long_lived: build_pool(cfg, PoolKind::LongLived)?,
        };
        debug!(
            paged = cfg.is_paged(),
            backing_dir = cfg.backing_dir.as_deref().unwrap_or("-"),
            "memory bank ready"
        );
        Ok(bank)
    }

    /// Unbounded in-memory bank.
    pub fn in_memory() -> Self {
        Self {
            short_lived: Pool::in_memory(PoolKind::ShortLived),
            long_lived: Pool::in_memory(PoolKind::LongLived),
        }
    }

    /// Reserve `size` bytes in the pool chosen by `longlived`.
    ///
    /// Aborts the process if the pool's id no longer fits in a handle: the
    /// id cannot be represented, and wrapping it would alias a live fragment.
    pub fn alloc(&mut self, size: usize, clear: bool, longlived: bool) -> Result<Handle> {
        let kind = PoolKind::from_longlived(longlived);
        let id = self.pool_mut(kind).alloc(size, clear)?;
        match Handle::encode(id, kind) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                error!(pool = kind.tag(), id = id.get(), error = %e, "fragment id space exhausted");
                std::process::abort()
            }
        }
    }

    /// Copy `data` into the fragment at `offset`; bytes past its end are dropped.
    pub fn write(&mut self, handle: Handle, offset: u64, data: &[u8]) -> Result<usize> {
        let (id, kind) = handle.decode();
        self.pool_mut(kind).write(id, offset, data)
    }

    /// Copy fragment bytes from `offset` into `buf`; returns how many were available.
    pub fn read(&mut self, handle: Handle, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let (id, kind) = handle.decode();
        self.pool_mut(kind).read(id, offset, buf)
    }

    pub fn size(&self, handle: Handle) -> Result<usize> {
        let (id, kind) = handle.decode();
        self.pool(kind).size(id)
    }

    /// Release the fragment. The handle must not be used afterwards.
    pub fn free(&mut self, handle: Handle) -> Result<()> {
        let (id, kind) = handle.decode();
        self.pool_mut(kind).free(id)
    }

    pub fn stats(&self) -> BankStats {
        BankStats {
            short_lived: self.short_lived.stats(),
            long_lived: self.long_lived.stats(),
        }
    }

    /// Tear the bank down. Fragments still live are discarded with it.
    pub fn release(self) {
        let stats = self.stats();
        debug!(
            live = stats.live(),
            live_bytes = stats.live_bytes(),
            "releasing memory bank"
        );
    }

    fn pool(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::ShortLived => &self.short_lived,
            PoolKind::LongLived => &self.long_lived,
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut Pool {
        match kind {
            PoolKind::ShortLived => &mut self.short_lived,
            PoolKind::LongLived => &mut self.long_lived,
        }
    }
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn build_pool(cfg: &BankConfig, kind: PoolKind) -> Result<Pool> {
    let pool_cfg = cfg.pool(kind);
    let store: Box<dyn BackingStore> = match &cfg.backing_dir {
        Some(dir) => Box::new(PagedStore::create(
            dir,
            PagedStoreOptions::from_pool_config(pool_cfg),
            kind.tag(),
        )?),
        None => Box::new(MemoryStore::with_budget(
            ByteBudget::new(pool_cfg.mem_cap_bytes, kind.tag()),
            kind.tag(),
        )),
    };
    Ok(Pool::new(kind, store))
}
