#![forbid(unsafe_code)]
//! fragbank: a spillable scratch store for paired-read fragments.
//!
//! ```no_run
//! use fragbank::{BankConfig, MemoryBank};
//!
//! # fn main() -> fragbank::Result<()> {
//! let mut bank = MemoryBank::make(&BankConfig::paged("/tmp/fragbank", 256 << 20))?;
//! let h = bank.alloc(35, false, false)?;
//! bank.write(h, 0, b"ACGT")?;
//! let mut buf = [0u8; 4];
//! bank.read(h, 0, &mut buf)?;
//! bank.free(h)?;
//! bank.release();
//! # Ok(())
//! # }
//! ```

pub use fragbank_bank::{BankStats, MemoryBank};
pub use fragbank_core::{BankConfig, Handle, PoolConfig, PoolKind, SlotId};
pub use fragbank_io::{PagedStore, PagedStoreOptions};
pub use fragbank_mem::{
    BackingStore, ByteBudget, CacheStats, Error, MemoryStore, Pool, Result, StoreStats,
};
