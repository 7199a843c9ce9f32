#![forbid(unsafe_code)]
//! fragbank-mem: the backing store contract, byte budgets, and pools.
//!
//! Both store variants implement [`BackingStore`]. The in-memory variant lives
//! here; the paged file variant lives in `fragbank-io` so this crate stays
//! free of file I/O.

pub mod error;
pub mod guard;
pub mod memory;
pub mod pool;
pub mod slots;
pub mod store;
pub mod tracking;

pub use error::{Error, Result};
pub use guard::{ByteBudget, Reservation};
pub use memory::MemoryStore;
pub use pool::Pool;
pub use slots::SlotTable;
pub use store::{clip, BackingStore, CacheStats, StoreStats};
