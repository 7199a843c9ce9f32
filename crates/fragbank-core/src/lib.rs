#![forbid(unsafe_code)]
//! fragbank-core: ids, the handle codec, and bank configuration.
//!
//! Everything here is plain data. Storage lives in `fragbank-mem` (trait,
//! in-memory store, pools) and `fragbank-io` (the paged file store).

pub mod config;
pub mod error;
pub mod id;

pub use config::{BankConfig, PoolConfig};
pub use error::{Error, Result};
pub use id::{Handle, PoolKind, SlotId, MAX_SLOT_ID};
