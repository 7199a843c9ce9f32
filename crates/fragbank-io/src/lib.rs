#![forbid(unsafe_code)]
//! fragbank-io: the paged, file-backed implementation of
//! `fragbank_mem::BackingStore`.
//!
//! Blobs are laid out in fixed-size chunks inside an anonymous temporary file
//! and accessed through an LRU page cache, so a pool can hold more fragments
//! than fit in memory.

pub mod paged;

pub use paged::{PagedStore, PagedStoreOptions};
