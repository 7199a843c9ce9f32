#![forbid(unsafe_code)]
//! fragbank-bank: the memory bank facade.
//!
//! A [`MemoryBank`] owns a short-lived and a long-lived pool and routes every
//! call by the pool bit of the handle (or by the `longlived` flag at alloc).

pub mod bank;

pub use bank::{BankStats, MemoryBank};
