//! Byte budget + RAII reservations for the in-memory store.
//!
//! Every live in-memory allocation holds a [`Reservation`] for its size.
//! Dropping the reservation returns the bytes to the budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared inner state for the budget.
struct BudgetInner {
    capacity: Option<usize>,
    used: AtomicUsize,
}

impl BudgetInner {
    fn try_acquire(&self, bytes: usize) -> bool {
        loop {
            let cur = self.used.load(Ordering::Relaxed);
            let next = cur.saturating_add(bytes);
            if matches!(self.capacity, Some(cap) if next > cap) {
                return false;
            }
            if self
                .used
                .compare_exchange(cur, next, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Live-byte cap for one pool. `None` capacity means unlimited.
#[derive(Clone)]
pub struct ByteBudget {
    inner: Arc<BudgetInner>,
    tag: &'static str,
}

impl ByteBudget {
    pub fn new(capacity: Option<usize>, tag: &'static str) -> Self {
        Self {
            inner: Arc::new(BudgetInner {
                capacity,
                used: AtomicUsize::new(0),
            }),
            tag,
        }
    }

    pub fn unlimited(tag: &'static str) -> Self {
        Self::new(None, tag)
    }

    /// Reserve `bytes`, or fail with [`Error::BudgetExceeded`].
    pub fn try_reserve(&self, bytes: usize) -> Result<Reservation> {
        if bytes > 0 && !self.inner.try_acquire(bytes) {
            return Err(Error::BudgetExceeded {
                tag: self.tag,
                requested: bytes,
                capacity: self.inner.capacity.unwrap_or(usize::MAX),
                used: self.used_bytes(),
            });
        }
        Ok(Reservation {
            inner: Arc::clone(&self.inner),
            bytes,
        })
    }

    /// Current usage (advisory).
    pub fn used_bytes(&self) -> usize {
        self.inner.used.load(Ordering::Relaxed)
    }

    pub fn capacity_bytes(&self) -> Option<usize> {
        self.inner.capacity
    }
}

/// Bytes held against a [`ByteBudget`]; released on drop.
pub struct Reservation {
    inner: Arc<BudgetInner>,
    bytes: usize,
}

impl Reservation {
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.inner.release(self.bytes);
            self.bytes = 0;
        }
    }
}
