use fragbank_core::SlotId;
use thiserror::Error;

/// Result type local to fragbank-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("memory budget exceeded for pool '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    BudgetExceeded {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("allocation failed for {bytes} bytes (pool '{tag}')")]
    AllocFailed { tag: &'static str, bytes: usize },

    #[error("backing file of pool '{tag}' would grow to {requested} bytes, ceiling is {ceiling}")]
    StoreFull {
        tag: &'static str,
        requested: u64,
        ceiling: u64,
    },

    #[error("{id} is not live in pool '{tag}' (never allocated or already freed)")]
    UnknownSlot { tag: &'static str, id: SlotId },

    #[error("backing storage error: {0}")]
    Storage(String),

    #[error("checksum mismatch on page {page}")]
    ChecksumMismatch { page: u64 },

    #[error(transparent)]
    Core(#[from] fragbank_core::Error),
}

impl Error {
    /// Out of memory, budget, or file space. The caller may free fragments and retry.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Error::BudgetExceeded { .. } | Error::AllocFailed { .. } | Error::StoreFull { .. }
        )
    }

    /// Handle misuse by the caller (unknown id, double free).
    pub fn is_misuse(&self) -> bool {
        matches!(self, Error::UnknownSlot { .. })
    }
}
