//! Strongly-typed identifiers and the handle codec.
//!
//! Callers only ever see [`Handle`]. Stores work with [`SlotId`], which is
//! unique within one pool. A handle packs the slot id and the pool selector:
//!
//! ```text
//! handle = (slot_id << 1) | pool_bit      pool_bit: 1 = long-lived, 0 = short-lived
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(SlotId);

/// Largest slot id a handle can carry.
pub const MAX_SLOT_ID: u64 = (u32::MAX >> 1) as u64;

/// Lifetime class of an allocation. Each class owns an independent pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    /// Fragments whose mate is expected within a few records.
    ShortLived,
    /// Fragments whose mate may be far away (other chromosome, secondary alignments).
    LongLived,
}

impl PoolKind {
    pub const fn from_longlived(longlived: bool) -> Self {
        if longlived {
            PoolKind::LongLived
        } else {
            PoolKind::ShortLived
        }
    }

    pub const fn is_longlived(self) -> bool {
        matches!(self, PoolKind::LongLived)
    }

    /// Static tag used in errors and log fields.
    pub const fn tag(self) -> &'static str {
        match self {
            PoolKind::ShortLived => "short-lived",
            PoolKind::LongLived => "long-lived",
        }
    }

    const fn bit(self) -> u32 {
        match self {
            PoolKind::ShortLived => 0,
            PoolKind::LongLived => 1,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Opaque caller-visible reference to one allocation.
///
/// The only way to obtain a handle is [`Handle::encode`]; callers cannot
/// build one from an arbitrary integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Pack `id` and `pool` into a handle.
    ///
    /// Fails if `id` needs more than 31 bits. This is the only overflow check
    /// for the id space and runs on every allocation.
    pub fn encode(id: SlotId, pool: PoolKind) -> Result<Self> {
        if id.get() > MAX_SLOT_ID {
            return Err(Error::IdSpaceExhausted {
                pool: pool.tag(),
                id: id.get(),
            });
        }
        Ok(Handle(((id.get() as u32) << 1) | pool.bit()))
    }

    /// Split the handle back into slot id and pool.
    pub const fn decode(self) -> (SlotId, PoolKind) {
        let pool = if self.0 & 1 == 1 {
            PoolKind::LongLived
        } else {
            PoolKind::ShortLived
        };
        (SlotId::new((self.0 >> 1) as u64), pool)
    }

    pub const fn pool(self) -> PoolKind {
        self.decode().1
    }

    /// Raw 32-bit value, for logging and for records that store handles inline.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}
