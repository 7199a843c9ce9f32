//! Bank configuration that loaders can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::PoolKind;

/// Tunables for one lifetime pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Allocation granularity of the paged store (bytes).
    pub chunk_size: usize,

    /// Unit of transfer between the page cache and the backing file (bytes).
    pub page_size: usize,

    /// Memory given to the page cache of the paged store (bytes).
    pub cache_bytes: usize,

    /// Ceiling on the backing file size of the paged store (bytes).
    pub max_file_bytes: u64,

    /// Optional cap on live bytes held by the in-memory store.
    pub mem_cap_bytes: Option<usize>,
}

impl PoolConfig {
    /// Defaults for fragments that pair quickly: small chunks and pages.
    pub fn short_lived() -> Self {
        Self {
            chunk_size: 128,
            page_size: 32 * 1024,
            cache_bytes: 64 * 1024 * 1024,
            max_file_bytes: 64 * 1024 * 1024 * 1024,
            mem_cap_bytes: None,
        }
    }

    /// Defaults for fragments that wait a long time for their mate: coarser chunks.
    pub fn long_lived() -> Self {
        Self {
            chunk_size: 512,
            page_size: 128 * 1024,
            cache_bytes: 16 * 1024 * 1024,
            max_file_bytes: 256 * 1024 * 1024 * 1024,
            mem_cap_bytes: None,
        }
    }

    /// Number of pages the cache may hold (at least one).
    pub fn cache_pages(&self) -> usize {
        (self.cache_bytes / self.page_size.max(1)).max(1)
    }

    fn validate(&self, pool: PoolKind) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config(format!("{pool} pool: chunk_size must be > 0")));
        }
        if self.page_size < self.chunk_size {
            return Err(Error::Config(format!(
                "{pool} pool: page_size {} is smaller than chunk_size {}",
                self.page_size, self.chunk_size
            )));
        }
        if self.cache_bytes < self.page_size {
            return Err(Error::Config(format!(
                "{pool} pool: cache_bytes {} cannot hold one {}-byte page",
                self.cache_bytes, self.page_size
            )));
        }
        if self.max_file_bytes < self.page_size as u64 {
            return Err(Error::Config(format!(
                "{pool} pool: max_file_bytes {} is below one page",
                self.max_file_bytes
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Directory for the paged backing files. `None` keeps everything in memory.
    pub backing_dir: Option<String>,

    pub short_lived: PoolConfig,
    pub long_lived: PoolConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            backing_dir: None,
            short_lived: PoolConfig::short_lived(),
            long_lived: PoolConfig::long_lived(),
        }
    }
}

impl BankConfig {
    /// Pure in-memory bank (tests, small inputs).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Paged bank under `dir`, splitting `cache_bytes` between the pools:
    /// the long-lived pool gets an eighth, the short-lived pool four times that.
    pub fn paged(dir: impl Into<String>, cache_bytes: usize) -> Self {
        let mut cfg = Self {
            backing_dir: Some(dir.into()),
            ..Self::default()
        };
        cfg.set_cache_bytes(cache_bytes);
        cfg
    }

    fn set_cache_bytes(&mut self, cache_bytes: usize) {
        let long = cache_bytes / 8;
        self.long_lived.cache_bytes = long;
        self.short_lived.cache_bytes = long.saturating_mul(4);
    }

    pub fn pool(&self, kind: PoolKind) -> &PoolConfig {
        match kind {
            PoolKind::ShortLived => &self.short_lived,
            PoolKind::LongLived => &self.long_lived,
        }
    }

    pub fn is_paged(&self) -> bool {
        self.backing_dir.is_some()
    }

    /// Check the pool settings. Paged limits are only enforced when a backing
    /// directory is configured.
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.backing_dir {
            if dir.trim().is_empty() {
                return Err(Error::Config("backing_dir is empty".into()));
            }
            self.short_lived.validate(PoolKind::ShortLived)?;
            self.long_lived.validate(PoolKind::LongLived)?;
        }
        Ok(())
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FRAGBANK_BACKING_DIR`: directory for paged backing files
    /// - `FRAGBANK_CACHE_BYTES`: total page cache, split between pools
    /// - `FRAGBANK_SHORT_MAX_FILE_BYTES` / `FRAGBANK_LONG_MAX_FILE_BYTES`
    /// - `FRAGBANK_SHORT_MEM_CAP_BYTES` / `FRAGBANK_LONG_MEM_CAP_BYTES`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("FRAGBANK_BACKING_DIR") {
            if !s.trim().is_empty() {
                cfg.backing_dir = Some(s);
            }
        }

        if let Some(v) = env_parse::<usize>("FRAGBANK_CACHE_BYTES") {
            cfg.set_cache_bytes(v);
        }

        if let Some(v) = env_parse::<u64>("FRAGBANK_SHORT_MAX_FILE_BYTES") {
            cfg.short_lived.max_file_bytes = v;
        }

        if let Some(v) = env_parse::<u64>("FRAGBANK_LONG_MAX_FILE_BYTES") {
            cfg.long_lived.max_file_bytes = v;
        }

        if let Some(v) = env_parse::<usize>("FRAGBANK_SHORT_MEM_CAP_BYTES") {
            cfg.short_lived.mem_cap_bytes = Some(v);
        }

        if let Some(v) = env_parse::<usize>("FRAGBANK_LONG_MEM_CAP_BYTES") {
            cfg.long_lived.mem_cap_bytes = Some(v);
        }

        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
