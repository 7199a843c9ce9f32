//! Paged backing: spilling, file ceilings, and statistics.

use fragbank::{BankConfig, Error, MemoryBank, PoolConfig};

fn tiny_pool(max_file_bytes: u64) -> PoolConfig {
    PoolConfig {
        chunk_size: 64,
        page_size: 256,
        cache_bytes: 512,
        max_file_bytes,
        mem_cap_bytes: None,
    }
}

fn config(dir: &std::path::Path, short_max: u64, long_max: u64) -> BankConfig {
    BankConfig {
        backing_dir: Some(dir.to_string_lossy().to_string()),
        short_lived: tiny_pool(short_max),
        long_lived: tiny_pool(long_max),
    }
}

#[test]
fn test_fragments_survive_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let mut bank = MemoryBank::make(&config(dir.path(), 1 << 20, 1 << 20)).unwrap();

    // 2 cached pages of 256 bytes against ~25 KiB of fragments.
    let handles: Vec<_> = (0..200u32)
        .map(|i| {
            let h = bank.alloc(128, false, i % 2 == 1).unwrap();
            bank.write(h, 0, &[(i % 256) as u8; 128]).unwrap();
            h
        })
        .collect();

    for (i, h) in handles.iter().enumerate() {
        let mut buf = [0u8; 128];
        assert_eq!(bank.read(*h, 0, &mut buf).unwrap(), 128);
        assert_eq!(buf, [(i % 256) as u8; 128], "fragment {i}");
    }

    let stats = bank.stats();
    for pool in [&stats.short_lived, &stats.long_lived] {
        let cache = pool.cache.expect("paged pools report cache stats");
        assert!(cache.evictions > 0);
        assert!(cache.writebacks > 0);
        assert!(pool.file_bytes >= 256);
        assert_eq!(pool.live, 100);
        assert_eq!(pool.live_bytes, 100 * 128);
    }
}

#[test]
fn test_ceiling_is_per_pool() {
    let dir = tempfile::tempdir().unwrap();
    let mut bank = MemoryBank::make(&config(dir.path(), 1024, 64 * 1024)).unwrap();

    let mut short = Vec::new();
    for _ in 0..4 {
        short.push(bank.alloc(256, false, false).unwrap());
    }
    let err = bank.alloc(1, false, false).unwrap_err();
    assert!(err.is_exhaustion(), "{err}");
    assert!(matches!(
        err,
        Error::StoreFull {
            tag: "short-lived",
            ceiling: 1024,
            ..
        }
    ));

    // The long-lived pool has its own ceiling and keeps accepting fragments.
    for _ in 0..16 {
        bank.alloc(256, false, true).unwrap();
    }

    // Freeing short-lived fragments makes room again.
    bank.free(short.pop().unwrap()).unwrap();
    let h = bank.alloc(200, false, false).unwrap();
    assert_eq!(bank.size(h).unwrap(), 200);
}

#[test]
fn test_failed_alloc_leaves_state_intact() {
    let dir = tempfile::tempdir().unwrap();
    let mut bank = MemoryBank::make(&config(dir.path(), 1024, 1024)).unwrap();
    let h = bank.alloc(512, false, true).unwrap();
    bank.write(h, 0, &[3u8; 512]).unwrap();

    assert!(bank.alloc(1024, false, true).is_err());
    let stats = bank.stats();
    assert_eq!(stats.long_lived.live, 1);
    assert_eq!(stats.long_lived.released, 0);

    let mut buf = [0u8; 512];
    bank.read(h, 0, &mut buf).unwrap();
    assert_eq!(buf, [3u8; 512]);
}

#[test]
fn test_peak_and_released_counters() {
    let dir = tempfile::tempdir().unwrap();
    let mut bank = MemoryBank::make(&config(dir.path(), 1 << 20, 1 << 20)).unwrap();
    let a = bank.alloc(100, false, false).unwrap();
    let b = bank.alloc(300, false, false).unwrap();
    bank.free(a).unwrap();
    bank.free(b).unwrap();

    let stats = bank.stats().short_lived;
    assert_eq!(stats.live, 0);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.peak_bytes, 400);
    assert_eq!(stats.released, 2);
}

#[test]
fn test_stats_serialize() {
    let bank = MemoryBank::in_memory();
    let text = serde_json::to_string(&bank.stats()).unwrap();
    assert!(text.contains("short_lived"));
    assert!(text.contains("long_lived"));
}

#[test]
fn test_missing_backing_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut bank = MemoryBank::make(&config(&nested, 1 << 20, 1 << 20)).unwrap();
    let h = bank.alloc(10, false, false).unwrap();
    bank.write(h, 0, b"0123456789").unwrap();
    assert!(nested.is_dir());
    assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
}
