//! Memory bank behaviour, checked against both backing stores.

use fragbank::{BankConfig, Handle, MemoryBank, PoolConfig, PoolKind};
use tempfile::TempDir;

fn small_pool(chunk_size: usize, page_size: usize) -> PoolConfig {
    PoolConfig {
        chunk_size,
        page_size,
        cache_bytes: 2 * page_size,
        max_file_bytes: 1024 * 1024,
        mem_cap_bytes: None,
    }
}

/// A paged bank with tiny pages so that tests exercise eviction.
fn paged_bank() -> (MemoryBank, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = BankConfig {
        backing_dir: Some(dir.path().to_string_lossy().to_string()),
        short_lived: small_pool(16, 64),
        long_lived: small_pool(32, 128),
    };
    let bank = MemoryBank::make(&cfg).expect("paged bank");
    (bank, dir)
}

/// Run `check` against an in-memory bank and a paged bank.
fn for_each_bank(check: impl Fn(&str, &mut MemoryBank)) {
    let mut bank = MemoryBank::in_memory();
    check("memory", &mut bank);
    bank.release();

    let (mut bank, _dir) = paged_bank();
    check("paged", &mut bank);
    bank.release();
}

#[test]
fn test_roundtrip() {
    for_each_bank(|name, bank| {
        for (size, longlived) in [(1usize, false), (35, false), (50, true), (1000, true)] {
            let data: Vec<u8> = (0..size).map(|i| (i * 7 + 3) as u8).collect();
            let h = bank.alloc(size, false, longlived).unwrap();
            assert_eq!(bank.write(h, 0, &data).unwrap(), size, "{name}");

            let mut buf = vec![0u8; size];
            assert_eq!(bank.read(h, 0, &mut buf).unwrap(), size, "{name}");
            assert_eq!(buf, data, "{name}: size {size}");
        }
    });
}

#[test]
fn test_partial_offset_io() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(100, true, false).unwrap();
        bank.write(h, 10, b"mate").unwrap();
        bank.write(h, 60, b"pair").unwrap();

        let mut buf = [0u8; 4];
        bank.read(h, 10, &mut buf).unwrap();
        assert_eq!(&buf, b"mate", "{name}");
        bank.read(h, 60, &mut buf).unwrap();
        assert_eq!(&buf, b"pair", "{name}");
        bank.read(h, 30, &mut buf).unwrap();
        assert_eq!(buf, [0u8; 4], "{name}");
    });
}

#[test]
fn test_clipping_past_end() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(20, false, true).unwrap();
        assert_eq!(bank.write(h, 20, b"overflow").unwrap(), 0, "{name}");
        assert_eq!(bank.write(h, 500, b"overflow").unwrap(), 0, "{name}");
        assert_eq!(bank.write(h, 16, b"overflow").unwrap(), 4, "{name}");

        let mut buf = [0xEEu8; 8];
        assert_eq!(bank.read(h, 20, &mut buf).unwrap(), 0, "{name}");
        assert_eq!(buf, [0xEE; 8], "{name}: nothing copied on a clipped read");
        assert_eq!(bank.read(h, 16, &mut buf).unwrap(), 4, "{name}");
        assert_eq!(&buf[..4], b"over", "{name}");
    });
}

#[test]
fn test_id_reuse_without_stale_bytes() {
    for_each_bank(|name, bank| {
        for clear in [true, false] {
            let h1 = bank.alloc(40, false, false).unwrap();
            bank.write(h1, 0, &[0xC5; 40]).unwrap();
            let (id1, _) = h1.decode();
            bank.free(h1).unwrap();

            let h2 = bank.alloc(40, clear, false).unwrap();
            let (id2, _) = h2.decode();
            assert_eq!(id2, id1, "{name}: released id is recycled");

            let mut buf = [0xFFu8; 40];
            bank.read(h2, 0, &mut buf).unwrap();
            assert_eq!(buf, [0u8; 40], "{name}: clear={clear}");
            bank.free(h2).unwrap();
        }
    });
}

#[test]
fn test_pool_isolation() {
    for_each_bank(|name, bank| {
        let short = bank.alloc(24, false, false).unwrap();
        let long = bank.alloc(24, false, true).unwrap();
        assert_eq!(short.decode().0, long.decode().0, "{name}: same internal id");
        assert_ne!(short, long);

        bank.write(short, 0, &[1u8; 24]).unwrap();
        bank.write(long, 0, &[2u8; 24]).unwrap();

        let mut buf = [0u8; 24];
        bank.read(short, 0, &mut buf).unwrap();
        assert_eq!(buf, [1u8; 24], "{name}");
        bank.read(long, 0, &mut buf).unwrap();
        assert_eq!(buf, [2u8; 24], "{name}");
    });
}

#[test]
fn test_double_free_detected() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(8, false, true).unwrap();
        bank.free(h).unwrap();
        let err = bank.free(h).unwrap_err();
        assert!(err.is_misuse(), "{name}: {err}");
        assert!(!err.is_exhaustion());

        // The released stack holds the id once: two allocations, two ids.
        let a = bank.alloc(8, false, true).unwrap();
        let b = bank.alloc(8, false, true).unwrap();
        assert_ne!(a, b, "{name}");
        bank.write(a, 0, b"aaaaaaaa").unwrap();
        bank.write(b, 0, b"bbbbbbbb").unwrap();
        let mut buf = [0u8; 8];
        bank.read(a, 0, &mut buf).unwrap();
        assert_eq!(&buf, b"aaaaaaaa", "{name}");
    });
}

#[test]
fn test_size_is_immutable() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(77, false, false).unwrap();
        assert_eq!(bank.size(h).unwrap(), 77, "{name}");
        bank.write(h, 0, &[9u8; 200]).unwrap();
        bank.read(h, 70, &mut [0u8; 30]).unwrap();
        bank.write(h, 1000, b"x").unwrap();
        assert_eq!(bank.size(h).unwrap(), 77, "{name}");
    });
}

#[test]
fn test_size_of_freed_handle_errors() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(5, false, false).unwrap();
        bank.free(h).unwrap();
        assert!(bank.size(h).unwrap_err().is_misuse(), "{name}");
        assert!(bank.read(h, 0, &mut [0u8; 5]).unwrap_err().is_misuse(), "{name}");
        assert!(bank.write(h, 0, b"late!").unwrap_err().is_misuse(), "{name}");
    });
}

#[test]
fn test_short_then_long_scenario() {
    for_each_bank(|name, bank| {
        let first = bank.alloc(35, false, false).unwrap();
        let payload: Vec<u8> = (0..20u8).map(|b| b + 1).collect();
        assert_eq!(bank.write(first, 0, &payload).unwrap(), 20);
        bank.free(first).unwrap();

        let second = bank.alloc(50, false, true).unwrap();
        assert_eq!(first.pool(), PoolKind::ShortLived);
        assert_eq!(second.pool(), PoolKind::LongLived);
        assert_ne!(first.raw() & 1, second.raw() & 1, "{name}");

        let mut buf = [0u8; 20];
        assert_eq!(bank.read(second, 0, &mut buf).unwrap(), 20);
        assert_ne!(buf.to_vec(), payload, "{name}");
        assert_eq!(bank.size(second).unwrap(), 50);
    });
}

#[test]
fn test_zero_size_fragment() {
    for_each_bank(|name, bank| {
        let h = bank.alloc(0, true, true).unwrap();
        assert_eq!(bank.size(h).unwrap(), 0, "{name}");
        assert_eq!(bank.write(h, 0, b"abc").unwrap(), 0, "{name}");
        assert_eq!(bank.read(h, 0, &mut [0u8; 3]).unwrap(), 0, "{name}");
        bank.free(h).unwrap();
    });
}

#[test]
fn test_many_pending_fragments() {
    for_each_bank(|name, bank| {
        let handles: Vec<(Handle, u8)> = (0..500u32)
            .map(|i| {
                let len = 10 + (i % 90) as usize;
                let h = bank.alloc(len, false, i % 3 == 0).unwrap();
                let tag = (i % 251) as u8;
                bank.write(h, 0, &vec![tag; len]).unwrap();
                (h, tag)
            })
            .collect();

        // Free every other fragment, then fill the gaps with new ones.
        for (h, _) in handles.iter().step_by(2) {
            bank.free(*h).unwrap();
        }
        let refill: Vec<Handle> = (0..250)
            .map(|i| bank.alloc(10 + i % 90, false, i % 3 == 0).unwrap())
            .collect();

        for (h, tag) in handles.iter().skip(1).step_by(2) {
            let len = bank.size(*h).unwrap();
            let mut buf = vec![0u8; len];
            bank.read(*h, 0, &mut buf).unwrap();
            assert!(buf.iter().all(|b| b == tag), "{name}: {h}");
        }
        for h in &refill {
            let len = bank.size(*h).unwrap();
            let mut buf = vec![0xFFu8; len];
            bank.read(*h, 0, &mut buf).unwrap();
            assert!(buf.iter().all(|&b| b == 0), "{name}: {h} leaked stale bytes");
        }
        assert_eq!(bank.stats().live(), 500, "{name}");
    });
}

#[test]
fn test_release_with_live_fragments() {
    let (mut bank, dir) = paged_bank();
    for i in 0..50 {
        let h = bank.alloc(100, false, i % 2 == 0).unwrap();
        bank.write(h, 0, &[i as u8; 100]).unwrap();
    }
    bank.release();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
