//! LRU page cache over the backing file.
//!
//! The file is addressed in whole pages. A miss loads the page from the file,
//! or yields a zero page if the file does not reach that far yet. Dirty pages
//! are written back when evicted, which is the only way the file grows.
//! Each written page records a blake3 digest that is checked when the page
//! is loaded again.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::num::NonZeroUsize;

use fragbank_mem::{CacheStats, Error, Result};
use lru::LruCache;

struct Page {
    data: Box<[u8]>,
    dirty: bool,
}

pub struct PageCache {
    file: File,
    page_size: usize,
    pages: LruCache<u64, Page>,
    /// Pages `[0, file_pages)` exist in the file.
    file_pages: u64,
    checksums: HashMap<u64, blake3::Hash>,
    stats: CacheStats,
}

impl PageCache {
    pub fn new(file: File, page_size: usize, capacity_pages: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity_pages).unwrap_or(NonZeroUsize::MIN);
        Self {
            file,
            page_size,
            pages: LruCache::new(capacity),
            file_pages: 0,
            checksums: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Fill `buf` with the bytes at byte address `addr`.
    pub fn read(&mut self, addr: u64, buf: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < buf.len() {
            let (page_no, at, n) = self.span(addr + done as u64, buf.len() - done);
            let page = self.page(page_no)?;
            buf[done..done + n].copy_from_slice(&page.data[at..at + n]);
            done += n;
        }
        Ok(())
    }

    /// Store `data` at byte address `addr`.
    pub fn write(&mut self, addr: u64, data: &[u8]) -> Result<()> {
        let mut done = 0;
        while done < data.len() {
            let (page_no, at, n) = self.span(addr + done as u64, data.len() - done);
            let page = self.page(page_no)?;
            page.data[at..at + n].copy_from_slice(&data[done..done + n]);
            page.dirty = true;
            done += n;
        }
        Ok(())
    }

    /// Zero `len` bytes starting at byte address `addr`.
    pub fn zero(&mut self, addr: u64, len: usize) -> Result<()> {
        let mut done = 0;
        while done < len {
            let (page_no, at, n) = self.span(addr + done as u64, len - done);
            let page = self.page(page_no)?;
            page.data[at..at + n].fill(0);
            page.dirty = true;
            done += n;
        }
        Ok(())
    }

    pub fn file_bytes(&self) -> u64 {
        self.file_pages * self.page_size as u64
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// (page number, offset inside the page, bytes available in that page)
    fn span(&self, pos: u64, remaining: usize) -> (u64, usize, usize) {
        let page_size = self.page_size as u64;
        let at = (pos % page_size) as usize;
        (pos / page_size, at, (self.page_size - at).min(remaining))
    }

    fn page(&mut self, page_no: u64) -> Result<&mut Page> {
        if self.pages.contains(&page_no) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            if self.pages.len() >= self.pages.cap().get() {
                self.evict_one()?;
            }
            let page = self.load(page_no)?;
            self.pages.put(page_no, page);
        }
        self.pages
            .get_mut(&page_no)
            .ok_or_else(|| Error::Storage(format!("page {page_no} vanished from cache")))
    }

    fn evict_one(&mut self) -> Result<()> {
        let Some((page_no, page)) = self.pages.pop_lru() else {
            return Ok(());
        };
        if page.dirty {
            if let Err(e) = self.write_back(page_no, &page.data) {
                // Keep the only copy of the data resident.
                self.pages.put(page_no, page);
                return Err(e);
            }
        }
        self.stats.evictions += 1;
        Ok(())
    }

    fn load(&mut self, page_no: u64) -> Result<Page> {
        let mut data = vec![0u8; self.page_size].into_boxed_slice();
        if page_no < self.file_pages {
            self.file
                .seek(SeekFrom::Start(page_no * self.page_size as u64))
                .map_err(|e| Error::Storage(format!("seek page {page_no}: {e}")))?;
            self.file
                .read_exact(&mut data)
                .map_err(|e| Error::Storage(format!("read page {page_no}: {e}")))?;
            if let Some(expected) = self.checksums.get(&page_no) {
                if blake3::hash(&data) != *expected {
                    return Err(Error::ChecksumMismatch { page: page_no });
                }
            }
        }
        Ok(Page { data, dirty: false })
    }

    fn write_back(&mut self, page_no: u64, data: &[u8]) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(page_no * self.page_size as u64))
            .map_err(|e| Error::Storage(format!("seek page {page_no}: {e}")))?;
        self.file
            .write_all(data)
            .map_err(|e| Error::Storage(format!("write page {page_no}: {e}")))?;
        self.checksums.insert(page_no, blake3::hash(data));
        self.file_pages = self.file_pages.max(page_no + 1);
        self.stats.writebacks += 1;
        Ok(())
    }
}
