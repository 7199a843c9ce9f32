//! Live/peak usage counters for one store.
//!
//! Keep this cheap. Stores are single-threaded, so plain counters suffice.

#[derive(Debug, Default, Clone)]
pub struct UsageTracker {
    live: usize,
    live_bytes: u64,
    peak_bytes: u64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_alloc(&mut self, bytes: usize) {
        self.live += 1;
        self.live_bytes += bytes as u64;
        if self.live_bytes > self.peak_bytes {
            self.peak_bytes = self.live_bytes;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            bytes,
            live = self.live,
            live_bytes = self.live_bytes,
            peak = self.peak_bytes,
            "slot alloc"
        );
    }

    pub fn record_free(&mut self, bytes: usize) {
        self.live = self.live.saturating_sub(1);
        self.live_bytes = self.live_bytes.saturating_sub(bytes as u64);
        #[cfg(feature = "tracing")]
        tracing::trace!(bytes, live = self.live, live_bytes = self.live_bytes, "slot free");
    }

    pub fn live(&self) -> usize {
        self.live
    }

    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }
}
