use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for a read session, shared between a world and whoever reports.
#[derive(Debug, Default)]
pub struct ReadMetrics {
    // Decode Stats
    pub total_chunks_decoded: AtomicUsize,
    pub total_decode_time_us: AtomicU64,
    pub max_decode_time_us: AtomicU64,
    pub total_decode_failures: AtomicUsize,

    // Bytes
    pub total_compressed_bytes: AtomicU64,
    pub total_inflated_bytes: AtomicU64,

    // Cache
    pub total_cache_hits: AtomicUsize,
    pub total_cache_misses: AtomicUsize,

    // Session
    pub start_time: Option<Instant>,
}

impl ReadMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// One chunk read from disk and decoded, with its payload sizes.
    pub fn record_decode(&self, duration: Duration, compressed: usize, inflated: usize) {
        self.total_chunks_decoded.fetch_add(1, Ordering::Relaxed);
        let us = duration.as_micros() as u64;
        self.total_decode_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_decode_time_us.fetch_max(us, Ordering::Relaxed);
        self.total_compressed_bytes.fetch_add(compressed as u64, Ordering::Relaxed);
        self.total_inflated_bytes.fetch_add(inflated as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total_decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.total_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.total_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn chunks_decoded(&self) -> usize {
        self.total_chunks_decoded.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.total_cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.total_cache_misses.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.total_decode_failures.load(Ordering::Relaxed)
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();
        let decoded = self.total_chunks_decoded.load(Ordering::Relaxed);
        let failures = self.total_decode_failures.load(Ordering::Relaxed);
        let decode_total = self.total_decode_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let decode_max = self.max_decode_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let decode_avg = if decoded > 0 { decode_total / decoded as f64 } else { 0.0 };

        let compressed = self.total_compressed_bytes.load(Ordering::Relaxed);
        let inflated = self.total_inflated_bytes.load(Ordering::Relaxed);
        let ratio = if compressed > 0 { inflated as f64 / compressed as f64 } else { 0.0 };

        let hits = self.total_cache_hits.load(Ordering::Relaxed);
        let misses = self.total_cache_misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests > 0 { (hits as f64 / total_requests as f64) * 100.0 } else { 0.0 };

        format!(
            "worldread Read Report\n\
             =====================\n\
             Session Duration: {:.2?}\n\n\
             [Decode]\n\
             Chunks Decoded: {}\n\
             Failures: {}\n\
             Total Time: {:.2} ms\n\
             Avg Time: {:.2} ms/chunk\n\
             Max Time: {:.2} ms\n\n\
             [Bytes]\n\
             Compressed: {}\n\
             Inflated: {}\n\
             Ratio: {:.2}x\n\n\
             [Cache]\n\
             Hits: {}\n\
             Misses: {}\n\
             Hit Rate: {:.1}%\n",
            uptime,
            decoded, failures, decode_total, decode_avg, decode_max,
            compressed, inflated, ratio,
            hits, misses, hit_rate
        )
    }
}
