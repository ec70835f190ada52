//! Running capture counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters written by the capture thread and read by anyone.
///
/// Each counter is individually atomic; a snapshot is not a transaction
/// across counters.
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames_received: AtomicU64,
    frames_captured: AtomicU64,
    frames_skipped: AtomicU64,
    bytes_written: AtomicU64,
}

/// Point-in-time copy of [`CaptureStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames decoded from the transport
    pub frames_received: u64,
    /// Frames persisted by the sink
    pub frames_captured: u64,
    /// Frames the sink could not represent
    pub frames_skipped: u64,
    /// Output file size
    pub bytes_written: u64,
}

impl CaptureStats {
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_captured(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_bytes_written(&self, bytes: u64) {
        self.bytes_written.store(bytes, Ordering::Relaxed);
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
