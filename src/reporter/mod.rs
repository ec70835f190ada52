//! Status reporting for running captures.
//!
//! This module defines the `StatusReporter` trait and a console
//! implementation. Reporters only format; sampling the shared counters is
//! done by `StatusSampler`.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::controller::{CaptureStats, StatsSnapshot};
use crate::heartbeat::DeviceHeartbeatTracker;

/// One periodic status sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStatus {
    pub stats: StatsSnapshot,
    /// Frames captured since the previous sample
    pub delta_frames: u64,
    /// Devices seen within the heartbeat window
    pub active_devices: usize,
    /// Devices seen since the capture started
    pub total_devices: usize,
}

/// Trait for reporting capture progress.
pub trait StatusReporter: Send {
    /// Called once the capture thread has been started.
    fn on_start(&self, device: &str, output: &Path);

    /// Report a periodic status sample.
    fn report(&self, status: &CaptureStatus);

    /// Called after the capture loop has ended.
    fn on_stop(&self, status: &CaptureStatus);
}

/// Reads the shared counters and heartbeat map into status samples.
pub struct StatusSampler {
    stats: Arc<CaptureStats>,
    heartbeat: Arc<DeviceHeartbeatTracker>,
    window: Duration,
    last_frames: u64,
}

impl StatusSampler {
    pub fn new(
        stats: Arc<CaptureStats>,
        heartbeat: Arc<DeviceHeartbeatTracker>,
        window: Duration,
    ) -> Self {
        Self {
            stats,
            heartbeat,
            window,
            last_frames: 0,
        }
    }

    /// Take a sample as of `now`.
    pub fn sample(&mut self, now: DateTime<Utc>) -> CaptureStatus {
        let stats = self.stats.snapshot();
        let delta_frames = stats.frames_captured.saturating_sub(self.last_frames);
        self.last_frames = stats.frames_captured;

        CaptureStatus {
            stats,
            delta_frames,
            active_devices: self.heartbeat.active_count_at(self.window, now),
            total_devices: self.heartbeat.total_count(),
        }
    }
}
