//! Capture loop.
//!
//! Ties a frame source, the heartbeat tracker and a sink together and
//! keeps counters other threads can poll while the loop runs.

mod stats;

pub use stats::{CaptureStats, StatsSnapshot};

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::capture::{FrameSource, SerialFrameSource};
use crate::config::{CaptureConfig, OutputFormat};
use crate::decoder::ReadOutcome;
use crate::domain::RawFrame;
use crate::error::CaptureError;
use crate::heartbeat::DeviceHeartbeatTracker;
use crate::sink::{CaptureSink, PcapSink, RawDumpSink, SinkWrite};

/// Runs one capture from a single sniffer into a single output file.
///
/// The loop runs on the calling thread and ends when the source reports
/// end of stream. A transport or output failure ends it with an error.
pub struct CaptureController {
    source: Box<dyn FrameSource>,
    sink: Box<dyn CaptureSink>,
    heartbeat: Arc<DeviceHeartbeatTracker>,
    stats: Arc<CaptureStats>,
}

impl CaptureController {
    pub fn new(
        source: Box<dyn FrameSource>,
        sink: Box<dyn CaptureSink>,
        heartbeat: Arc<DeviceHeartbeatTracker>,
    ) -> Self {
        Self {
            source,
            sink,
            heartbeat,
            stats: Arc::new(CaptureStats::default()),
        }
    }

    /// Open the configured serial device and create the output file.
    pub fn open(
        config: &CaptureConfig,
        output: &Path,
        heartbeat: Arc<DeviceHeartbeatTracker>,
        running: Arc<AtomicBool>,
    ) -> Result<Self, CaptureError> {
        let source = SerialFrameSource::open(&config.device, running)?;
        let sink: Box<dyn CaptureSink> = match config.format {
            OutputFormat::Pcap => Box::new(PcapSink::create(output, config.write_through)?),
            OutputFormat::Raw => Box::new(RawDumpSink::create(output, config.write_through)?),
        };

        Ok(Self::new(Box::new(source), sink, heartbeat))
    }

    /// Counters updated by the loop.
    pub fn stats(&self) -> Arc<CaptureStats> {
        Arc::clone(&self.stats)
    }

    pub fn heartbeat(&self) -> Arc<DeviceHeartbeatTracker> {
        Arc::clone(&self.heartbeat)
    }

    /// Run until the source is exhausted.
    pub fn run(mut self) -> Result<StatsSnapshot, CaptureError> {
        tracing::info!("Starting capture from {}", self.source.name());

        self.sink.begin()?;
        self.stats.set_bytes_written(self.sink.bytes_written());

        let start = Instant::now();
        let result = self.capture_loop(start);

        // flush what we have even if the transport failed
        let finished = self.sink.finish();
        result?;
        finished?;

        let snapshot = self.stats.snapshot();
        tracing::info!(
            "Capture from {} ended: {} frames written, {} skipped, {} bytes",
            self.source.name(),
            snapshot.frames_captured,
            snapshot.frames_skipped,
            snapshot.bytes_written
        );
        Ok(snapshot)
    }

    fn capture_loop(&mut self, start: Instant) -> Result<(), CaptureError> {
        loop {
            let data = match self.source.read_packet()? {
                ReadOutcome::Frame(data) => data,
                ReadOutcome::EndOfStream => {
                    tracing::info!("End of stream on {}", self.source.name());
                    return Ok(());
                }
            };

            let frame = RawFrame::new(data, Utc::now(), start.elapsed());
            self.stats.record_received();
            self.heartbeat.record(&frame.data, frame.received_at);

            match self.sink.write_frame(&frame)? {
                SinkWrite::Written(_) => self.stats.record_captured(),
                SinkWrite::Skipped => self.stats.record_skipped(),
            }
            self.stats.set_bytes_written(self.sink.bytes_written());
        }
    }
}
