//! Sink writing Nordic BLE pcap files.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::{create_output, needs_explicit_sync, CaptureSink, SinkWrite};
use crate::domain::RawFrame;
use crate::error::CaptureError;
use crate::format::PcapEncoder;

/// Transcodes frames into pcap records.
///
/// Frames too short for the link-layer adaptation are skipped.
pub struct PcapSink {
    path: PathBuf,
    encoder: PcapEncoder<File>,
    bytes_written: u64,
    sync_each: bool,
}

impl PcapSink {
    /// Create the output file. The global header is written by `begin`.
    pub fn create(path: impl AsRef<Path>, write_through: bool) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file = create_output(&path, write_through)?;

        Ok(Self {
            path,
            encoder: PcapEncoder::new(file),
            bytes_written: 0,
            sync_each: needs_explicit_sync(write_through),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sync(&mut self) -> Result<(), CaptureError> {
        if self.sync_each {
            self.encoder.get_mut().sync_data()?;
        }
        Ok(())
    }
}

impl CaptureSink for PcapSink {
    fn begin(&mut self) -> Result<(), CaptureError> {
        let written = self.encoder.write_global_header()?;
        self.sync()?;
        self.bytes_written += written as u64;
        tracing::info!("Writing pcap capture to {}", self.path.display());
        Ok(())
    }

    fn write_frame(&mut self, frame: &RawFrame) -> Result<SinkWrite, CaptureError> {
        if !frame.is_adaptable() {
            tracing::debug!("Skipping {}-byte frame, too short for pcap", frame.len());
            return Ok(SinkWrite::Skipped);
        }

        let written = self.encoder.write_frame(frame.offset, &frame.data)?;
        self.sync()?;
        self.bytes_written += written as u64;
        Ok(SinkWrite::Written(written))
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        self.encoder.get_mut().sync_all()?;
        tracing::info!(
            "Closed {} ({} bytes)",
            self.path.display(),
            self.bytes_written
        );
        Ok(())
    }
}
