//! Sink writing raw timestamped dumps.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{create_output, needs_explicit_sync, CaptureSink, SinkWrite};
use crate::domain::RawFrame;
use crate::error::CaptureError;
use crate::format::raw;

/// Writes every frame unchanged, stamped with its wall-clock receive time.
pub struct RawDumpSink {
    path: PathBuf,
    file: File,
    bytes_written: u64,
    sync_each: bool,
}

impl RawDumpSink {
    pub fn create(path: impl AsRef<Path>, write_through: bool) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file = create_output(&path, write_through)?;

        Ok(Self {
            path,
            file,
            bytes_written: 0,
            sync_each: needs_explicit_sync(write_through),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureSink for RawDumpSink {
    fn begin(&mut self) -> Result<(), CaptureError> {
        tracing::info!("Writing raw capture to {}", self.path.display());
        Ok(())
    }

    fn write_frame(&mut self, frame: &RawFrame) -> Result<SinkWrite, CaptureError> {
        let record = raw::encode_record(frame.received_at, &frame.data);
        self.file.write_all(&record)?;
        if self.sync_each {
            self.file.sync_data()?;
        }
        self.bytes_written += record.len() as u64;
        Ok(SinkWrite::Written(record.len()))
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        self.file.sync_all()?;
        tracing::info!(
            "Closed {} ({} bytes)",
            self.path.display(),
            self.bytes_written
        );
        Ok(())
    }
}
