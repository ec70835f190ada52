//! Capture sinks.
//!
//! This module defines the `CaptureSink` trait and its two file-backed
//! implementations. The controller hands every decoded frame to a sink and
//! never looks at the output format itself.

mod pcap_sink;
mod raw_sink;

pub use pcap_sink::PcapSink;
pub use raw_sink::RawDumpSink;

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::domain::RawFrame;
use crate::error::CaptureError;

/// What a sink did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkWrite {
    /// The frame was persisted using this many bytes
    Written(usize),
    /// The frame cannot be represented in this sink's format
    Skipped,
}

/// Trait for persisting decoded frames.
///
/// Implementations write each frame through to storage before returning;
/// nothing is buffered across calls.
pub trait CaptureSink: Send {
    /// Prepare the output. Called once, before the first frame.
    fn begin(&mut self) -> Result<(), CaptureError>;

    /// Persist one frame.
    fn write_frame(&mut self, frame: &RawFrame) -> Result<SinkWrite, CaptureError>;

    /// Size of the output so far.
    fn bytes_written(&self) -> u64;

    /// Flush anything still pending. Called once the loop ends.
    fn finish(&mut self) -> Result<(), CaptureError>;
}

/// Create (or truncate) an output file.
///
/// With `write_through`, Linux opens the file `O_DSYNC` so every write
/// reaches stable storage before returning.
pub(crate) fn create_output(path: &Path, write_through: bool) -> Result<File, CaptureError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    if write_through {
        sync_writes(&mut options);
    }

    options.open(path).map_err(|source| CaptureError::Output {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(target_os = "linux")]
fn sync_writes(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.custom_flags(libc::O_DSYNC);
}

#[cfg(not(target_os = "linux"))]
fn sync_writes(_options: &mut OpenOptions) {}

/// Whether a write-through file still needs an explicit sync per record.
pub(crate) fn needs_explicit_sync(write_through: bool) -> bool {
    write_through && !cfg!(target_os = "linux")
}
