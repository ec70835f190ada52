//! Frame source abstraction.
//!
//! This module defines the `FrameSource` trait and provides a serial
//! implementation for the sniffer hardware plus a reader-backed one for
//! replaying recorded byte streams. The controller only sees the trait,
//! so tests can feed it frames without a device attached.

mod reader_source;
mod serial_source;

pub use reader_source::ReaderFrameSource;
pub use serial_source::{SerialFrameSource, BAUD_RATE};

use crate::decoder::ReadOutcome;
use crate::error::CaptureError;

/// Trait for anything that yields decoded sniffer frames.
pub trait FrameSource: Send {
    /// Block until the next frame arrives or the stream ends.
    fn read_packet(&mut self) -> Result<ReadOutcome, CaptureError>;

    /// Human-readable name of the source, for logs.
    fn name(&self) -> &str;
}
