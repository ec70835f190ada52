//! Frame source over any byte reader.

use std::io::Read;

use super::FrameSource;
use crate::decoder::{FrameDecoder, ReadOutcome};
use crate::error::CaptureError;

/// Decodes frames from an arbitrary reader, such as a file holding a
/// recorded serial byte stream.
pub struct ReaderFrameSource<R: Read> {
    name: String,
    decoder: FrameDecoder<R>,
}

impl<R: Read> ReaderFrameSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            decoder: FrameDecoder::new(reader),
        }
    }
}

impl<R: Read + Send> FrameSource for ReaderFrameSource<R> {
    fn read_packet(&mut self) -> Result<ReadOutcome, CaptureError> {
        self.decoder.read_packet()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
