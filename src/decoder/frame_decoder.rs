//! Frame decoder over a blocking byte stream.

use std::io::{BufReader, ErrorKind, Read};

use super::slip::{self, Unescaped};
use crate::error::CaptureError;

/// Result of asking the decoder for the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete frame body, markers and escapes removed
    Frame(Vec<u8>),
    /// The transport closed; no more frames will arrive
    EndOfStream,
}

/// Decodes SLIP-framed packets from any byte stream.
///
/// Reads block for as long as the underlying reader blocks. A stream that
/// never delivers a START byte keeps the caller waiting indefinitely.
pub struct FrameDecoder<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> FrameDecoder<R> {
    /// Create a decoder reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame from the stream.
    ///
    /// Returns [`ReadOutcome::EndOfStream`] when the reader is exhausted,
    /// including when it closes partway through a frame. Any other I/O
    /// error is returned as [`CaptureError::Transport`].
    pub fn read_packet(&mut self) -> Result<ReadOutcome, CaptureError> {
        if !self.advance_to_start()? {
            return Ok(ReadOutcome::EndOfStream);
        }

        match self.read_frame_body()? {
            Some(body) => Ok(ReadOutcome::Frame(body)),
            None => Ok(ReadOutcome::EndOfStream),
        }
    }

    /// Discard bytes up to and including the next START marker.
    ///
    /// Returns `false` if the stream ended first.
    pub fn advance_to_start(&mut self) -> Result<bool, CaptureError> {
        let mut discarded = 0usize;
        while let Some(b) = self.next_byte()? {
            if b == slip::START {
                if discarded > 0 {
                    tracing::debug!("Skipped {} bytes before frame start", discarded);
                }
                return Ok(true);
            }
            discarded += 1;
        }
        Ok(false)
    }

    /// Accumulate one frame body after a START has been consumed.
    ///
    /// The END marker terminates the body and is not included. Returns
    /// `None` if the stream ended before END arrived; the partial body is
    /// dropped.
    pub fn read_frame_body(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        let mut body = Vec::new();

        loop {
            let Some(b) = self.next_byte()? else {
                if !body.is_empty() {
                    tracing::debug!("Stream closed inside a frame, dropped {} bytes", body.len());
                }
                return Ok(None);
            };

            match b {
                slip::END => return Ok(Some(body)),
                slip::ESC => {
                    let Some(code) = self.next_byte()? else {
                        return Ok(None);
                    };
                    match slip::unescape(code) {
                        Unescaped::Byte(byte) => body.push(byte),
                        Unescaped::Unknown(code) => {
                            // Unknown escapes decode to END
                            tracing::debug!(
                                "Unknown escape code {:#04x} after {} bytes",
                                code,
                                body.len()
                            );
                            body.push(slip::END);
                        }
                    }
                }
                _ => body.push(b),
            }
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, CaptureError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) => match e.kind() {
                    ErrorKind::Interrupted => continue,
                    ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe => return Ok(None),
                    _ => return Err(CaptureError::Transport(e)),
                },
            }
        }
    }
}
