//! Serial-port frame source for the sniffer hardware.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serialport::{FlowControl, SerialPort};

use super::FrameSource;
use crate::decoder::{FrameDecoder, ReadOutcome};
use crate::error::CaptureError;

/// Baud rate the sniffer firmware talks at
pub const BAUD_RATE: u32 = 460_800;

/// How long a single port read may wait before the shutdown flag is checked
const READ_POLL: Duration = Duration::from_millis(100);

/// Frame source reading from the sniffer's serial port.
///
/// The port is opened with hardware flow control and RTS asserted, and is
/// closed when the source is dropped.
pub struct SerialFrameSource {
    device: String,
    decoder: FrameDecoder<PortReader<Box<dyn SerialPort>>>,
}

impl SerialFrameSource {
    /// Open `device` at [`BAUD_RATE`].
    ///
    /// Once `running` is cleared, the next read poll reports end of stream.
    pub fn open(device: &str, running: Arc<AtomicBool>) -> Result<Self, CaptureError> {
        let open_error = |source| CaptureError::Open {
            device: device.to_string(),
            source,
        };

        let mut port = serialport::new(device, BAUD_RATE)
            .flow_control(FlowControl::Hardware)
            .timeout(READ_POLL)
            .open()
            .map_err(open_error)?;
        port.write_request_to_send(true).map_err(open_error)?;

        tracing::info!("Opened serial device {} at {} baud", device, BAUD_RATE);

        Ok(Self {
            device: device.to_string(),
            decoder: FrameDecoder::new(PortReader::new(port, running)),
        })
    }
}

impl FrameSource for SerialFrameSource {
    fn read_packet(&mut self) -> Result<ReadOutcome, CaptureError> {
        self.decoder.read_packet()
    }

    fn name(&self) -> &str {
        &self.device
    }
}

impl Drop for SerialFrameSource {
    fn drop(&mut self) {
        tracing::info!("Closed serial device {}", self.device);
    }
}

/// Blocking reader over the port.
///
/// Read timeouts are retried, so a silent port blocks until data arrives or
/// the running flag is cleared.
pub(crate) struct PortReader<P: Read> {
    port: P,
    running: Arc<AtomicBool>,
}

impl<P: Read> PortReader<P> {
    pub(crate) fn new(port: P, running: Arc<AtomicBool>) -> Self {
        Self { port, running }
    }
}

impl<P: Read> Read for PortReader<P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Ok(0);
            }
            match self.port.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
                other => return other,
            }
        }
    }
}
