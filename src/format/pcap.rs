//! pcap writer for Nordic BLE sniffer frames.
//!
//! The pcap format is small enough that it is written by hand. All fields
//! are little endian on every host, so the magic lands on disk as
//! `d4 c3 b2 a1` and readers pick the byte order up from it.
//!
//! Useful resources:
//! * https://wiki.wireshark.org/Development/LibpcapFileFormat
//! * https://www.tcpdump.org/linktypes.html

use std::io::Write;
use std::time::Duration;

use crate::domain::layout;
use crate::error::{CaptureError, EncodeError};

pub const MAGIC: u32 = 0xa1b2_c3d4;
pub const VERSION_MAJOR: u16 = 2;
pub const VERSION_MINOR: u16 = 4;
pub const SNAPLEN: u32 = 0x0000_ffff;
/// LINKTYPE_NORDIC_BLE
pub const LINKTYPE_NORDIC_BLE: u32 = 272;

pub const GLOBAL_HEADER_LEN: usize = 24;
pub const RECORD_HEADER_LEN: usize = 16;

/// Bytes of the pcap global header.
pub fn global_header() -> [u8; GLOBAL_HEADER_LEN] {
    let mut header = [0u8; GLOBAL_HEADER_LEN];
    header[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    header[4..6].copy_from_slice(&VERSION_MAJOR.to_le_bytes());
    header[6..8].copy_from_slice(&VERSION_MINOR.to_le_bytes());
    // thiszone and sigfigs stay zero
    header[16..20].copy_from_slice(&SNAPLEN.to_le_bytes());
    header[20..24].copy_from_slice(&LINKTYPE_NORDIC_BLE.to_le_bytes());
    header
}

/// Reshape a native sniffer frame into the Nordic BLE capture payload.
///
/// Prepends the adaptation byte, decrements the native length byte, and
/// drops the byte the capture header has no room for. The result is the
/// same length as the input.
pub fn adapt_payload(frame: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if frame.len() < layout::ADAPTATION_MIN_LEN {
        return Err(EncodeError::FrameTooShort {
            minimum: layout::ADAPTATION_MIN_LEN,
            actual: frame.len(),
        });
    }

    let mut payload = Vec::with_capacity(frame.len());
    payload.push(layout::ADAPTATION_PREFIX);
    payload.extend_from_slice(&frame[..layout::DROPPED_BYTE]);
    payload[1 + layout::LENGTH_FIELD] = frame[layout::LENGTH_FIELD].wrapping_sub(1);
    payload.extend_from_slice(&frame[layout::DROPPED_BYTE + 1..]);
    Ok(payload)
}

/// Encode one record: header followed by the adapted payload.
///
/// Microseconds are derived from whole milliseconds of `offset`.
pub fn encode_record(offset: Duration, frame: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let payload = adapt_payload(frame)?;
    let seconds = offset.as_secs() as u32;
    let micros = offset.subsec_millis() * 1000;
    let len = payload.len() as u32;

    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    record.extend_from_slice(&seconds.to_le_bytes());
    record.extend_from_slice(&micros.to_le_bytes());
    // captured and original length are always equal
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Streams a pcap file: one global header, then records.
pub struct PcapEncoder<W: Write> {
    inner: W,
    header_written: bool,
}

impl<W: Write> PcapEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            header_written: false,
        }
    }

    /// Write the global header. Fails if it has already been written.
    pub fn write_global_header(&mut self) -> Result<usize, CaptureError> {
        if self.header_written {
            return Err(EncodeError::HeaderAlreadyWritten.into());
        }
        self.inner.write_all(&global_header())?;
        self.header_written = true;
        Ok(GLOBAL_HEADER_LEN)
    }

    /// Write one frame as a record, returning the bytes written.
    ///
    /// Frames shorter than [`layout::ADAPTATION_MIN_LEN`] are rejected
    /// without writing anything; callers are expected to skip them.
    pub fn write_frame(&mut self, offset: Duration, frame: &[u8]) -> Result<usize, CaptureError> {
        if !self.header_written {
            return Err(EncodeError::HeaderNotWritten.into());
        }
        let record = encode_record(offset, frame)?;
        self.inner.write_all(&record)?;
        Ok(record.len())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn test_global_header_layout() {
        let mut enc = PcapEncoder::new(Vec::new());
        assert_eq!(enc.write_global_header().unwrap(), 24);

        let out = enc.into_inner();
        assert_eq!(
            out,
            vec![
                0xd4, 0xc3, 0xb2, 0xa1, // magic
                0x02, 0x00, 0x04, 0x00, // version 2.4
                0x00, 0x00, 0x00, 0x00, // thiszone
                0x00, 0x00, 0x00, 0x00, // sigfigs
                0xff, 0xff, 0x00, 0x00, // snaplen
                0x10, 0x01, 0x00, 0x00, // linktype 272
            ]
        );
    }

    #[test]
    fn test_header_only_once() {
        let mut enc = PcapEncoder::new(Vec::new());
        enc.write_global_header().unwrap();
        assert!(matches!(
            enc.write_global_header(),
            Err(CaptureError::Encode(EncodeError::HeaderAlreadyWritten))
        ));
        assert_eq!(enc.get_ref().len(), 24);
    }

    #[test]
    fn test_frame_before_header_rejected() {
        let mut enc = PcapEncoder::new(Vec::new());
        assert!(matches!(
            enc.write_frame(Duration::ZERO, &[0u8; 30]),
            Err(CaptureError::Encode(EncodeError::HeaderNotWritten))
        ));
        assert!(enc.get_ref().is_empty());
    }

    #[test]
    fn test_minimum_frame_adaptation() {
        let mut frame: Vec<u8> = (0..23).map(|i| 0x10 + i as u8).collect();
        frame[1] = 5;

        let payload = adapt_payload(&frame).unwrap();
        assert_eq!(payload.len(), 23);
        assert_eq!(payload[0], 0x04);
        assert_eq!(payload[1], 0x10);
        assert_eq!(payload[2], 4);
        assert_eq!(&payload[3..], &frame[2..22]);
        // input is left untouched
        assert_eq!(frame[1], 5);
    }

    #[test]
    fn test_write_minimum_frame() {
        let mut frame = vec![0u8; 23];
        frame[1] = 5;

        let mut enc = PcapEncoder::new(Vec::new());
        enc.write_global_header().unwrap();
        let written = enc.write_frame(Duration::ZERO, &frame).unwrap();
        assert_eq!(written, 16 + 23);

        let out = enc.into_inner();
        let record = &out[24..];
        assert_eq!(u32_at(record, 8), 23);
        assert_eq!(u32_at(record, 12), 23);
        assert_eq!(record[16], 0x04);
        assert_eq!(record[18], 4);
    }

    #[test]
    fn test_byte_22_is_dropped() {
        let frame: Vec<u8> = (0..40).collect();
        let payload = adapt_payload(&frame).unwrap();

        assert_eq!(payload.len(), 40);
        assert_eq!(&payload[1..23], &[0, 0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21]);
        assert!(!payload[1..].contains(&22));
        assert_eq!(&payload[23..], &frame[23..]);
    }

    #[test]
    fn test_length_byte_wraps() {
        let frame = vec![0u8; 23];
        let payload = adapt_payload(&frame).unwrap();
        assert_eq!(payload[2], 0xff);
    }

    #[test]
    fn test_short_frame_rejected() {
        assert_eq!(
            adapt_payload(&[0u8; 22]),
            Err(EncodeError::FrameTooShort {
                minimum: 23,
                actual: 22
            })
        );

        let mut enc = PcapEncoder::new(Vec::new());
        enc.write_global_header().unwrap();
        assert!(enc.write_frame(Duration::ZERO, &[0u8; 22]).is_err());
        assert_eq!(enc.get_ref().len(), 24);
    }

    #[test]
    fn test_timestamp_split() {
        let record = encode_record(Duration::new(75, 123_456_789), &[0u8; 23]).unwrap();
        assert_eq!(u32_at(&record, 0), 75);
        // sub-millisecond precision is not kept
        assert_eq!(u32_at(&record, 4), 123_000);
    }
}
