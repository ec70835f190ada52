//! Raw timestamped frame dump.
//!
//! Each record is an `i64` timestamp in 100 ns ticks since
//! 0001-01-01T00:00:00Z, an `i32` payload length, then the payload, all
//! little endian. Nothing is transformed, so a raw dump can be converted
//! to pcap later.

use std::io::{self, Read};

use chrono::{DateTime, Utc};

use crate::error::CaptureError;

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01 and the Unix epoch
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

pub const RECORD_HEADER_LEN: usize = 12;

/// Convert a wall-clock time to dump ticks.
pub fn to_ticks(timestamp: DateTime<Utc>) -> i64 {
    UNIX_EPOCH_TICKS
        + timestamp.timestamp() * TICKS_PER_SECOND
        + i64::from(timestamp.timestamp_subsec_nanos() / 100)
}

/// Convert dump ticks back to a wall-clock time.
pub fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let since_epoch = ticks.checked_sub(UNIX_EPOCH_TICKS)?;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Encode one dump record.
pub fn encode_record(timestamp: DateTime<Utc>, payload: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + payload.len());
    record.extend_from_slice(&to_ticks(timestamp).to_le_bytes());
    record.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    record.extend_from_slice(payload);
    record
}

/// One record read back from a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: DateTime<Utc>,
    pub data: Vec<u8>,
}

/// Sequential reader for raw dumps.
///
/// A record cut short by the end of the file, as left behind when the
/// writer was killed mid-record, is treated as the end of the data.
pub struct RawDumpReader<R: Read> {
    inner: R,
    offset: u64,
}

impl<R: Read> RawDumpReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record, or `None` at end of data.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>, CaptureError> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        let got = self.read_full(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < RECORD_HEADER_LEN {
            tracing::warn!(
                "Truncated record header at offset {} ({} of {} bytes), treating as end of data",
                self.offset,
                got,
                RECORD_HEADER_LEN
            );
            return Ok(None);
        }

        let ticks = i64::from_le_bytes([
            header[0], header[1], header[2], header[3], header[4], header[5], header[6], header[7],
        ]);
        let length = i32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        let corrupt = CaptureError::CorruptRecord {
            offset: self.offset,
            length,
        };
        if length < 0 {
            return Err(corrupt);
        }
        let Some(timestamp) = from_ticks(ticks) else {
            return Err(corrupt);
        };

        let mut data = vec![0u8; length as usize];
        let got = self.read_full(&mut data)?;
        if got < data.len() {
            tracing::warn!(
                "Truncated record payload at offset {} ({} of {} bytes), treating as end of data",
                self.offset,
                got,
                length
            );
            return Ok(None);
        }

        self.offset += (RECORD_HEADER_LEN + data.len()) as u64;
        Ok(Some(RawRecord { timestamp, data }))
    }

    /// Fill `buf` as far as the stream allows, returning the bytes read.
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for RawDumpReader<R> {
    type Item = Result<RawRecord, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn sample_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 27, 14, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(1_234_500)
    }

    #[test]
    fn test_unix_epoch_ticks() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        assert_eq!(to_ticks(epoch), UNIX_EPOCH_TICKS);
        assert_eq!(from_ticks(UNIX_EPOCH_TICKS), Some(epoch));
    }

    #[test]
    fn test_ticks_keep_100ns_precision() {
        let ts = sample_time();
        assert_eq!(from_ticks(to_ticks(ts)), Some(ts));
    }

    #[test]
    fn test_record_layout() {
        let ts = DateTime::from_timestamp(1, 0).unwrap();
        let record = encode_record(ts, &[0xaa, 0xbb]);

        assert_eq!(record.len(), 14);
        assert_eq!(
            i64::from_le_bytes(record[0..8].try_into().unwrap()),
            UNIX_EPOCH_TICKS + TICKS_PER_SECOND
        );
        assert_eq!(&record[8..12], &[2, 0, 0, 0]);
        assert_eq!(&record[12..], &[0xaa, 0xbb]);
    }

    #[test]
    fn test_read_records_in_order() {
        let ts = sample_time();
        let mut dump = encode_record(ts, &[1, 2, 3]);
        dump.extend(encode_record(ts, &[]));
        dump.extend(encode_record(ts, &[4]));

        let records: Vec<_> = RawDumpReader::new(Cursor::new(dump))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data, vec![1, 2, 3]);
        assert!(records[1].data.is_empty());
        assert_eq!(records[2].data, vec![4]);
        assert_eq!(records[2].timestamp, ts);
    }

    #[test]
    fn test_torn_payload_is_end_of_data() {
        let ts = sample_time();
        let mut dump = encode_record(ts, &[1, 2, 3]);
        let mut torn = encode_record(ts, &[9; 10]);
        torn.truncate(15);
        dump.extend(torn);

        let mut reader = RawDumpReader::new(Cursor::new(dump));
        assert!(reader.next_record().unwrap().is_some());
        assert_eq!(reader.offset(), 15);
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_torn_header_is_end_of_data() {
        let mut dump = encode_record(sample_time(), &[1]);
        dump.extend_from_slice(&[0, 1, 2, 3, 4]);

        let mut reader = RawDumpReader::new(Cursor::new(dump));
        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_negative_length_is_corrupt() {
        let mut dump = to_ticks(sample_time()).to_le_bytes().to_vec();
        dump.extend_from_slice(&(-1i32).to_le_bytes());

        let mut reader = RawDumpReader::new(Cursor::new(dump));
        assert!(matches!(
            reader.next_record(),
            Err(CaptureError::CorruptRecord { offset: 0, length: -1 })
        ));
    }
}
