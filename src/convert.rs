//! Offline conversion of raw dumps into pcap files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::domain::layout;
use crate::error::CaptureError;
use crate::format::{PcapEncoder, RawDumpReader};

/// Outcome of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Records read from the dump
    pub records: u64,
    /// Records written to the pcap
    pub written: u64,
    /// Records too short for the pcap adaptation
    pub skipped: u64,
    /// Offset of a corrupt record that ended the conversion early
    pub corrupt_at: Option<u64>,
}

/// Convert a raw dump stream into a pcap stream.
///
/// Record timestamps become offsets from the first record. A torn final
/// record ends the conversion without an error, as does a corrupt record;
/// the records before it are kept and its offset lands in the summary.
pub fn raw_to_pcap<R: Read, W: Write>(input: R, output: W) -> Result<ConvertSummary, CaptureError> {
    let mut reader = RawDumpReader::new(input);
    let mut encoder = PcapEncoder::new(output);
    encoder.write_global_header()?;

    let mut summary = ConvertSummary::default();
    let mut base = None;

    loop {
        let record = match reader.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(CaptureError::CorruptRecord { offset, length }) => {
                tracing::warn!(
                    "Corrupt record at offset {} (length {}), ending conversion after {} records",
                    offset,
                    length,
                    summary.records
                );
                summary.corrupt_at = Some(offset);
                break;
            }
            Err(e) => return Err(e),
        };
        summary.records += 1;
        let base = *base.get_or_insert(record.timestamp);

        if record.data.len() < layout::ADAPTATION_MIN_LEN {
            summary.skipped += 1;
            continue;
        }

        // a clock stepping backwards clamps to the start
        let offset = (record.timestamp - base).to_std().unwrap_or(Duration::ZERO);
        encoder.write_frame(offset, &record.data)?;
        summary.written += 1;
    }

    encoder.get_mut().flush()?;
    Ok(summary)
}

/// Convert the raw dump at `input` into a pcap file at `output`.
pub fn unpack_file(input: &Path, output: &Path) -> Result<ConvertSummary, CaptureError> {
    let source = File::open(input).map_err(|source| CaptureError::Input {
        path: input.to_path_buf(),
        source,
    })?;
    let target = File::create(output).map_err(|source| CaptureError::Output {
        path: output.to_path_buf(),
        source,
    })?;

    let summary = raw_to_pcap(BufReader::new(source), BufWriter::new(target))?;
    tracing::info!(
        "Converted {} -> {}: {} records, {} written, {} skipped",
        input.display(),
        output.display(),
        summary.records,
        summary.written,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{pcap, raw};
    use chrono::{DateTime, Utc};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000 + millis).unwrap()
    }

    #[test]
    fn test_offsets_relative_to_first_record() {
        let mut dump = raw::encode_record(at(0), &[0u8; 30]);
        dump.extend(raw::encode_record(at(2_250), &[0u8; 23]));

        let mut out = Vec::new();
        let summary = raw_to_pcap(dump.as_slice(), &mut out).unwrap();
        assert_eq!(
            summary,
            ConvertSummary {
                records: 2,
                written: 2,
                skipped: 0,
                corrupt_at: None,
            }
        );

        assert_eq!(&out[..24], &pcap::global_header());
        let first = &out[24..];
        assert_eq!(&first[0..8], &[0u8; 8]);
        let second = &first[16 + 30..];
        assert_eq!(&second[0..4], &2u32.to_le_bytes());
        assert_eq!(&second[4..8], &250_000u32.to_le_bytes());
        assert_eq!(second.len(), 16 + 23);
    }

    #[test]
    fn test_short_records_skipped() {
        // the first record still sets the zero point even when skipped
        let mut dump = raw::encode_record(at(0), &[1, 2, 3]);
        dump.extend(raw::encode_record(at(1_000), &[0u8; 22]));
        dump.extend(raw::encode_record(at(3_000), &[0u8; 23]));

        let mut out = Vec::new();
        let summary = raw_to_pcap(dump.as_slice(), &mut out).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(&out[24..28], &3u32.to_le_bytes());
    }

    #[test]
    fn test_torn_tail_ends_conversion() {
        let mut dump = raw::encode_record(at(0), &[0u8; 30]);
        let mut torn = raw::encode_record(at(10), &[0u8; 30]);
        torn.truncate(20);
        dump.extend(torn);

        let mut out = Vec::new();
        let summary = raw_to_pcap(dump.as_slice(), &mut out).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(out.len(), 24 + 16 + 30);
    }

    #[test]
    fn test_empty_dump_gives_header_only() {
        let mut out = Vec::new();
        let summary = raw_to_pcap(std::io::empty(), &mut out).unwrap();
        assert_eq!(summary, ConvertSummary::default());
        assert_eq!(out.len(), 24);
    }

    #[test]
    fn test_corrupt_record_ends_conversion() {
        let mut dump = raw::encode_record(at(0), &[0u8; 30]);
        dump.extend(raw::encode_record(at(5), &[0u8; 24]));
        dump.extend_from_slice(&raw::to_ticks(at(9)).to_le_bytes());
        dump.extend_from_slice(&(-4i32).to_le_bytes());

        let mut out = Vec::new();
        let summary = raw_to_pcap(dump.as_slice(), &mut out).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.corrupt_at, Some((12 + 30 + 12 + 24) as u64));
        assert_eq!(out.len(), 24 + 16 + 30 + 16 + 24);
    }

    #[test]
    fn test_unpack_missing_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("missing.bin");
        let output = dir.path().join("missing.bin.pcap");

        let result = unpack_file(&input, &output);
        assert!(matches!(result, Err(CaptureError::Input { ref path, .. }) if *path == input));
        assert!(!output.exists());
    }
}
