//! On-disk formats for captured frames.
//!
//! `pcap` writes the standard capture container with the sniffer's
//! link-layer adaptation; `raw` is the lossless timestamped dump.

pub mod pcap;
pub mod raw;

pub use pcap::PcapEncoder;
pub use raw::{RawDumpReader, RawRecord};
