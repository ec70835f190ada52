//! BLE sniffer capture.
//!
//! Reads SLIP-framed packets from a serial BLE sniffer, tracks when each
//! advertising device was last heard from, and writes the frames to a pcap
//! file (Nordic BLE link type) or a raw timestamped dump.
//!
//! Pipeline: [`capture`] source → [`decoder`] → [`heartbeat`] → [`sink`],
//! driven by the [`controller`].

pub mod capture;
pub mod config;
pub mod controller;
pub mod convert;
pub mod decoder;
pub mod domain;
pub mod error;
pub mod format;
pub mod heartbeat;
pub mod reporter;
pub mod sink;

pub use capture::{FrameSource, ReaderFrameSource, SerialFrameSource};
pub use config::{CaptureConfig, OutputFormat};
pub use controller::{CaptureController, CaptureStats, StatsSnapshot};
pub use decoder::{FrameDecoder, ReadOutcome};
pub use domain::{DeviceAddress, RawFrame};
pub use error::{CaptureError, ConfigError, EncodeError};
pub use heartbeat::DeviceHeartbeatTracker;
pub use sink::{CaptureSink, PcapSink, RawDumpSink, SinkWrite};
