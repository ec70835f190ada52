//! Error types for the capture pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a capture loop or a conversion.
///
/// A cleanly closed transport is not an error; it is reported as
/// [`ReadOutcome::EndOfStream`](crate::decoder::ReadOutcome::EndOfStream).
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to open serial device {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    #[error("failed to read capture input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write capture output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("corrupt raw record at offset {offset}: length {length}")]
    CorruptRecord { offset: u64, length: i32 },
}

/// Errors raised by the capture-file encoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("frame too short for link-layer adaptation: expected at least {minimum} bytes, got {actual}")]
    FrameTooShort { minimum: usize, actual: usize },

    #[error("global header already written")]
    HeaderAlreadyWritten,

    #[error("global header must be written before any record")]
    HeaderNotWritten,
}

/// Errors loading the capture configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}
