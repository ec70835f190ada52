//! Frame decoding module.
//!
//! Turns the sniffer's byte stream into discrete frame bodies.

mod frame_decoder;
pub mod slip;

pub use frame_decoder::{FrameDecoder, ReadOutcome};
