//! Domain models for BLE sniffer capture.
//!
//! These types describe what comes off the sniffer, independent of the
//! transport it arrived on or the file it ends up in.

mod frame;
pub mod layout;

pub use frame::{format_address, DeviceAddress, RawFrame};
