//! Decoded sniffer frames.

use std::time::Duration;

use chrono::{DateTime, Utc};
use macaddr::MacAddr6;

use super::layout;

/// Hardware address of an advertising device, in display order.
pub type DeviceAddress = MacAddr6;

/// Format an address for display, e.g. `AA:BB:CC:DD:EE:FF`.
pub fn format_address(address: DeviceAddress) -> String {
    format!("{}", address).to_uppercase()
}

/// One decoded link-layer frame, stamped at the moment it was received.
///
/// Frames are written through to a sink and then dropped; nothing holds on
/// to them after the write call.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Unescaped frame body
    pub data: Vec<u8>,
    /// Wall-clock receive time
    pub received_at: DateTime<Utc>,
    /// Monotonic time since the capture started
    pub offset: Duration,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, received_at: DateTime<Utc>, offset: Duration) -> Self {
        Self {
            data,
            received_at,
            offset,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Address of the advertiser, if the frame is long enough to carry one.
    pub fn device_address(&self) -> Option<DeviceAddress> {
        layout::device_address(&self.data)
    }

    /// Whether the frame can be adapted into a capture-file record.
    pub fn is_adaptable(&self) -> bool {
        self.data.len() >= layout::ADAPTATION_MIN_LEN
    }
}
