//! Fixed offsets into the sniffer's native frame layout.
//!
//! Every index used to pick fields out of a frame lives here, next to the
//! minimum frame length that makes it safe to read.

use macaddr::MacAddr6;

/// Index of the native length/metadata byte that the capture format
/// expects to be one smaller.
pub const LENGTH_FIELD: usize = 1;

/// Index of the native byte the capture format does not carry.
pub const DROPPED_BYTE: usize = 22;

/// Byte prepended to every adapted capture payload.
pub const ADAPTATION_PREFIX: u8 = 0x04;

/// Frames shorter than this cannot be re-encoded for the capture file.
pub const ADAPTATION_MIN_LEN: usize = DROPPED_BYTE + 1;

/// First byte of the advertiser address (least significant on the wire).
pub const ADDRESS_START: usize = 23;

/// One past the last byte of the advertiser address.
pub const ADDRESS_END: usize = ADDRESS_START + 6;

/// Frames shorter than this are not used for heartbeat tracking.
pub const HEARTBEAT_MIN_LEN: usize = 24 + 6;

/// Extract the advertiser address from a frame.
///
/// The wire carries the address least-significant byte first; the returned
/// address is in display order. Returns `None` for frames shorter than
/// [`HEARTBEAT_MIN_LEN`].
pub fn device_address(frame: &[u8]) -> Option<MacAddr6> {
    if frame.len() < HEARTBEAT_MIN_LEN {
        return None;
    }

    let mut octets = [0u8; 6];
    octets.copy_from_slice(&frame[ADDRESS_START..ADDRESS_END]);
    octets.reverse();
    Some(MacAddr6::from(octets))
}
