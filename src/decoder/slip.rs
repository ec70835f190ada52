//! SLIP-style framing used by the sniffer's serial protocol.
//!
//! Unlike RFC 1055 SLIP, frames have distinct start and end markers, and an
//! escaped byte is sent as the reserved value plus one.

/// Start-of-frame marker
pub const START: u8 = 0xAB;
/// End-of-frame marker
pub const END: u8 = 0xBC;
/// Escape marker
pub const ESC: u8 = 0xCD;

/// Escaped START
pub const ESC_START: u8 = START + 1;
/// Escaped END
pub const ESC_END: u8 = END + 1;
/// Escaped ESC
pub const ESC_ESC: u8 = ESC + 1;

/// Resolve the byte that followed an ESC.
///
/// Unknown escape codes decode to END, which closes the frame early.
pub fn unescape(code: u8) -> Unescaped {
    match code {
        ESC_START => Unescaped::Byte(START),
        ESC_END => Unescaped::Byte(END),
        ESC_ESC => Unescaped::Byte(ESC),
        other => Unescaped::Unknown(other),
    }
}

/// Result of resolving an escape code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unescaped {
    Byte(u8),
    Unknown(u8),
}

/// Wrap a payload in START/END markers, escaping every reserved byte.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 2);
    out.push(START);
    for &b in payload {
        match b {
            START => out.extend_from_slice(&[ESC, ESC_START]),
            END => out.extend_from_slice(&[ESC, ESC_END]),
            ESC => out.extend_from_slice(&[ESC, ESC_ESC]),
            _ => out.push(b),
        }
    }
    out.push(END);
    out
}
