//! Wire-level helpers: response markers and length-coded integers.

use thiserror::Error;

/// First body byte of an OK packet.
pub const OK_MARKER: u8 = 0x00;
/// First body byte of an error packet.
pub const ERR_MARKER: u8 = 0xff;
/// First body byte of an EOF packet.
pub const EOF_MARKER: u8 = 0xfe;
/// An EOF packet body is shorter than this.
pub const EOF_MAX_LEN: usize = 9;

const LCB_NULL: u8 = 251;
const LCB_U16: u8 = 252;
const LCB_U24: u8 = 253;
const LCB_U64: u8 = 254;

/// Whether a packet body has the EOF shape.
pub fn is_eof(body: &[u8]) -> bool {
    body.first() == Some(&EOF_MARKER) && body.len() < EOF_MAX_LEN
}

/// Value of a length-coded binary integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCoded {
    Null,
    Value(u64),
}

impl LengthCoded {
    pub fn value(self) -> Option<u64> {
        match self {
            LengthCoded::Null => None,
            LengthCoded::Value(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LengthCodedError {
    #[error("no bytes to decode")]
    Empty,

    #[error("marker {marker} needs {needed} bytes, have {have}")]
    Truncated { marker: u8, needed: usize, have: usize },

    #[error("{0:#04x} is not a length-coded marker")]
    InvalidMarker(u8),
}

/// Decode a length-coded binary integer from the start of `data`.
///
/// Returns the value and the number of bytes it occupied.
pub fn read_length_coded(data: &[u8]) -> Result<(LengthCoded, usize), LengthCodedError> {
    let &marker = data.first().ok_or(LengthCodedError::Empty)?;

    let width = match marker {
        0..=250 => return Ok((LengthCoded::Value(marker as u64), 1)),
        LCB_NULL => return Ok((LengthCoded::Null, 1)),
        LCB_U16 => 2,
        LCB_U24 => 3,
        LCB_U64 => 8,
        other => return Err(LengthCodedError::InvalidMarker(other)),
    };

    let needed = 1 + width;
    if data.len() < needed {
        return Err(LengthCodedError::Truncated {
            marker,
            needed,
            have: data.len(),
        });
    }

    let mut bytes = [0u8; 8];
    bytes[..width].copy_from_slice(&data[1..needed]);
    Ok((LengthCoded::Value(u64::from_le_bytes(bytes)), needed))
}

/// Error code carried by an error packet (bytes 1..3, little-endian).
pub fn error_code(body: &[u8]) -> Option<u16> {
    match body {
        [ERR_MARKER, lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Affected-row count carried by an OK packet.
pub fn affected_rows(body: &[u8]) -> Option<u64> {
    match body.split_first() {
        Some((&OK_MARKER, rest)) => read_length_coded(rest).ok().and_then(|(v, _)| v.value()),
        _ => None,
    }
}
