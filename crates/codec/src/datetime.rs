//! Bit-packed calendar fields and card-identifier rendering

use std::fmt;

use serde::Serialize;

use crate::block::CodecError;

/// Date packed into 16 bits: `yyyyyyym mmmddddd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackedDate {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

impl PackedDate {
    pub fn from_raw(value: u16) -> Self {
        Self {
            year: (value >> 9) as u8,
            month: ((value >> 5) & 0x0F) as u8,
            day: (value & 0x1F) as u8,
        }
    }

    pub fn to_raw(&self) -> u16 {
        (u16::from(self.year) << 9) | (u16::from(self.month) << 5) | u16::from(self.day)
    }
}

impl fmt::Display for PackedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time packed into 16 bits: `hhhhhmmm mmmsssss`, seconds stored halved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackedTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl PackedTime {
    pub fn from_raw(value: u16) -> Self {
        Self {
            hour: (value >> 11) as u8,
            minute: ((value >> 5) & 0x3F) as u8,
            second: ((value & 0x1F) * 2) as u8,
        }
    }

    pub fn to_raw(&self) -> u16 {
        (u16::from(self.hour) << 11)
            | (u16::from(self.minute) << 5)
            | (u16::from(self.second / 2))
    }
}

impl fmt::Display for PackedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Render an 8-byte card identifier (IDi) in its display form.
///
/// Layout: 4 bytes of opaque id (upper hex), a packed issue date rendered as
/// `yymmdd`, and a big-endian serial zero-padded to 5 digits, all
/// concatenated without separators.
pub fn render_card_id(id: &[u8]) -> Result<String, CodecError> {
    if id.len() < 8 {
        return Err(CodecError::WrongIdLength { got: id.len() });
    }

    let head = hex::encode_upper(&id[0..4]);

    let packed = u16::from_be_bytes([id[4], id[5]]);
    let date = PackedDate::from_raw(packed);
    // The identifier's year field is 6 bits; the high bit of the packed
    // value is not part of the year.
    let date_part = format!("{:02}{:02}{:02}", date.year & 0x3F, date.month, date.day);

    let serial = u16::from_be_bytes([id[6], id[7]]);

    Ok(format!("{head}{date_part}{serial:05}"))
}

/// Format a two-byte BCD-style time field as `hh:mm`.
pub fn bcd_time(high: u8, low: u8) -> String {
    format!("{high:02X}:{low:02X}")
}
