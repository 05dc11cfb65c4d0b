//! Wire-type constants shared by the writer and reader.

use crate::error::ReadError;

/// The 3-bit wire type stored in the low bits of a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Composes a field tag: `(field_id << 3) | wire_type`.
    #[inline]
    pub fn tag(self, field_id: u32) -> u32 {
        (field_id << 3) | self as u32
    }
}

impl TryFrom<u32> for WireType {
    type Error = ReadError;

    fn try_from(value: u32) -> Result<Self, ReadError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(ReadError::InvalidWireType(other)),
        }
    }
}
