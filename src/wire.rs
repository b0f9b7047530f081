//! Protobuf wire primitives: varints, length-delimited payloads and field tags.

use crate::error::{DecodeError, EncodeError};

/// Longest varint a 64-bit value can need.
pub const MAX_VARINT_LEN: usize = 10;

/// Largest field number protobuf allows.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

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
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Like [`encode_varint`] for callers holding wider integers.
pub fn try_encode_varint(value: u128, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    let value = u64::try_from(value).map_err(|_| EncodeError::ValueTooLarge(value))?;
    encode_varint(value, buf);
    Ok(())
}

pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Reads a varint starting at `offset`, returning the value and the number of
/// bytes it occupied.
pub fn decode_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = bytes.get(offset + i) else {
            return Err(DecodeError::Truncated {
                offset: offset + i,
                needed: 1,
            });
        };
        // the tenth byte may only carry the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(DecodeError::Overflow(offset));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DecodeError::Overflow(offset))
}

pub fn encode_length_delimited(bytes: &[u8], buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    try_encode_varint(bytes.len() as u128, buf)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

pub fn decode_length_delimited(
    bytes: &[u8],
    offset: usize,
) -> Result<(&[u8], usize), DecodeError> {
    let (len, prefix) = decode_varint(bytes, offset)?;
    let start = offset + prefix;
    let remaining = bytes.len().saturating_sub(start);
    let len = usize::try_from(len).unwrap_or(usize::MAX);
    if len > remaining {
        return Err(DecodeError::Truncated {
            offset: start,
            needed: len - remaining,
        });
    }
    Ok((&bytes[start..start + len], prefix + len))
}

pub fn encode_tag(field: u32, wire_type: WireType, buf: &mut Vec<u8>) {
    encode_varint((u64::from(field) << 3) | wire_type as u64, buf);
}

pub fn encode_varint_field(field: u32, value: u64, buf: &mut Vec<u8>) {
    encode_tag(field, WireType::Varint, buf);
    encode_varint(value, buf);
}

pub fn encode_bytes_field(field: u32, bytes: &[u8], buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    encode_tag(field, WireType::LengthDelimited, buf);
    encode_length_delimited(bytes, buf)
}

/// Cursor over one message body.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (value, used) = decode_varint(self.buf, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let (payload, used) = decode_length_delimited(self.buf, self.pos)?;
        self.pos += used;
        Ok(payload)
    }

    /// Reads the next field key. Group wire types are rejected here since
    /// nothing in the format uses them.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), DecodeError> {
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 || field > u64::from(MAX_FIELD_NUMBER) {
            return Err(DecodeError::InvalidTag(key));
        }
        let field = field as u32;
        let bits = (key & 0x7) as u8;
        match WireType::from_bits(bits) {
            Some(WireType::StartGroup | WireType::EndGroup) | None => {
                Err(DecodeError::UnsupportedWireType {
                    field,
                    wire_type: bits,
                })
            }
            Some(wire_type) => Ok((field, wire_type)),
        }
    }

    fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        let remaining = self.buf.len().saturating_sub(self.pos);
        if n > remaining {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n - remaining,
            });
        }
        self.pos += n;
        Ok(())
    }

    /// Skips the value of a field whose tag was just read.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.advance(8),
            WireType::LengthDelimited => self.read_bytes().map(drop),
            WireType::Fixed32 => self.advance(4),
            WireType::StartGroup | WireType::EndGroup => Err(DecodeError::UnsupportedWireType {
                field: 0,
                wire_type: wire_type as u8,
            }),
        }
    }
}
