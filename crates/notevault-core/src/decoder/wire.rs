//! Protobuf-style wire walking
//!
//! Only the framing is understood here: tags, varints and length prefixes.
//! What the fields mean is decided by the caller.

use super::FormatError;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LENGTH_DELIMITED: u64 = 2;
const WIRE_FIXED32: u64 = 5;

/// Upper bound on fields per message, protects against runaway input
const MAX_FIELDS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireValue<'a> {
    Varint(u64),
    Fixed64,
    Fixed32,
    Bytes(&'a [u8]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub number: u64,
    pub value: WireValue<'a>,
}

impl<'a> Field<'a> {
    pub const fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.value {
            WireValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub const fn as_varint(&self) -> Option<u64> {
        match self.value {
            WireValue::Varint(value) => Some(value),
            _ => None,
        }
    }
}

/// Read a varint at `offset`, returning the value and the offset after it
pub fn read_varint(data: &[u8], mut offset: usize) -> Result<(u64, usize), FormatError> {
    let start = offset;
    let mut value = 0u64;
    let mut shift = 0u32;

    while offset < data.len() {
        let byte = data[offset];
        value |= u64::from(byte & 0x7f) << shift;
        offset += 1;

        if byte & 0x80 == 0 {
            return Ok((value, offset));
        }

        shift += 7;
        if shift > 63 {
            return Err(FormatError::TruncatedVarint { offset: start });
        }
    }

    Err(FormatError::TruncatedVarint { offset: start })
}

/// Split a buffer into its top-level fields
///
/// Fixed-width values are consumed but not kept. Any framing problem
/// (truncated varint, length past the end, group wire types) fails the whole
/// message so callers can tell structured data from arbitrary bytes.
pub fn parse_message(data: &[u8]) -> Result<Vec<Field<'_>>, FormatError> {
    let mut fields = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let tag_offset = offset;
        let (tag, next) = read_varint(data, offset)?;
        offset = next;

        let number = tag >> 3;
        let wire_type = tag & 0x07;
        if number == 0 {
            return Err(FormatError::ZeroFieldNumber { offset: tag_offset });
        }

        let value = match wire_type {
            WIRE_VARINT => {
                let (value, next) = read_varint(data, offset)?;
                offset = next;
                WireValue::Varint(value)
            }
            WIRE_FIXED64 => {
                offset = take(data, offset, 8)?;
                WireValue::Fixed64
            }
            WIRE_LENGTH_DELIMITED => {
                let (length, next) = read_varint(data, offset)?;
                let length = usize::try_from(length)
                    .map_err(|_| FormatError::LengthOverflow { offset, length })?;
                let end = take(data, next, length)?;
                let bytes = &data[next..end];
                offset = end;
                WireValue::Bytes(bytes)
            }
            WIRE_FIXED32 => {
                offset = take(data, offset, 4)?;
                WireValue::Fixed32
            }
            other => {
                return Err(FormatError::InvalidWireType {
                    wire_type: other,
                    offset: tag_offset,
                })
            }
        };

        fields.push(Field { number, value });
        if fields.len() > MAX_FIELDS {
            return Err(FormatError::TooManyFields);
        }
    }

    Ok(fields)
}

/// Offset after consuming `length` bytes from `offset`, if they exist
fn take(data: &[u8], offset: usize, length: usize) -> Result<usize, FormatError> {
    offset
        .checked_add(length)
        .filter(|end| *end <= data.len())
        .ok_or(FormatError::LengthOverflow {
            offset,
            length: length as u64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bytes_field, varint_field, write_varint};

    #[test]
    fn test_varint_roundtrip() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 300);
        assert_eq!(buf, vec![0xac, 0x02]);
        assert_eq!(read_varint(&buf, 0).unwrap(), (300, 2));
    }

    #[test]
    fn test_truncated_varint() {
        assert!(matches!(
            read_varint(&[0x80, 0x80], 0),
            Err(FormatError::TruncatedVarint { offset: 0 })
        ));
    }

    #[test]
    fn test_parse_mixed_fields() {
        let mut buf = varint_field(1, 150);
        buf.extend(bytes_field(2, b"testing"));
        // fixed32 field 7, skipped
        buf.extend([0x3d, 1, 2, 3, 4]);

        let fields = parse_message(&buf).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].as_varint(), Some(150));
        assert_eq!(fields[1].as_bytes(), Some(&b"testing"[..]));
        assert_eq!(fields[2].value, WireValue::Fixed32);
    }

    #[test]
    fn test_length_past_end_is_rejected() {
        // field 2, length 10, only 3 bytes follow
        let buf = [0x12, 0x0a, b'a', b'b', b'c'];
        assert!(matches!(
            parse_message(&buf),
            Err(FormatError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn test_group_wire_type_is_rejected() {
        // field 1, wire type 3 (start group)
        assert!(matches!(
            parse_message(&[0x0b]),
            Err(FormatError::InvalidWireType { wire_type: 3, .. })
        ));
    }
}
