use crate::core::error::{Error, ErrorKind, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u32 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u32(output: &mut Vec<u8>, mut value: u32) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    /// Decode single u32 value, returns (value, bytes_consumed)
    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let mut value = 0u32;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            value |= ((byte & 127) as u32) << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 28 {  // Max 5 bytes for u32
                return Err(Error::new(ErrorKind::Parse, "VByte overflow".to_string()));
            }
        }

        Err(Error::new(ErrorKind::Parse, "Incomplete VByte".to_string()))
    }
}

/// Sequential VByte reader over a byte slice
pub struct VByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteCursor { data, pos: 0 }
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        if self.pos >= self.data.len() {
            return Err(Error::new(ErrorKind::Corrupt, "posting data ended early".to_string()));
        }
        let (value, consumed) = VByteEncoder::decode_u32(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_widths() {
        let mut out = Vec::new();
        VByteEncoder::encode_u32(&mut out, 127);
        assert_eq!(out.len(), 1);
        VByteEncoder::encode_u32(&mut out, 128);
        assert_eq!(out.len(), 3);
        VByteEncoder::encode_u32(&mut out, u32::MAX);
        assert_eq!(out.len(), 8);
        let mut cursor = VByteCursor::new(&out);
        let decoded: Vec<u32> = (0..3).map(|_| cursor.next_u32().unwrap()).collect();
        assert_eq!(decoded, vec![127, 128, u32::MAX]);
        assert_eq!(cursor.position(), out.len());
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        assert!(VByteEncoder::decode_u32(&[0x80, 0x80]).is_err());
        let mut cursor = VByteCursor::new(&[]);
        assert_eq!(cursor.next_u32().unwrap_err().kind, ErrorKind::Corrupt);
    }
}
