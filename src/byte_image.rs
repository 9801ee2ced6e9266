//! Immutable random-access view over a firmware image buffer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// An opaque byte buffer with bounds-checked, little-endian reads.
///
/// Offsets are never adjusted by `base_address`; it is informational only,
/// carried through for consumers that want to display addresses the way a
/// disassembler would.
#[derive(Debug, Clone)]
pub struct ByteImage {
    data: Vec<u8>,
    base_address: Option<u64>,
}

impl ByteImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            base_address: None,
        }
    }

    pub fn with_base_address(data: Vec<u8>, base_address: u64) -> Self {
        Self {
            data,
            base_address: Some(base_address),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn base_address(&self) -> Option<u64> {
        self.base_address
    }

    fn check_bounds(&self, offset: usize, length: usize) -> Result<()> {
        let in_bounds = match offset.checked_add(length) {
            Some(end) => end <= self.data.len(),
            None => false,
        };
        if !in_bounds {
            return Err(Error::OutOfBounds {
                offset,
                length,
                size: self.data.len(),
            });
        }
        Ok(())
    }

    /// Borrow `length` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, length: usize) -> Result<&[u8]> {
        self.check_bounds(offset, length)?;
        Ok(&self.data[offset..offset + length])
    }

    /// Read a single little-endian u16 at `offset`.
    pub fn read_u16_le(&self, offset: usize) -> Result<u16> {
        let bytes = self.slice(offset, 2)?;
        Ok(LittleEndian::read_u16(bytes))
    }

    /// Read `count` consecutive little-endian u16 elements starting at `offset`.
    pub fn read_u16_le_array(&self, offset: usize, count: usize) -> Result<Vec<u16>> {
        let bytes = self.slice(offset, count * 2)?;
        let mut out = Vec::with_capacity(count);
        for chunk in bytes.chunks_exact(2) {
            out.push(LittleEndian::read_u16(chunk));
        }
        Ok(out)
    }

    /// Read a single little-endian, width-`size_bytes` integer at `offset`,
    /// interpreted as signed or unsigned. Used only by the template rescan
    /// path, which supports 1/2/4 byte elements.
    pub fn read_int_le(&self, offset: usize, size_bytes: u8, signed: bool) -> Result<i64> {
        let bytes = self.slice(offset, size_bytes as usize)?;
        Ok(match (size_bytes, signed) {
            (1, false) => bytes[0] as i64,
            (1, true) => bytes[0] as i8 as i64,
            (2, false) => LittleEndian::read_u16(bytes) as i64,
            (2, true) => LittleEndian::read_i16(bytes) as i64,
            (4, false) => LittleEndian::read_u32(bytes) as i64,
            (4, true) => LittleEndian::read_i32(bytes) as i64,
            _ => {
                return Err(Error::MalformedTemplate(format!(
                    "unsupported element size {size_bytes} bytes"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_reports_buffer_length() {
        let image = ByteImage::new(vec![0u8; 16]);
        assert_eq!(image.size(), 16);
    }

    #[test]
    fn slice_rejects_out_of_bounds() {
        let image = ByteImage::new(vec![1, 2, 3, 4]);
        assert!(image.slice(2, 3).is_err());
        assert!(image.slice(4, 0).is_ok());
        assert!(image.slice(5, 0).is_err());
    }

    #[test]
    fn read_u16_le_decodes_little_endian() {
        let image = ByteImage::new(vec![0x34, 0x12]);
        assert_eq!(image.read_u16_le(0).unwrap(), 0x1234);
    }

    #[test]
    fn read_u16_le_array_decodes_sequence() {
        let image = ByteImage::new(vec![0x0A, 0x00, 0x14, 0x00]);
        assert_eq!(image.read_u16_le_array(0, 2).unwrap(), vec![10, 20]);
    }

    #[test]
    fn read_int_le_handles_signed_and_unsigned_widths() {
        let image = ByteImage::new(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(image.read_int_le(0, 1, false).unwrap(), 255);
        assert_eq!(image.read_int_le(0, 1, true).unwrap(), -1);
        assert_eq!(image.read_int_le(0, 2, false).unwrap(), 0xFFFF);
        assert_eq!(image.read_int_le(0, 2, true).unwrap(), -1);
        assert_eq!(image.read_int_le(0, 4, false).unwrap(), 0xFFFFFFFF);
        assert_eq!(image.read_int_le(0, 4, true).unwrap(), -1);
    }

    #[test]
    fn base_address_is_informational_only() {
        let image = ByteImage::with_base_address(vec![0u8; 4], 0x8000);
        assert_eq!(image.base_address(), Some(0x8000));
        assert_eq!(image.read_u16_le(0).unwrap(), 0);
    }
}
