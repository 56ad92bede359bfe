//! Byte utilities shared by every decoder: slicing by inclusive byte range
//! and little-endian integer unpacking. Little-endian is the only endian
//! policy on an NTFS volume.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Returns the bytes in the inclusive range `[start, end]`.
pub fn byte_range(data: &[u8], start: usize, end: usize) -> Result<&[u8]> {
    if end < start || end >= data.len() {
        return Err(Error::TruncatedInput {
            needed: end + 1,
            got: data.len(),
        });
    }
    Ok(&data[start..=end])
}

/// Returns the single byte at `index` as a one-byte slice.
pub fn byte_at(data: &[u8], index: usize) -> Result<&[u8]> {
    byte_range(data, index, index)
}

pub fn le_u16(data: &[u8], start: usize) -> Result<u16> {
    Ok(LittleEndian::read_u16(byte_range(data, start, start + 1)?))
}

pub fn le_u32(data: &[u8], start: usize) -> Result<u32> {
    Ok(LittleEndian::read_u32(byte_range(data, start, start + 3)?))
}

pub fn le_u64(data: &[u8], start: usize) -> Result<u64> {
    Ok(LittleEndian::read_u64(byte_range(data, start, start + 7)?))
}
