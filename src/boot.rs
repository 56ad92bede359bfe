//! Boot sector decoder. The first 512 bytes of an NTFS volume carry the
//! BIOS parameter block; the fields below are the ones needed to locate the
//! MFT, plus the geometry worth reporting.

use crate::bytes::{byte_range, le_u16, le_u64};
use crate::error::{Error, Result};

pub const BOOT_SECTOR_SIZE: usize = 512;
pub const BOOT_SIGNATURE: u16 = 0xAA55;

#[derive(Debug, Clone)]
pub struct BootSector {
    /// OEM name at bytes 3..11, `"NTFS    "` on a real volume.
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub media_descriptor: u8,
    pub total_sectors: u64,
    pub mft_start_cluster: u64,
    pub mft_mirror_start_cluster: u64,
    // - If this value, when read in two's complement, is positive,
    //   i.e. if its value goes from 00h to 7Fh, it designates the number of
    //   clusters per MFT entry.
    // - If this value, when read in two's complement, is negative,
    //   i.e. if its value goes from 80h to FFh, the size in bytes of each
    //   entry is 2 to the power of the byte absolute value.
    // The raw byte is preserved and never fed into offset arithmetic; the
    // walker strides fixed 1024-byte entries.
    pub entry_size_code: i8,
    /// Same signed convention as `entry_size_code`, for index records.
    pub index_record_size_code: i8,
    pub serial_number: u64,
    /// Must be 0xAA55 for a valid boot sector.
    pub signature: u16,
}

impl BootSector {
    /// Decodes the boot sector from at least 512 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BOOT_SECTOR_SIZE {
            return Err(Error::TruncatedInput {
                needed: BOOT_SECTOR_SIZE,
                got: data.len(),
            });
        }

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(byte_range(data, 3, 10)?);

        Ok(Self {
            oem_name,
            bytes_per_sector: le_u16(data, 11)?,
            sectors_per_cluster: data[13],
            reserved_sectors: le_u16(data, 14)?,
            media_descriptor: data[21],
            total_sectors: le_u64(data, 40)?,
            mft_start_cluster: le_u64(data, 48)?,
            mft_mirror_start_cluster: le_u64(data, 56)?,
            entry_size_code: data[64] as i8,
            index_record_size_code: data[68] as i8,
            serial_number: le_u64(data, 72)?,
            signature: le_u16(data, 510)?,
        })
    }

    /// Checks the 0xAA55 signature at bytes 510..512.
    pub fn validate(&self) -> Result<()> {
        if self.signature != BOOT_SIGNATURE {
            return Err(Error::InvalidBootSector {
                found: self.signature,
            });
        }
        Ok(())
    }

    pub fn oem_name_str(&self) -> String {
        String::from_utf8_lossy(&self.oem_name).trim().to_owned()
    }

    pub fn cluster_bytes(&self) -> u64 {
        self.bytes_per_sector as u64 * self.sectors_per_cluster as u64
    }

    /// Byte offset of the first MFT entry from the start of the volume.
    pub fn mft_start_offset_bytes(&self) -> u64 {
        self.cluster_bytes() * self.mft_start_cluster
    }
}

#[cfg(test)]
pub(crate) fn build_boot_sector(
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    mft_start_cluster: u64,
) -> [u8; BOOT_SECTOR_SIZE] {
    use byteorder::{ByteOrder, LittleEndian};

    let mut data = [0u8; BOOT_SECTOR_SIZE];
    data[3..11].copy_from_slice(b"NTFS    ");
    LittleEndian::write_u16(&mut data[11..13], bytes_per_sector);
    data[13] = sectors_per_cluster;
    LittleEndian::write_u64(&mut data[40..48], 0x100000);
    LittleEndian::write_u64(&mut data[48..56], mft_start_cluster);
    LittleEndian::write_u64(&mut data[56..64], mft_start_cluster / 2);
    data[64] = 0xf6; // -10: 1024-byte entries
    data[68] = 0x01;
    LittleEndian::write_u64(&mut data[72..80], 0xdead_beef);
    LittleEndian::write_u16(&mut data[510..512], BOOT_SIGNATURE);
    data
}
