//! Builders for synthetic NTFS structures shared by the integration tests.

#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};

pub const ENTRY_SIZE: usize = 1024;
pub const ATTRIBUTE_START: usize = 56;

/// A boot sector for a volume whose MFT starts at `mft_start_cluster`.
pub fn build_boot_sector(
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    mft_start_cluster: u64,
) -> [u8; 512] {
    let mut data = [0u8; 512];
    data[3..11].copy_from_slice(b"NTFS    ");
    LittleEndian::write_u16(&mut data[11..13], bytes_per_sector);
    data[13] = sectors_per_cluster;
    LittleEndian::write_u64(&mut data[40..48], 0x100000);
    LittleEndian::write_u64(&mut data[48..56], mft_start_cluster);
    LittleEndian::write_u64(&mut data[56..64], mft_start_cluster / 2);
    data[64] = 0xf6;
    data[68] = 0x01;
    LittleEndian::write_u64(&mut data[72..80], 0xdead_beef);
    LittleEndian::write_u16(&mut data[510..512], 0xaa55);
    data
}

/// A resident attribute record with its content at offset 24.
pub fn resident_attribute(type_code: u32, length: u32, content: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; length as usize];
    LittleEndian::write_u32(&mut data[0..4], type_code);
    LittleEndian::write_u32(&mut data[4..8], length);
    LittleEndian::write_u32(&mut data[16..20], content.len() as u32);
    LittleEndian::write_u16(&mut data[20..22], 24);
    data[24..24 + content.len()].copy_from_slice(content);
    data
}

pub fn standard_info_content(filetime: u64, si_flags: u32) -> Vec<u8> {
    let mut content = vec![0u8; 72];
    for slot in 0..4 {
        LittleEndian::write_u64(&mut content[slot * 8..slot * 8 + 8], filetime);
    }
    LittleEndian::write_u32(&mut content[32..36], si_flags);
    content
}

pub fn file_name_content(parent: u64, name: &str) -> Vec<u8> {
    let mut content = vec![0u8; 66];
    LittleEndian::write_u64(&mut content[0..8], parent);
    let units: Vec<u16> = name.encode_utf16().collect();
    content[64] = units.len() as u8;
    content[65] = 3;
    for unit in units {
        content.extend_from_slice(&unit.to_le_bytes());
    }
    content
}

/// A 1024-byte entry holding the given attribute records plus a terminator.
pub fn build_entry(signature: &[u8; 4], next_attr_id: u16, attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut data = vec![0u8; ENTRY_SIZE];
    data[0..4].copy_from_slice(signature);
    LittleEndian::write_u16(&mut data[4..6], 42);
    LittleEndian::write_u16(&mut data[6..8], 3);
    LittleEndian::write_u64(&mut data[8..16], 0x2000);
    LittleEndian::write_u16(&mut data[16..18], 1);
    LittleEndian::write_u16(&mut data[18..20], 1);
    LittleEndian::write_u16(&mut data[20..22], ATTRIBUTE_START as u16);
    LittleEndian::write_u16(&mut data[22..24], 0x01);
    LittleEndian::write_u32(&mut data[28..32], ENTRY_SIZE as u32);
    LittleEndian::write_u16(&mut data[40..42], next_attr_id);

    let mut cursor = ATTRIBUTE_START;
    for attribute in attributes {
        data[cursor..cursor + attribute.len()].copy_from_slice(attribute);
        cursor += attribute.len();
    }
    LittleEndian::write_u32(&mut data[cursor..cursor + 4], 0xffff_ffff);
    LittleEndian::write_u32(&mut data[24..28], (cursor + 8) as u32);
    data
}

pub fn entry_with_name(name: &str) -> Vec<u8> {
    // 2015-08-25 12:00:00 UTC
    let si = resident_attribute(0x10, 96, &standard_info_content(0x01d0_df2d_916b_6000, 0x01));
    let content = file_name_content((3u64 << 48) | 5, name);
    let length = (24 + content.len() as u32 + 7) & !7;
    let fname = resident_attribute(0x30, length, &content);
    build_entry(b"FILE", 3, &[si, fname])
}

/// Boot sector at offset 0, MFT at byte 4096 (cluster 4, 1024-byte clusters).
pub fn build_image(records: &[Vec<u8>]) -> Vec<u8> {
    let mut image = Vec::new();
    image.extend_from_slice(&build_boot_sector(512, 2, 4));
    image.resize(4096, 0);
    for record in records {
        image.extend_from_slice(record);
    }
    image
}
