//! MFT entry decoder: the 42-byte entry header, a lazy iterator over the
//! embedded attribute stream, and the fixup array bookkeeping. An [`Entry`]
//! is an immutable snapshot borrowing the caller's buffer.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::attributes::{Attribute, END_OF_ATTRIBUTES};
use crate::bytes::{byte_range, le_u32};
use crate::error::{Error, Result};
use crate::export::{push_field, sorted, Export, ExportRow};
use crate::fields::Field;

/// Common on-disk size of one MFT entry.
pub const ENTRY_SIZE: usize = 1024;

/// Bytes of fixed header before the attribute stream and fixup values.
pub const ENTRY_HEADER_LEN: usize = 42;

/// Returned by [`Entry::filename`] when no $FILE_NAME attribute exists.
pub const NO_FILENAME: &str = "*[No Filename Attribute]*";

const SIGNATURE_FILE: u32 = 0x454c_4946;
const SIGNATURE_BAAD: u32 = 0x4441_4142;

/// A decoded MFT entry. Every field borrows from the entry buffer; the
/// buffer is never copied or mutated.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    raw: &'a [u8],
    pub signature: Field<'a>,
    pub fixup_array_offset: Field<'a>,
    pub fixup_array_entries: Field<'a>,
    pub lsn: Field<'a>,
    pub sequence: Field<'a>,
    pub link_count: Field<'a>,
    pub attribute_offset: Field<'a>,
    pub flags: Field<'a>,
    pub used_size: Field<'a>,
    pub allocated_size: Field<'a>,
    pub file_ref: Field<'a>,
    pub next_attr_id: Field<'a>,
    /// Attribute stream and embedded fixup values, kept opaque.
    pub attributes_and_fixups: &'a [u8],
}

impl<'a> Entry<'a> {
    /// Decodes the entry header. The buffer is usually 1024 bytes; anything
    /// holding at least the header is accepted.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < ENTRY_HEADER_LEN {
            return Err(Error::TruncatedInput {
                needed: ENTRY_HEADER_LEN,
                got: data.len(),
            });
        }
        Ok(Self {
            raw: data,
            signature: Field::string(byte_range(data, 0, 3)?, Some("Signature")),
            fixup_array_offset: Field::integer(byte_range(data, 4, 5)?, Some("Fixup Array Offset")),
            fixup_array_entries: Field::integer(
                byte_range(data, 6, 7)?,
                Some("Fixup Array Entries"),
            ),
            lsn: Field::integer(byte_range(data, 8, 15)?, Some("LSN")),
            sequence: Field::integer(byte_range(data, 16, 17)?, Some("Sequence")),
            link_count: Field::integer(byte_range(data, 18, 19)?, Some("Link Count")),
            attribute_offset: Field::integer(byte_range(data, 20, 21)?, Some("Attribute Offset")),
            flags: Field::mft_flags(byte_range(data, 22, 23)?, Some("Flags")),
            used_size: Field::integer(byte_range(data, 24, 27)?, Some("Used Size")),
            allocated_size: Field::integer(byte_range(data, 28, 31)?, Some("Allocated Size")),
            file_ref: Field::reference(byte_range(data, 32, 39)?, Some("File Reference")),
            next_attr_id: Field::integer(byte_range(data, 40, 41)?, Some("Next Attribute ID")),
            attributes_and_fixups: &data[ENTRY_HEADER_LEN..],
        })
    }

    /// The exact raw bytes of the entry, suitable for writing back out.
    pub fn dump(&self) -> &'a [u8] {
        self.raw
    }

    /// Accepts the FILE and BAAD signatures plus the all-zero empty slot.
    pub fn validate(&self) -> Result<()> {
        let signature = le_u32(self.raw, 0)?;
        match signature {
            SIGNATURE_FILE | SIGNATURE_BAAD | 0 => Ok(()),
            found => Err(Error::InvalidMftEntry { found }),
        }
    }

    /// Lazy iterator over the attribute stream, in on-disk order.
    pub fn attributes(&self) -> Attributes<'a> {
        Attributes {
            data: self.raw,
            cursor: self.attribute_offset.as_u64() as usize,
        }
    }

    /// The rendered name of the first $FILE_NAME attribute, or the
    /// [`NO_FILENAME`] sentinel.
    pub fn filename(&self) -> String {
        for attribute in self.attributes() {
            if let Attribute::FileName(fname) = attribute {
                return fname.name.render();
            }
        }
        NO_FILENAME.to_owned()
    }

    /// Decodes the fixup array: the update sequence number followed by the
    /// stored sector tail values.
    pub fn fixup_array(&self) -> Result<FixupArray> {
        let offset = self.fixup_array_offset.as_u64() as usize;
        let slots = self.fixup_array_entries.as_u64() as usize;
        if slots == 0 {
            return Ok(FixupArray {
                update_sequence: 0,
                stored_tails: Vec::new(),
            });
        }
        let raw = byte_range(self.raw, offset, offset + slots * 2 - 1)?;
        let update_sequence = LittleEndian::read_u16(&raw[0..2]);
        let stored_tails = raw[2..]
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();
        Ok(FixupArray {
            update_sequence,
            stored_tails,
        })
    }

    /// Hook for fixup application. The stored tails are not written back
    /// into the sector ends yet; the raw buffer is returned untouched.
    pub fn validated_buffer(&self) -> &'a [u8] {
        self.raw
    }
}

impl Export for Entry<'_> {
    fn export(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        push_field(&mut rows, "signature", &self.signature);
        push_field(&mut rows, "fixup_array_offset", &self.fixup_array_offset);
        push_field(&mut rows, "fixup_array_entries", &self.fixup_array_entries);
        push_field(&mut rows, "lsn", &self.lsn);
        push_field(&mut rows, "sequence", &self.sequence);
        push_field(&mut rows, "link_count", &self.link_count);
        push_field(&mut rows, "attribute_offset", &self.attribute_offset);
        push_field(&mut rows, "flags", &self.flags);
        push_field(&mut rows, "used_size", &self.used_size);
        push_field(&mut rows, "allocated_size", &self.allocated_size);
        push_field(&mut rows, "file_ref", &self.file_ref);
        push_field(&mut rows, "next_attr_id", &self.next_attr_id);
        sorted(rows)
    }
}

/// The per-entry fixup values: one update sequence number and the original
/// tail of every 512-byte sector of the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixupArray {
    pub update_sequence: u16,
    pub stored_tails: Vec<u16>,
}

/// Forward-only iterator over an entry's attribute records. Stops at the
/// 0xFFFFFFFF terminator, on a type code outside the table, on a
/// zero-length record, and before ever leaving the entry buffer. Restart by
/// calling [`Entry::attributes`] again.
pub struct Attributes<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.checked_add(8)? > self.data.len() {
            return None;
        }
        let type_code = LittleEndian::read_u32(&self.data[self.cursor..self.cursor + 4]);
        if type_code == END_OF_ATTRIBUTES {
            return None;
        }
        let length = LittleEndian::read_u32(&self.data[self.cursor + 4..self.cursor + 8]) as usize;
        // a zero stride would loop forever
        if length == 0 {
            debug!(cursor = self.cursor, "refusing zero-length attribute record");
            return None;
        }
        let end = self.cursor.checked_add(length)?;
        if end > self.data.len() {
            debug!(
                cursor = self.cursor,
                length, "attribute record overruns the entry buffer"
            );
            return None;
        }
        match Attribute::create(&self.data[self.cursor..end]) {
            Ok(Some(attribute)) => {
                self.cursor = end;
                Some(attribute)
            }
            Ok(None) => None,
            Err(error) => {
                debug!(cursor = self.cursor, %error, "attribute parse refused");
                None
            }
        }
    }
}
