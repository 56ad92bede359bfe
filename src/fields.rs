//! Typed field layer. A [`Field`] wraps a raw slice of a caller-owned buffer
//! together with a rendering rule and an optional title for labeled export.
//! Decoding never fails: malformed values render as fallback strings so that
//! an otherwise valid entry stays viewable.

use std::fmt;
use std::fmt::Write;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, TimeZone, Utc};

use crate::attributes::{attribute_type, NtfsVersion};

/// 100-ns intervals between 1601-01-01 and 1970-01-01.
pub const FILETIME_UNIX_EPOCH_DIFF: u64 = 116_444_736_000_000_000;

/// Rendered in place of a FILETIME outside the representable range.
pub const INVALID_DATETIME: &str = "Invalid date and time";

/// $STANDARD_INFORMATION flag bits and their display labels.
pub const SI_FLAGS: [(u32, &str); 13] = [
    (0x0001, "Read Only"),
    (0x0002, "Hidden"),
    (0x0004, "System"),
    (0x0020, "Archive"),
    (0x0040, "Device"),
    (0x0080, "Normal"),
    (0x0100, "Temporary"),
    (0x0200, "Sparse file"),
    (0x0400, "Reparse point"),
    (0x0800, "Compressed"),
    (0x1000, "Offline"),
    (0x2000, "Content not being indexed for faster searches"),
    (0x4000, "Encrypted"),
];

/// A packed 64-bit MFT reference: low 48 bits are the record number, the
/// high 16 bits the sequence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MftReference {
    pub record: u64,
    pub sequence: u16,
}

impl From<u64> for MftReference {
    fn from(value: u64) -> Self {
        Self {
            record: value & 0x0000_ffff_ffff_ffff,
            sequence: (value >> 48) as u16,
        }
    }
}

impl fmt::Display for MftReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.record, self.sequence)
    }
}

/// One rendering rule per field shape found in the decoded structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Little-endian unsigned integer of width 1, 2, 4 or 8; a 16-byte raw
    /// renders GUID-shaped as two u64s.
    Integer,
    /// UTF-8 text; failure falls back to the raw bytes.
    String,
    /// File name: UTF-8, then UTF-16LE, then UTF-32LE, NUL units stripped.
    FileName,
    /// FILETIME rendered as `YYYY/MM/DD HH:MM` in UTC.
    WindowsTime,
    /// Entry flags word: 0x01 in use, 0x02 directory.
    MftFlags,
    /// Non-resident flag byte rendered as a boolean.
    NonResident,
    /// $STANDARD_INFORMATION flags decoded as a bitmask over [`SI_FLAGS`].
    SiFlags,
    /// Parent directory reference, decoded with the historical
    /// `(u16, u16, u32)` split.
    ParentDir,
    /// Attribute type code with a symbolic name from the type table.
    AttributeType,
    /// Packed 64-bit MFT reference.
    Reference,
}

/// A raw slice plus its interpretation. Borrows from the caller's buffer and
/// never copies or mutates it.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    raw: &'a [u8],
    kind: FieldKind,
    title: Option<&'static str>,
}

impl<'a> Field<'a> {
    fn new(kind: FieldKind, raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self { raw, kind, title }
    }

    pub fn integer(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::Integer, raw, title)
    }

    pub fn string(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::String, raw, title)
    }

    pub fn file_name(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::FileName, raw, title)
    }

    pub fn windows_time(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::WindowsTime, raw, title)
    }

    pub fn mft_flags(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::MftFlags, raw, title)
    }

    pub fn non_resident(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::NonResident, raw, title)
    }

    pub fn si_flags(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::SiFlags, raw, title)
    }

    pub fn parent_dir(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::ParentDir, raw, title)
    }

    pub fn attribute_type(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::AttributeType, raw, title)
    }

    pub fn reference(raw: &'a [u8], title: Option<&'static str>) -> Self {
        Self::new(FieldKind::Reference, raw, title)
    }

    /// The wrapped bytes, exactly as they appear in the source buffer.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn title(&self) -> Option<&'static str> {
        self.title
    }

    /// `0x` followed by the lowercase hex of the raw bytes in buffer order.
    pub fn hex(&self) -> String {
        let mut out = String::with_capacity(2 + self.raw.len() * 2);
        out.push_str("0x");
        for byte in self.raw {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Little-endian unsigned value of the raw bytes. Slices wider than
    /// 8 bytes yield their low quadword.
    pub fn as_u64(&self) -> u64 {
        match self.raw.len() {
            0 => 0,
            n @ 1..=8 => LittleEndian::read_uint(self.raw, n),
            _ => LittleEndian::read_u64(&self.raw[..8]),
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.as_u64() as u32
    }

    pub fn as_u16(&self) -> u16 {
        self.as_u64() as u16
    }

    /// The non-resident flag interpretation: set iff the byte equals 1.
    pub fn as_bool(&self) -> bool {
        self.as_u64() == 1
    }

    /// The raw FILETIME count, when the field is 8 bytes wide.
    pub fn filetime(&self) -> Option<u64> {
        if self.raw.len() != 8 {
            return None;
        }
        let low = LittleEndian::read_u32(&self.raw[0..4]);
        let high = LittleEndian::read_u32(&self.raw[4..8]);
        Some(((high as u64) << 32) | low as u64)
    }

    /// FILETIME converted to UTC. `None` when the value falls before the
    /// Unix epoch or past the representable range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let filetime = self.filetime()?;
        let secs = filetime.checked_sub(FILETIME_UNIX_EPOCH_DIFF)? / 10_000_000;
        Utc.timestamp_opt(i64::try_from(secs).ok()?, 0).single()
    }

    /// The `(record, sequence)` pair of a parent directory reference,
    /// using the historical `(u16, u16, u32)` unpacking where
    /// `record = second u16 | (u32 >> 16)`.
    pub fn parent_reference(&self) -> (u64, u16) {
        if self.raw.len() < 8 {
            return (0, 0);
        }
        let sequence = LittleEndian::read_u16(&self.raw[0..2]);
        let low = LittleEndian::read_u16(&self.raw[2..4]);
        let high = LittleEndian::read_u32(&self.raw[4..8]);
        ((low as u64) | ((high >> 16) as u64), sequence)
    }

    /// The attribute type code, for dispatch.
    pub fn attr_type_id(&self) -> u32 {
        self.as_u32()
    }

    /// The packed 64-bit reference interpretation.
    pub fn mft_reference(&self) -> MftReference {
        MftReference::from(self.as_u64())
    }

    /// The human-readable form of the value, per the field's rule.
    pub fn render(&self) -> String {
        match self.kind {
            FieldKind::Integer => self.render_integer(),
            FieldKind::String => match std::str::from_utf8(self.raw) {
                Ok(text) => text.to_owned(),
                Err(_) => self.hex(),
            },
            FieldKind::FileName => decode_file_name(self.raw).unwrap_or_else(|| self.hex()),
            FieldKind::WindowsTime => match self.datetime() {
                Some(datetime) => datetime.format("%Y/%m/%d %H:%M").to_string(),
                None => INVALID_DATETIME.to_owned(),
            },
            FieldKind::MftFlags => match self.as_u64() {
                0x01 => "In use".to_owned(),
                0x02 => "Directory".to_owned(),
                other => other.to_string(),
            },
            FieldKind::NonResident => self.as_bool().to_string(),
            FieldKind::SiFlags => render_si_flags(self.as_u32()),
            FieldKind::ParentDir => {
                let (record, sequence) = self.parent_reference();
                format!("{record} / {sequence}")
            }
            FieldKind::AttributeType => {
                let code = self.attr_type_id();
                match attribute_type(code, NtfsVersion::default()) {
                    Some((name, _)) => name.to_owned(),
                    None => code.to_string(),
                }
            }
            FieldKind::Reference => self.mft_reference().to_string(),
        }
    }

    fn render_integer(&self) -> String {
        if self.raw.len() == 16 {
            let low = LittleEndian::read_u64(&self.raw[..8]);
            let high = LittleEndian::read_u64(&self.raw[8..16]);
            format!("({low}, {high})")
        } else {
            self.as_u64().to_string()
        }
    }
}

impl fmt::Display for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.render(), self.hex())
    }
}

fn render_si_flags(value: u32) -> String {
    let mut labels = Vec::new();
    let mut residual = value;
    for (bit, label) in SI_FLAGS {
        if value & bit != 0 {
            labels.push(label);
            residual &= !bit;
        }
    }
    if labels.is_empty() {
        return value.to_string();
    }
    let mut out = labels.join(" | ");
    if residual != 0 {
        let _ = write!(out, " | {residual:#06x}");
    }
    out
}

/// Names are stored as UTF-16LE, but the declared length is in code units
/// and on-disk data is not always well formed; accept any legal decoding
/// before giving up.
fn decode_file_name(raw: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(raw) {
        return Some(text.replace('\0', ""));
    }
    if raw.len() % 2 == 0 {
        let units: Vec<u16> = raw.chunks_exact(2).map(LittleEndian::read_u16).collect();
        if let Ok(text) = String::from_utf16(&units) {
            return Some(text.replace('\0', ""));
        }
    }
    if raw.len() % 4 == 0 {
        let mut out = String::new();
        for chunk in raw.chunks_exact(4) {
            match char::from_u32(LittleEndian::read_u32(chunk)) {
                Some('\0') => {}
                Some(c) => out.push(c),
                None => return None,
            }
        }
        return Some(out);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_field_unpacks_little_endian() {
        let raw = [0x2c, 0x01];
        let field = Field::integer(&raw, Some("Sequence"));
        assert_eq!(field.as_u64(), 300);
        assert_eq!(field.hex(), "0x2c01");
        assert_eq!(field.render(), "300");
        assert_eq!(field.to_string(), "300 (0x2c01)");
    }

    #[test]
    fn sixteen_byte_integer_renders_guid_shaped() {
        let mut raw = [0u8; 16];
        raw[0] = 1;
        raw[8] = 2;
        let field = Field::integer(&raw, None);
        assert_eq!(field.render(), "(1, 2)");
    }

    #[test]
    fn string_field_falls_back_to_raw_bytes() {
        let field = Field::string(b"FILE", None);
        assert_eq!(field.render(), "FILE");
        let raw = [0xff, 0xfe];
        let field = Field::string(&raw, None);
        assert_eq!(field.render(), "0xfffe");
    }

    #[test]
    fn file_name_decodes_utf16le_with_trailing_nuls() {
        let mut raw = Vec::new();
        for unit in "notes.txt".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        raw.extend_from_slice(&[0, 0, 0, 0]);
        let field = Field::file_name(&raw, Some("File name"));
        assert_eq!(field.render(), "notes.txt");
    }

    #[test]
    fn file_name_decodes_non_ascii_utf16le() {
        let mut raw = Vec::new();
        for unit in "übung.txt".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        let field = Field::file_name(&raw, None);
        assert_eq!(field.render(), "übung.txt");
    }

    #[test]
    fn windows_time_renders_utc_minutes() {
        // 2015-08-25 12:00:00 UTC
        let raw = 0x01d0_df2d_916b_6000u64.to_le_bytes();
        let field = Field::windows_time(&raw, Some("Created"));
        assert_eq!(field.render(), "2015/08/25 12:00");
    }

    #[test]
    fn windows_time_zero_is_invalid() {
        let raw = [0u8; 8];
        let field = Field::windows_time(&raw, None);
        assert_eq!(field.render(), INVALID_DATETIME);
        assert!(field.datetime().is_none());
    }

    #[test]
    fn windows_time_epoch_boundary() {
        let raw = FILETIME_UNIX_EPOCH_DIFF.to_le_bytes();
        let field = Field::windows_time(&raw, None);
        assert_eq!(field.render(), "1970/01/01 00:00");
    }

    #[test]
    fn mft_flags_label_single_values_only() {
        assert_eq!(Field::mft_flags(&[0x01, 0x00], None).render(), "In use");
        assert_eq!(Field::mft_flags(&[0x02, 0x00], None).render(), "Directory");
        assert_eq!(Field::mft_flags(&[0x03, 0x00], None).render(), "3");
    }

    #[test]
    fn si_flags_decode_as_bitmask() {
        let raw = 0x0006u32.to_le_bytes();
        assert_eq!(Field::si_flags(&raw, None).render(), "Hidden | System");
        let raw = 0x0001u32.to_le_bytes();
        assert_eq!(Field::si_flags(&raw, None).render(), "Read Only");
        let raw = 0x0000u32.to_le_bytes();
        assert_eq!(Field::si_flags(&raw, None).render(), "0");
        // unknown residual bits keep their hex form
        let raw = 0x0011u32.to_le_bytes();
        assert_eq!(Field::si_flags(&raw, None).render(), "Read Only | 0x0010");
    }

    #[test]
    fn parent_dir_uses_the_historical_split() {
        let raw = [0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00];
        let field = Field::parent_dir(&raw, None);
        let (record, sequence) = field.parent_reference();
        assert_eq!(sequence, 5);
        assert_eq!(record, 3);
        assert_eq!(field.render(), "3 / 5");
    }

    #[test]
    fn mft_reference_splits_record_and_sequence() {
        let packed = (7u64 << 48) | 42;
        let reference = MftReference::from(packed);
        assert_eq!(reference.record, 42);
        assert_eq!(reference.sequence, 7);
        assert_eq!(reference.to_string(), "42 / 7");
    }

    #[test]
    fn non_resident_flag_is_boolean() {
        assert!(Field::non_resident(&[1], None).as_bool());
        assert!(!Field::non_resident(&[0], None).as_bool());
        assert_eq!(Field::non_resident(&[1], None).render(), "true");
    }

    #[test]
    fn attribute_type_renders_symbolic_name() {
        let raw = 0x30u32.to_le_bytes();
        let field = Field::attribute_type(&raw, Some("Attribute type"));
        assert_eq!(field.render(), "$FILE_NAME");
        assert_eq!(field.attr_type_id(), 0x30);
        let raw = 0x33u32.to_le_bytes();
        assert_eq!(Field::attribute_type(&raw, None).render(), "51");
    }
}
