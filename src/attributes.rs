//! MFT attribute decoding: the common 16-byte header, the resident and
//! non-resident tails, and the per-kind content decoders. Attributes are a
//! tagged variant over the type code; shared header fields live in the
//! common prefix and each kind decodes its content slice only.

use crate::bytes::{byte_at, byte_range, le_u32};
use crate::error::{Error, Result};
use crate::export::{push_field, sorted, Export, ExportRow};
use crate::fields::Field;

/// Type code that terminates an entry's attribute stream.
pub const END_OF_ATTRIBUTES: u32 = 0xFFFF_FFFF;

/// Attribute type codes, symbolic names and short descriptions.
pub const ATTRIBUTE_TYPES: [(u32, &str, &str); 15] = [
    (0x10, "$STANDARD_INFORMATION", "General information"),
    (
        0x20,
        "$ATTRIBUTE_LIST",
        "Lists where other attributes for file can be found",
    ),
    (
        0x30,
        "$FILE_NAME",
        "File name, in unicode. Last accessed, written, created",
    ),
    (0x40, "$OBJECT_ID", "16 byte ID for the file or directory."),
    (
        0x50,
        "$SECURITY_DESCRIPTOR",
        "Access control and security properties",
    ),
    (0x60, "$VOLUME_NAME", "Volume name"),
    (
        0x70,
        "$VOLUME_INFORMATION",
        "File system version and other flags",
    ),
    (0x80, "$DATA", "File contents"),
    (0x90, "$INDEX_ROOT", "Root node of an index tree"),
    (0xA0, "$INDEX_ALLOCATION", "Nodes of an index tree"),
    (0xB0, "$BITMAP", "A bitmap for the $MFT file and for indexes"),
    (0xC0, "$REPARSE_POINT", "Data about a reparse point"),
    (
        0xD0,
        "$EA_INFORMATION",
        "Used for backward compatability with OS/2 apps",
    ),
    (0xE0, "$EA", "Used for backward compatability with OS/2 apps"),
    (
        0x100,
        "$LOGGED_UTILITY_STREAM",
        "Keys and info about encrypted attributes",
    ),
];

/// NTFS revisions that rename two attribute types. The table itself is
/// immutable; the 1.2 names are only reachable through this parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NtfsVersion {
    V1_2,
    #[default]
    V3,
}

/// Looks up the symbolic name and description of a type code.
pub fn attribute_type(code: u32, version: NtfsVersion) -> Option<(&'static str, &'static str)> {
    if version == NtfsVersion::V1_2 {
        match code {
            0x40 => return Some(("$VOLUME_VERSION", "Volume information")),
            0xC0 => return Some(("$SYMBOLIC_LINK", "Soft link information")),
            _ => {}
        }
    }
    ATTRIBUTE_TYPES
        .iter()
        .find(|(key, _, _)| *key == code)
        .map(|(_, name, description)| (*name, *description))
}

/// The resident or non-resident continuation of the common header.
#[derive(Debug, Clone)]
pub enum Tail<'a> {
    Resident {
        content_size: Field<'a>,
        content_offset: Field<'a>,
        /// The content slice, bounds-checked against the record length.
        content: &'a [u8],
    },
    NonResident {
        vcn_start: Field<'a>,
        vcn_end: Field<'a>,
        runlist_offset: Field<'a>,
        compression_size: Field<'a>,
        attr_allocated_size: Field<'a>,
        attr_actual_size: Field<'a>,
        attr_init_size: Field<'a>,
    },
}

/// The common prefix every attribute record starts with, plus its tail.
/// Borrows the attribute-aligned slice of declared length.
#[derive(Debug, Clone)]
pub struct AttributeHeader<'a> {
    raw: &'a [u8],
    pub attr_type: Field<'a>,
    pub attr_length: Field<'a>,
    pub non_resident: Field<'a>,
    pub name_length: Field<'a>,
    pub name_offset: Field<'a>,
    pub flags: Field<'a>,
    pub attr_id: Field<'a>,
    pub tail: Tail<'a>,
}

impl<'a> AttributeHeader<'a> {
    /// Parses the header from the attribute's first byte. The caller hands
    /// over the full record of declared length; the terminator code never
    /// reaches this function.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let attr_type = Field::attribute_type(byte_range(data, 0, 3)?, Some("Attribute type"));
        let attr_length = Field::integer(byte_range(data, 4, 7)?, Some("Attribute length"));
        let non_resident =
            Field::non_resident(byte_at(data, 8)?, Some("Non-resident flag"));
        let name_length = Field::integer(byte_at(data, 9)?, Some("Name length"));
        let name_offset = Field::integer(byte_range(data, 10, 11)?, Some("Name offset"));
        let flags = Field::integer(byte_range(data, 12, 13)?, Some("Attribute flags"));
        let attr_id = Field::integer(byte_range(data, 14, 15)?, Some("Attribute identifier"));

        let tail = if non_resident.as_bool() {
            Tail::NonResident {
                vcn_start: Field::integer(
                    byte_range(data, 16, 23)?,
                    Some("Virtual cluster number (VCN) start"),
                ),
                vcn_end: Field::integer(
                    byte_range(data, 24, 31)?,
                    Some("Virtual cluster number (VCN) end"),
                ),
                runlist_offset: Field::integer(byte_range(data, 32, 33)?, Some("Runlist offset")),
                compression_size: Field::integer(
                    byte_range(data, 34, 35)?,
                    Some("Compression unit size"),
                ),
                attr_allocated_size: Field::integer(
                    byte_range(data, 40, 47)?,
                    Some("Attribute allocated size"),
                ),
                attr_actual_size: Field::integer(
                    byte_range(data, 48, 55)?,
                    Some("Attribute actual size"),
                ),
                attr_init_size: Field::integer(
                    byte_range(data, 56, 63)?,
                    Some("Initialized size of attribute content"),
                ),
            }
        } else {
            let content_size = Field::integer(byte_range(data, 16, 19)?, Some("Content size"));
            let content_offset = Field::integer(byte_range(data, 20, 21)?, Some("Content offset"));
            let offset = content_offset.as_u64() as usize;
            let size = content_size.as_u64() as usize;
            // bounded by the declared record length and by the buffer
            let available = data.len().min(attr_length.as_u64() as usize);
            let end = offset.checked_add(size).ok_or(Error::TruncatedAttributeContent {
                offset,
                size,
                available,
            })?;
            if end > available {
                return Err(Error::TruncatedAttributeContent {
                    offset,
                    size,
                    available,
                });
            }
            Tail::Resident {
                content_size,
                content_offset,
                content: &data[offset..end],
            }
        };

        Ok(Self {
            raw: data,
            attr_type,
            attr_length,
            non_resident,
            name_length,
            name_offset,
            flags,
            attr_id,
            tail,
        })
    }

    /// The full record of declared length this header was parsed from.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn type_code(&self) -> u32 {
        self.attr_type.attr_type_id()
    }

    /// Stride to the next attribute record.
    pub fn length(&self) -> u32 {
        self.attr_length.as_u32()
    }

    pub fn is_resident(&self) -> bool {
        !self.non_resident.as_bool()
    }

    /// The resident content slice, `None` for non-resident attributes.
    pub fn resident_content(&self) -> Option<&'a [u8]> {
        match &self.tail {
            Tail::Resident { content, .. } => Some(*content),
            Tail::NonResident { .. } => None,
        }
    }

    fn export_into(&self, rows: &mut Vec<ExportRow>) {
        push_field(rows, "attr_type", &self.attr_type);
        push_field(rows, "attr_length", &self.attr_length);
        push_field(rows, "non_resident", &self.non_resident);
        push_field(rows, "name_length", &self.name_length);
        push_field(rows, "name_offset", &self.name_offset);
        push_field(rows, "flags", &self.flags);
        push_field(rows, "attr_id", &self.attr_id);
        match &self.tail {
            Tail::Resident {
                content_size,
                content_offset,
                ..
            } => {
                push_field(rows, "content_size", content_size);
                push_field(rows, "content_offset", content_offset);
            }
            Tail::NonResident {
                vcn_start,
                vcn_end,
                runlist_offset,
                compression_size,
                attr_allocated_size,
                attr_actual_size,
                attr_init_size,
            } => {
                push_field(rows, "vcn_start", vcn_start);
                push_field(rows, "vcn_end", vcn_end);
                push_field(rows, "runlist_offset", runlist_offset);
                push_field(rows, "compression_size", compression_size);
                push_field(rows, "attr_allocated_size", attr_allocated_size);
                push_field(rows, "attr_actual_size", attr_actual_size);
                push_field(rows, "attr_init_size", attr_init_size);
            }
        }
    }
}

/// $STANDARD_INFORMATION, type 0x10.
#[derive(Debug, Clone)]
pub struct StandardInfo<'a> {
    pub header: AttributeHeader<'a>,
    pub created: Field<'a>,
    pub altered: Field<'a>,
    pub mft_altered: Field<'a>,
    pub accessed: Field<'a>,
    pub si_flags: Field<'a>,
    pub version_max: Field<'a>,
    pub version: Field<'a>,
    pub class_id: Field<'a>,
    pub owner_id: Field<'a>,
    pub security_id: Field<'a>,
    pub quota: Field<'a>,
    pub usn: Field<'a>,
}

impl<'a> StandardInfo<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 72 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 72,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            created: Field::windows_time(byte_range(content, 0, 7)?, Some("Created")),
            altered: Field::windows_time(byte_range(content, 8, 15)?, Some("Altered")),
            mft_altered: Field::windows_time(byte_range(content, 16, 23)?, Some("MFT altered")),
            accessed: Field::windows_time(byte_range(content, 24, 31)?, Some("Accessed")),
            si_flags: Field::si_flags(
                byte_range(content, 32, 35)?,
                Some("Standard information flags"),
            ),
            version_max: Field::integer(byte_range(content, 36, 39)?, Some("Maximum versions")),
            version: Field::integer(byte_range(content, 40, 43)?, Some("Version")),
            class_id: Field::integer(byte_range(content, 44, 47)?, Some("Class ID")),
            owner_id: Field::integer(byte_range(content, 48, 51)?, Some("Owner ID")),
            security_id: Field::integer(byte_range(content, 52, 55)?, Some("Security ID")),
            quota: Field::integer(byte_range(content, 56, 63)?, Some("Quota")),
            usn: Field::integer(byte_range(content, 64, 71)?, Some("USN")),
        })
    }
}

/// $FILE_NAME, type 0x30.
#[derive(Debug, Clone)]
pub struct FileName<'a> {
    pub header: AttributeHeader<'a>,
    pub parent_dir: Field<'a>,
    pub file_creation_time: Field<'a>,
    pub file_modification_time: Field<'a>,
    pub mft_modification_time: Field<'a>,
    pub file_access_time: Field<'a>,
    pub allocated_size: Field<'a>,
    pub actual_size: Field<'a>,
    pub content_flags: Field<'a>,
    pub reparse_value: Field<'a>,
    pub name_length: Field<'a>,
    pub namespace: Field<'a>,
    pub name: Field<'a>,
}

impl<'a> FileName<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 66 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 66,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            parent_dir: Field::parent_dir(byte_range(content, 0, 7)?, Some("Parent directory")),
            file_creation_time: Field::windows_time(
                byte_range(content, 8, 15)?,
                Some("Creation time"),
            ),
            file_modification_time: Field::windows_time(
                byte_range(content, 16, 23)?,
                Some("File modification time"),
            ),
            mft_modification_time: Field::windows_time(
                byte_range(content, 24, 31)?,
                Some("MFT modification time"),
            ),
            file_access_time: Field::windows_time(
                byte_range(content, 32, 39)?,
                Some("File access time"),
            ),
            allocated_size: Field::integer(byte_range(content, 40, 47)?, Some("Allocated size")),
            actual_size: Field::integer(byte_range(content, 48, 55)?, Some("Actual size")),
            content_flags: Field::integer(byte_range(content, 56, 59)?, Some("Content flags")),
            reparse_value: Field::integer(byte_range(content, 60, 63)?, Some("Reparse value")),
            name_length: Field::integer(byte_at(content, 64)?, Some("Name length")),
            namespace: Field::integer(byte_at(content, 65)?, Some("Namespace")),
            // The declared length in code units is not trusted; the name
            // runs from byte 66 to the end of the content slice.
            name: Field::file_name(&content[66..], Some("File name")),
        })
    }
}

/// $ATTRIBUTE_LIST, type 0x20. Only the first list entry is decoded.
#[derive(Debug, Clone)]
pub struct AttributeList<'a> {
    pub header: AttributeHeader<'a>,
    pub alist_attr_type: Field<'a>,
    pub alist_entry_length: Field<'a>,
    pub alist_name_length: Field<'a>,
    pub alist_name_offset: Field<'a>,
    pub alist_vcn_start: Field<'a>,
    pub alist_file_ref: Field<'a>,
    pub alist_attr_id: Field<'a>,
}

impl<'a> AttributeList<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 25 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 25,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            alist_attr_type: Field::attribute_type(
                byte_range(content, 0, 3)?,
                Some("Attribute type"),
            ),
            alist_entry_length: Field::integer(byte_range(content, 4, 5)?, Some("Entry length")),
            alist_name_length: Field::integer(byte_at(content, 6)?, Some("Name length")),
            alist_name_offset: Field::integer(byte_at(content, 7)?, Some("Name offset")),
            alist_vcn_start: Field::integer(byte_range(content, 8, 15)?, Some("VCN start")),
            alist_file_ref: Field::reference(
                byte_range(content, 16, 23)?,
                Some("File reference to attribute location"),
            ),
            alist_attr_id: Field::integer(byte_at(content, 24)?, Some("Attribute ID")),
        })
    }
}

/// $OBJECT_ID, type 0x40: four 16-byte GUIDs.
#[derive(Debug, Clone)]
pub struct ObjectId<'a> {
    pub header: AttributeHeader<'a>,
    pub oid_object_id: Field<'a>,
    pub oid_birth_vol_id: Field<'a>,
    pub oid_birth_obj_id: Field<'a>,
    pub oid_birth_dom_id: Field<'a>,
}

impl<'a> ObjectId<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 64 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 64,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            oid_object_id: Field::integer(byte_range(content, 0, 15)?, Some("Object ID")),
            oid_birth_vol_id: Field::integer(byte_range(content, 16, 31)?, Some("Birth volume ID")),
            oid_birth_obj_id: Field::integer(byte_range(content, 32, 47)?, Some("Birth object ID")),
            oid_birth_dom_id: Field::integer(byte_range(content, 48, 63)?, Some("Birth domain ID")),
        })
    }
}

/// $DATA, type 0x80. After the header there is only raw content; nothing
/// further to decode. Non-resident data carries the header only.
#[derive(Debug, Clone)]
pub struct Data<'a> {
    pub header: AttributeHeader<'a>,
}

impl<'a> Data<'a> {
    /// The resident file content, `None` when the data lives in clusters.
    pub fn content(&self) -> Option<&'a [u8]> {
        self.header.resident_content()
    }
}

/// $INDEX_ROOT, type 0x90. The node header past byte 12 stays opaque.
#[derive(Debug, Clone)]
pub struct IndexRoot<'a> {
    pub header: AttributeHeader<'a>,
    pub ir_attr_type: Field<'a>,
    pub ir_collation_rule: Field<'a>,
    pub ir_index_byte_size: Field<'a>,
    pub ir_index_cluster_size: Field<'a>,
}

impl<'a> IndexRoot<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 13 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 13,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            ir_attr_type: Field::attribute_type(
                byte_range(content, 0, 3)?,
                Some("Type of attribute in index"),
            ),
            ir_collation_rule: Field::integer(
                byte_range(content, 4, 7)?,
                Some("Collation sorting rule"),
            ),
            ir_index_byte_size: Field::integer(
                byte_range(content, 8, 11)?,
                Some("Index record size (bytes)"),
            ),
            ir_index_cluster_size: Field::integer(
                byte_at(content, 12)?,
                Some("Index record size (clusters)"),
            ),
        })
    }
}

/// $INDEX_ALLOCATION, type 0xA0: header only, the body stays opaque.
#[derive(Debug, Clone)]
pub struct IndexAllocation<'a> {
    pub header: AttributeHeader<'a>,
}

/// $REPARSE_POINT, type 0xC0.
#[derive(Debug, Clone)]
pub struct ReparsePoint<'a> {
    pub header: AttributeHeader<'a>,
    pub rpoint_flags: Field<'a>,
    pub rpoint_size: Field<'a>,
    pub rpoint_target_name_offset: Field<'a>,
    pub rpoint_target_name_length: Field<'a>,
    pub rpoint_print_name_offset: Field<'a>,
    pub rpoint_print_name_length: Field<'a>,
}

impl<'a> ReparsePoint<'a> {
    fn parse(header: AttributeHeader<'a>, content: &'a [u8]) -> Result<Self> {
        if content.len() < 16 {
            return Err(Error::TruncatedAttributeContent {
                offset: 0,
                size: 16,
                available: content.len(),
            });
        }
        Ok(Self {
            header,
            rpoint_flags: Field::integer(byte_range(content, 0, 3)?, Some("Reparse point flags")),
            rpoint_size: Field::integer(byte_range(content, 4, 5)?, Some("Size")),
            rpoint_target_name_offset: Field::integer(
                byte_range(content, 8, 9)?,
                Some("Target name offset"),
            ),
            rpoint_target_name_length: Field::integer(
                byte_range(content, 10, 11)?,
                Some("Target name length"),
            ),
            rpoint_print_name_offset: Field::integer(
                byte_range(content, 12, 13)?,
                Some("Print name offset"),
            ),
            rpoint_print_name_length: Field::integer(
                byte_range(content, 14, 15)?,
                Some("Print name length"),
            ),
        })
    }
}

/// A known type code with no specialized decoder, header fields only.
#[derive(Debug, Clone)]
pub struct Generic<'a> {
    pub header: AttributeHeader<'a>,
}

/// A decoded attribute, tagged by its type code.
#[derive(Debug, Clone)]
pub enum Attribute<'a> {
    StandardInformation(StandardInfo<'a>),
    AttributeList(AttributeList<'a>),
    FileName(FileName<'a>),
    ObjectId(ObjectId<'a>),
    Data(Data<'a>),
    IndexRoot(IndexRoot<'a>),
    IndexAllocation(IndexAllocation<'a>),
    ReparsePoint(ReparsePoint<'a>),
    Generic(Generic<'a>),
}

impl<'a> Attribute<'a> {
    /// Dispatches on the type code at the start of `data` and decodes the
    /// matching variant. Returns `Ok(None)` for the 0xFFFFFFFF terminator
    /// and refuses codes outside the type table. A kind that requires
    /// resident content but finds none decodes as [`Generic`].
    pub fn create(data: &'a [u8]) -> Result<Option<Attribute<'a>>> {
        let code = le_u32(data, 0)?;
        if code == END_OF_ATTRIBUTES {
            return Ok(None);
        }
        if attribute_type(code, NtfsVersion::default()).is_none() {
            return Err(Error::UnknownAttributeType { code });
        }

        let header = AttributeHeader::parse(data)?;
        let content = header.resident_content();
        let attr = match (code, content) {
            (0x10, Some(content)) => {
                Attribute::StandardInformation(StandardInfo::parse(header, content)?)
            }
            (0x20, Some(content)) => {
                Attribute::AttributeList(AttributeList::parse(header, content)?)
            }
            (0x30, Some(content)) => Attribute::FileName(FileName::parse(header, content)?),
            (0x40, Some(content)) => Attribute::ObjectId(ObjectId::parse(header, content)?),
            (0x80, _) => Attribute::Data(Data { header }),
            (0x90, Some(content)) => Attribute::IndexRoot(IndexRoot::parse(header, content)?),
            (0xA0, _) => Attribute::IndexAllocation(IndexAllocation { header }),
            (0xC0, Some(content)) => {
                Attribute::ReparsePoint(ReparsePoint::parse(header, content)?)
            }
            _ => Attribute::Generic(Generic { header }),
        };
        Ok(Some(attr))
    }

    pub fn header(&self) -> &AttributeHeader<'a> {
        match self {
            Attribute::StandardInformation(a) => &a.header,
            Attribute::AttributeList(a) => &a.header,
            Attribute::FileName(a) => &a.header,
            Attribute::ObjectId(a) => &a.header,
            Attribute::Data(a) => &a.header,
            Attribute::IndexRoot(a) => &a.header,
            Attribute::IndexAllocation(a) => &a.header,
            Attribute::ReparsePoint(a) => &a.header,
            Attribute::Generic(a) => &a.header,
        }
    }

    pub fn type_code(&self) -> u32 {
        self.header().type_code()
    }

    /// The symbolic name of the type code, e.g. `$FILE_NAME`.
    pub fn type_name(&self) -> Option<&'static str> {
        attribute_type(self.type_code(), NtfsVersion::default()).map(|(name, _)| name)
    }
}

impl Export for Attribute<'_> {
    fn export(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();
        self.header().export_into(&mut rows);
        match self {
            Attribute::StandardInformation(a) => {
                push_field(&mut rows, "created", &a.created);
                push_field(&mut rows, "altered", &a.altered);
                push_field(&mut rows, "mft_altered", &a.mft_altered);
                push_field(&mut rows, "accessed", &a.accessed);
                push_field(&mut rows, "si_flags", &a.si_flags);
                push_field(&mut rows, "version_max", &a.version_max);
                push_field(&mut rows, "version", &a.version);
                push_field(&mut rows, "class_id", &a.class_id);
                push_field(&mut rows, "owner_id", &a.owner_id);
                push_field(&mut rows, "security_id", &a.security_id);
                push_field(&mut rows, "quota", &a.quota);
                push_field(&mut rows, "usn", &a.usn);
            }
            Attribute::AttributeList(a) => {
                push_field(&mut rows, "alist_attr_type", &a.alist_attr_type);
                push_field(&mut rows, "alist_entry_length", &a.alist_entry_length);
                push_field(&mut rows, "alist_name_length", &a.alist_name_length);
                push_field(&mut rows, "alist_name_offset", &a.alist_name_offset);
                push_field(&mut rows, "alist_vcn_start", &a.alist_vcn_start);
                push_field(&mut rows, "alist_file_ref", &a.alist_file_ref);
                push_field(&mut rows, "alist_attr_id", &a.alist_attr_id);
            }
            Attribute::FileName(a) => {
                push_field(&mut rows, "parent_dir", &a.parent_dir);
                push_field(&mut rows, "file_creation_time", &a.file_creation_time);
                push_field(&mut rows, "file_modification_time", &a.file_modification_time);
                push_field(&mut rows, "mft_modification_time", &a.mft_modification_time);
                push_field(&mut rows, "file_access_time", &a.file_access_time);
                push_field(&mut rows, "allocated_size", &a.allocated_size);
                push_field(&mut rows, "actual_size", &a.actual_size);
                push_field(&mut rows, "content_flags", &a.content_flags);
                push_field(&mut rows, "reparse_value", &a.reparse_value);
                push_field(&mut rows, "name_length", &a.name_length);
                push_field(&mut rows, "namespace", &a.namespace);
                push_field(&mut rows, "name", &a.name);
            }
            Attribute::ObjectId(a) => {
                push_field(&mut rows, "oid_object_id", &a.oid_object_id);
                push_field(&mut rows, "oid_birth_vol_id", &a.oid_birth_vol_id);
                push_field(&mut rows, "oid_birth_obj_id", &a.oid_birth_obj_id);
                push_field(&mut rows, "oid_birth_dom_id", &a.oid_birth_dom_id);
            }
            Attribute::IndexRoot(a) => {
                push_field(&mut rows, "ir_attr_type", &a.ir_attr_type);
                push_field(&mut rows, "ir_collation_rule", &a.ir_collation_rule);
                push_field(&mut rows, "ir_index_byte_size", &a.ir_index_byte_size);
                push_field(&mut rows, "ir_index_cluster_size", &a.ir_index_cluster_size);
            }
            Attribute::ReparsePoint(a) => {
                push_field(&mut rows, "rpoint_flags", &a.rpoint_flags);
                push_field(&mut rows, "rpoint_size", &a.rpoint_size);
                push_field(
                    &mut rows,
                    "rpoint_target_name_offset",
                    &a.rpoint_target_name_offset,
                );
                push_field(
                    &mut rows,
                    "rpoint_target_name_length",
                    &a.rpoint_target_name_length,
                );
                push_field(
                    &mut rows,
                    "rpoint_print_name_offset",
                    &a.rpoint_print_name_offset,
                );
                push_field(
                    &mut rows,
                    "rpoint_print_name_length",
                    &a.rpoint_print_name_length,
                );
            }
            Attribute::Data(_) | Attribute::IndexAllocation(_) | Attribute::Generic(_) => {}
        }
        sorted(rows)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use byteorder::{ByteOrder, LittleEndian};

    /// A resident attribute record: 16-byte common header, 8-byte resident
    /// tail, then the content at offset 24, padded to `length`.
    pub fn resident_attribute(type_code: u32, length: u32, content: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; length as usize];
        LittleEndian::write_u32(&mut data[0..4], type_code);
        LittleEndian::write_u32(&mut data[4..8], length);
        data[8] = 0;
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
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::testutil::*;
    use super::*;

    #[test]
    fn terminator_is_a_marker_not_an_attribute() {
        let data = [0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00];
        assert!(Attribute::create(&data).unwrap().is_none());
    }

    #[test]
    fn codes_outside_the_table_are_refused() {
        let data = [0x33, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
        assert!(matches!(
            Attribute::create(&data),
            Err(Error::UnknownAttributeType { code: 0x33 })
        ));
    }

    #[test]
    fn known_code_without_decoder_falls_through_to_generic() {
        let data = resident_attribute(0x100, 32, &[0xab; 4]);
        let attr = Attribute::create(&data).unwrap().unwrap();
        assert!(matches!(attr, Attribute::Generic(_)));
        assert_eq!(attr.header().attr_type.render(), "$LOGGED_UTILITY_STREAM");
    }

    #[test]
    fn standard_information_decodes_times_and_flags() {
        // 2015-08-25 12:00:00 UTC
        let content = standard_info_content(0x01d0_df2d_916b_6000, 0x0006);
        let data = resident_attribute(0x10, 96, &content);
        let attr = Attribute::create(&data).unwrap().unwrap();
        let si = match attr {
            Attribute::StandardInformation(si) => si,
            other => panic!("expected $STANDARD_INFORMATION, got {other:?}"),
        };
        assert_eq!(si.created.render(), "2015/08/25 12:00");
        assert_eq!(si.si_flags.render(), "Hidden | System");
        assert_eq!(si.header.length(), 96);
    }

    #[test]
    fn file_name_reads_name_to_the_end_of_content() {
        let content = file_name_content((2u64 << 48) | 5, "abc.txt");
        let data = resident_attribute(0x30, 104, &content);
        let attr = Attribute::create(&data).unwrap().unwrap();
        let fname = match attr {
            Attribute::FileName(f) => f,
            other => panic!("expected $FILE_NAME, got {other:?}"),
        };
        assert_eq!(fname.name.render(), "abc.txt");
        assert_eq!(fname.name_length.as_u64(), 7);
        assert_eq!(fname.namespace.as_u64(), 3);
    }

    #[test]
    fn short_file_name_content_is_truncated() {
        let data = resident_attribute(0x30, 88, &[0u8; 60]);
        assert!(matches!(
            Attribute::create(&data),
            Err(Error::TruncatedAttributeContent { .. })
        ));
    }

    #[test]
    fn short_content_slices_are_truncated_per_kind() {
        // each declared content_size falls below the kind's fixed layout
        for (code, short_len) in [(0x10, 48), (0x20, 24), (0x40, 32), (0x90, 12), (0xC0, 8)] {
            let data = resident_attribute(code, 96, &vec![0u8; short_len]);
            assert!(
                matches!(
                    Attribute::create(&data),
                    Err(Error::TruncatedAttributeContent { .. })
                ),
                "type {code:#x} with {short_len}-byte content"
            );
        }
    }

    #[test]
    fn content_outside_the_record_is_truncated() {
        let mut data = resident_attribute(0x80, 32, &[0u8; 4]);
        // declare more content than the record holds
        data[16] = 64;
        assert!(matches!(
            Attribute::create(&data),
            Err(Error::TruncatedAttributeContent { .. })
        ));
    }

    #[test]
    fn resident_content_fits_the_declared_length() {
        let data = resident_attribute(0x80, 40, b"hello world");
        let attr = Attribute::create(&data).unwrap().unwrap();
        let data_attr = match attr {
            Attribute::Data(d) => d,
            other => panic!("expected $DATA, got {other:?}"),
        };
        assert_eq!(data_attr.content(), Some(&b"hello world"[..]));
    }

    #[test]
    fn non_resident_tail_uses_the_newer_layout() {
        let mut data = vec![0u8; 64];
        LittleEndian::write_u32(&mut data[0..4], 0x80);
        LittleEndian::write_u32(&mut data[4..8], 64);
        data[8] = 1;
        LittleEndian::write_u64(&mut data[16..24], 0);
        LittleEndian::write_u64(&mut data[24..32], 15);
        LittleEndian::write_u16(&mut data[32..34], 64);
        LittleEndian::write_u64(&mut data[40..48], 65536);
        LittleEndian::write_u64(&mut data[48..56], 61234);
        LittleEndian::write_u64(&mut data[56..64], 61234);
        let attr = Attribute::create(&data).unwrap().unwrap();
        let header = attr.header();
        assert!(!header.is_resident());
        assert!(header.resident_content().is_none());
        match &header.tail {
            Tail::NonResident {
                vcn_end,
                attr_actual_size,
                ..
            } => {
                assert_eq!(vcn_end.as_u64(), 15);
                assert_eq!(attr_actual_size.as_u64(), 61234);
            }
            Tail::Resident { .. } => panic!("expected a non-resident tail"),
        }
    }

    #[test]
    fn object_id_renders_guid_shaped_fields() {
        let mut content = vec![0u8; 64];
        content[0] = 0x11;
        content[24] = 0x22;
        let data = resident_attribute(0x40, 96, &content);
        let attr = Attribute::create(&data).unwrap().unwrap();
        let oid = match attr {
            Attribute::ObjectId(o) => o,
            other => panic!("expected $OBJECT_ID, got {other:?}"),
        };
        assert_eq!(oid.oid_object_id.render(), "(17, 0)");
        assert_eq!(oid.oid_birth_vol_id.render(), "(0, 34)");
    }

    #[test]
    fn version_1_2_renames_two_types() {
        assert_eq!(
            attribute_type(0x40, NtfsVersion::V1_2).map(|(n, _)| n),
            Some("$VOLUME_VERSION")
        );
        assert_eq!(
            attribute_type(0xC0, NtfsVersion::V1_2).map(|(n, _)| n),
            Some("$SYMBOLIC_LINK")
        );
        assert_eq!(
            attribute_type(0x40, NtfsVersion::default()).map(|(n, _)| n),
            Some("$OBJECT_ID")
        );
    }

    #[test]
    fn export_rows_sort_by_member_key() {
        let content = standard_info_content(0, 0);
        let data = resident_attribute(0x10, 96, &content);
        let attr = Attribute::create(&data).unwrap().unwrap();
        let rows = attr.export();
        let keys: Vec<&str> = rows.iter().map(|r| r.key).collect();
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(keys, expected);
        assert!(keys.contains(&"attr_type"));
        assert!(keys.contains(&"si_flags"));
        assert!(!keys.contains(&"raw"));
        assert!(!keys.contains(&"content"));
    }
}
