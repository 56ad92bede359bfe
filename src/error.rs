use thiserror::Error;

/// Errors surfaced by the decoders and the partition walker.
///
/// Field-level decode failures (string encodings, out-of-range timestamps)
/// never appear here; they render as fallback values so an otherwise valid
/// entry stays viewable.
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer holds fewer bytes than the layout requires.
    #[error("truncated input: layout requires {needed} bytes, buffer holds {got}")]
    TruncatedInput { needed: usize, got: usize },

    /// The boot sector does not end in 0xAA55.
    #[error("invalid boot sector: signature {found:#06x} is not 0xaa55")]
    InvalidBootSector { found: u16 },

    /// The entry signature is not FILE, BAAD or all zeroes.
    #[error("invalid MFT entry: signature {found:#010x}")]
    InvalidMftEntry { found: u32 },

    /// The attribute type code is absent from the type table.
    #[error("unknown attribute type {code:#x}")]
    UnknownAttributeType { code: u32 },

    /// The declared content range extends beyond the attribute record.
    #[error("truncated attribute content: offset {offset} + size {size} exceeds {available} available bytes")]
    TruncatedAttributeContent {
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
