//! Decoders for NTFS on-disk metadata: the boot sector of a volume and the
//! entries of the Master File Table, with their embedded attribute records.
//!
//! The crate is a pull-based decoding pipeline. A byte source (a file or a
//! raw partition) feeds the [`boot::BootSector`] decoder, which locates the
//! MFT; the [`partition::Partition`] walker strides over 1024-byte entry
//! blocks; [`entry::Entry`] decodes a block and lazily yields its
//! [`attributes::Attribute`] records; and the [`fields`] layer gives every
//! raw slice a typed, renderable interpretation. Decoded structures borrow
//! the caller's buffer and never mutate it.

pub mod attributes;
pub mod boot;
pub mod bytes;
pub mod entry;
pub mod error;
pub mod export;
pub mod fields;
pub mod partition;

pub use attributes::Attribute;
pub use boot::BootSector;
pub use entry::{Entry, NO_FILENAME};
pub use error::{Error, Result};
pub use export::{Export, ExportRow};
pub use fields::{Field, MftReference};
pub use partition::{MftRecord, Partition};
