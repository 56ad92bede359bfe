//! Partition walker. Reads the boot sector of an NTFS volume, seeks to the
//! MFT and strides over it in 1024-byte records. The walker is pull-based:
//! nothing is read until the consumer asks for the next record.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::boot::{BootSector, BOOT_SECTOR_SIZE};
use crate::entry::{Entry, ENTRY_SIZE, NO_FILENAME};
use crate::error::Result;

/// An NTFS volume behind any readable, seekable byte source.
pub struct Partition<R> {
    source: R,
    boot: BootSector,
}

impl Partition<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> Partition<R> {
    /// Reads and validates the boot sector. A source whose first 512 bytes
    /// do not form a valid NTFS boot sector is rejected here.
    pub fn new(mut source: R) -> Result<Self> {
        let mut block = [0u8; BOOT_SECTOR_SIZE];
        source.seek(SeekFrom::Start(0))?;
        source.read_exact(&mut block)?;
        let boot = BootSector::parse(&block)?;
        boot.validate()?;
        debug!(
            cluster_bytes = boot.cluster_bytes(),
            mft_offset = boot.mft_start_offset_bytes(),
            "parsed NTFS boot sector"
        );
        Ok(Self { source, boot })
    }

    pub fn boot(&self) -> &BootSector {
        &self.boot
    }

    /// Raw 1024-byte MFT blocks starting at record `start`, unvalidated and
    /// unfiltered.
    pub fn blocks(self, start: u64) -> Result<Blocks<R>> {
        let mut source = self.source;
        let offset = self.boot.mft_start_offset_bytes() + ENTRY_SIZE as u64 * start;
        source.seek(SeekFrom::Start(offset))?;
        Ok(Blocks {
            source,
            index: start,
        })
    }

    /// Decoded MFT records starting at record `start`. Records with an
    /// unrecognized signature are skipped silently, and empty slots (no
    /// $FILE_NAME and a zero next attribute id) are discarded.
    pub fn records(self, start: u64) -> Result<Records<R>> {
        Ok(Records {
            blocks: self.blocks(start)?,
        })
    }
}

/// One 1024-byte MFT block, owned so it can outlive the walker stride.
#[derive(Debug, Clone)]
pub struct MftRecord {
    /// Record number within the MFT.
    pub index: u64,
    /// Byte offset of the block from the start of the volume.
    pub offset: u64,
    data: Box<[u8]>,
}

impl MftRecord {
    /// Re-borrows the block as a decoded entry.
    pub fn entry(&self) -> Result<Entry<'_>> {
        Entry::new(&self.data)
    }

    /// The exact raw bytes of the block.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Unfiltered iterator over MFT blocks. The next offset always comes from
/// the stream's own position, so a partial read cannot desynchronize the
/// stride. A short read terminates the walk; any other read error is fatal
/// and surfaced.
pub struct Blocks<R> {
    source: R,
    index: u64,
}

impl<R: Read + Seek> Iterator for Blocks<R> {
    type Item = Result<MftRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = match self.source.stream_position() {
            Ok(offset) => offset,
            Err(error) => return Some(Err(error.into())),
        };
        let mut data = vec![0u8; ENTRY_SIZE];
        if let Err(error) = self.source.read_exact(&mut data) {
            return match error.kind() {
                ErrorKind::UnexpectedEof => None,
                _ => Some(Err(error.into())),
            };
        }
        let index = self.index;
        self.index += 1;
        Some(Ok(MftRecord {
            index,
            offset,
            data: data.into_boxed_slice(),
        }))
    }
}

/// Filtered iterator over decoded MFT records.
pub struct Records<R> {
    blocks: Blocks<R>,
}

impl<R: Read + Seek> Iterator for Records<R> {
    type Item = Result<MftRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.blocks.next()? {
                Ok(record) => record,
                Err(error) => return Some(Err(error)),
            };
            let keep = match record.entry() {
                Ok(entry) => match entry.validate() {
                    Ok(()) => {
                        let empty_slot =
                            entry.filename() == NO_FILENAME && entry.next_attr_id.as_u64() == 0;
                        if empty_slot {
                            debug!(record = record.index, "discarding empty MFT slot");
                        }
                        !empty_slot
                    }
                    Err(error) => {
                        debug!(record = record.index, %error, "skipping invalid MFT entry");
                        false
                    }
                },
                Err(error) => {
                    debug!(record = record.index, %error, "skipping undersized MFT entry");
                    false
                }
            };
            if keep {
                return Some(Ok(record));
            }
        }
    }
}
