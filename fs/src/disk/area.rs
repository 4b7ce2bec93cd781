//! Area header record.
//!
//! One header sits at the start of every area. The scratch area carries
//! id [`AREA_ID_NONE`]; since that sentinel is all ones, the garbage
//! collector can later program a real id over it without an erase.

use crate::core::error::{FsError, FsResult};
use crate::core::types::AREA_ID_NONE;
use crate::disk::{AREA_MAGIC, DISK_VERSION};

/// Size of the area header on flash
pub const DISK_AREA_SIZE: usize = 12;

static_assertions::const_assert_eq!(DISK_AREA_SIZE, 4 + 4 + 2 + 1 + 1);

/// On-flash area header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskArea {
    /// Must equal [`AREA_MAGIC`]
    pub magic: u32,
    /// Area length in bytes, header included
    pub length: u32,
    /// Area id, or [`AREA_ID_NONE`] for the scratch area
    pub id: u16,
    /// On-flash format version
    pub ver: u8,
    /// Garbage collection sequence number
    pub gc_seq: u8,
}

impl DiskArea {
    /// Header for a data or scratch area
    pub fn new(length: u32, id: u16, gc_seq: u8) -> Self {
        Self {
            magic: AREA_MAGIC,
            length,
            id,
            ver: DISK_VERSION,
            gc_seq,
        }
    }

    /// Whether this header marks the scratch area
    #[inline]
    pub fn is_scratch(&self) -> bool {
        self.id == AREA_ID_NONE
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; DISK_AREA_SIZE] {
        let mut buf = [0u8; DISK_AREA_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf[8..10].copy_from_slice(&self.id.to_le_bytes());
        buf[10] = self.ver;
        buf[11] = self.gc_seq;
        buf
    }

    /// Deserialize from bytes, checking the magic
    pub fn from_bytes(bytes: &[u8; DISK_AREA_SIZE]) -> FsResult<Self> {
        let area = Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            id: u16::from_le_bytes([bytes[8], bytes[9]]),
            ver: bytes[10],
            gc_seq: bytes[11],
        };
        if area.magic != AREA_MAGIC {
            return Err(FsError::Corrupt);
        }
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_area_roundtrip() {
        let area = DiskArea::new(4096, 2, 9);
        let decoded = DiskArea::from_bytes(&area.to_bytes()).unwrap();
        assert_eq!(decoded, area);
        assert!(!decoded.is_scratch());
    }

    #[test]
    fn test_disk_area_scratch_sentinel() {
        let scratch = DiskArea::new(4096, AREA_ID_NONE, 0);
        assert!(scratch.is_scratch());
        // The sentinel must be all ones so a real id can be programmed
        // over it on NOR flash without an erase.
        assert_eq!(scratch.to_bytes()[8..10], [0xFF, 0xFF]);
    }

    #[test]
    fn test_disk_area_bad_magic() {
        let mut bytes = DiskArea::new(4096, 0, 0).to_bytes();
        bytes[0] ^= 0xFF;
        assert_eq!(DiskArea::from_bytes(&bytes), Err(FsError::Corrupt));
    }
}
