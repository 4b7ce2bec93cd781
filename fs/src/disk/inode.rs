//! Inode record.
//!
//! An inode names one file or directory. The filename follows the
//! header directly on flash; the record's CRC covers both.

use crate::core::error::{FsError, FsResult};
use crate::disk::crc::{crc16, crc16_update};
use crate::disk::INODE_MAGIC;

/// Size of the inode header on flash (filename follows)
pub const DISK_INODE_SIZE: usize = 12;

static_assertions::const_assert_eq!(DISK_INODE_SIZE, 2 + 2 + 2 + 2 + 1 + 1 + 2);

/// Inode flags
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(transparent)]
pub struct InodeFlags(pub u8);

impl InodeFlags {
    /// Inode names a regular file (directories leave this clear)
    pub const FILE: u8 = 1 << 0;

    #[inline]
    pub const fn contains(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

/// On-flash inode header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskInode {
    /// Must equal [`INODE_MAGIC`]
    pub magic: u16,
    /// Object id of this inode
    pub id: u16,
    /// Overwrite sequence; a higher-seq record for the same id supersedes
    pub seq: u16,
    /// Object id of the parent directory (raw sentinel when detached)
    pub parent_id: u16,
    /// Length of the filename that follows the header
    pub filename_len: u8,
    /// [`InodeFlags`] bits
    pub flags: u8,
    /// CRC16 over the header (crc field zeroed) and the filename
    pub crc: u16,
}

impl DiskInode {
    /// Header for a fresh inode; CRC left unfilled
    pub fn new(id: u16, parent_id: u16, filename_len: u8, is_file: bool) -> Self {
        let mut flags = InodeFlags::default();
        if is_file {
            flags.set(InodeFlags::FILE);
        }
        Self {
            magic: INODE_MAGIC,
            id,
            seq: 0,
            parent_id,
            filename_len,
            flags: flags.0,
            crc: 0,
        }
    }

    /// Whether this inode names a regular file
    #[inline]
    pub fn is_file(&self) -> bool {
        InodeFlags(self.flags).contains(InodeFlags::FILE)
    }

    /// Total record length on flash, filename included
    #[inline]
    pub fn flash_len(&self) -> u32 {
        DISK_INODE_SIZE as u32 + self.filename_len as u32
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; DISK_INODE_SIZE] {
        let mut buf = [0u8; DISK_INODE_SIZE];
        buf[0..2].copy_from_slice(&self.magic.to_le_bytes());
        buf[2..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.seq.to_le_bytes());
        buf[6..8].copy_from_slice(&self.parent_id.to_le_bytes());
        buf[8] = self.filename_len;
        buf[9] = self.flags;
        buf[10..12].copy_from_slice(&self.crc.to_le_bytes());
        buf
    }

    /// Deserialize from bytes, checking the magic
    pub fn from_bytes(bytes: &[u8; DISK_INODE_SIZE]) -> FsResult<Self> {
        let inode = Self {
            magic: u16::from_le_bytes([bytes[0], bytes[1]]),
            id: u16::from_le_bytes([bytes[2], bytes[3]]),
            seq: u16::from_le_bytes([bytes[4], bytes[5]]),
            parent_id: u16::from_le_bytes([bytes[6], bytes[7]]),
            filename_len: bytes[8],
            flags: bytes[9],
            crc: u16::from_le_bytes([bytes[10], bytes[11]]),
        };
        if inode.magic != INODE_MAGIC {
            return Err(FsError::Corrupt);
        }
        Ok(inode)
    }

    /// CRC16 over the header with the crc field zeroed, then `filename`
    pub fn compute_crc(&self, filename: &[u8]) -> u16 {
        let mut hdr = *self;
        hdr.crc = 0;
        crc16_update(crc16(&hdr.to_bytes()), filename)
    }

    /// Fill the crc field from the header and `filename`
    pub fn fill_crc(&mut self, filename: &[u8]) {
        self.crc = self.compute_crc(filename);
    }

    /// Validate the stored CRC against the header and `filename`
    pub fn validate_crc(&self, filename: &[u8]) -> bool {
        self.crc == self.compute_crc(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_inode_roundtrip() {
        let mut inode = DiskInode::new(4, 1, 8, true);
        inode.fill_crc(b"test.txt");

        let decoded = DiskInode::from_bytes(&inode.to_bytes()).unwrap();
        assert_eq!(decoded, inode);
        assert!(decoded.is_file());
        assert!(decoded.validate_crc(b"test.txt"));
        assert_eq!(decoded.flash_len(), DISK_INODE_SIZE as u32 + 8);
    }

    #[test]
    fn test_disk_inode_directory_flag() {
        let dir = DiskInode::new(2, 1, 3, false);
        assert!(!dir.is_file());
    }

    #[test]
    fn test_disk_inode_crc_mismatch() {
        let mut inode = DiskInode::new(4, 1, 8, true);
        inode.fill_crc(b"test.txt");
        assert!(!inode.validate_crc(b"test.bin"));
    }
}
