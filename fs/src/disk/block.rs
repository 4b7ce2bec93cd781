//! Data block record.
//!
//! Blocks hold file payload and chain backward: each block names its
//! predecessor by id. A file's inode points at the *last* block, so the
//! chain is walked newest-first. The payload follows the header on
//! flash; the record's CRC covers both.

use crate::core::error::{FsError, FsResult};
use crate::core::types::ObjectId;
use crate::disk::crc::{crc16, crc16_update};
use crate::disk::BLOCK_MAGIC;

/// Size of the block header on flash (payload follows)
pub const DISK_BLOCK_SIZE: usize = 14;

static_assertions::const_assert_eq!(DISK_BLOCK_SIZE, 2 + 2 + 2 + 2 + 2 + 2 + 2);

/// On-flash data block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskBlock {
    /// Must equal [`BLOCK_MAGIC`]
    pub magic: u16,
    /// Object id of this block
    pub id: u16,
    /// Overwrite sequence; bumped when the block's content is rewritten
    /// (e.g. when GC collation merges a run into it)
    pub seq: u16,
    /// Object id of the owning inode
    pub inode_id: u16,
    /// Object id of the previous block in the chain (raw sentinel if
    /// this is the file's first block)
    pub prev_id: u16,
    /// Payload length in bytes
    pub data_len: u16,
    /// CRC16 over the header (crc field zeroed) and the payload
    pub crc: u16,
}

impl DiskBlock {
    /// Header for a fresh block; CRC left unfilled
    pub fn new(id: ObjectId, inode_id: ObjectId, prev: Option<ObjectId>, seq: u16, data_len: u16) -> Self {
        Self {
            magic: BLOCK_MAGIC,
            id: id.0,
            seq,
            inode_id: inode_id.0,
            prev_id: ObjectId::to_raw(prev),
            data_len,
            crc: 0,
        }
    }

    /// Total record length on flash, payload included
    #[inline]
    pub fn flash_len(&self) -> u32 {
        DISK_BLOCK_SIZE as u32 + self.data_len as u32
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; DISK_BLOCK_SIZE] {
        let mut buf = [0u8; DISK_BLOCK_SIZE];
        buf[0..2].copy_from_slice(&self.magic.to_le_bytes());
        buf[2..4].copy_from_slice(&self.id.to_le_bytes());
        buf[4..6].copy_from_slice(&self.seq.to_le_bytes());
        buf[6..8].copy_from_slice(&self.inode_id.to_le_bytes());
        buf[8..10].copy_from_slice(&self.prev_id.to_le_bytes());
        buf[10..12].copy_from_slice(&self.data_len.to_le_bytes());
        buf[12..14].copy_from_slice(&self.crc.to_le_bytes());
        buf
    }

    /// Deserialize from bytes, checking the magic
    pub fn from_bytes(bytes: &[u8; DISK_BLOCK_SIZE]) -> FsResult<Self> {
        let block = Self {
            magic: u16::from_le_bytes([bytes[0], bytes[1]]),
            id: u16::from_le_bytes([bytes[2], bytes[3]]),
            seq: u16::from_le_bytes([bytes[4], bytes[5]]),
            inode_id: u16::from_le_bytes([bytes[6], bytes[7]]),
            prev_id: u16::from_le_bytes([bytes[8], bytes[9]]),
            data_len: u16::from_le_bytes([bytes[10], bytes[11]]),
            crc: u16::from_le_bytes([bytes[12], bytes[13]]),
        };
        if block.magic != BLOCK_MAGIC {
            return Err(FsError::Corrupt);
        }
        Ok(block)
    }

    /// CRC16 over the header with the crc field zeroed, then `payload`
    pub fn compute_crc(&self, payload: &[u8]) -> u16 {
        let mut hdr = *self;
        hdr.crc = 0;
        crc16_update(crc16(&hdr.to_bytes()), payload)
    }

    /// Fill the crc field from the header and `payload`
    pub fn fill_crc(&mut self, payload: &[u8]) {
        self.crc = self.compute_crc(payload);
    }

    /// Validate the stored CRC against the header and `payload`
    pub fn validate_crc(&self, payload: &[u8]) -> bool {
        self.crc == self.compute_crc(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_block_roundtrip() {
        let mut block = DiskBlock::new(ObjectId(9), ObjectId(4), Some(ObjectId(8)), 1, 100);
        block.fill_crc(&[0xAB; 100]);

        let decoded = DiskBlock::from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.validate_crc(&[0xAB; 100]));
        assert_eq!(decoded.flash_len(), DISK_BLOCK_SIZE as u32 + 100);
    }

    #[test]
    fn test_disk_block_first_in_chain() {
        let block = DiskBlock::new(ObjectId(9), ObjectId(4), None, 0, 10);
        assert_eq!(ObjectId::from_raw(block.prev_id), None);
    }

    #[test]
    fn test_disk_block_crc_covers_payload() {
        let mut block = DiskBlock::new(ObjectId(9), ObjectId(4), None, 0, 4);
        block.fill_crc(&[1, 2, 3, 4]);
        assert!(!block.validate_crc(&[1, 2, 3, 5]));
    }
}
