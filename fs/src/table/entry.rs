//! Object table entries.
//!
//! One entry per live object. Inode and block entries share an identity
//! (id + current flash location) and are kept as explicit variants, so
//! the type of an entry is checked at every access instead of being
//! inferred from id bit patterns.

use crate::core::types::{FlashLoc, ObjectId};

/// In-RAM record of one inode.
#[derive(Clone, Copy, Debug)]
pub struct InodeEntry {
    /// Object id
    pub id: ObjectId,
    /// Current flash location of the inode record
    pub loc: FlashLoc,
    /// Filename length (the name itself stays on flash)
    pub filename_len: u8,
    /// Regular file or directory
    pub is_file: bool,
    /// Last block of the file's chain, if any
    pub last_block: Option<ObjectId>,
}

/// In-RAM record of one data block.
#[derive(Clone, Copy, Debug)]
pub struct BlockEntry {
    /// Object id
    pub id: ObjectId,
    /// Current flash location of the block record
    pub loc: FlashLoc,
    /// Payload length
    pub data_len: u16,
    /// Overwrite sequence
    pub seq: u16,
    /// Owning inode, by id
    pub inode_id: ObjectId,
    /// Previous block in the chain, by id
    pub prev: Option<ObjectId>,
}

/// One object table entry.
#[derive(Clone, Copy, Debug)]
pub enum Object {
    /// File or directory inode
    Inode(InodeEntry),
    /// File data block
    Block(BlockEntry),
}

impl Object {
    /// Object id
    #[inline]
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Inode(inode) => inode.id,
            Self::Block(block) => block.id,
        }
    }

    /// Current flash location
    #[inline]
    pub fn loc(&self) -> FlashLoc {
        match self {
            Self::Inode(inode) => inode.loc,
            Self::Block(block) => block.loc,
        }
    }

    /// Move the object's recorded location (the GC relocation step)
    #[inline]
    pub fn set_loc(&mut self, loc: FlashLoc) {
        match self {
            Self::Inode(inode) => inode.loc = loc,
            Self::Block(block) => block.loc = loc,
        }
    }

    /// Inode view, if this entry is an inode
    #[inline]
    pub fn as_inode(&self) -> Option<&InodeEntry> {
        match self {
            Self::Inode(inode) => Some(inode),
            Self::Block(_) => None,
        }
    }

    /// Mutable inode view
    #[inline]
    pub fn as_inode_mut(&mut self) -> Option<&mut InodeEntry> {
        match self {
            Self::Inode(inode) => Some(inode),
            Self::Block(_) => None,
        }
    }

    /// Block view, if this entry is a block
    #[inline]
    pub fn as_block(&self) -> Option<&BlockEntry> {
        match self {
            Self::Block(block) => Some(block),
            Self::Inode(_) => None,
        }
    }

    /// Mutable block view
    #[inline]
    pub fn as_block_mut(&mut self) -> Option<&mut BlockEntry> {
        match self {
            Self::Block(block) => Some(block),
            Self::Inode(_) => None,
        }
    }
}
